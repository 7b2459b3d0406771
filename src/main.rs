use anyhow::{bail, Context, Result};
use chore_planner::clock::SystemClock;
use chore_planner::domain::{
    format_elapsed, progress_bar, status_badge, FamilyMemberPatch, NewFamilyMember, Task,
};
use chore_planner::notifications::DesktopAlert;
use chore_planner::persistence::{get_data_dir, init_local_data_dir, FileStore};
use chore_planner::ticker::tick_duration;
use chore_planner::timer::Countdown;
use chore_planner::{
    Config, FamilyStore, LoadOutcome, NewTask, PersistOutcome, StoreEvent, TaskCommand, TaskStore,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "chores")]
#[command(about = "Plan family chores with countdown timers and progress boards", long_about = None)]
struct Cli {
    /// Config file. Defaults to <config_dir>/chores/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Data directory. Defaults to a local .chores, then ~/.chores
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .chores directory in the current directory
    Init,
    /// Manage family members
    Family {
        #[command(subcommand)]
        action: FamilyAction,
    },
    /// Manage tasks
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Show progress per responsible person
    Board,
    /// Follow a running countdown until its timer stops
    Watch { id: String },
}

#[derive(Subcommand)]
enum FamilyAction {
    Add {
        name: String,
        #[arg(long)]
        emoji: Option<String>,
    },
    List,
    Rename { id: String, name: String },
    /// Switch a member between active and inactive
    Toggle { id: String },
    Remove { id: String },
}

#[derive(Subcommand)]
enum TaskAction {
    Add {
        title: String,
        #[arg(long)]
        emoji: Option<String>,
        #[arg(long)]
        color: Option<String>,
        /// Family member names; repeat for several
        #[arg(long = "assign")]
        assign: Vec<String>,
        /// Estimated minutes
        #[arg(long)]
        minutes: Option<u32>,
    },
    List,
    /// Assign members; no names clears the assignment
    Assign { id: String, names: Vec<String> },
    /// Set the estimate in minutes; no value clears it
    Estimate { id: String, minutes: Option<u32> },
    Rename { id: String, title: String },
    Start { id: String },
    Pause { id: String },
    Resume { id: String },
    Reset { id: String },
    Stop { id: String },
    /// Mark completed, or not completed with --undo
    Complete {
        id: String,
        #[arg(long)]
        undo: bool,
    },
    Delete { id: String },
    /// Delete every task of one responsible person
    ClearFor { name: String },
}

fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();
}

struct Stores {
    config: Config,
    tasks: TaskStore,
    family: FamilyStore,
}

fn open_stores(cli: &Cli) -> Result<Stores> {
    let config = Config::load(cli.config.as_deref())?;

    let data_dir = match cli.data_dir.clone().or_else(|| config.data_dir.clone()) {
        Some(dir) => dir,
        None => get_data_dir()?,
    };
    tracing::debug!(dir = %data_dir.display(), "using data directory");

    let storage = Arc::new(FileStore::open(&data_dir)?);
    let mut tasks = TaskStore::new(
        storage.clone(),
        Arc::new(SystemClock),
        Arc::new(DesktopAlert),
        config.store_config(),
    );
    let mut family = FamilyStore::new(storage, config.family_minimum_active);

    if let LoadOutcome::Failed(reason) = tasks.load_tasks() {
        eprintln!("Warning: could not read tasks: {}", reason);
    }
    if let LoadOutcome::Failed(reason) = family.load_family_members() {
        eprintln!("Warning: could not read family members: {}", reason);
    }

    Ok(Stores {
        config,
        tasks,
        family,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Commands::Init = cli.command {
        let cwd = std::env::current_dir().context("Could not determine current directory")?;
        let data_dir = init_local_data_dir(&cwd)?;
        println!("Initialized chores directory: {}", data_dir.display());
        println!();
        println!("Run 'chores family add <name>' to set up your family.");
        return Ok(());
    }

    let mut stores = open_stores(&cli)?;

    match cli.command {
        Commands::Init => Ok(()),
        Commands::Family { action } => run_family(&mut stores.family, action),
        Commands::Task { action } => run_task(&mut stores, action),
        Commands::Board => {
            print_board(&stores.tasks);
            Ok(())
        }
        Commands::Watch { id } => {
            let id = resolve_task_id(&stores.tasks, &id)?;
            watch(&mut stores, &id)
        }
    }
}

fn report(outcome: PersistOutcome) {
    if let PersistOutcome::Failed(reason) = outcome {
        eprintln!("Warning: change kept in memory only: {}", reason);
    }
}

fn resolve_member_id(family: &FamilyStore, prefix: &str) -> Result<String> {
    let matches: Vec<&str> = family
        .members()
        .iter()
        .filter(|m| m.id.starts_with(prefix) || m.name == prefix)
        .map(|m| m.id.as_str())
        .collect();
    match matches.as_slice() {
        [id] => Ok(id.to_string()),
        [] => bail!("No family member matches '{}'", prefix),
        _ => bail!("'{}' matches several family members", prefix),
    }
}

/// Accept any unambiguous ID prefix
fn resolve_task_id(tasks: &TaskStore, prefix: &str) -> Result<String> {
    let matches: Vec<&str> = tasks
        .tasks()
        .iter()
        .filter(|t| t.id.starts_with(prefix))
        .map(|t| t.id.as_str())
        .collect();
    match matches.as_slice() {
        [id] => Ok(id.to_string()),
        [] => bail!("No task matches '{}'", prefix),
        _ => bail!("'{}' matches several tasks", prefix),
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn run_family(family: &mut FamilyStore, action: FamilyAction) -> Result<()> {
    match action {
        FamilyAction::Add { name, emoji } => {
            let mut new_member = NewFamilyMember::new(name);
            if let Some(emoji) = emoji {
                new_member = new_member.with_emoji(emoji);
            }
            let (id, outcome) = family.add_family_member(new_member)?;
            report(outcome);
            println!("Added {}", short_id(&id));
        }
        FamilyAction::List => {
            if family.members().is_empty() {
                println!("No family members yet.");
            }
            for member in family.members() {
                let state = if member.is_active { "" } else { " (inactive)" };
                println!("{} {}  {}{}", member.emoji, member.name, short_id(&member.id), state);
            }
            if !family.is_family_configured() {
                println!();
                println!(
                    "At least {} active member(s) needed before planning.",
                    family.minimum_active()
                );
            }
        }
        FamilyAction::Rename { id, name } => {
            let id = resolve_member_id(family, &id)?;
            report(family.update_family_member(&id, &FamilyMemberPatch::rename(name))?);
        }
        FamilyAction::Toggle { id } => {
            let id = resolve_member_id(family, &id)?;
            report(family.toggle_family_member(&id));
        }
        FamilyAction::Remove { id } => {
            let id = resolve_member_id(family, &id)?;
            report(family.delete_family_member(&id));
        }
    }
    Ok(())
}

fn run_task(stores: &mut Stores, action: TaskAction) -> Result<()> {
    let tasks = &mut stores.tasks;

    let command = match action {
        TaskAction::Add {
            title,
            emoji,
            color,
            assign,
            minutes,
        } => {
            warn_unknown_members(&stores.family, &assign);
            let new_task = NewTask {
                title,
                emoji,
                color,
                assigned_members: assign,
                estimated_completion_time: minutes,
            };
            let (id, outcome) = tasks.add_task(new_task)?;
            report(outcome);
            println!("Added {}", short_id(&id));
            return Ok(());
        }
        TaskAction::List => {
            print_tasks(tasks);
            return Ok(());
        }
        TaskAction::ClearFor { name } => {
            report(tasks.delete_tasks_for(&name)?);
            return Ok(());
        }
        TaskAction::Assign { id, names } => {
            let id = resolve_task_id(tasks, &id)?;
            warn_unknown_members(&stores.family, &names);
            if names.is_empty() {
                TaskCommand::Unassign { id }
            } else {
                TaskCommand::AssignMembers { id, members: names }
            }
        }
        TaskAction::Estimate { id, minutes } => TaskCommand::SetEstimate {
            id: resolve_task_id(tasks, &id)?,
            minutes,
        },
        TaskAction::Rename { id, title } => TaskCommand::Rename {
            id: resolve_task_id(tasks, &id)?,
            title,
        },
        TaskAction::Start { id } => TaskCommand::TimerStart {
            id: resolve_task_id(tasks, &id)?,
        },
        TaskAction::Pause { id } => TaskCommand::TimerPause {
            id: resolve_task_id(tasks, &id)?,
        },
        TaskAction::Resume { id } => TaskCommand::TimerResume {
            id: resolve_task_id(tasks, &id)?,
        },
        TaskAction::Reset { id } => TaskCommand::TimerReset {
            id: resolve_task_id(tasks, &id)?,
        },
        TaskAction::Stop { id } => TaskCommand::TimerStop {
            id: resolve_task_id(tasks, &id)?,
        },
        TaskAction::Complete { id, undo } => TaskCommand::SetCompleted {
            id: resolve_task_id(tasks, &id)?,
            completed: !undo,
        },
        TaskAction::Delete { id } => TaskCommand::Delete {
            id: resolve_task_id(tasks, &id)?,
        },
    };

    let is_start = matches!(command, TaskCommand::TimerStart { .. });
    let target = command.task_id().map(str::to_string);
    let outcome = tasks.apply(command)?;
    if is_start && outcome == PersistOutcome::Unchanged {
        println!("Timer not started: the task needs an estimate and someone responsible.");
    }
    report(outcome);

    if let Some(task) = target.as_deref().and_then(|id| tasks.task(id)) {
        print_task(tasks, task);
    }
    print_events(tasks.take_events());
    Ok(())
}

fn warn_unknown_members(family: &FamilyStore, names: &[String]) {
    for name in names {
        if family.member_by_name(name).is_none() {
            eprintln!("Warning: '{}' is not a family member", name);
        }
    }
}

fn print_task(tasks: &TaskStore, task: &Task) {
    let emoji = task.emoji.as_deref().unwrap_or(" ");
    let who = task.responsible().unwrap_or("-");
    let time = match (task.estimated_completion_time, task.actual_completion_time) {
        (_, Some(actual)) => format!("took {}", format_elapsed(actual)),
        (Some(_), None) => tasks
            .remaining(&task.id)
            .filter(|_| task.timer_started)
            .map(|r| r.formatted())
            .unwrap_or_else(|| format!("{}m", task.estimated_completion_time.unwrap_or_default())),
        (None, None) => String::new(),
    };
    println!(
        "{}  {:<12} {} {:<24} {:<10} {}",
        short_id(&task.id),
        status_badge(task),
        emoji,
        task.title,
        who,
        time
    );
}

fn print_tasks(tasks: &TaskStore) {
    if tasks.tasks().is_empty() {
        println!("No tasks yet.");
    }
    for task in tasks.tasks() {
        print_task(tasks, task);
    }
}

fn print_board(tasks: &TaskStore) {
    let board = tasks.board();

    for group in &board.groups {
        println!(
            "{:<12} {} {}/{} ({:.0}%)",
            group.responsible,
            progress_bar(group, 20),
            group.completed_count,
            group.total_count,
            group.completion_percentage()
        );
        for task in group.task_ids.iter().filter_map(|id| tasks.task(id)) {
            println!("    {:<12} {}", status_badge(task), task.title);
        }
    }

    if !board.unplanned.is_empty() {
        println!("Unplanned");
        for task in board.unplanned.iter().filter_map(|id| tasks.task(id)) {
            println!("    {}  {}", short_id(&task.id), task.title);
        }
    }

    if board.is_completed() {
        println!();
        println!("🎉 Every chore is done!");
    }
}

fn print_events(events: Vec<StoreEvent>) {
    for event in events {
        match event {
            StoreEvent::Overdue { title, .. } => println!("⏰ '{}' is over its estimate", title),
            StoreEvent::GroupCompleted { responsible } => {
                println!("🎉 {} finished all their chores", responsible)
            }
            StoreEvent::BoardCompleted => println!("🎉 Every chore is done!"),
        }
    }
}

fn watch(stores: &mut Stores, id: &str) -> Result<()> {
    let mut countdown = Countdown::new(id, stores.config.coalesce_ms);
    let interval = tick_duration(stores.config.refresh_ms);

    loop {
        // Other processes may pause or complete the task meanwhile
        stores.tasks.load_tasks();
        report(stores.tasks.tick().unwrap_or(PersistOutcome::Unchanged));
        print_events(stores.tasks.take_events());

        let Some(task) = stores.tasks.task(id).cloned() else {
            bail!("Task {} was deleted", short_id(id));
        };
        if let Some(remaining) = countdown.poll(&task, stores.tasks.now_ms()) {
            println!("{}  {}", remaining.formatted(), task.title);
        }
        if !countdown.needs_polling(&task) {
            countdown.cancel();
            println!("Timer is {}.", task.timer_phase().to_tag().to_lowercase().replace('_', " "));
            return Ok(());
        }

        std::thread::sleep(interval);
    }
}
