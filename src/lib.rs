//! Planning core for family chores: tasks with countdown timers, the family
//! roster they are assigned to, and per-person progress boards.

pub mod clock;
pub mod command;
pub mod config;
pub mod domain;
pub mod notifications;
pub mod persistence;
pub mod store;
pub mod ticker;
pub mod timer;

pub use command::{reduce, CommandError, NewTask, TaskCommand};
pub use config::{Config, ConfigError, StoreConfig};
pub use store::{FamilyStore, LoadOutcome, PersistOutcome, StoreEvent, TaskStore};
