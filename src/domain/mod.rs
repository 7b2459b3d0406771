pub mod board;
pub mod enums;
pub mod family;
pub mod task;
pub mod views;

pub use board::{Board, GroupProgress};
pub use enums::{CelebrationPolicy, TimerPhase};
pub use family::{FamilyMember, FamilyMemberPatch, NewFamilyMember, DEFAULT_MEMBER_EMOJI};
pub use task::{Task, MS_PER_MINUTE};
pub use views::{format_elapsed, format_remaining, progress_bar, status_badge};
