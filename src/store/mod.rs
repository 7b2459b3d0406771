pub mod family_store;
pub mod task_store;

pub use family_store::FamilyStore;
pub use task_store::TaskStore;

/// Result of writing a list back to storage.
///
/// The in-memory list is committed either way; a failure only means the
/// next successful write has to catch storage up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Saved,
    /// Nothing changed, so nothing was written
    Unchanged,
    Failed(String),
}

impl PersistOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Result of hydrating a store from storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// This many records were read
    Loaded(usize),
    /// Nothing stored yet
    Empty,
    Failed(String),
}

/// One-shot signals for the presentation layer, drained by the consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A running timer went past its estimate
    Overdue { task_id: String, title: String },
    /// Every task of one responsible person is completed
    GroupCompleted { responsible: String },
    /// Every group on the board is completed
    BoardCompleted,
}

/// Transient notification text; hiding it is up to the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Toast {
    pub visible: bool,
    pub message: String,
}
