//! The task the loop is working on.

use serde::{Deserialize, Serialize};

/// Description of the task handed to the candidate source each iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskContext {
    pub description: String,
    /// Category used to partition the outcome ledger and learned weights.
    pub category: String,
    /// Free-text notes accumulated across iterations (last failure, hints).
    #[serde(default)]
    pub notes: Vec<String>,
}

impl TaskContext {
    pub fn new(description: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            category: category.into(),
            notes: Vec::new(),
        }
    }

    pub fn add_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }
}
