//! Core data types for notes and scratchpad errors.

use serde::{Deserialize, Serialize};

/// A note stored in the scratchpad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// RFC 3339 UTC timestamp.
    pub created_at: String,
}

impl Note {
    /// Whether the note carries any of the given tags.
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|t| self.tags.contains(t))
    }
}

/// Errors that can occur in the scratchpad library.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScratchpadError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Result is not a finite number")]
    NonFinite,

    #[error("Counter overflow: {current} + {amount}")]
    Overflow { current: i64, amount: i64 },

    #[error("Note not found: {0}")]
    NoteNotFound(u64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience result type.
pub type ScratchpadResult<T> = Result<T, ScratchpadError>;
