//! Error types for agenda.

use chrono::NaiveDate;
use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur in agenda operations.
#[derive(Error, Debug)]
pub enum AgendaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid rule: {0}")]
    Validation(#[from] ValidationError),

    #[error("{store} store unavailable: {reason}")]
    StoreUnavailable { store: &'static str, reason: String },

    #[error("Recurring occurrence '{title}' already exists on {date}")]
    DuplicateOccurrence { title: String, date: NaiveDate },

    #[error("Materialization for {0} is already running")]
    MaterializationInProgress(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AgendaError {
    pub fn store(store: &'static str, reason: impl Into<String>) -> Self {
        AgendaError::StoreUnavailable {
            store,
            reason: reason.into(),
        }
    }
}

/// Result type alias for agenda operations.
pub type AgendaResult<T> = Result<T, AgendaError>;
