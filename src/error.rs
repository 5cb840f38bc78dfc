use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrazoError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Invalid template {id}: {reason}")]
    InvalidTemplate { id: i64, reason: String },

    #[error("Recurrence made no forward progress from {date}")]
    NonTerminatingRecurrence { date: NaiveDate },

    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Unknown client: {0}")]
    UnknownClient(String),

    #[error("Unknown occurrence: {0}")]
    UnknownOccurrence(i64),

    #[error("Cannot {action} an occurrence that is {status}")]
    InvalidTransition { action: &'static str, status: String },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PrazoError>;
