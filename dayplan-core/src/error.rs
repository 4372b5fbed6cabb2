//! Error types for dayplan-core.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlanError {
    #[error("daily capacity must be a positive number of hours, got {0}")]
    InvalidCapacity(f64),

    #[error("hours must be a positive number, got {0}")]
    InvalidHours(f64),

    #[error("invalid deadline '{input}': {reason}")]
    InvalidDeadline { input: String, reason: String },

    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("task {0} is already tracking")]
    AlreadyTracking(String),

    #[error("task {0} is not tracking")]
    NotTracking(String),

    #[error("task {0} is completed; reopen it before tracking time")]
    TaskCompleted(String),
}

pub type Result<T> = std::result::Result<T, PlanError>;
