//! Shared error types for the services crate.

use thiserror::Error;

use habit_core::model::{HabitError, HabitId};
use storage::repository::StorageError;

/// Errors emitted by `HabitService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HabitServiceError {
    #[error("habit {0} not found")]
    NotFound(HabitId),
    #[error("habit {0} belongs to another user")]
    Forbidden(HabitId),
    #[error("habit {0} is already marked complete today")]
    AlreadyCompletedToday(HabitId),
    #[error(transparent)]
    Habit(#[from] HabitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `HabitApiClient`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("not authorized (status {0}); sign in again")]
    Unauthorized(reqwest::StatusCode),
    #[error("habit API request failed with status {status}{}", detail(.message))]
    HttpStatus {
        status: reqwest::StatusCode,
        message: Option<String>,
    },
    #[error("habit API did not confirm the {0}")]
    NotAcknowledged(&'static str),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

fn detail(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}
