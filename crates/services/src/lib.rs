#![forbid(unsafe_code)]

pub mod api;
pub mod error;
pub mod habit_service;

pub use habit_core::Clock;

pub use api::{ApiConfig, HabitApiClient};
pub use error::{ApiError, HabitServiceError};
pub use habit_service::{HabitOverview, HabitService, Viewer};
