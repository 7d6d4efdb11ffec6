#![forbid(unsafe_code)]

pub mod model;
pub mod progress;
pub mod search;
pub mod time;

pub use progress::{HabitProgress, ProgressSettings};
pub use time::{Clock, DayBoundary};
