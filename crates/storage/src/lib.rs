#![forbid(unsafe_code)]

pub mod repository;

pub use repository::{HabitRepository, InMemoryRepository, NewHabitRecord, Storage, StorageError};
