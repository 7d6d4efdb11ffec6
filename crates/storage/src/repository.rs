use async_trait::async_trait;
use chrono::{DateTime, Utc};
use habit_core::model::{Creator, Habit, HabitId, ValidHabit};
use habit_core::progress::normalize;
use habit_core::time::DayBoundary;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("habit already completed on {0}")]
    AlreadyCompleted(chrono::NaiveDate),

    #[error("connection error: {0}")]
    Connection(String),
}

/// Insert payload for a habit that has no id yet.
#[derive(Debug, Clone)]
pub struct NewHabitRecord {
    pub fields: ValidHabit,
    pub creator: Creator,
    pub created_at: DateTime<Utc>,
}

/// Repository contract for habits and their completion logs.
#[async_trait]
pub trait HabitRepository: Send + Sync {
    /// Assign an id to a new habit and persist it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the habit cannot be stored.
    async fn insert_new_habit(&self, record: NewHabitRecord) -> Result<Habit, StorageError>;

    /// Fetch a habit by ID. Returns `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_habit(&self, id: &HabitId) -> Result<Option<Habit>, StorageError>;

    /// Replace the editable fields of a stored habit. Id, owner, creation time
    /// and completion history are left untouched, atomically with respect to
    /// `record_completion`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no habit has this id.
    async fn update_fields(&self, id: &HabitId, fields: ValidHabit) -> Result<Habit, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no habit has this id.
    async fn delete_habit(&self, id: &HabitId) -> Result<(), StorageError>;

    /// Habits owned by `email`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn list_by_creator(&self, email: &str) -> Result<Vec<Habit>, StorageError>;

    /// Public habits, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn list_public(&self) -> Result<Vec<Habit>, StorageError>;

    /// Newest public habits first, at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn list_featured(&self, limit: usize) -> Result<Vec<Habit>, StorageError>;

    /// Append a completion at `at`, unless the habit already has one on the
    /// same calendar day under `boundary`. The check and the append are atomic
    /// per habit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyCompleted` for a same-day duplicate and
    /// `StorageError::NotFound` for an unknown id.
    async fn record_completion(
        &self,
        id: &HabitId,
        at: DateTime<Utc>,
        boundary: DayBoundary,
    ) -> Result<Habit, StorageError>;
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    habits: BTreeMap<HabitId, Habit>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StorageError> {
        self.inner
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl HabitRepository for InMemoryRepository {
    async fn insert_new_habit(&self, record: NewHabitRecord) -> Result<Habit, StorageError> {
        let mut guard = self.lock()?;
        guard.next_id += 1;
        // Zero-padded so map order matches insertion order.
        let id = HabitId::new(format!("habit-{:08}", guard.next_id))
            .map_err(|_| StorageError::Conflict)?;
        if guard.habits.contains_key(&id) {
            return Err(StorageError::Conflict);
        }
        let habit = record
            .fields
            .assign(id.clone(), record.creator, record.created_at);
        guard.habits.insert(id, habit.clone());
        Ok(habit)
    }

    async fn get_habit(&self, id: &HabitId) -> Result<Option<Habit>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.habits.get(id).cloned())
    }

    async fn update_fields(&self, id: &HabitId, fields: ValidHabit) -> Result<Habit, StorageError> {
        let mut guard = self.lock()?;
        let habit = guard.habits.get_mut(id).ok_or(StorageError::NotFound)?;
        habit.apply_update(fields);
        Ok(habit.clone())
    }

    async fn delete_habit(&self, id: &HabitId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard
            .habits
            .remove(id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn list_by_creator(&self, email: &str) -> Result<Vec<Habit>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .habits
            .values()
            .filter(|h| h.is_owned_by(email))
            .cloned()
            .collect())
    }

    async fn list_public(&self) -> Result<Vec<Habit>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .habits
            .values()
            .filter(|h| h.is_public())
            .cloned()
            .collect())
    }

    async fn list_featured(&self, limit: usize) -> Result<Vec<Habit>, StorageError> {
        let mut public = self.list_public().await?;
        public.sort_by_key(|h| Reverse(h.created_at()));
        public.truncate(limit);
        Ok(public)
    }

    async fn record_completion(
        &self,
        id: &HabitId,
        at: DateTime<Utc>,
        boundary: DayBoundary,
    ) -> Result<Habit, StorageError> {
        let mut guard = self.lock()?;
        let habit = guard.habits.get_mut(id).ok_or(StorageError::NotFound)?;
        let day = boundary.day_of(at);
        if normalize(habit.completion_history().iter(), boundary).contains(day) {
            debug!(habit = %id, %day, "refusing duplicate completion");
            return Err(StorageError::AlreadyCompleted(day));
        }
        habit.record_completion(at);
        Ok(habit.clone())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub habits: Arc<dyn HabitRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let habits: Arc<dyn HabitRepository> = Arc::new(InMemoryRepository::new());
        Self { habits }
    }
}
