use std::sync::Arc;

use chrono::NaiveDate;
use habit_core::model::{Creator, Habit, HabitDraft, HabitError, HabitId};
use habit_core::progress::{HabitProgress, ProgressSettings};
use habit_core::search::HabitFilter;
use storage::repository::{HabitRepository, NewHabitRecord, StorageError};
use tracing::{info, warn};

use crate::Clock;
use crate::error::HabitServiceError;

/// The signed-in user on whose behalf a call is made.
///
/// Passed explicitly to every call that depends on identity; the service
/// keeps no session state of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    identity: Creator,
}

impl Viewer {
    /// # Errors
    ///
    /// Returns `HabitError::InvalidCreatorEmail` if `email` is not usable.
    pub fn new(name: Option<String>, email: impl Into<String>) -> Result<Self, HabitError> {
        Ok(Self {
            identity: Creator::new(name, email)?,
        })
    }

    #[must_use]
    pub fn email(&self) -> &str {
        self.identity.email()
    }

    #[must_use]
    pub fn owns(&self, habit: &Habit) -> bool {
        habit.is_owned_by(self.identity.email())
    }
}

/// A habit together with its metrics as of a given day.
#[derive(Debug, Clone, PartialEq)]
pub struct HabitOverview {
    pub habit: Habit,
    pub progress: HabitProgress,
}

impl HabitOverview {
    #[must_use]
    pub fn build(habit: Habit, today: NaiveDate, settings: &ProgressSettings) -> Self {
        let progress = HabitProgress::compute(habit.completion_history(), today, settings);
        Self { habit, progress }
    }
}

/// Orchestrates habit ownership rules, completions and progress views.
#[derive(Clone)]
pub struct HabitService {
    clock: Clock,
    settings: ProgressSettings,
    habits: Arc<dyn HabitRepository>,
}

impl HabitService {
    #[must_use]
    pub fn new(clock: Clock, habits: Arc<dyn HabitRepository>) -> Self {
        Self {
            clock,
            settings: ProgressSettings::default(),
            habits,
        }
    }

    /// Override the day boundary and progress window.
    #[must_use]
    pub fn with_settings(mut self, settings: ProgressSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &ProgressSettings {
        &self.settings
    }

    /// The calendar day "today" resolves to under the configured boundary.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today(self.settings.boundary())
    }

    fn overview(&self, habit: Habit) -> HabitOverview {
        HabitOverview::build(habit, self.today(), &self.settings)
    }

    async fn owned(&self, viewer: &Viewer, id: &HabitId) -> Result<Habit, HabitServiceError> {
        let habit = self
            .habits
            .get_habit(id)
            .await?
            .ok_or_else(|| HabitServiceError::NotFound(id.clone()))?;
        if !viewer.owns(&habit) {
            warn!(habit = %id, viewer = viewer.email(), "refusing access to another user's habit");
            return Err(HabitServiceError::Forbidden(id.clone()));
        }
        Ok(habit)
    }

    /// Validate a draft and store it as a new habit owned by `viewer`.
    ///
    /// # Errors
    ///
    /// Returns `HabitServiceError::Habit` for validation failures.
    /// Returns `HabitServiceError::Storage` if persistence fails.
    pub async fn create_habit(
        &self,
        viewer: &Viewer,
        draft: HabitDraft,
    ) -> Result<Habit, HabitServiceError> {
        let fields = draft.validate()?;
        let habit = self
            .habits
            .insert_new_habit(NewHabitRecord {
                fields,
                creator: viewer.identity.clone(),
                created_at: self.clock.now(),
            })
            .await?;
        info!(habit = %habit.id(), "habit created");
        Ok(habit)
    }

    /// Replace the editable fields of a habit the viewer owns.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`Forbidden` for missing or foreign habits,
    /// `Habit` for validation failures and `Storage` if persistence fails.
    pub async fn update_habit(
        &self,
        viewer: &Viewer,
        id: &HabitId,
        draft: HabitDraft,
    ) -> Result<Habit, HabitServiceError> {
        let fields = draft.validate()?;
        self.owned(viewer, id).await?;
        let habit = self
            .habits
            .update_fields(id, fields)
            .await
            .map_err(|err| match err {
                StorageError::NotFound => HabitServiceError::NotFound(id.clone()),
                other => HabitServiceError::Storage(other),
            })?;
        info!(habit = %id, "habit updated");
        Ok(habit)
    }

    /// # Errors
    ///
    /// Returns `NotFound`/`Forbidden` for missing or foreign habits and
    /// `Storage` if the delete fails.
    pub async fn delete_habit(&self, viewer: &Viewer, id: &HabitId) -> Result<(), HabitServiceError> {
        self.owned(viewer, id).await?;
        self.habits.delete_habit(id).await?;
        info!(habit = %id, "habit deleted");
        Ok(())
    }

    /// Fetch a habit with its metrics. Public habits are visible to anyone;
    /// private ones only to their owner.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if missing, `Forbidden` if private and foreign.
    pub async fn get_habit(
        &self,
        viewer: Option<&Viewer>,
        id: &HabitId,
    ) -> Result<HabitOverview, HabitServiceError> {
        let habit = self
            .habits
            .get_habit(id)
            .await?
            .ok_or_else(|| HabitServiceError::NotFound(id.clone()))?;
        let visible = habit.is_public() || viewer.is_some_and(|v| v.owns(&habit));
        if !visible {
            return Err(HabitServiceError::Forbidden(id.clone()));
        }
        Ok(self.overview(habit))
    }

    /// The viewer's habits with streak and progress.
    ///
    /// # Errors
    ///
    /// Returns `HabitServiceError::Storage` if repository access fails.
    pub async fn my_habits(&self, viewer: &Viewer) -> Result<Vec<HabitOverview>, HabitServiceError> {
        let habits = self.habits.list_by_creator(viewer.email()).await?;
        Ok(habits.into_iter().map(|h| self.overview(h)).collect())
    }

    /// Public habits matching `filter`, in listing order.
    ///
    /// # Errors
    ///
    /// Returns `HabitServiceError::Storage` if repository access fails.
    pub async fn browse_public(&self, filter: &HabitFilter) -> Result<Vec<Habit>, HabitServiceError> {
        let habits = self.habits.list_public().await?;
        Ok(habits.into_iter().filter(|h| filter.matches(h)).collect())
    }

    /// Newest public habits, at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns `HabitServiceError::Storage` if repository access fails.
    pub async fn featured(&self, limit: usize) -> Result<Vec<Habit>, HabitServiceError> {
        Ok(self.habits.list_featured(limit).await?)
    }

    /// Record today's completion for a habit the viewer owns.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyCompletedToday` when today is already marked,
    /// `NotFound`/`Forbidden` for missing or foreign habits and `Storage`
    /// if persistence fails.
    pub async fn mark_complete(
        &self,
        viewer: &Viewer,
        id: &HabitId,
    ) -> Result<HabitOverview, HabitServiceError> {
        self.owned(viewer, id).await?;
        let now = self.clock.now();
        let habit = self
            .habits
            .record_completion(id, now, self.settings.boundary())
            .await
            .map_err(|err| match err {
                StorageError::AlreadyCompleted(_) => {
                    HabitServiceError::AlreadyCompletedToday(id.clone())
                }
                StorageError::NotFound => HabitServiceError::NotFound(id.clone()),
                other => HabitServiceError::Storage(other),
            })?;
        let overview = self.overview(habit);
        info!(
            habit = %id,
            streak = overview.progress.current_streak,
            "habit marked complete"
        );
        Ok(overview)
    }
}
