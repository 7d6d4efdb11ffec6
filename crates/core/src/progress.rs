//! Streak and progress metrics derived from a habit's completion history.
//!
//! Everything here is pure: "today" is always supplied by the caller and the
//! calendar convention is fixed by a [`DayBoundary`]. Raw history entries are
//! first reduced to a set of calendar days ([`normalize`]); the metrics are
//! then read off that set.
//!
//! The current streak is **strict**: it counts backward from `today`, so a
//! habit that has not been completed yet today has a current streak of 0 even
//! if it was completed on every previous day.

use std::collections::BTreeSet;
use std::num::NonZeroU32;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::model::CompletionHistory;
use crate::time::DayBoundary;

/// Trailing window used for the completion percentage unless configured otherwise.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("invalid reference date (expected YYYY-MM-DD): {0}")]
    InvalidToday(String),

    #[error("progress window must cover at least one day")]
    InvalidWindow,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Calendar convention and window size used when computing [`HabitProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSettings {
    boundary: DayBoundary,
    window_days: NonZeroU32,
}

impl ProgressSettings {
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidWindow` if `window_days` is zero.
    pub fn new(boundary: DayBoundary, window_days: u32) -> Result<Self, ProgressError> {
        let window_days = NonZeroU32::new(window_days).ok_or(ProgressError::InvalidWindow)?;
        Ok(Self {
            boundary,
            window_days,
        })
    }

    #[must_use]
    pub fn boundary(&self) -> DayBoundary {
        self.boundary
    }

    #[must_use]
    pub fn window_days(&self) -> NonZeroU32 {
        self.window_days
    }
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            boundary: DayBoundary::Utc,
            window_days: NonZeroU32::new(DEFAULT_WINDOW_DAYS).unwrap_or(NonZeroU32::MIN),
        }
    }
}

//
// ─── PARSING ───────────────────────────────────────────────────────────────────
//

/// Parse a caller-supplied reference date.
///
/// # Errors
///
/// Returns `ProgressError::InvalidToday` unless `raw` is a real `YYYY-MM-DD` date.
pub fn parse_today(raw: &str) -> Result<NaiveDate, ProgressError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ProgressError::InvalidToday(raw.to_owned()))
}

/// Reduce one history entry to its calendar day.
///
/// Accepts RFC 3339 instants (shifted into `boundary`), offset-less date-times
/// (taken as already local to `boundary`) and bare `YYYY-MM-DD` dates.
/// Returns `None` for anything else.
#[must_use]
pub fn parse_completion(raw: &str, boundary: DayBoundary) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(boundary.day_of(instant.with_timezone(&Utc)));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(local) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(local.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

//
// ─── COMPLETION DAYS ───────────────────────────────────────────────────────────
//

/// Distinct calendar days on which a habit was completed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionDays {
    days: BTreeSet<NaiveDate>,
}

/// Normalize raw history entries into distinct calendar days.
///
/// Order and duplicates in the input are irrelevant. Entries that cannot be
/// parsed are skipped so one corrupt record does not blank out the rest.
pub fn normalize<I, S>(history: I, boundary: DayBoundary) -> CompletionDays
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut days = BTreeSet::new();
    for entry in history {
        let entry = entry.as_ref();
        match parse_completion(entry, boundary) {
            Some(day) => {
                days.insert(day);
            }
            None => debug!(entry, "skipping malformed completion timestamp"),
        }
    }
    CompletionDays { days }
}

impl CompletionDays {
    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.days.contains(&day)
    }

    /// Days in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.iter().copied()
    }

    /// True iff `today` has a completion.
    #[must_use]
    pub fn completed_today(&self, today: NaiveDate) -> bool {
        self.contains(today)
    }

    /// Consecutive completed days ending at `today`, stopping at the first gap.
    ///
    /// Returns 0 when `today` itself has no completion.
    #[must_use]
    pub fn current_streak(&self, today: NaiveDate) -> u32 {
        let mut streak = 0;
        let mut day = today;
        while self.contains(day) {
            streak += 1;
            match day.pred_opt() {
                Some(prev) => day = prev,
                None => break,
            }
        }
        streak
    }

    /// Percentage of days in `[today - (window - 1), today]` with a completion,
    /// rounded to the nearest integer (halves round up).
    #[must_use]
    pub fn progress_percent(&self, today: NaiveDate, window_days: NonZeroU32) -> u8 {
        let window = u64::from(window_days.get());
        let start = today
            .checked_sub_days(Days::new(window - 1))
            .unwrap_or(NaiveDate::MIN);
        let completed = self.days.range(start..=today).count() as u64;
        let percent = (completed * 200 + window) / (window * 2);
        u8::try_from(percent).unwrap_or(100)
    }
}

//
// ─── HABIT PROGRESS ────────────────────────────────────────────────────────────
//

/// The three metrics shown next to a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HabitProgress {
    pub current_streak: u32,
    pub progress_percent: u8,
    pub completed_today: bool,
}

impl HabitProgress {
    /// Compute all metrics for `history` as seen on `today`.
    #[must_use]
    pub fn compute(
        history: &CompletionHistory,
        today: NaiveDate,
        settings: &ProgressSettings,
    ) -> Self {
        let days = normalize(history.iter(), settings.boundary());
        Self::from_days(&days, today, settings.window_days())
    }

    #[must_use]
    pub fn from_days(days: &CompletionDays, today: NaiveDate, window_days: NonZeroU32) -> Self {
        Self {
            current_streak: days.current_streak(today),
            progress_percent: days.progress_percent(today, window_days),
            completed_today: days.completed_today(today),
        }
    }

    /// "1 Day" / "N Days", as shown in habit tables.
    #[must_use]
    pub fn streak_label(&self) -> String {
        if self.current_streak == 1 {
            "1 Day".to_owned()
        } else {
            format!("{} Days", self.current_streak)
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn window(days: u32) -> NonZeroU32 {
        NonZeroU32::new(days).unwrap()
    }

    fn days_ago(n: u64) -> String {
        format!("{}T12:00:00Z", today().checked_sub_days(Days::new(n)).unwrap())
    }

    fn days(entries: &[String]) -> CompletionDays {
        normalize(entries, DayBoundary::Utc)
    }

    #[test]
    fn empty_history_is_zero_state() {
        let empty = days(&[]);
        assert_eq!(empty.current_streak(today()), 0);
        assert_eq!(empty.progress_percent(today(), window(30)), 0);
        assert!(!empty.completed_today(today()));
        assert_eq!(
            HabitProgress::compute(&CompletionHistory::new(), today(), &ProgressSettings::default()),
            HabitProgress::default()
        );
    }

    #[test]
    fn three_consecutive_days_ending_today() {
        let d = days(&[days_ago(0), days_ago(1), days_ago(2)]);
        assert_eq!(d.current_streak(today()), 3);
        assert!(d.completed_today(today()));
    }

    #[test]
    fn not_completed_today_resets_current_streak() {
        let d = days(&[days_ago(1), days_ago(2)]);
        assert!(!d.completed_today(today()));
        assert_eq!(d.current_streak(today()), 0);
    }

    #[test]
    fn streak_stops_at_first_gap() {
        let d = days(&[days_ago(0), days_ago(1), days_ago(3), days_ago(4)]);
        assert_eq!(d.current_streak(today()), 2);
    }

    #[test]
    fn same_day_entries_count_once() {
        let d = days(&[
            "2024-03-15T08:00:00Z".to_owned(),
            "2024-03-15T20:00:00Z".to_owned(),
        ]);
        assert_eq!(d.len(), 1);
        assert!(d.completed_today(today()));
        assert_eq!(d.current_streak(today()), 1);
    }

    #[test]
    fn ten_days_in_window_is_thirty_three_percent() {
        let entries: Vec<String> = (0..20).step_by(2).map(days_ago).collect();
        let d = days(&entries);
        assert_eq!(d.len(), 10);
        assert_eq!(d.progress_percent(today(), window(30)), 33);
    }

    #[test]
    fn window_includes_oldest_day_and_excludes_the_one_before() {
        let oldest = days(&[days_ago(29)]);
        assert_eq!(oldest.progress_percent(today(), window(30)), 3);

        let outside = days(&[days_ago(30)]);
        assert_eq!(outside.progress_percent(today(), window(30)), 0);
    }

    #[test]
    fn future_completions_do_not_count() {
        let d = days(&["2024-03-16T09:00:00Z".to_owned()]);
        assert_eq!(d.progress_percent(today(), window(30)), 0);
        assert_eq!(d.current_streak(today()), 0);
    }

    #[test]
    fn full_window_is_one_hundred_percent() {
        let entries: Vec<String> = (0..7).map(days_ago).collect();
        assert_eq!(days(&entries).progress_percent(today(), window(7)), 100);
    }

    #[test]
    fn halves_round_up() {
        // 1 of 8 days = 12.5%
        let d = days(&[days_ago(0)]);
        assert_eq!(d.progress_percent(today(), window(8)), 13);
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let d = days(&[
            "not a date".to_owned(),
            "2024-13-40".to_owned(),
            String::new(),
            days_ago(0),
        ]);
        assert_eq!(d.len(), 1);
        assert_eq!(d.current_streak(today()), 1);
    }

    #[test]
    fn accepts_offset_less_and_date_only_entries() {
        let boundary = DayBoundary::Utc;
        assert_eq!(parse_completion("2024-03-15", boundary), Some(today()));
        assert_eq!(
            parse_completion("2024-03-15T23:59:59.123", boundary),
            Some(today())
        );
        assert_eq!(
            parse_completion("2024-03-15T01:00:00+05:00", boundary),
            NaiveDate::from_ymd_opt(2024, 3, 14)
        );
    }

    #[test]
    fn boundary_decides_which_day_a_late_completion_lands_on() {
        let entry = ["2024-03-15T02:30:00Z"];
        let utc = normalize(entry, DayBoundary::Utc);
        assert!(utc.completed_today(today()));

        let new_york = DayBoundary::Offset(FixedOffset::west_opt(4 * 3600).unwrap());
        let local = normalize(entry, new_york);
        assert!(!local.completed_today(today()));
        assert!(local.contains(NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()));
    }

    #[test]
    fn parse_today_fails_fast_on_impossible_dates() {
        assert_eq!(parse_today("2024-03-15").unwrap(), today());
        assert_eq!(
            parse_today("2024-02-30").unwrap_err(),
            ProgressError::InvalidToday("2024-02-30".into())
        );
        assert!(parse_today("yesterday").is_err());
    }

    #[test]
    fn settings_reject_empty_window() {
        assert_eq!(
            ProgressSettings::new(DayBoundary::Utc, 0).unwrap_err(),
            ProgressError::InvalidWindow
        );
        let settings = ProgressSettings::default();
        assert_eq!(settings.window_days().get(), DEFAULT_WINDOW_DAYS);
        assert_eq!(settings.boundary(), DayBoundary::Utc);
    }

    #[test]
    fn compute_bundles_all_three_metrics() {
        let history: CompletionHistory = [days_ago(0), days_ago(1), days_ago(1), days_ago(5)]
            .into_iter()
            .collect();
        let progress = HabitProgress::compute(&history, today(), &ProgressSettings::default());
        assert_eq!(
            progress,
            HabitProgress {
                current_streak: 2,
                progress_percent: 10,
                completed_today: true,
            }
        );
        assert_eq!(progress.streak_label(), "2 Days");
    }

    #[test]
    fn streak_label_is_singular_for_one_day() {
        let progress = HabitProgress {
            current_streak: 1,
            ..HabitProgress::default()
        };
        assert_eq!(progress.streak_label(), "1 Day");
    }
}
