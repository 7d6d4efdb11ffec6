use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Returns the calendar day the clock is currently on under `boundary`.
    #[must_use]
    pub fn today(&self, boundary: DayBoundary) -> NaiveDate {
        boundary.day_of(self.now())
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    /// Returns true if this clock is fixed.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

//
// ─── DAY BOUNDARY ──────────────────────────────────────────────────────────────
//

/// Where one calendar day ends and the next begins.
///
/// Completion instants are reduced to calendar days by shifting them into
/// this offset and taking the date. `Utc` keys days on the UTC date; `Offset`
/// lets a caller pin their own local offset so that a completion at 23:30
/// local time lands on the local day rather than the next UTC day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayBoundary {
    #[default]
    Utc,
    Offset(FixedOffset),
}

impl DayBoundary {
    /// Builds a boundary from an offset in seconds east of UTC.
    ///
    /// Returns `None` when the offset is out of range (more than a day).
    #[must_use]
    pub fn east_seconds(seconds: i32) -> Option<Self> {
        FixedOffset::east_opt(seconds).map(Self::Offset)
    }

    /// The fixed offset used for this boundary (zero for `Utc`).
    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        match self {
            DayBoundary::Utc => Utc.fix(),
            DayBoundary::Offset(offset) => *offset,
        }
    }

    /// Calendar day containing `instant`.
    #[must_use]
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset()).date_naive()
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
