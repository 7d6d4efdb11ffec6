use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Raw completion log for a habit, exactly as the backend stores it.
///
/// Entries are ISO-8601 strings in whatever order and multiplicity they were
/// written. Nothing here deduplicates or validates them; reducing the log to
/// calendar days is the job of [`crate::progress::normalize`].
///
/// Decoding is lenient: `null` reads as an empty log and non-string elements
/// are dropped, so one bad document never fails a whole listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CompletionHistory(Vec<String>);

impl CompletionHistory {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a completion at `at`, formatted as RFC 3339 with millisecond precision.
    pub fn record(&mut self, at: DateTime<Utc>) {
        self.0.push(at.to_rfc3339_opts(SecondsFormat::Millis, true));
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for CompletionHistory {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Text(String),
    Other(IgnoredAny),
}

impl<'de> Deserialize<'de> for CompletionHistory {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = Option::<Vec<RawEntry>>::deserialize(d)?.unwrap_or_default();
        let total = raw.len();
        let entries: Vec<String> = raw
            .into_iter()
            .filter_map(|entry| match entry {
                RawEntry::Text(text) => Some(text),
                RawEntry::Other(_) => None,
            })
            .collect();
        if entries.len() < total {
            debug!(dropped = total - entries.len(), "skipping non-string completion entries");
        }
        Ok(Self(entries))
    }
}
