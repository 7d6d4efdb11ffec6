use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::category::Category;
use crate::model::history::CompletionHistory;
use crate::model::ids::HabitId;

/// Image shown for habits that were saved without one.
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://i.ibb.co.com/Tqq5j7p3/no-picture-available-icon.png";

/// Description length shown on habit cards before truncation.
pub const CARD_SUMMARY_CHARS: usize = 100;

const ANONYMOUS: &str = "Anonymous";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HabitError {
    #[error("habit title cannot be empty")]
    EmptyTitle,

    #[error("habit description cannot be empty")]
    EmptyDescription,

    #[error("invalid image URL: {0}")]
    InvalidImageUrl(String),

    #[error("invalid reminder time (expected HH:MM): {0}")]
    InvalidReminderTime(String),

    #[error("creator email is missing or malformed")]
    InvalidCreatorEmail,
}

//
// ─── CREATOR ───────────────────────────────────────────────────────────────────
//

/// Identity of the user who owns a habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    #[serde(rename = "creatorName", default, with = "blank_as_none")]
    name: Option<String>,
    #[serde(rename = "creatorEmail")]
    email: String,
}

impl Creator {
    /// # Errors
    ///
    /// Returns `HabitError::InvalidCreatorEmail` if the email is blank or has no `@`.
    pub fn new(name: Option<String>, email: impl Into<String>) -> Result<Self, HabitError> {
        let email = email.into().trim().to_owned();
        if email.is_empty() || !email.contains('@') {
            return Err(HabitError::InvalidCreatorEmail);
        }
        let name = name.map(|n| n.trim().to_owned()).filter(|n| !n.is_empty());
        Ok(Self { name, email })
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Name to show on cards; falls back to "Anonymous".
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(ANONYMOUS)
    }

    /// Emails are compared case-insensitively.
    #[must_use]
    pub fn is(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// User-entered habit fields, prior to validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitDraft {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub reminder_time: Option<String>,
    pub image_url: Option<String>,
    pub is_public: bool,
}

impl HabitDraft {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            category,
            ..Self::default()
        }
    }

    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `HabitError` when title or description is blank, the image URL
    /// does not parse, or the reminder time is not `HH:MM`.
    pub fn validate(self) -> Result<ValidHabit, HabitError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(HabitError::EmptyTitle);
        }
        let description = self.description.trim().to_owned();
        if description.is_empty() {
            return Err(HabitError::EmptyDescription);
        }

        let image_url = match normalize_optional(self.image_url) {
            Some(raw) => Some(Url::parse(&raw).map_err(|_| HabitError::InvalidImageUrl(raw))?),
            None => None,
        };

        let reminder_time = match normalize_optional(self.reminder_time) {
            Some(raw) => Some(parse_reminder(&raw).ok_or(HabitError::InvalidReminderTime(raw))?),
            None => None,
        };

        Ok(ValidHabit {
            title,
            description,
            category: self.category,
            reminder_time,
            image_url,
            is_public: self.is_public,
        })
    }
}

/// Validated habit fields that are not yet bound to an id or owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidHabit {
    title: String,
    description: String,
    category: Category,
    reminder_time: Option<NaiveTime>,
    image_url: Option<Url>,
    is_public: bool,
}

impl ValidHabit {
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn reminder_time(&self) -> Option<NaiveTime> {
        self.reminder_time
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&Url> {
        self.image_url.as_ref()
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        self.is_public
    }

    /// Bind the fields to a freshly assigned id and owner.
    #[must_use]
    pub fn assign(self, id: HabitId, creator: Creator, created_at: DateTime<Utc>) -> Habit {
        Habit {
            id,
            title: self.title,
            description: self.description,
            category: Some(self.category),
            reminder_time: self.reminder_time,
            image_url: self.image_url,
            creator,
            is_public: self.is_public,
            completion_history: CompletionHistory::new(),
            created_at: Some(created_at),
        }
    }
}

//
// ─── HABIT ─────────────────────────────────────────────────────────────────────
//

/// A tracked habit, in the shape the backend stores and returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    #[serde(rename = "_id")]
    id: HabitId,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default, with = "category_format")]
    category: Option<Category>,
    #[serde(default, with = "reminder_format")]
    reminder_time: Option<NaiveTime>,
    #[serde(default, with = "image_url_format")]
    image_url: Option<Url>,
    #[serde(flatten)]
    creator: Creator,
    #[serde(default)]
    is_public: bool,
    #[serde(default)]
    completion_history: CompletionHistory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

impl Habit {
    // Accessors
    #[must_use]
    pub fn id(&self) -> &HabitId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// `None` when the stored category is missing or not one we know.
    #[must_use]
    pub fn category(&self) -> Option<Category> {
        self.category
    }

    #[must_use]
    pub fn reminder_time(&self) -> Option<NaiveTime> {
        self.reminder_time
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&Url> {
        self.image_url.as_ref()
    }

    #[must_use]
    pub fn image_url_or_placeholder(&self) -> &str {
        self.image_url
            .as_ref()
            .map_or(PLACEHOLDER_IMAGE_URL, Url::as_str)
    }

    #[must_use]
    pub fn creator(&self) -> &Creator {
        &self.creator
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        self.is_public
    }

    #[must_use]
    pub fn completion_history(&self) -> &CompletionHistory {
        &self.completion_history
    }

    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// True if `email` owns this habit.
    #[must_use]
    pub fn is_owned_by(&self, email: &str) -> bool {
        self.creator.is(email)
    }

    /// Description cut to at most `max_chars` characters, with `...` appended
    /// when anything was cut.
    #[must_use]
    pub fn summary(&self, max_chars: usize) -> String {
        match self.description.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}...", &self.description[..cut]),
            None => self.description.clone(),
        }
    }

    /// Replace the editable fields, keeping id, owner, history and creation time.
    pub fn apply_update(&mut self, fields: ValidHabit) {
        self.title = fields.title;
        self.description = fields.description;
        self.category = Some(fields.category);
        self.reminder_time = fields.reminder_time;
        self.image_url = fields.image_url;
        self.is_public = fields.is_public;
    }

    /// Append a completion instant to the history.
    pub fn record_completion(&mut self, at: DateTime<Utc>) {
        self.completion_history.record(at);
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn parse_reminder(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

// The backend stores "" for unset optional strings; these adapters map that to `None`.

mod blank_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_deref().unwrap_or_default())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(super::normalize_optional(raw))
    }
}

mod reminder_format {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => s.serialize_str(&t.format("%H:%M").to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw = super::normalize_optional(Option::<String>::deserialize(d)?);
        // An unreadable reminder is dropped rather than failing the whole habit.
        Ok(raw.and_then(|r| super::parse_reminder(&r)))
    }
}

mod category_format {
    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::debug;

    use crate::model::category::Category;

    pub fn serialize<S: Serializer>(value: &Option<Category>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.map_or("", Category::as_str))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Category>, D::Error> {
        let Some(raw) = super::normalize_optional(Option::<String>::deserialize(d)?) else {
            return Ok(None);
        };
        match raw.parse() {
            Ok(category) => Ok(Some(category)),
            Err(_) => {
                debug!(category = %raw, "unknown habit category");
                Ok(None)
            }
        }
    }
}

mod image_url_format {
    use serde::{Deserialize, Deserializer, Serializer};
    use url::Url;

    pub fn serialize<S: Serializer>(value: &Option<Url>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_ref().map_or("", Url::as_str))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Url>, D::Error> {
        let raw = super::normalize_optional(Option::<String>::deserialize(d)?);
        Ok(raw.and_then(|r| Url::parse(&r).ok()))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
