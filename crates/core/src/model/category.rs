use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown habit category: {0}")]
pub struct CategoryError(pub String);

/// Time-of-day or life-area bucket a habit is filed under.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    #[default]
    Morning,
    Work,
    Fitness,
    Evening,
    Study,
}

impl Category {
    /// Every category, in the order forms offer them.
    pub const ALL: [Category; 5] = [
        Category::Morning,
        Category::Work,
        Category::Fitness,
        Category::Evening,
        Category::Study,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Morning => "Morning",
            Category::Work => "Work",
            Category::Fitness => "Fitness",
            Category::Evening => "Evening",
            Category::Study => "Study",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| CategoryError(s.to_owned()))
    }
}

impl TryFrom<String> for Category {
    type Error = CategoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_owned()
    }
}
