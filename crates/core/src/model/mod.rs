mod category;
mod habit;
mod history;
mod ids;

pub use ids::{HabitId, ParseIdError};

pub use category::{Category, CategoryError};
pub use habit::{
    CARD_SUMMARY_CHARS, Creator, Habit, HabitDraft, HabitError, PLACEHOLDER_IMAGE_URL, ValidHabit,
};
pub use history::CompletionHistory;
