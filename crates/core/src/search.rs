use std::str::FromStr;

use crate::model::{Category, CategoryError, Habit};

/// Category selector for browsing; `All` disables the category check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl FromStr for CategoryFilter {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse().map(Self::Only)
    }
}

/// Keyword + category filter applied to public habit listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitFilter {
    keyword: String,
    category: CategoryFilter,
}

impl HabitFilter {
    #[must_use]
    pub fn new(keyword: impl AsRef<str>, category: CategoryFilter) -> Self {
        Self {
            keyword: keyword.as_ref().trim().to_lowercase(),
            category,
        }
    }

    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    #[must_use]
    pub fn category(&self) -> CategoryFilter {
        self.category
    }

    /// A habit matches when its category passes and the keyword (if any)
    /// occurs in its title or description, ignoring case.
    #[must_use]
    pub fn matches(&self, habit: &Habit) -> bool {
        let category_ok = match self.category {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => habit.category() == Some(c),
        };
        if !category_ok {
            return false;
        }
        self.keyword.is_empty()
            || habit.title().to_lowercase().contains(&self.keyword)
            || habit.description().to_lowercase().contains(&self.keyword)
    }
}

/// Habits matching `filter`, in their original order.
#[must_use]
pub fn filter_habits<'a>(habits: &'a [Habit], filter: &HabitFilter) -> Vec<&'a Habit> {
    habits.iter().filter(|h| filter.matches(h)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Creator, HabitDraft, HabitId};
    use crate::time::fixed_now;

    fn habit(id: &str, title: &str, description: &str, category: Category) -> Habit {
        HabitDraft::new(title, description, category)
            .validate()
            .unwrap()
            .assign(
                HabitId::new(id).unwrap(),
                Creator::new(None, "owner@example.com").unwrap(),
                fixed_now(),
            )
    }

    fn sample() -> Vec<Habit> {
        vec![
            habit("1", "Morning Run", "5k around the park", Category::Fitness),
            habit("2", "Journal", "Write before bed", Category::Evening),
            habit("3", "Deep work", "Two hours, no phone", Category::Work),
            habit("4", "Stretch", "Yoga flow after running", Category::Morning),
        ]
    }

    fn ids(found: &[&Habit]) -> Vec<String> {
        found.iter().map(|h| h.id().to_string()).collect()
    }

    #[test]
    fn empty_filter_keeps_everything_in_order() {
        let habits = sample();
        let found = filter_habits(&habits, &HabitFilter::default());
        assert_eq!(ids(&found), ["1", "2", "3", "4"]);
    }

    #[test]
    fn keyword_matches_title_or_description_case_insensitively() {
        let habits = sample();
        let found = filter_habits(&habits, &HabitFilter::new("  RUN ", CategoryFilter::All));
        assert_eq!(ids(&found), ["1", "4"]);
    }

    #[test]
    fn category_and_keyword_must_both_match() {
        let habits = sample();
        let filter = HabitFilter::new("run", CategoryFilter::Only(Category::Fitness));
        assert_eq!(ids(&filter_habits(&habits, &filter)), ["1"]);

        let filter = HabitFilter::new("", CategoryFilter::Only(Category::Study));
        assert!(filter_habits(&habits, &filter).is_empty());
    }

    #[test]
    fn uncategorized_habits_only_show_under_all() {
        let mut habits = sample();
        habits.push(
            serde_json::from_str(
                r#"{"_id": "5", "title": "Run club", "category": "Social", "creatorEmail": "o@example.com"}"#,
            )
            .unwrap(),
        );
        let found = filter_habits(&habits, &HabitFilter::new("run", CategoryFilter::All));
        assert_eq!(ids(&found), ["1", "4", "5"]);

        let filter = HabitFilter::new("run", CategoryFilter::Only(Category::Fitness));
        assert_eq!(ids(&filter_habits(&habits, &filter)), ["1"]);
    }

    #[test]
    fn category_filter_parses_all_and_names() {
        assert_eq!("All".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "evening".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(Category::Evening)
        );
        assert!("weekend".parse::<CategoryFilter>().is_err());
    }
}
