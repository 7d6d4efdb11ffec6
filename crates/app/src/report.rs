use std::fmt::Write as _;

use habit_core::model::{CARD_SUMMARY_CHARS, Category, Habit};
use services::HabitOverview;

const TITLE_WIDTH: usize = 28;

fn category_label(habit: &Habit) -> &'static str {
    habit.category().map_or("-", Category::as_str)
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// One row per habit: streak, trailing-window percentage and today's mark.
pub fn stats_table(rows: &[HabitOverview], window_days: u32) -> String {
    let mut out = String::new();
    let window_header = format!("{window_days}-DAY");
    let _ = writeln!(
        out,
        "{:<width$}  {:<8}  {:>8}  {:>7}  TODAY",
        "TITLE",
        "CATEGORY",
        "STREAK",
        window_header,
        width = TITLE_WIDTH
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<width$}  {:<8}  {:>8}  {:>6}%  {}",
            clip(row.habit.title(), TITLE_WIDTH),
            category_label(&row.habit),
            row.progress.streak_label(),
            row.progress.progress_percent,
            if row.progress.completed_today { "done" } else { "-" },
            width = TITLE_WIDTH
        );
    }
    if rows.is_empty() {
        out.push_str("(no habits)\n");
    }
    out
}

/// Card-style listing used when browsing public habits.
pub fn habit_cards(habits: &[&Habit]) -> String {
    let mut out = String::new();
    for habit in habits {
        let _ = writeln!(out, "{} [{}]", habit.title(), category_label(habit));
        let _ = writeln!(out, "  By: {}", habit.creator().display_name());
        let _ = writeln!(out, "  {}", habit.summary(CARD_SUMMARY_CHARS));
        let _ = writeln!(out, "  id: {}", habit.id());
    }
    if habits.is_empty() {
        out.push_str("No habits found. Try adjusting your search or filter terms.\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use habit_core::model::{Creator, HabitDraft, HabitId};
    use habit_core::progress::HabitProgress;
    use habit_core::time::fixed_now;

    fn habit(title: &str) -> Habit {
        HabitDraft::new(title, "a description", Category::Study)
            .validate()
            .unwrap()
            .assign(
                HabitId::new("x1").unwrap(),
                Creator::new(None, "x@example.com").unwrap(),
                fixed_now(),
            )
    }

    #[test]
    fn stats_row_shows_all_three_metrics() {
        let rows = [HabitOverview {
            habit: habit("Flashcards"),
            progress: HabitProgress {
                current_streak: 4,
                progress_percent: 13,
                completed_today: true,
            },
        }];
        let table = stats_table(&rows, 30);
        let mut lines = table.lines();
        assert!(lines.next().unwrap().contains("30-DAY"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("Flashcards"));
        assert!(row.contains("4 Days"));
        assert!(row.contains("13%"));
        assert!(row.ends_with("done"));
    }

    #[test]
    fn long_titles_are_clipped() {
        assert_eq!(clip("abcdef", 4), "abc…");
        assert_eq!(clip("abc", 4), "abc");
    }

    #[test]
    fn cards_fall_back_to_anonymous_and_empty_message() {
        let h = habit("Sketch");
        let cards = habit_cards(&[&h]);
        assert!(cards.contains("By: Anonymous"));
        assert!(habit_cards(&[]).starts_with("No habits found"));
    }

    #[test]
    fn unknown_category_shows_a_dash() {
        let h: Habit = serde_json::from_str(
            r#"{"_id": "u1", "title": "Hydrate", "category": "Health", "creatorEmail": "u@example.com"}"#,
        )
        .unwrap();
        assert!(habit_cards(&[&h]).starts_with("Hydrate [-]"));
    }
}
