use std::sync::Arc;

use chrono::Duration;
use habit_core::model::{Category, HabitDraft};
use habit_core::progress::ProgressSettings;
use habit_core::search::{CategoryFilter, HabitFilter};
use habit_core::time::{DayBoundary, fixed_now};
use services::{Clock, HabitService, HabitServiceError, Viewer};
use storage::repository::Storage;

fn service_at(storage: &Storage, days_later: i64) -> HabitService {
    let clock = Clock::fixed(fixed_now() + Duration::days(days_later));
    HabitService::new(clock, Arc::clone(&storage.habits))
}

#[tokio::test]
async fn streak_builds_over_days_and_resets_after_a_missed_day() {
    let storage = Storage::in_memory();
    let owner = Viewer::new(Some("Ada".into()), "ada@example.com").unwrap();

    let habit = service_at(&storage, 0)
        .create_habit(&owner, HabitDraft::new("Read", "20 pages", Category::Evening))
        .await
        .expect("create habit");

    for day in 0..3 {
        let overview = service_at(&storage, day)
            .mark_complete(&owner, habit.id())
            .await
            .expect("mark complete");
        assert_eq!(overview.progress.current_streak, u32::try_from(day + 1).unwrap());
    }

    // Day 3: not yet completed, strict streak is zero.
    let day3 = service_at(&storage, 3);
    let mine = day3.my_habits(&owner).await.expect("list");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].progress.current_streak, 0);
    assert!(!mine[0].progress.completed_today);
    assert_eq!(mine[0].progress.progress_percent, 10);

    // Skip day 4, complete on day 5: a fresh run of one.
    let after_gap = service_at(&storage, 5)
        .mark_complete(&owner, habit.id())
        .await
        .expect("mark complete");
    assert_eq!(after_gap.progress.current_streak, 1);
    assert_eq!(after_gap.progress.progress_percent, 13);
}

#[tokio::test]
async fn only_the_owner_can_change_a_habit() {
    let storage = Storage::in_memory();
    let service = service_at(&storage, 0);
    let owner = Viewer::new(None, "owner@example.com").unwrap();
    let intruder = Viewer::new(None, "intruder@example.com").unwrap();

    let mut draft = HabitDraft::new("Run", "3k", Category::Fitness);
    draft.is_public = true;
    let habit = service.create_habit(&owner, draft.clone()).await.unwrap();

    assert!(matches!(
        service.mark_complete(&intruder, habit.id()).await,
        Err(HabitServiceError::Forbidden(_))
    ));
    assert!(matches!(
        service.update_habit(&intruder, habit.id(), draft).await,
        Err(HabitServiceError::Forbidden(_))
    ));
    assert!(matches!(
        service.delete_habit(&intruder, habit.id()).await,
        Err(HabitServiceError::Forbidden(_))
    ));

    // Public, so readable by anyone.
    assert!(service.get_habit(Some(&intruder), habit.id()).await.is_ok());

    service.delete_habit(&owner, habit.id()).await.unwrap();
    assert!(matches!(
        service.get_habit(Some(&owner), habit.id()).await,
        Err(HabitServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn browse_filters_public_habits_only() {
    let storage = Storage::in_memory();
    let service = service_at(&storage, 0);
    let owner = Viewer::new(None, "owner@example.com").unwrap();

    for (title, category, is_public) in [
        ("Morning pages", Category::Morning, true),
        ("Evening pages", Category::Evening, true),
        ("Secret pages", Category::Morning, false),
    ] {
        let mut draft = HabitDraft::new(title, "write", category);
        draft.is_public = is_public;
        service.create_habit(&owner, draft).await.unwrap();
    }

    let all = service
        .browse_public(&HabitFilter::new("PAGES", CategoryFilter::All))
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let morning = service
        .browse_public(&HabitFilter::new("", CategoryFilter::Only(Category::Morning)))
        .await
        .unwrap();
    assert_eq!(morning.len(), 1);
    assert_eq!(morning[0].title(), "Morning pages");

    assert_eq!(service.featured(6).await.unwrap().len(), 2);
}

#[tokio::test]
async fn local_day_boundary_decides_duplicate_days() {
    let storage = Storage::in_memory();
    let owner = Viewer::new(None, "owner@example.com").unwrap();
    // fixed_now() is 22:13 UTC; two hours later is a new UTC day but the
    // same day at UTC-05:00.
    let offset = DayBoundary::east_seconds(-5 * 3600).unwrap();
    let settings = ProgressSettings::new(offset, 30).unwrap();

    let first = HabitService::new(Clock::fixed(fixed_now()), Arc::clone(&storage.habits))
        .with_settings(settings);
    let habit = first
        .create_habit(&owner, HabitDraft::new("Walk", "dog", Category::Evening))
        .await
        .unwrap();
    first.mark_complete(&owner, habit.id()).await.unwrap();

    let later = HabitService::new(
        Clock::fixed(fixed_now() + Duration::hours(2)),
        Arc::clone(&storage.habits),
    )
    .with_settings(settings);
    assert!(matches!(
        later.mark_complete(&owner, habit.id()).await,
        Err(HabitServiceError::AlreadyCompletedToday(_))
    ));
}
