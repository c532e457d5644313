//! Integration tests for logging through the file-backed store

mod common;

use calorie_tracker_engine::error::TrackerError;
use calorie_tracker_shared::{
    ActivityLevel, CreateHabitItemRequest, Food, HabitKind, HabitValue, LogExerciseRequest,
    LogFoodRequest, StrengthInput, UpdateProfileRequest,
};
use common::{day, TestTracker};
use std::collections::BTreeMap;

#[test]
fn test_fresh_store_is_persisted() {
    let tracker = TestTracker::new();
    let stored: serde_json::Value = serde_json::from_str(&tracker.stored()).unwrap();
    assert_eq!(stored["version"], 2);
    assert_eq!(stored["activeUserId"], "default");
    assert_eq!(stored["users"]["default"]["detox"]["streakStart"], "2024-03-01");
}

#[test]
fn test_food_log_survives_reopen() {
    let mut tracker = TestTracker::new();
    let date = day("2024-03-02");

    let banana = tracker
        .store
        .add_food(LogFoodRequest::named(date, "banana", 2.0))
        .unwrap();
    assert_eq!(banana.name, "Banana");
    assert_eq!(banana.kcal, 210.0);

    let manual = tracker
        .store
        .add_food(LogFoodRequest::manual(date, "Lentil soup", 30.0, 10.0, 40.0))
        .unwrap();
    assert_eq!(manual.kcal, 370.0);

    let tracker = tracker.reopen();
    let foods = tracker.store.foods_on(date).unwrap();
    assert_eq!(foods.len(), 2);
    assert_eq!(tracker.store.active_user().unwrap().recent_foods[0], "Lentil soup");
}

#[test]
fn test_add_then_remove_food_restores_day() {
    let mut tracker = TestTracker::new();
    let date = day("2024-03-02");
    tracker.store.add_food(LogFoodRequest::named(date, "Oats", 1.0)).unwrap();
    let before = tracker.store.foods_on(date).unwrap();

    let added = tracker.store.add_food(LogFoodRequest::named(date, "Apple", 1.0)).unwrap();
    assert!(tracker.store.remove_food(&added.id).unwrap());
    assert_eq!(tracker.store.foods_on(date).unwrap(), before);

    // unknown id is a silent no-op
    assert!(!tracker.store.remove_food(&added.id).unwrap());
}

#[test]
fn test_unknown_food_without_numbers_is_rejected() {
    let mut tracker = TestTracker::new();
    let result = tracker
        .store
        .add_food(LogFoodRequest::named(day("2024-03-02"), "Mystery stew", 1.0));
    assert!(matches!(result, Err(TrackerError::Validation(_))));
    assert!(tracker.store.foods_on(day("2024-03-02")).unwrap().is_empty());
}

#[test]
fn test_custom_food_is_found_by_name() {
    let mut tracker = TestTracker::new();
    tracker
        .store
        .add_custom_food(Food {
            name: "Grandma's stew".into(),
            category: String::new(),
            measure: Some("1 bowl".into()),
            kcal: 420.0,
            protein: 25.0,
            fat: 18.0,
            carbs: 35.0,
        })
        .unwrap();

    let entry = tracker
        .store
        .add_food(LogFoodRequest::named(day("2024-03-02"), "grandma's stew", 1.5))
        .unwrap();
    assert_eq!(entry.kcal, 630.0);

    let duplicate = tracker.store.add_custom_food(Food {
        name: "GRANDMA'S STEW".into(),
        category: String::new(),
        measure: None,
        kcal: 1.0,
        protein: 0.0,
        fat: 0.0,
        carbs: 0.0,
    });
    assert!(matches!(duplicate, Err(TrackerError::Conflict(_))));

    let groups = tracker.store.food_groups().unwrap();
    assert_eq!(groups[0].name, "Recently used");
    assert!(groups.iter().any(|g| g.name == "My foods"));
}

#[test]
fn test_weight_upsert_keeps_one_sample_per_date() {
    let mut tracker = TestTracker::new();
    let date = day("2024-03-05");
    tracker.store.upsert_weight(date, 81.0).unwrap();
    tracker.store.upsert_weight(date, 80.4).unwrap();
    tracker.store.upsert_weight(day("2024-03-03"), 81.5).unwrap();

    let tracker = tracker.reopen();
    let user = tracker.store.active_user().unwrap();
    assert_eq!(user.weights.len(), 2);
    assert_eq!(user.weights[0].date, day("2024-03-03"));
    assert_eq!(user.weights[1].weight_kg, 80.4);
    // the last write sets the current weight
    assert_eq!(user.profile.weight_kg, 81.5);

    assert_eq!(tracker.store.weight_as_of(day("2024-03-04")).unwrap(), 81.5);
    assert_eq!(tracker.store.weight_as_of(day("2024-03-09")).unwrap(), 80.4);
}

#[test]
fn test_exercise_and_summary() {
    let mut tracker = TestTracker::new();
    let date = day("2024-03-02");
    tracker
        .store
        .update_profile(UpdateProfileRequest {
            weight_kg: Some(80.0),
            ..UpdateProfileRequest::default()
        })
        .unwrap();

    let rowing = tracker
        .store
        .add_exercise(LogExerciseRequest {
            met: Some(7.0),
            ..LogExerciseRequest::cardio(date, "Rowing", 30.0)
        })
        .unwrap();
    assert_eq!(rowing.kcal_burn, Some(294.0));

    tracker
        .store
        .add_exercise(LogExerciseRequest {
            duration_min: None,
            strength: Some(StrengthInput { sets: 3, reps: 10, load_kg: 40.0 }),
            ..LogExerciseRequest::cardio(date, "Deadlift", 0.0)
        })
        .unwrap();
    tracker.store.add_food(LogFoodRequest::named(date, "Oats", 1.0)).unwrap();

    let summary = tracker.store.summarize(date).unwrap();
    // 10*80 + 6.25*170 - 5*30 + 5 = 1717.5, sedentary
    assert!((summary.base_burn - 1717.5 * 1.2).abs() < 1e-9);
    assert_eq!(summary.exercise_burn, 294.0);
    assert!((summary.deficit - (summary.base_burn + 294.0 - summary.intake)).abs() < 1e-9);
    assert_eq!(tracker.store.exercises_on(date).unwrap().len(), 2);
}

#[test]
fn test_profile_update_validation() {
    let mut tracker = TestTracker::new();
    let updated = tracker
        .store
        .update_profile(UpdateProfileRequest {
            activity_level: Some(ActivityLevel::VeryActive),
            target_deficit: Some(750.0),
            ..UpdateProfileRequest::default()
        })
        .unwrap();
    assert_eq!(updated.target_deficit, 750.0);

    let rejected = tracker.store.update_profile(UpdateProfileRequest {
        weight_kg: Some(5.0),
        ..UpdateProfileRequest::default()
    });
    assert!(matches!(rejected, Err(TrackerError::Validation(_))));

    let tracker = tracker.reopen();
    let profile = tracker.store.profile().unwrap();
    assert_eq!(profile.activity_level, ActivityLevel::VeryActive);
    assert_eq!(profile.weight_kg, 70.0);
}

#[test]
fn test_habit_streak_persists() {
    let mut tracker = TestTracker::new();
    let item = tracker
        .store
        .add_habit_item(CreateHabitItemRequest {
            name: "No sugar".into(),
            kind: HabitKind::Boolean,
            unit: None,
        })
        .unwrap();

    let mut values = BTreeMap::new();
    values.insert(item.id.clone(), HabitValue::Flag(false));
    tracker.store.save_habit_day(day("2024-03-04"), values, false).unwrap();

    let tracker = tracker.reopen();
    let streak = tracker.store.habit_streak(day("2024-03-10")).unwrap();
    assert_eq!(streak.streak_start, day("2024-03-04"));
    assert_eq!(streak.days, 6);
    assert!(tracker.store.habit_entry_on(day("2024-03-04")).unwrap().is_some());
}

#[test]
fn test_users_are_isolated() {
    let mut tracker = TestTracker::new();
    tracker.store.add_food(LogFoodRequest::named(day("2024-03-02"), "Eggs", 1.0)).unwrap();
    tracker.store.add_user("partner").unwrap();
    tracker.store.switch_user("partner").unwrap();

    assert!(tracker.store.foods_on(day("2024-03-02")).unwrap().is_empty());
    assert!(matches!(
        tracker.store.remove_user("partner"),
        Err(TrackerError::Conflict(_))
    ));
    assert!(matches!(
        tracker.store.switch_user("nobody"),
        Err(TrackerError::NotFound(_))
    ));

    let mut tracker = tracker.reopen();
    assert_eq!(tracker.store.document().active_user_id, "partner");
    tracker.store.switch_user("default").unwrap();
    tracker.store.remove_user("partner").unwrap();
    assert_eq!(tracker.store.list_users().len(), 1);
    assert_eq!(tracker.store.foods_on(day("2024-03-02")).unwrap().len(), 1);
}
