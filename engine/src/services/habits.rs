//! Habit (detox) tracking
//!
//! A user defines habit items, then records one entry per day with a value
//! per item and whether the plan was kept. The streak runs from the most
//! recent day the plan was broken.

use crate::error::{check, TrackerError, TrackerResult};
use calorie_tracker_shared::validation::validate_name;
use calorie_tracker_shared::{
    CreateHabitItemRequest, HabitEntry, HabitItem, HabitKind, HabitValue, StreakInfo, User,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use uuid::Uuid;

pub struct HabitService;

impl HabitService {
    pub fn add_item(user: &mut User, request: CreateHabitItemRequest) -> TrackerResult<HabitItem> {
        let name = request.name.trim().to_string();
        check("name", validate_name(&name))?;
        if user
            .detox
            .items
            .iter()
            .any(|item| item.name.eq_ignore_ascii_case(&name))
        {
            return Err(TrackerError::Conflict(format!(
                "A habit named '{}' already exists",
                name
            )));
        }

        let unit = match request.kind {
            HabitKind::Numeric => request
                .unit
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
            HabitKind::Boolean => None,
        };

        let item = HabitItem {
            id: Uuid::new_v4().to_string(),
            name,
            kind: request.kind,
            unit,
        };
        user.detox.items.push(item.clone());
        Ok(item)
    }

    /// Past entries keep their recorded values for the item
    pub fn remove_item(user: &mut User, id: &str) -> bool {
        let before = user.detox.items.len();
        user.detox.items.retain(|item| item.id != id);
        user.detox.items.len() != before
    }

    /// Replace the entry for `date`. A day with the plan broken moves the
    /// streak anchor to that date.
    pub fn save_day(
        user: &mut User,
        date: NaiveDate,
        values: BTreeMap<String, HabitValue>,
        kept_plan: bool,
    ) -> TrackerResult<HabitEntry> {
        for (id, value) in &values {
            let item = user
                .detox
                .items
                .iter()
                .find(|item| &item.id == id)
                .ok_or_else(|| TrackerError::invalid("habit", &format!("Unknown habit '{}'", id)))?;
            match (item.kind, value) {
                (HabitKind::Boolean, HabitValue::Flag(_)) => {}
                (HabitKind::Numeric, HabitValue::Amount(amount))
                    if amount.is_finite() && *amount >= 0.0 => {}
                (HabitKind::Boolean, _) => {
                    return Err(TrackerError::invalid(
                        "habit",
                        &format!("'{}' takes yes or no", item.name),
                    ))
                }
                (HabitKind::Numeric, _) => {
                    return Err(TrackerError::invalid(
                        "habit",
                        &format!("'{}' takes a non-negative number", item.name),
                    ))
                }
            }
        }

        let entry = HabitEntry {
            date,
            values,
            kept_plan,
        };
        let daily = &mut user.detox.daily;
        daily.retain(|e| e.date != date);
        daily.push(entry.clone());
        daily.sort_by_key(|e| e.date);

        if !kept_plan {
            user.detox.streak_start = date;
        }
        Ok(entry)
    }

    pub fn entry_on(user: &User, date: NaiveDate) -> Option<&HabitEntry> {
        user.detox.daily.iter().find(|e| e.date == date)
    }

    /// Whole days since the anchor, never negative
    pub fn streak_length_days(user: &User, now: NaiveDate) -> i64 {
        (now - user.detox.streak_start).num_days().max(0)
    }

    pub fn streak(user: &User, now: NaiveDate) -> StreakInfo {
        StreakInfo {
            streak_start: user.detox.streak_start,
            days: Self::streak_length_days(user, now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calorie_tracker_shared::Profile;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn user_with_items() -> (User, String, String) {
        let mut user = User::new(Profile::default(), day(1));
        let sugar = HabitService::add_item(
            &mut user,
            CreateHabitItemRequest {
                name: "No sugar".into(),
                kind: HabitKind::Boolean,
                unit: Some("ignored".into()),
            },
        )
        .unwrap();
        let water = HabitService::add_item(
            &mut user,
            CreateHabitItemRequest {
                name: "Water".into(),
                kind: HabitKind::Numeric,
                unit: Some(" L ".into()),
            },
        )
        .unwrap();
        assert_eq!(sugar.unit, None);
        assert_eq!(water.unit.as_deref(), Some("L"));
        (user, sugar.id, water.id)
    }

    #[test]
    fn test_duplicate_item_name_conflicts() {
        let (mut user, _, _) = user_with_items();
        let result = HabitService::add_item(
            &mut user,
            CreateHabitItemRequest {
                name: "water".into(),
                kind: HabitKind::Numeric,
                unit: None,
            },
        );
        assert!(matches!(result, Err(TrackerError::Conflict(_))));
    }

    #[test]
    fn test_broken_plan_moves_anchor() {
        let (mut user, sugar, water) = user_with_items();
        let mut values = BTreeMap::new();
        values.insert(sugar, HabitValue::Flag(false));
        values.insert(water, HabitValue::Amount(1.5));

        HabitService::save_day(&mut user, day(5), values.clone(), true).unwrap();
        assert_eq!(user.detox.streak_start, day(1));
        assert_eq!(HabitService::streak_length_days(&user, day(8)), 7);

        HabitService::save_day(&mut user, day(6), values, false).unwrap();
        assert_eq!(user.detox.streak_start, day(6));
        assert_eq!(HabitService::streak(&user, day(8)).days, 2);
        assert_eq!(HabitService::streak_length_days(&user, day(3)), 0);
    }

    #[test]
    fn test_save_day_replaces_entry() {
        let (mut user, sugar, _) = user_with_items();
        let mut values = BTreeMap::new();
        values.insert(sugar.clone(), HabitValue::Flag(true));
        HabitService::save_day(&mut user, day(4), values.clone(), true).unwrap();
        HabitService::save_day(&mut user, day(2), values.clone(), true).unwrap();
        values.insert(sugar, HabitValue::Flag(false));
        HabitService::save_day(&mut user, day(4), values, true).unwrap();

        let dates: Vec<NaiveDate> = user.detox.daily.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![day(2), day(4)]);
        assert!(!HabitService::entry_on(&user, day(4)).unwrap().values.values().any(|v| *v == HabitValue::Flag(true)));
    }

    #[test]
    fn test_value_kind_must_match_item() {
        let (mut user, sugar, water) = user_with_items();

        let mut wrong = BTreeMap::new();
        wrong.insert(sugar, HabitValue::Amount(2.0));
        assert!(matches!(
            HabitService::save_day(&mut user, day(2), wrong, true),
            Err(TrackerError::Validation(_))
        ));

        let mut negative = BTreeMap::new();
        negative.insert(water, HabitValue::Amount(-1.0));
        assert!(HabitService::save_day(&mut user, day(2), negative, true).is_err());

        let mut unknown = BTreeMap::new();
        unknown.insert("nope".to_string(), HabitValue::Flag(true));
        assert!(HabitService::save_day(&mut user, day(2), unknown, true).is_err());
        assert!(user.detox.daily.is_empty());
    }

    #[test]
    fn test_remove_item() {
        let (mut user, sugar, _) = user_with_items();
        assert!(HabitService::remove_item(&mut user, &sugar));
        assert!(!HabitService::remove_item(&mut user, &sugar));
        assert_eq!(user.detox.items.len(), 1);
    }
}
