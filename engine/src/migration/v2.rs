//! Version 1 -> 2: current field names and value shapes inside each user
//!
//! - profile: `heightCm`/`weightKg` to `height`/`weight`, numeric or label
//!   `activity` to the level name, numeric strings to numbers
//! - foods: nested `macros` lifted, missing kcal derived from macros
//! - exercises: `type` to `label`, `kcal` to `kcalBurn`, `start` to `time`,
//!   `kind` defaulted to cardio, missing MET looked up
//! - entries without an id get a deterministic one

use super::{as_number, take, MigrationContext, EXERCISE_NUMBERS, FOOD_NUMBERS, PROFILE_NUMBERS};
use calorie_tracker_shared::{kcal_from_macros, ActivityLevel, CURRENT_SCHEMA_VERSION};
use serde_json::{json, Map, Value};
use tracing::warn;

/// MET used when neither the entry nor the catalog knows one
const FALLBACK_MET: f64 = 3.5;

const MACROS: [&str; 5] = ["protein", "fat", "carbs", "alcohol", "fiber"];

pub(super) fn upgrade(value: Value, ctx: &MigrationContext<'_>) -> Value {
    let mut root = match value {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    if let Some(Value::Object(users)) = root.get_mut("users") {
        for (id, user) in users.iter_mut() {
            let Value::Object(user) = user else {
                warn!(user = %id, "User is not an object");
                continue;
            };
            if let Some(Value::Object(profile)) = user.get_mut("profile") {
                upgrade_profile(profile);
            }
            if let Some(Value::Array(foods)) = user.get_mut("foods") {
                for (index, food) in foods.iter_mut().enumerate() {
                    if let Value::Object(food) = food {
                        upgrade_food(food, index);
                    }
                }
            }
            if let Some(Value::Array(exercises)) = user.get_mut("exercises") {
                for (index, exercise) in exercises.iter_mut().enumerate() {
                    if let Value::Object(exercise) = exercise {
                        upgrade_exercise(exercise, index, ctx);
                    }
                }
            }
        }
    }

    root.insert("version".to_string(), json!(CURRENT_SCHEMA_VERSION));
    Value::Object(root)
}

fn upgrade_profile(profile: &mut Map<String, Value>) {
    rename(profile, "heightCm", "height");
    rename(profile, "weightKg", "weight");

    PROFILE_NUMBERS.coerce(profile);

    let level = match profile.get("activity") {
        Some(Value::Number(n)) => n.as_f64().and_then(ActivityLevel::from_multiplier),
        Some(Value::String(s)) => s.parse::<ActivityLevel>().ok(),
        _ => None,
    };
    match level {
        Some(level) => {
            if let Ok(name) = serde_json::to_value(level) {
                profile.insert("activity".to_string(), name);
            }
        }
        None => {
            if let Some(unknown) = profile.remove("activity") {
                warn!(activity = %unknown, "Unknown activity level, using the default");
            }
        }
    }
}

fn upgrade_food(food: &mut Map<String, Value>, index: usize) {
    if let Some(Value::Object(macros)) = take(food, "macros") {
        for key in MACROS {
            if let Some(grams) = macros.get(key).and_then(as_number) {
                food.entry(key.to_string()).or_insert(json!(grams));
            }
        }
    }
    ensure_id(food, "food", index);
    FOOD_NUMBERS.coerce(food);

    if food.get("kcal").and_then(Value::as_f64).is_none() {
        let grams = |key: &str| food.get(key).and_then(as_number).unwrap_or(0.0);
        let kcal = kcal_from_macros(
            grams("protein"),
            grams("fat"),
            grams("carbs"),
            grams("alcohol"),
            grams("fiber"),
        );
        food.insert("kcal".to_string(), json!(kcal));
    }
    if food.get("name").and_then(Value::as_str).map_or(true, |n| n.trim().is_empty()) {
        food.insert("name".to_string(), json!("Custom"));
    }
}

fn upgrade_exercise(exercise: &mut Map<String, Value>, index: usize, ctx: &MigrationContext<'_>) {
    rename(exercise, "type", "label");
    rename(exercise, "kcal", "kcalBurn");
    rename(exercise, "start", "time");
    exercise.remove("end");
    ensure_id(exercise, "exercise", index);

    // empty form inputs were stored as ""
    if exercise.get("time").and_then(Value::as_str).map_or(false, |t| t.trim().is_empty()) {
        exercise.remove("time");
    }
    if !exercise.contains_key("kind") {
        exercise.insert("kind".to_string(), json!("cardio"));
    }
    if exercise.get("label").and_then(Value::as_str).is_none() {
        exercise.insert("label".to_string(), json!("Exercise"));
    }

    let met = exercise
        .get("met")
        .and_then(as_number)
        .filter(|met| *met > 0.0)
        .or_else(|| {
            exercise
                .get("label")
                .and_then(Value::as_str)
                .and_then(|label| ctx.catalog.met_for(label))
        })
        .unwrap_or(FALLBACK_MET);
    exercise.insert("met".to_string(), json!(met));
    EXERCISE_NUMBERS.coerce(exercise);
}

fn ensure_id(entry: &mut Map<String, Value>, kind: &str, index: usize) {
    let id = match entry.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => return,
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            let date = entry.get("date").and_then(Value::as_str).unwrap_or("undated");
            format!("legacy-{}-{}-{}", kind, date, index)
        }
    };
    entry.insert("id".to_string(), Value::String(id));
}

fn rename(map: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = take(map, from) {
        map.entry(to.to_string()).or_insert(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calorie_tracker_shared::{Catalog, Profile};
    use chrono::NaiveDate;

    fn upgrade_with_builtin(value: Value) -> Value {
        let profile = Profile::default();
        let catalog = Catalog::builtin();
        let ctx = MigrationContext {
            today: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            default_profile: &profile,
            catalog: &catalog,
        };
        upgrade(value, &ctx)
    }

    fn single_user(user: Value) -> Value {
        json!({ "activeUserId": "default", "users": { "default": user } })
    }

    #[test]
    fn test_profile_field_renames() {
        let out = upgrade_with_builtin(single_user(json!({
            "profile": { "heightCm": 180, "weightKg": "82.5", "age": 29.6, "activity": 1.55, "gender": "Female" }
        })));
        let profile = &out["users"]["default"]["profile"];
        assert_eq!(profile["height"], json!(180.0));
        assert_eq!(profile["weight"], json!(82.5));
        assert_eq!(profile["age"], json!(30));
        assert_eq!(profile["activity"], json!("moderately_active"));
        assert!(profile.get("heightCm").is_none());
        assert_eq!(out["version"], json!(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_activity_label_and_unknown() {
        let out = upgrade_with_builtin(single_user(json!({ "profile": { "activity": "Lightly active" } })));
        assert_eq!(out["users"]["default"]["profile"]["activity"], json!("lightly_active"));

        let out = upgrade_with_builtin(single_user(json!({ "profile": { "activity": 1.3 } })));
        assert!(out["users"]["default"]["profile"].get("activity").is_none());
    }

    #[test]
    fn test_food_macros_lifted() {
        let out = upgrade_with_builtin(single_user(json!({
            "profile": {},
            "foods": [{ "date": "2024-01-01", "name": "Shake", "qty": 2,
                        "macros": { "protein": 48, "fat": 4, "carbs": 6 } }]
        })));
        let food = &out["users"]["default"]["foods"][0];
        assert_eq!(food["protein"], json!(48.0));
        assert_eq!(food["kcal"], json!(48.0 * 4.0 + 4.0 * 9.0 + 6.0 * 4.0));
        assert_eq!(food["id"], json!("legacy-food-2024-01-01-0"));
        assert!(food.get("macros").is_none());
    }

    #[test]
    fn test_food_string_kcal_kept() {
        let out = upgrade_with_builtin(single_user(json!({
            "profile": {},
            "foods": [{ "date": "2024-01-01", "name": "Toast", "kcal": "80",
                        "macros": { "protein": 3, "fat": 1, "carbs": 15 } }]
        })));
        let food = &out["users"]["default"]["foods"][0];
        assert_eq!(food["kcal"], json!(80.0));
        assert_eq!(food["carbs"], json!(15.0));
    }

    #[test]
    fn test_exercise_fields_renamed() {
        let out = upgrade_with_builtin(single_user(json!({
            "profile": {},
            "exercises": [
                { "id": "x", "date": "2024-01-02", "type": "Cycling", "mins": 40, "kcal": 300, "start": "07:00", "end": "07:40" },
                { "id": 17, "date": "2024-01-02", "type": "Juggling", "mins": 10, "start": "" }
            ]
        })));
        let first = &out["users"]["default"]["exercises"][0];
        assert_eq!(first["label"], json!("Cycling"));
        assert_eq!(first["kcalBurn"], json!(300.0));
        assert_eq!(first["time"], json!("07:00"));
        assert_eq!(first["kind"], json!("cardio"));
        assert_eq!(first["met"], json!(7.5));

        let second = &out["users"]["default"]["exercises"][1];
        assert_eq!(second["id"], json!("17"));
        assert_eq!(second["met"], json!(FALLBACK_MET));
        assert!(second.get("time").is_none());
    }
}
