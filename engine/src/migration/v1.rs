//! Version 0 -> 1: wrap a single-user document into the `users` map
//!
//! Per-date `logs` are flattened into dated lists and the foods of a legacy
//! `foodDb` that the catalog does not know become custom foods. Field names
//! inside entries are left for the next step.

use super::{take, MigrationContext};
use calorie_tracker_shared::DEFAULT_USER_ID;
use serde_json::{json, Map, Value};
use tracing::debug;

pub(super) fn upgrade(value: Value, ctx: &MigrationContext<'_>) -> Value {
    let mut root = match value {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let onboarded = take(&mut root, "onboarded").unwrap_or(Value::Bool(false));
    let logs = take(&mut root, "logs");
    let food_db = take(&mut root, "foodDb");
    root.remove("version");

    // whatever is left belongs to the single user
    let mut user = root;
    if !user.get("profile").map_or(false, Value::is_object) {
        user.insert("profile".to_string(), Value::Object(Map::new()));
    }

    if let Some(Value::Object(logs)) = logs {
        flatten_logs(&mut user, logs);
    }
    if let Some(Value::Array(food_db)) = food_db {
        import_food_db(&mut user, food_db, ctx);
    }

    json!({
        "activeUserId": DEFAULT_USER_ID,
        "users": { DEFAULT_USER_ID: Value::Object(user) },
        "onboarded": onboarded,
    })
}

/// `{ date: { foods, exercises, weight } }` into dated entry lists
fn flatten_logs(user: &mut Map<String, Value>, logs: Map<String, Value>) {
    let mut foods = list(user, "foods");
    let mut exercises = list(user, "exercises");
    let mut weights = list(user, "weights");

    for (date, day) in logs {
        let Value::Object(mut day) = day else {
            continue;
        };

        for kind in ["foods", "exercises"] {
            let Some(Value::Array(entries)) = take(&mut day, kind) else {
                continue;
            };
            let target = if kind == "foods" { &mut foods } else { &mut exercises };
            for entry in entries {
                if let Value::Object(mut entry) = entry {
                    entry.insert("date".to_string(), Value::String(date.clone()));
                    target.push(Value::Object(entry));
                }
            }
        }

        if let Some(weight) = day.get("weight").and_then(Value::as_f64).filter(|w| *w > 0.0) {
            weights.push(json!({ "date": date, "weight": weight }));
        }
    }

    debug!(
        foods = foods.len(),
        exercises = exercises.len(),
        weights = weights.len(),
        "Flattened per-date logs"
    );
    user.insert("foods".to_string(), Value::Array(foods));
    user.insert("exercises".to_string(), Value::Array(exercises));
    user.insert("weights".to_string(), Value::Array(weights));
}

fn import_food_db(user: &mut Map<String, Value>, food_db: Vec<Value>, ctx: &MigrationContext<'_>) {
    let mut custom = list(user, "customFoods");

    for item in food_db {
        let Value::Object(mut item) = item else {
            continue;
        };
        // CSV-sourced databases used `food` for the name
        let name = take(&mut item, "name")
            .or_else(|| take(&mut item, "food"))
            .and_then(|n| n.as_str().map(|s| s.trim().to_string()))
            .filter(|n| !n.is_empty());
        let Some(name) = name else {
            continue;
        };

        let known = ctx.catalog.find_food(&name).is_some()
            || custom.iter().any(|c| {
                c.get("name")
                    .and_then(Value::as_str)
                    .map_or(false, |n| n.eq_ignore_ascii_case(&name))
            });
        if known {
            continue;
        }

        item.insert("name".to_string(), Value::String(name));
        custom.push(Value::Object(item));
    }

    user.insert("customFoods".to_string(), Value::Array(custom));
}

fn list(user: &mut Map<String, Value>, key: &str) -> Vec<Value> {
    match take(user, key) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
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

    #[test]
    fn test_flat_single_user_is_wrapped() {
        let out = upgrade_with_builtin(json!({
            "profile": { "age": 41 },
            "foods": [{ "id": "f1", "date": "2024-01-01", "name": "Toast", "kcal": 80 }],
            "weights": []
        }));
        assert_eq!(out["activeUserId"], json!("default"));
        assert_eq!(out["users"]["default"]["profile"]["age"], json!(41));
        assert_eq!(out["users"]["default"]["foods"][0]["id"], json!("f1"));
        assert_eq!(out["onboarded"], json!(false));
    }

    #[test]
    fn test_logs_are_flattened_with_dates() {
        let out = upgrade_with_builtin(json!({
            "profile": {},
            "logs": {
                "2024-01-01": { "foods": [{ "id": "a", "name": "Oats" }], "exercises": [], "weight": 81.2 },
                "2024-01-02": { "foods": [], "exercises": [{ "id": "b", "type": "Walking", "mins": 30 }], "weight": null }
            }
        }));
        let user = &out["users"]["default"];
        assert_eq!(user["foods"][0]["date"], json!("2024-01-01"));
        assert_eq!(user["exercises"][0]["date"], json!("2024-01-02"));
        assert_eq!(user["weights"].as_array().unwrap().len(), 1);
        assert_eq!(user["weights"][0]["weight"], json!(81.2));
    }

    #[test]
    fn test_food_db_keeps_only_unknown_foods() {
        let out = upgrade_with_builtin(json!({
            "profile": {},
            "foodDb": [
                { "name": "Banana", "kcal": 105 },
                { "food": "Grandma's stew", "kcal": 410, "protein": 25 },
                { "food": "grandma's STEW", "kcal": 1 }
            ]
        }));
        let custom = out["users"]["default"]["customFoods"].as_array().unwrap();
        assert_eq!(custom.len(), 1);
        assert_eq!(custom[0]["name"], json!("Grandma's stew"));
        assert!(custom[0].get("food").is_none());
    }
}
