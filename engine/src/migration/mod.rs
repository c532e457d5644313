//! Loading and upgrading the persisted document
//!
//! Stored documents come in three shapes:
//!
//! - version 0: no `version` and no `users`; a single user's profile and
//!   logs at the top level, either as flat `foods`/`exercises`/`weights`
//!   lists or as per-date `logs` with a `foodDb`
//! - version 1: multi-user `users` map without a `version`, entries still
//!   using the old field names
//! - version 2: the current schema
//!
//! Upgrades run as a linear chain N -> N+1 on raw JSON, then every user is
//! decoded entity by entity so one unreadable entry never costs the rest.

mod v1;
mod v2;

use calorie_tracker_shared::{
    Catalog, DetoxState, Document, ExerciseEntry, Food, FoodEntry, HabitEntry, HabitItem, Profile,
    User, WeightSample, CURRENT_SCHEMA_VERSION, DEFAULT_USER_ID,
};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Inputs migration needs beyond the stored bytes
#[derive(Debug, Clone, Copy)]
pub struct MigrationContext<'a> {
    /// Streak anchor for users without habit state
    pub today: NaiveDate,
    pub default_profile: &'a Profile,
    /// Legacy food databases keep only the foods this catalog lacks
    pub catalog: &'a Catalog,
}

type Upgrade = fn(Value, &MigrationContext<'_>) -> Value;

/// Indexed by source version
const UPGRADES: [Upgrade; CURRENT_SCHEMA_VERSION as usize] = [v1::upgrade, v2::upgrade];

/// Turn whatever was stored into a current document. Never fails.
pub fn load_document(raw: Option<&str>, ctx: &MigrationContext<'_>) -> Document {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            info!("No stored document, starting fresh");
            return fresh_document(ctx);
        }
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => migrate_value(value, ctx),
        Ok(other) => {
            warn!(kind = json_kind(&other), "Stored document is not an object, replacing it");
            fresh_document(ctx)
        }
        Err(e) => {
            warn!(error = %e, "Stored document is not valid JSON, replacing it");
            fresh_document(ctx)
        }
    }
}

/// Run the upgrade chain and the per-entity decode on a parsed document
pub fn migrate_value(mut value: Value, ctx: &MigrationContext<'_>) -> Document {
    let mut version = detect_version(&value);
    if version > CURRENT_SCHEMA_VERSION {
        warn!(version, "Document written by a newer schema, reading it as current");
        version = CURRENT_SCHEMA_VERSION;
    }

    while version < CURRENT_SCHEMA_VERSION {
        value = UPGRADES[version as usize](value, ctx);
        version += 1;
        debug!(to = version, "Applied document upgrade");
    }

    normalize(value, ctx)
}

/// Explicit `version` wins; otherwise a `users` map means version 1
pub fn detect_version(value: &Value) -> u32 {
    match value.get("version").and_then(Value::as_u64) {
        Some(version) => version.min(u32::MAX as u64) as u32,
        None if value.get("users").map_or(false, Value::is_object) => 1,
        None => 0,
    }
}

fn fresh_document(ctx: &MigrationContext<'_>) -> Document {
    Document::new(ctx.default_profile.clone(), ctx.today)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Per-entity decode
// ============================================================================

fn normalize(value: Value, ctx: &MigrationContext<'_>) -> Document {
    let mut users = BTreeMap::new();
    if let Some(stored) = value.get("users").and_then(Value::as_object) {
        for (id, user) in stored {
            if !user.is_object() {
                warn!(user = %id, "Dropping unreadable user");
                continue;
            }
            users.insert(id.clone(), normalize_user(id, user, ctx));
        }
    }

    if users.is_empty() {
        warn!("Document has no users, adding the default user");
        users.insert(
            DEFAULT_USER_ID.to_string(),
            User::new(ctx.default_profile.clone(), ctx.today),
        );
    }

    let stored_active = value.get("activeUserId").and_then(Value::as_str);
    let active_user_id = match stored_active {
        Some(id) if users.contains_key(id) => id.to_string(),
        _ => {
            let fallback = if users.contains_key(DEFAULT_USER_ID) {
                DEFAULT_USER_ID.to_string()
            } else {
                users.keys().next().cloned().unwrap_or_else(|| DEFAULT_USER_ID.to_string())
            };
            warn!(stored = ?stored_active, active = %fallback, "Active user missing, switching");
            fallback
        }
    };

    Document {
        version: CURRENT_SCHEMA_VERSION,
        active_user_id,
        users,
        onboarded: value.get("onboarded").and_then(Value::as_bool).unwrap_or(false),
    }
}

fn normalize_user(id: &str, value: &Value, ctx: &MigrationContext<'_>) -> User {
    let mut profile = decode_over(
        ctx.default_profile.clone(),
        value.get("profile"),
        &PROFILE_NUMBERS,
        "profile",
    );

    let foods: Vec<FoodEntry> = decode_each(value.get("foods"), &FOOD_NUMBERS, "food entry");
    let exercises: Vec<ExerciseEntry> = decode_each(value.get("exercises"), &EXERCISE_NUMBERS, "exercise entry");

    let mut weights: Vec<WeightSample> = decode_each(value.get("weights"), &WEIGHT_NUMBERS, "weight sample");
    weights.retain(|w| w.weight_kg.is_finite() && w.weight_kg > 0.0);
    let weights = last_per_date(weights, |w| w.date);

    if profile.initial_weight_kg.is_none() {
        let anchor = weights.first().map_or(profile.weight_kg, |w| w.weight_kg);
        profile.initial_weight_kg = Some(anchor);
    }

    let detox = value.get("detox");
    let detox = DetoxState {
        items: decode_each::<HabitItem>(detox.and_then(|d| d.get("items")), &NumericFields::NONE, "habit item"),
        daily: last_per_date(
            decode_each::<HabitEntry>(detox.and_then(|d| d.get("daily")), &NumericFields::NONE, "habit day"),
            |d| d.date,
        ),
        streak_start: detox
            .and_then(|d| d.get("streakStart"))
            .and_then(|d| serde_json::from_value(d.clone()).ok())
            .unwrap_or(ctx.today),
    };

    let mut custom_foods: Vec<Food> = decode_each(value.get("customFoods"), &FOOD_NUMBERS, "custom food");
    let mut seen = Vec::new();
    custom_foods.retain(|f| {
        let key = f.name.trim().to_lowercase();
        if key.is_empty() || seen.contains(&key) {
            return false;
        }
        seen.push(key);
        true
    });

    debug!(
        user = %id,
        foods = foods.len(),
        exercises = exercises.len(),
        weights = weights.len(),
        "User normalized"
    );

    User {
        profile,
        foods,
        exercises,
        weights,
        detox,
        custom_foods,
        recent_foods: string_list(value.get("recentFoods")),
        recent_exercises: string_list(value.get("recentExercises")),
    }
}

/// Decode every element of an array, skipping the unreadable ones
fn decode_each<T: DeserializeOwned>(value: Option<&Value>, numbers: &NumericFields, what: &str) -> Vec<T> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(numbers.coerced(item)) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(index, error = %e, "Dropping unreadable {}", what);
                None
            }
        })
        .collect()
}

/// Overlay stored fields on a default one at a time, keeping each field
/// that still decodes
fn decode_over<T: Serialize + DeserializeOwned>(
    fallback: T,
    stored: Option<&Value>,
    numbers: &NumericFields,
    what: &str,
) -> T {
    let Some(Value::Object(stored)) = stored.map(|v| numbers.coerced(v)) else {
        return fallback;
    };
    let mut merged = match serde_json::to_value(&fallback) {
        Ok(Value::Object(map)) => map,
        _ => return fallback,
    };

    for (key, value) in stored {
        let mut candidate = merged.clone();
        candidate.insert(key.clone(), value);
        if serde_json::from_value::<T>(Value::Object(candidate.clone())).is_ok() {
            merged = candidate;
        } else {
            warn!(field = %key, "Dropping unreadable {} field", what);
        }
    }

    serde_json::from_value(Value::Object(merged)).unwrap_or(fallback)
}

/// Sort ascending by date, keeping the last entry written for each date
fn last_per_date<T>(items: Vec<T>, date: impl Fn(&T) -> NaiveDate) -> Vec<T> {
    let mut by_date: BTreeMap<NaiveDate, T> = BTreeMap::new();
    for item in items {
        by_date.insert(date(&item), item);
    }
    by_date.into_values().collect()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in value.and_then(Value::as_array).into_iter().flatten() {
        if let Some(name) = name.as_str().map(str::trim).filter(|n| !n.is_empty()) {
            if !out.iter().any(|n| n == name) {
                out.push(name.to_string());
            }
        }
    }
    out
}

/// Take `key` out of an object, treating null as absent
pub(crate) fn take(map: &mut Map<String, Value>, key: &str) -> Option<Value> {
    map.remove(key).filter(|v| !v.is_null())
}

/// Numbers, or strings holding one
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

// ============================================================================
// Numeric fields
// ============================================================================

/// Stored field names holding numbers, by wire name
struct NumericFields {
    numbers: &'static [&'static str],
    /// Rounded and floored at zero
    integers: &'static [&'static str],
}

const PROFILE_NUMBERS: NumericFields = NumericFields {
    numbers: &["height", "weight", "deficit", "initialWeight"],
    integers: &["age"],
};

const FOOD_NUMBERS: NumericFields = NumericFields {
    numbers: &["qty", "kcal", "protein", "fat", "carbs", "alcohol", "fiber"],
    integers: &[],
};

const EXERCISE_NUMBERS: NumericFields = NumericFields {
    numbers: &["met", "mins", "kcalBurn", "distanceKm", "inclinePct", "loadKg", "volumeKg"],
    integers: &["sets", "reps"],
};

const WEIGHT_NUMBERS: NumericFields = NumericFields {
    numbers: &["weight"],
    integers: &[],
};

impl NumericFields {
    const NONE: NumericFields = NumericFields {
        numbers: &[],
        integers: &[],
    };

    /// Rewrite numeric strings as numbers and integer fields as whole
    /// numbers; anything else is left for the decoder to reject
    fn coerce(&self, map: &mut Map<String, Value>) {
        for key in self.numbers {
            if let Some(number) = map.get(*key).and_then(as_number) {
                map.insert(key.to_string(), json!(number));
            }
        }
        for key in self.integers {
            if let Some(number) = map.get(*key).filter(|v| !v.is_u64()).and_then(as_number) {
                map.insert(key.to_string(), json!(number.max(0.0).round() as u64));
            }
        }
    }

    fn coerced(&self, value: &Value) -> Value {
        let mut value = value.clone();
        if let Value::Object(map) = &mut value {
            self.coerce(map);
        }
        value
    }
}
