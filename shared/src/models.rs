//! Persisted document model
//!
//! The whole tracker state is one JSON document. Field names on the wire are
//! camelCase and a few keep the short names the browser app has always
//! written (`height`, `weight`, `gender`, `qty`, `mins`), so older documents
//! and the current schema share most of their keys.

use crate::health_metrics::{ActivityLevel, BiologicalSex};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema version written by this build
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Id of the user created for fresh and single-user documents
pub const DEFAULT_USER_ID: &str = "default";

// ============================================================================
// Document
// ============================================================================

/// Root of the persisted state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub version: u32,
    pub active_user_id: String,
    pub users: BTreeMap<String, User>,
    #[serde(default)]
    pub onboarded: bool,
}

impl Document {
    /// Fresh single-user document
    pub fn new(profile: Profile, today: NaiveDate) -> Self {
        let mut users = BTreeMap::new();
        users.insert(DEFAULT_USER_ID.to_string(), User::new(profile, today));
        Self {
            version: CURRENT_SCHEMA_VERSION,
            active_user_id: DEFAULT_USER_ID.to_string(),
            users,
            onboarded: false,
        }
    }

    pub fn active_user(&self) -> Option<&User> {
        self.users.get(&self.active_user_id)
    }

    pub fn active_user_mut(&mut self) -> Option<&mut User> {
        self.users.get_mut(&self.active_user_id)
    }
}

// ============================================================================
// User
// ============================================================================

/// One tracked person. Users share nothing with each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub profile: Profile,
    #[serde(default)]
    pub foods: Vec<FoodEntry>,
    #[serde(default)]
    pub exercises: Vec<ExerciseEntry>,
    /// Ascending by date, at most one sample per date
    #[serde(default)]
    pub weights: Vec<WeightSample>,
    pub detox: DetoxState,
    #[serde(default)]
    pub custom_foods: Vec<crate::catalog::Food>,
    /// Most recent first
    #[serde(default)]
    pub recent_foods: Vec<String>,
    #[serde(default)]
    pub recent_exercises: Vec<String>,
}

impl User {
    /// Empty logs; the starting weight anchors longitudinal change
    pub fn new(mut profile: Profile, today: NaiveDate) -> Self {
        if profile.initial_weight_kg.is_none() {
            profile.initial_weight_kg = Some(profile.weight_kg);
        }
        Self {
            profile,
            foods: Vec::new(),
            exercises: Vec::new(),
            weights: Vec::new(),
            detox: DetoxState::new(today),
            custom_foods: Vec::new(),
            recent_foods: Vec::new(),
            recent_exercises: Vec::new(),
        }
    }
}

// ============================================================================
// Profile
// ============================================================================

/// Body metrics and goals driving the energy model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub age: u32,
    #[serde(rename = "height")]
    pub height_cm: f64,
    /// Current baseline weight
    #[serde(rename = "weight")]
    pub weight_kg: f64,
    #[serde(rename = "gender")]
    pub sex: BiologicalSex,
    #[serde(rename = "activity")]
    pub activity_level: ActivityLevel,
    /// Daily deficit goal in kcal
    #[serde(rename = "deficit")]
    pub target_deficit: f64,
    #[serde(alias = "fasting_start", with = "hhmm::option", skip_serializing_if = "Option::is_none")]
    pub fasting_start: Option<NaiveTime>,
    #[serde(alias = "fasting_end", with = "hhmm::option", skip_serializing_if = "Option::is_none")]
    pub fasting_end: Option<NaiveTime>,
    /// Anchor for longitudinal weight change; snake_case aliases accept
    /// case-folded config keys
    #[serde(rename = "initialWeight", alias = "initial_weight", skip_serializing_if = "Option::is_none")]
    pub initial_weight_kg: Option<f64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            age: 30,
            height_cm: 170.0,
            weight_kg: 70.0,
            sex: BiologicalSex::Male,
            activity_level: ActivityLevel::Sedentary,
            target_deficit: 500.0,
            fasting_start: None,
            fasting_end: None,
            initial_weight_kg: None,
        }
    }
}

// ============================================================================
// Log Entries
// ============================================================================

fn default_quantity() -> f64 {
    1.0
}

/// A logged food. kcal and macros are already scaled by quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntry {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default, with = "hhmm::option", skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    pub name: String,
    #[serde(rename = "qty", default = "default_quantity")]
    pub quantity: f64,
    pub kcal: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub alcohol: f64,
    #[serde(default)]
    pub fiber: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure: Option<String>,
}

/// A logged workout with its burn frozen at creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseEntry {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default, with = "hhmm::option", skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    pub label: String,
    pub met: f64,
    #[serde(rename = "mins", default)]
    pub duration_min: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kcal_burn: Option<f64>,
    #[serde(flatten)]
    pub detail: ExerciseDetail,
}

/// Cardio or strength specifics, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExerciseDetail {
    Cardio {
        #[serde(rename = "distanceKm", default, skip_serializing_if = "Option::is_none")]
        distance_km: Option<f64>,
        #[serde(rename = "inclinePct", default, skip_serializing_if = "Option::is_none")]
        incline_pct: Option<f64>,
    },
    Strength {
        sets: u32,
        reps: u32,
        #[serde(rename = "loadKg")]
        load_kg: f64,
        /// sets x reps x load
        #[serde(rename = "volumeKg")]
        volume_kg: f64,
    },
}

impl Default for ExerciseDetail {
    fn default() -> Self {
        ExerciseDetail::Cardio {
            distance_km: None,
            incline_pct: None,
        }
    }
}

impl ExerciseDetail {
    pub fn strength(sets: u32, reps: u32, load_kg: f64) -> Self {
        ExerciseDetail::Strength {
            sets,
            reps,
            load_kg,
            volume_kg: sets as f64 * reps as f64 * load_kg,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSample {
    pub date: NaiveDate,
    #[serde(rename = "weight")]
    pub weight_kg: f64,
}

// ============================================================================
// Habits (detox tracker)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HabitKind {
    #[default]
    Boolean,
    Numeric,
}

/// A user-defined habit to check off or count each day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: HabitKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HabitValue {
    Flag(bool),
    Amount(f64),
}

/// One day of habit values, keyed by habit item id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub values: BTreeMap<String, HabitValue>,
    #[serde(default)]
    pub kept_plan: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetoxState {
    #[serde(default)]
    pub items: Vec<HabitItem>,
    /// Ascending by date, one entry per date
    #[serde(default)]
    pub daily: Vec<HabitEntry>,
    /// Most recent day the plan was broken
    pub streak_start: NaiveDate,
}

impl DetoxState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            items: Vec::new(),
            daily: Vec::new(),
            streak_start: today,
        }
    }
}

// ============================================================================
// Time-of-day serde ("HH:MM")
// ============================================================================

/// Times of day are stored as `HH:MM`; seconds are accepted on input
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn parse(value: &str) -> Option<NaiveTime> {
        let value = value.trim();
        NaiveTime::parse_from_str(value, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
            .ok()
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid time of day: {}", raw)))
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(time) => super::serialize(time, serializer),
                None => serializer.serialize_none(),
            }
        }

        /// Empty strings read as absent, as the form inputs produce them
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(value) => super::parse(value)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid time of day: {}", value))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_new_document_has_active_default_user() {
        let doc = Document::new(Profile::default(), day("2024-03-01"));
        assert_eq!(doc.version, CURRENT_SCHEMA_VERSION);
        assert_eq!(doc.active_user_id, DEFAULT_USER_ID);
        let user = doc.active_user().unwrap();
        assert_eq!(user.detox.streak_start, day("2024-03-01"));
        assert_eq!(user.profile.initial_weight_kg, Some(70.0));
        assert!(!doc.onboarded);
    }

    #[test]
    fn test_profile_wire_names() {
        let profile = Profile {
            fasting_start: hhmm::parse("20:00"),
            fasting_end: hhmm::parse("12:00"),
            ..Profile::default()
        };
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["height"], json!(170.0));
        assert_eq!(value["gender"], json!("Male"));
        assert_eq!(value["activity"], json!("sedentary"));
        assert_eq!(value["deficit"], json!(500.0));
        assert_eq!(value["fastingStart"], json!("20:00"));
        assert!(value.get("initialWeight").is_none());
    }

    #[test]
    fn test_profile_missing_fields_backfilled() {
        let profile: Profile = serde_json::from_value(json!({ "age": 41, "weight": 88.0 })).unwrap();
        assert_eq!(profile.age, 41);
        assert_eq!(profile.weight_kg, 88.0);
        assert_eq!(profile.height_cm, 170.0);
        assert_eq!(profile.fasting_start, None);
    }

    #[test]
    fn test_empty_time_reads_as_none() {
        let profile: Profile = serde_json::from_value(json!({ "fastingStart": "" })).unwrap();
        assert_eq!(profile.fasting_start, None);
    }

    #[test]
    fn test_exercise_kind_tag() {
        let entry = ExerciseEntry {
            id: "e1".into(),
            date: day("2024-03-01"),
            time: None,
            label: "Bench press".into(),
            met: 5.0,
            duration_min: 20.0,
            kcal_burn: Some(120.0),
            detail: ExerciseDetail::strength(3, 10, 60.0),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["kind"], json!("strength"));
        assert_eq!(value["volumeKg"], json!(1800.0));
        assert_eq!(value["mins"], json!(20.0));

        let back: ExerciseEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_habit_value_untagged() {
        let entry: HabitEntry = serde_json::from_value(json!({
            "date": "2024-03-02",
            "values": { "sugar": false, "water": 2.5 },
            "keptPlan": true
        }))
        .unwrap();
        assert_eq!(entry.values["sugar"], HabitValue::Flag(false));
        assert_eq!(entry.values["water"], HabitValue::Amount(2.5));
    }

    #[test]
    fn test_food_entry_quantity_defaults_to_one() {
        let entry: FoodEntry = serde_json::from_value(json!({
            "id": "f1", "date": "2024-03-01", "name": "Apple", "kcal": 95.0
        }))
        .unwrap();
        assert_eq!(entry.quantity, 1.0);
        assert_eq!(entry.protein, 0.0);
    }
}
