//! Calorie Tracker WASM Module
//!
//! Browser bindings over the engine. The page reads the stored document
//! from local storage, hands it to `Tracker`, and writes `document()` back
//! after every change. Payloads and results are JSON strings; failures are
//! thrown as the JSON error body `{ "error": { "code", "message" } }`.

use calorie_tracker_engine::error::{TrackerError, TrackerResult};
use calorie_tracker_engine::services::WeightService;
use calorie_tracker_engine::state::{StoreSettings, TrackerStore};
use calorie_tracker_engine::storage::MemoryStorage;
use calorie_tracker_shared::validation::{parse_iso_date, parse_time_of_day};
use calorie_tracker_shared::{
    calculate_bmr_mifflin, BiologicalSex, Catalog, CreateHabitItemRequest, Food, HabitValue,
    LogExerciseRequest, LogFoodRequest, UpdateProfileRequest, WeightUnit,
};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use wasm_bindgen::prelude::*;

// ============================================================================
// Stateless helpers
// ============================================================================

/// Trailing moving average: one value per input, each over up to
/// `window_size` values ending at that position
#[wasm_bindgen]
pub fn calculate_moving_average(values: &[f64], window_size: usize) -> Vec<f64> {
    (0..values.len())
        .filter_map(|i| {
            let start = (i + 1).saturating_sub(window_size);
            WeightService::calculate_moving_average(&values[start..=i], window_size)
        })
        .collect()
}

/// Calculate TDEE (Total Daily Energy Expenditure)
/// Uses Mifflin-St Jeor equation
#[wasm_bindgen]
pub fn calculate_tdee(
    weight_kg: f64,
    height_cm: f64,
    age_years: u32,
    is_male: bool,
    activity_multiplier: f64,
) -> f64 {
    let sex = if is_male { BiologicalSex::Male } else { BiologicalSex::Female };
    calorie_tracker_shared::calculate_tdee(
        calculate_bmr_mifflin(weight_kg, height_cm, age_years, sex),
        activity_multiplier,
    )
}

/// Convert a body weight between "kg", "lbs" and "stone"; NaN for an
/// unknown unit
#[wasm_bindgen]
pub fn convert_weight(value: f64, from: &str, to: &str) -> f64 {
    match (from.parse::<WeightUnit>(), to.parse::<WeightUnit>()) {
        (Ok(from), Ok(to)) => to.from_kg(from.to_kg(value)),
        _ => f64::NAN,
    }
}

// ============================================================================
// Tracker
// ============================================================================

#[wasm_bindgen]
pub struct Tracker {
    store: TrackerStore<MemoryStorage>,
}

#[wasm_bindgen]
impl Tracker {
    /// `stored` is the raw local-storage value, if any. A missing or
    /// unreadable catalog leaves only custom foods to pick from.
    #[wasm_bindgen(constructor)]
    pub fn new(stored: Option<String>, catalog_json: Option<String>, today: &str) -> Result<Tracker, JsValue> {
        Self::open(stored, catalog_json, today).map_err(js_error)
    }

    /// Serialized document to write back to local storage
    pub fn document(&self) -> Result<String, JsValue> {
        self.store.export().map_err(js_error)
    }

    /// Swap in a catalog fetched after construction
    pub fn load_catalog(&mut self, catalog_json: &str) -> Result<(), JsValue> {
        self.store.load_catalog_json(catalog_json).map(|_| ()).map_err(js_error)
    }

    pub fn set_today(&mut self, today: &str) -> Result<(), JsValue> {
        let today = date(today).map_err(js_error)?;
        self.store.set_today(today);
        Ok(())
    }

    pub fn catalog(&self) -> Result<String, JsValue> {
        respond(Ok(self.store.catalog()))
    }

    // Profile

    pub fn profile(&self) -> Result<String, JsValue> {
        respond(self.store.profile())
    }

    pub fn update_profile(&mut self, payload: &str) -> Result<String, JsValue> {
        respond(parse::<UpdateProfileRequest>(payload).and_then(|req| self.store.update_profile(req)))
    }

    pub fn profile_metrics(&self) -> Result<String, JsValue> {
        respond(self.store.profile_metrics())
    }

    // Foods

    pub fn add_food(&mut self, payload: &str) -> Result<String, JsValue> {
        respond(parse::<LogFoodRequest>(payload).and_then(|req| self.store.add_food(req)))
    }

    pub fn remove_food(&mut self, id: &str) -> Result<bool, JsValue> {
        self.store.remove_food(id).map_err(js_error)
    }

    pub fn foods_on(&self, day: &str) -> Result<String, JsValue> {
        respond(date(day).and_then(|d| self.store.foods_on(d)))
    }

    pub fn add_custom_food(&mut self, payload: &str) -> Result<String, JsValue> {
        respond(parse::<Food>(payload).and_then(|food| self.store.add_custom_food(food)))
    }

    pub fn remove_custom_food(&mut self, name: &str) -> Result<bool, JsValue> {
        self.store.remove_custom_food(name).map_err(js_error)
    }

    pub fn food_groups(&self) -> Result<String, JsValue> {
        respond(self.store.food_groups())
    }

    // Exercise

    pub fn add_exercise(&mut self, payload: &str) -> Result<String, JsValue> {
        respond(parse::<LogExerciseRequest>(payload).and_then(|req| self.store.add_exercise(req)))
    }

    pub fn remove_exercise(&mut self, id: &str) -> Result<bool, JsValue> {
        self.store.remove_exercise(id).map_err(js_error)
    }

    pub fn exercises_on(&self, day: &str) -> Result<String, JsValue> {
        respond(date(day).and_then(|d| self.store.exercises_on(d)))
    }

    // Weight

    pub fn upsert_weight(&mut self, day: &str, weight_kg: f64) -> Result<String, JsValue> {
        respond(date(day).and_then(|d| self.store.upsert_weight(d, weight_kg)))
    }

    pub fn remove_weight(&mut self, day: &str) -> Result<bool, JsValue> {
        date(day)
            .and_then(|d| self.store.remove_weight(d))
            .map_err(js_error)
    }

    pub fn weight_as_of(&self, day: &str) -> Result<f64, JsValue> {
        date(day)
            .and_then(|d| self.store.weight_as_of(d))
            .map_err(js_error)
    }

    // Habits

    pub fn add_habit_item(&mut self, payload: &str) -> Result<String, JsValue> {
        respond(parse::<CreateHabitItemRequest>(payload).and_then(|req| self.store.add_habit_item(req)))
    }

    pub fn remove_habit_item(&mut self, id: &str) -> Result<bool, JsValue> {
        self.store.remove_habit_item(id).map_err(js_error)
    }

    /// `values` maps habit item ids to `true`/`false` or a number
    pub fn save_habit_day(&mut self, day: &str, values: &str, kept_plan: bool) -> Result<String, JsValue> {
        respond(date(day).and_then(|d| {
            let values = parse::<BTreeMap<String, HabitValue>>(values)?;
            self.store.save_habit_day(d, values, kept_plan)
        }))
    }

    /// Entry for `day` as JSON, `null` when nothing was saved
    pub fn habit_entry_on(&self, day: &str) -> Result<String, JsValue> {
        respond(date(day).and_then(|d| self.store.habit_entry_on(d)))
    }

    pub fn habit_streak(&self, now: &str) -> Result<String, JsValue> {
        respond(date(now).and_then(|d| self.store.habit_streak(d)))
    }

    // Derived views

    pub fn summarize(&self, day: &str) -> Result<String, JsValue> {
        respond(date(day).and_then(|d| self.store.summarize(d)))
    }

    pub fn series(&self) -> Result<String, JsValue> {
        respond(self.store.series())
    }

    pub fn insights(&self, end: &str, days: u32) -> Result<String, JsValue> {
        respond(date(end).and_then(|d| self.store.insights(d, days)))
    }

    /// `now` as "HH:MM"; `null` when no fasting window is set
    pub fn fasting_status(&self, now: &str) -> Result<String, JsValue> {
        respond(
            parse_time_of_day(now)
                .map_err(|msg| TrackerError::invalid("time", msg))
                .and_then(|t| self.store.fasting_status(t)),
        )
    }

    // Users

    pub fn list_users(&self) -> Result<String, JsValue> {
        respond(Ok(self.store.list_users()))
    }

    pub fn add_user(&mut self, id: &str) -> Result<(), JsValue> {
        self.store.add_user(id).map_err(js_error)
    }

    pub fn switch_user(&mut self, id: &str) -> Result<(), JsValue> {
        self.store.switch_user(id).map_err(js_error)
    }

    pub fn remove_user(&mut self, id: &str) -> Result<(), JsValue> {
        self.store.remove_user(id).map_err(js_error)
    }

    pub fn mark_onboarded(&mut self) -> Result<(), JsValue> {
        self.store.mark_onboarded().map_err(js_error)
    }
}

impl Tracker {
    fn open(stored: Option<String>, catalog_json: Option<String>, today: &str) -> TrackerResult<Self> {
        let settings = StoreSettings::default();
        let storage = match stored {
            Some(raw) => MemoryStorage::with_value(&settings.key, raw),
            None => MemoryStorage::new(),
        };
        let catalog = match catalog_json {
            None => Catalog::builtin(),
            Some(raw) => Catalog::from_json(&raw).unwrap_or_else(|_| Catalog::empty()),
        };
        let store = TrackerStore::open(storage, settings, catalog, date(today)?)?;
        Ok(Self { store })
    }
}

fn date(value: &str) -> TrackerResult<NaiveDate> {
    parse_iso_date(value).map_err(|msg| TrackerError::invalid("date", msg))
}

fn parse<T: DeserializeOwned>(payload: &str) -> TrackerResult<T> {
    serde_json::from_str(payload).map_err(|e| TrackerError::Validation(format!("Invalid payload: {}", e)))
}

fn respond<T: Serialize>(result: TrackerResult<T>) -> Result<String, JsValue> {
    result
        .and_then(|value| Ok(serde_json::to_string(&value)?))
        .map_err(js_error)
}

/// JSON error body handed to the page
fn error_json(error: &TrackerError) -> String {
    let response = error.to_response();
    serde_json::to_string(&response).unwrap_or(response.error.message)
}

fn js_error(error: TrackerError) -> JsValue {
    JsValue::from_str(&error_json(&error))
}

// Native tests stay on success paths; building a JsValue needs a wasm host.
#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> Tracker {
        Tracker::new(None, None, "2024-03-01").unwrap()
    }

    #[test]
    fn test_moving_average() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = calculate_moving_average(&values, 3);
        assert_eq!(result.len(), 5);
        assert!((result[0] - 1.0).abs() < 0.001);
        assert!((result[2] - 2.0).abs() < 0.001); // avg of [1,2,3]
        assert!((result[4] - 4.0).abs() < 0.001); // avg of [3,4,5]
        assert!(calculate_moving_average(&values, 0).is_empty());
    }

    #[test]
    fn test_tdee() {
        let tdee = calculate_tdee(70.0, 170.0, 30, true, 1.2);
        assert!((tdee - 1941.0).abs() < 1e-9);
    }

    #[test]
    fn test_convert_weight() {
        assert!((convert_weight(14.0, "lbs", "stone") - 1.0).abs() < 1e-9);
        assert!(convert_weight(1.0, "kg", "furlong").is_nan());
    }

    #[test]
    fn test_document_round_trips_through_page_storage() {
        let mut tracker = tracker();
        let entry = tracker
            .add_food(r#"{ "date": "2024-03-01", "name": "Banana", "quantity": 1 }"#)
            .unwrap();
        assert!(entry.contains("\"kcal\":105.0"));
        tracker.upsert_weight("2024-03-01", 69.5).unwrap();

        let stored = tracker.document().unwrap();
        let reopened = Tracker::new(Some(stored.clone()), None, "2024-03-02").unwrap();
        assert_eq!(reopened.document().unwrap(), stored);
        assert_eq!(reopened.weight_as_of("2024-03-05").unwrap(), 69.5);

        let foods: serde_json::Value = serde_json::from_str(&reopened.foods_on("2024-03-01").unwrap()).unwrap();
        assert_eq!(foods.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_catalog_is_empty() {
        let tracker = Tracker::new(None, Some("{ not json".into()), "2024-03-01").unwrap();
        let catalog: serde_json::Value = serde_json::from_str(&tracker.catalog().unwrap()).unwrap();
        assert!(catalog["foods"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_habits_and_summary() {
        let mut tracker = tracker();
        let item: serde_json::Value =
            serde_json::from_str(&tracker.add_habit_item(r#"{ "name": "Water", "kind": "numeric", "unit": "L" }"#).unwrap())
                .unwrap();
        let values = format!(r#"{{ "{}": 2.5 }}"#, item["id"].as_str().unwrap());
        tracker.save_habit_day("2024-03-03", &values, false).unwrap();

        assert_ne!(tracker.habit_entry_on("2024-03-03").unwrap(), "null");
        assert_eq!(tracker.habit_entry_on("2024-03-04").unwrap(), "null");
        let streak: serde_json::Value = serde_json::from_str(&tracker.habit_streak("2024-03-05").unwrap()).unwrap();
        assert_eq!(streak["days"], 2);

        let summary: serde_json::Value = serde_json::from_str(&tracker.summarize("2024-03-03").unwrap()).unwrap();
        assert_eq!(summary["intake"], 0.0);
    }

    #[test]
    fn test_error_body() {
        let body: serde_json::Value =
            serde_json::from_str(&error_json(&TrackerError::NotFound("User 'x' not found".into()))).unwrap();
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
