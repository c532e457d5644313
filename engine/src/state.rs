//! Tracker state management
//!
//! `TrackerStore` owns the migrated document, the catalog and a storage
//! backend. Reads go straight to the active user; every mutation is applied
//! to a draft copy, the whole document is written, and only then does the
//! draft replace the live document. A failed write leaves both unchanged.

use crate::config::AppConfig;
use crate::error::{check, TrackerError, TrackerResult};
use crate::migration::{load_document, MigrationContext};
use crate::services::{
    ExerciseService, FastingService, FoodLogService, HabitService, InsightsService,
    PredictionService, ProfileService, SummaryService, UserService, WeightService,
};
use crate::storage::KeyValueStorage;
use calorie_tracker_shared::{
    Catalog, CreateHabitItemRequest, DailySummary, Document, ExerciseEntry, FastingStatus, Food,
    FoodEntry, FoodGroup, HabitEntry, HabitItem, HabitValue, Insights, LogExerciseRequest,
    LogFoodRequest, Profile, ProfileMetrics, SeriesPoint, StreakInfo, UpdateProfileRequest, User,
    UserListing, WeightSample,
};
use calorie_tracker_shared::validation::validate_insight_days;
use chrono::{NaiveDate, NaiveTime};
use std::collections::BTreeMap;
use tracing::info;

/// Store settings taken from the application configuration
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Storage key of the document
    pub key: String,
    pub default_profile: Profile,
    pub recent_limit: usize,
}

impl From<&AppConfig> for StoreSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            key: config.storage.key.clone(),
            default_profile: config.defaults.profile.clone(),
            recent_limit: config.recent.limit,
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// The tracker document bound to its storage
pub struct TrackerStore<S: KeyValueStorage> {
    storage: S,
    settings: StoreSettings,
    document: Document,
    catalog: Catalog,
    today: NaiveDate,
}

impl<S: KeyValueStorage> TrackerStore<S> {
    /// Read, migrate and (when migration changed anything) rewrite the
    /// stored document
    pub fn open(storage: S, settings: StoreSettings, catalog: Catalog, today: NaiveDate) -> TrackerResult<Self> {
        let raw = storage.get(&settings.key)?;
        let ctx = MigrationContext {
            today,
            default_profile: &settings.default_profile,
            catalog: &catalog,
        };
        let document = load_document(raw.as_deref(), &ctx);

        let mut store = Self {
            storage,
            settings,
            document,
            catalog,
            today,
        };

        let serialized = serde_json::to_string(&store.document)?;
        if raw.as_deref() != Some(serialized.as_str()) {
            store.storage.set(&store.settings.key, &serialized)?;
            info!(key = %store.settings.key, "Stored document written after migration");
        }

        Ok(store)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Date used when a new user needs a streak anchor
    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    /// Replace the catalog with one decoded from the JSON resource; the
    /// current catalog stays when decoding fails
    pub fn load_catalog_json(&mut self, raw: &str) -> TrackerResult<&Catalog> {
        self.catalog = Catalog::from_json(raw)?;
        Ok(&self.catalog)
    }

    /// Serialized document, as persisted
    pub fn export(&self) -> TrackerResult<String> {
        Ok(serde_json::to_string(&self.document)?)
    }

    pub fn active_user(&self) -> TrackerResult<&User> {
        self.document
            .active_user()
            .ok_or_else(|| missing_active_user(&self.document.active_user_id))
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    fn commit<T>(&mut self, op: impl FnOnce(&mut Document, &Catalog) -> TrackerResult<T>) -> TrackerResult<T> {
        let mut draft = self.document.clone();
        let output = op(&mut draft, &self.catalog)?;
        self.write(draft)?;
        Ok(output)
    }

    fn commit_user<T>(
        &mut self,
        op: impl FnOnce(&mut User, &Catalog, usize) -> TrackerResult<T>,
    ) -> TrackerResult<T> {
        let limit = self.settings.recent_limit;
        self.commit(|doc, catalog| op(active_user_mut(doc)?, catalog, limit))
    }

    /// Removals report whether anything matched; nothing is written otherwise
    fn commit_removal(&mut self, op: impl FnOnce(&mut User) -> bool) -> TrackerResult<bool> {
        let mut draft = self.document.clone();
        if !op(active_user_mut(&mut draft)?) {
            return Ok(false);
        }
        self.write(draft)?;
        Ok(true)
    }

    fn write(&mut self, draft: Document) -> TrackerResult<()> {
        let serialized = serde_json::to_string(&draft)?;
        self.storage.set(&self.settings.key, &serialized)?;
        info!(bytes = serialized.len(), "Document saved");
        self.document = draft;
        Ok(())
    }

    // ========================================================================
    // Profile
    // ========================================================================

    pub fn profile(&self) -> TrackerResult<&Profile> {
        Ok(&self.active_user()?.profile)
    }

    pub fn update_profile(&mut self, request: UpdateProfileRequest) -> TrackerResult<Profile> {
        self.commit_user(|user, _, _| {
            user.profile = ProfileService::update(&user.profile, request)?;
            Ok(user.profile.clone())
        })
    }

    pub fn profile_metrics(&self) -> TrackerResult<ProfileMetrics> {
        Ok(ProfileService::metrics(self.profile()?))
    }

    // ========================================================================
    // Foods
    // ========================================================================

    pub fn add_food(&mut self, request: LogFoodRequest) -> TrackerResult<FoodEntry> {
        self.commit_user(|user, catalog, limit| FoodLogService::add_food(user, catalog, request, limit))
    }

    pub fn remove_food(&mut self, id: &str) -> TrackerResult<bool> {
        self.commit_removal(|user| FoodLogService::remove_food(user, id))
    }

    pub fn foods_on(&self, date: NaiveDate) -> TrackerResult<Vec<FoodEntry>> {
        Ok(FoodLogService::foods_on(self.active_user()?, date))
    }

    pub fn add_custom_food(&mut self, food: Food) -> TrackerResult<Food> {
        self.commit_user(|user, _, _| FoodLogService::add_custom_food(user, food))
    }

    pub fn remove_custom_food(&mut self, name: &str) -> TrackerResult<bool> {
        self.commit_removal(|user| FoodLogService::remove_custom_food(user, name))
    }

    pub fn food_groups(&self) -> TrackerResult<Vec<FoodGroup>> {
        Ok(FoodLogService::food_groups(self.active_user()?, &self.catalog))
    }

    // ========================================================================
    // Exercise
    // ========================================================================

    pub fn add_exercise(&mut self, request: LogExerciseRequest) -> TrackerResult<ExerciseEntry> {
        self.commit_user(|user, catalog, limit| ExerciseService::add_exercise(user, catalog, request, limit))
    }

    pub fn remove_exercise(&mut self, id: &str) -> TrackerResult<bool> {
        self.commit_removal(|user| ExerciseService::remove_exercise(user, id))
    }

    pub fn exercises_on(&self, date: NaiveDate) -> TrackerResult<Vec<ExerciseEntry>> {
        Ok(ExerciseService::exercises_on(self.active_user()?, date))
    }

    // ========================================================================
    // Weight
    // ========================================================================

    pub fn upsert_weight(&mut self, date: NaiveDate, weight_kg: f64) -> TrackerResult<WeightSample> {
        self.commit_user(|user, _, _| WeightService::upsert_weight(user, date, weight_kg))
    }

    pub fn remove_weight(&mut self, date: NaiveDate) -> TrackerResult<bool> {
        self.commit_removal(|user| WeightService::remove_weight(user, date))
    }

    pub fn weight_as_of(&self, date: NaiveDate) -> TrackerResult<f64> {
        Ok(WeightService::weight_as_of(self.active_user()?, date))
    }

    // ========================================================================
    // Habits
    // ========================================================================

    pub fn add_habit_item(&mut self, request: CreateHabitItemRequest) -> TrackerResult<HabitItem> {
        self.commit_user(|user, _, _| HabitService::add_item(user, request))
    }

    pub fn remove_habit_item(&mut self, id: &str) -> TrackerResult<bool> {
        self.commit_removal(|user| HabitService::remove_item(user, id))
    }

    pub fn save_habit_day(
        &mut self,
        date: NaiveDate,
        values: BTreeMap<String, HabitValue>,
        kept_plan: bool,
    ) -> TrackerResult<HabitEntry> {
        self.commit_user(|user, _, _| HabitService::save_day(user, date, values, kept_plan))
    }

    pub fn habit_entry_on(&self, date: NaiveDate) -> TrackerResult<Option<HabitEntry>> {
        Ok(HabitService::entry_on(self.active_user()?, date).cloned())
    }

    pub fn habit_streak(&self, now: NaiveDate) -> TrackerResult<StreakInfo> {
        Ok(HabitService::streak(self.active_user()?, now))
    }

    // ========================================================================
    // Derived views
    // ========================================================================

    pub fn summarize(&self, date: NaiveDate) -> TrackerResult<DailySummary> {
        Ok(SummaryService::summarize(self.active_user()?, date, self.today))
    }

    pub fn series(&self) -> TrackerResult<Vec<SeriesPoint>> {
        Ok(PredictionService::build_series(self.active_user()?, self.today))
    }

    pub fn predicted_weight_on(&self, date: NaiveDate) -> TrackerResult<f64> {
        Ok(PredictionService::predicted_weight_on(self.active_user()?, date, self.today))
    }

    pub fn insights(&self, end: NaiveDate, days: u32) -> TrackerResult<Insights> {
        check("days", validate_insight_days(days))?;
        Ok(InsightsService::insights(self.active_user()?, end, days))
    }

    pub fn fasting_status(&self, now: NaiveTime) -> TrackerResult<Option<FastingStatus>> {
        Ok(FastingService::status(self.profile()?, now))
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub fn list_users(&self) -> Vec<UserListing> {
        UserService::list(&self.document)
    }

    /// New users start from the configured default profile
    pub fn add_user(&mut self, id: &str) -> TrackerResult<()> {
        let profile = self.settings.default_profile.clone();
        let today = self.today;
        self.commit(|doc, _| UserService::add_user(doc, id, profile, today))
    }

    pub fn switch_user(&mut self, id: &str) -> TrackerResult<()> {
        if self.document.active_user_id == id {
            return Ok(());
        }
        self.commit(|doc, _| UserService::switch_user(doc, id))
    }

    pub fn remove_user(&mut self, id: &str) -> TrackerResult<()> {
        self.commit(|doc, _| UserService::remove_user(doc, id))
    }

    pub fn mark_onboarded(&mut self) -> TrackerResult<()> {
        if self.document.onboarded {
            return Ok(());
        }
        self.commit(|doc, _| {
            UserService::mark_onboarded(doc);
            Ok(())
        })
    }
}

fn active_user_mut(doc: &mut Document) -> TrackerResult<&mut User> {
    let Document {
        active_user_id,
        users,
        ..
    } = doc;
    users
        .get_mut(active_user_id.as_str())
        .ok_or_else(|| missing_active_user(active_user_id.as_str()))
}

// Migration always leaves the active user in place
fn missing_active_user(id: &str) -> TrackerError {
    TrackerError::Internal(anyhow::anyhow!("active user '{}' missing from document", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use calorie_tracker_shared::StorageError;

    const KEY: &str = "calorie-tracker-state-v2";

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    /// Counts writes and can be told to fail them
    #[derive(Default)]
    struct RecordingStorage {
        inner: MemoryStorage,
        writes: usize,
        fail_writes: bool,
    }

    impl KeyValueStorage for RecordingStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.fail_writes {
                return Err(StorageError::Unavailable("quota exceeded".into()));
            }
            self.writes += 1;
            self.inner.set(key, value)
        }
    }

    fn open() -> TrackerStore<RecordingStorage> {
        TrackerStore::open(
            RecordingStorage::default(),
            StoreSettings::default(),
            Catalog::builtin(),
            day(1),
        )
        .unwrap()
    }

    #[test]
    fn test_open_empty_storage_writes_fresh_document() {
        let store = open();
        assert_eq!(store.storage().writes, 1);
        let stored = store.storage().get(KEY).unwrap().unwrap();
        assert_eq!(stored, store.export().unwrap());
    }

    #[test]
    fn test_open_current_document_does_not_rewrite() {
        let first = open();
        let raw = first.export().unwrap();

        let storage = RecordingStorage {
            inner: MemoryStorage::with_value(KEY, raw.clone()),
            ..RecordingStorage::default()
        };
        let second = TrackerStore::open(storage, StoreSettings::default(), Catalog::builtin(), day(1)).unwrap();
        assert_eq!(second.storage().writes, 0);
        assert_eq!(second.export().unwrap(), raw);
    }

    #[test]
    fn test_mutation_persists() {
        let mut store = open();
        let entry = store.add_food(LogFoodRequest::named(day(2), "Banana", 2.0)).unwrap();
        assert_eq!(entry.kcal, 210.0);
        assert_eq!(store.storage().writes, 2);

        let stored = store.storage().get(KEY).unwrap().unwrap();
        assert!(stored.contains(&entry.id));
    }

    #[test]
    fn test_rejected_input_writes_nothing() {
        let mut store = open();
        let result = store.upsert_weight(day(2), -5.0);
        assert!(matches!(result, Err(TrackerError::Validation(_))));
        assert_eq!(store.storage().writes, 1);
    }

    #[test]
    fn test_insights_window_bounds() {
        let store = open();
        assert!(store.insights(day(1), 30).is_ok());
        assert!(matches!(store.insights(day(1), 0), Err(TrackerError::Validation(_))));
        assert!(matches!(store.insights(day(1), u32::MAX), Err(TrackerError::Validation(_))));
    }

    #[test]
    fn test_load_catalog_json() {
        let mut store = open();
        let err = store.load_catalog_json("{ not json").unwrap_err();
        assert_eq!(err.code(), "CATALOG_ERROR");
        assert!(store.catalog().find_food("Banana").is_some());

        let catalog = store
            .load_catalog_json(r#"{ "foods": [{ "name": "Skyr", "category": "Dairy", "kcal": 63, "protein": 11, "fat": 0.2, "carbs": 4 }], "activities": [] }"#)
            .unwrap();
        assert_eq!(catalog.foods.len(), 1);
        assert!(store.catalog().find_food("Banana").is_none());
    }

    #[test]
    fn test_unknown_removal_writes_nothing() {
        let mut store = open();
        assert!(!store.remove_food("nope").unwrap());
        assert!(!store.remove_weight(day(9)).unwrap());
        assert_eq!(store.storage().writes, 1);
    }

    #[test]
    fn test_failed_write_keeps_document() {
        let mut store = open();
        store.storage.fail_writes = true;

        let result = store.upsert_weight(day(2), 75.0);
        assert!(matches!(result, Err(TrackerError::Storage(_))));
        assert!(store.active_user().unwrap().weights.is_empty());
        assert_eq!(store.profile().unwrap().weight_kg, 70.0);
    }

    #[test]
    fn test_user_operations_persist() {
        let mut store = open();
        store.add_user("alex").unwrap();
        store.switch_user("alex").unwrap();
        store.upsert_weight(day(3), 64.0).unwrap();

        assert_eq!(store.document().active_user_id, "alex");
        assert_eq!(store.document().users["default"].weights.len(), 0);
        assert_eq!(store.active_user().unwrap().weights.len(), 1);

        let writes = store.storage().writes;
        store.switch_user("alex").unwrap();
        store.mark_onboarded().unwrap();
        store.mark_onboarded().unwrap();
        assert_eq!(store.storage().writes, writes + 1);
    }
}
