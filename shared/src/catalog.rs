//! Reference catalog of foods, activities and strength exercises
//!
//! The catalog is read-only. It is loaded once from a JSON resource or a CSV
//! food table, or falls back to the built-in sample data below.

use crate::errors::CatalogError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};

/// A selectable food, per serving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure: Option<String>,
    #[serde(default)]
    pub kcal: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub carbs: f64,
}

/// A cardio or general activity with its MET intensity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub label: String,
    #[serde(default)]
    pub category: String,
    pub met: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthExercise {
    pub name: String,
    /// Muscle group
    #[serde(default)]
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine: Option<String>,
    pub met: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub foods: Vec<Food>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub exercises: Vec<StrengthExercise>,
}

/// Built once, cloned out on request
static BUILTIN_CATALOG: Lazy<Catalog> = Lazy::new(build_builtin_catalog);

impl Catalog {
    /// An empty catalog; lookups fall back to custom foods and manual entry
    pub fn empty() -> Self {
        Self::default()
    }

    /// The bundled sample catalog
    pub fn builtin() -> Self {
        BUILTIN_CATALOG.clone()
    }

    /// Parse the `{ foods, activities, exercises? }` resource
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Parse a CSV food table
    ///
    /// Header: `food` (or `name`), optional `measure` and `category`, then
    /// `kcal`, `protein`, `fat`, `carbs`. Header names are case-insensitive;
    /// empty or unparseable numeric cells read as 0.
    pub fn from_csv(raw: &str) -> Result<Self, CatalogError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(raw.as_bytes());

        let headers: csv::StringRecord = reader
            .headers()?
            .iter()
            .map(|h| h.to_lowercase())
            .collect();
        reader.set_headers(headers);

        let mut foods = Vec::new();
        for row in reader.deserialize::<CsvFoodRow>() {
            let row = row?;
            if row.food.is_empty() {
                continue;
            }
            foods.push(Food {
                name: row.food,
                category: row.category.unwrap_or_default(),
                measure: row.measure.filter(|m| !m.is_empty()),
                kcal: row.kcal,
                protein: row.protein,
                fat: row.fat,
                carbs: row.carbs,
            });
        }

        Ok(Self {
            foods,
            ..Self::default()
        })
    }

    /// Pick the parser from a file extension
    pub fn from_path(path: &std::path::Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
            Some("json") => Self::from_json(&raw),
            Some("csv") => Self::from_csv(&raw),
            other => Err(CatalogError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty() && self.activities.is_empty() && self.exercises.is_empty()
    }

    /// Case-insensitive food lookup by name
    pub fn find_food(&self, name: &str) -> Option<&Food> {
        let needle = name.trim();
        self.foods.iter().find(|f| f.name.eq_ignore_ascii_case(needle))
    }

    pub fn find_activity(&self, label: &str) -> Option<&Activity> {
        let needle = label.trim();
        self.activities
            .iter()
            .find(|a| a.label.eq_ignore_ascii_case(needle))
    }

    pub fn find_exercise(&self, name: &str) -> Option<&StrengthExercise> {
        let needle = name.trim();
        self.exercises
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(needle))
    }

    /// MET for an activity label or strength exercise name
    pub fn met_for(&self, label: &str) -> Option<f64> {
        self.find_activity(label)
            .map(|a| a.met)
            .or_else(|| self.find_exercise(label).map(|e| e.met))
    }
}

#[derive(Debug, Deserialize)]
struct CsvFoodRow {
    #[serde(alias = "name")]
    food: String,
    #[serde(default)]
    measure: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    kcal: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    protein: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    fat: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    carbs: f64,
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .unwrap_or(0.0))
}

fn food(name: &str, category: &str, measure: &str, kcal: f64, protein: f64, fat: f64, carbs: f64) -> Food {
    Food {
        name: name.into(),
        category: category.into(),
        measure: Some(measure.into()),
        kcal,
        protein,
        fat,
        carbs,
    }
}

fn activity(label: &str, category: &str, met: f64) -> Activity {
    Activity {
        label: label.into(),
        category: category.into(),
        met,
    }
}

fn strength(name: &str, group: &str, machine: Option<&str>, met: f64) -> StrengthExercise {
    StrengthExercise {
        name: name.into(),
        group: group.into(),
        machine: machine.map(Into::into),
        met,
    }
}

fn build_builtin_catalog() -> Catalog {
    let foods = vec![
        food("Grilled chicken breast", "Protein", "100 g", 165.0, 31.0, 3.6, 0.0),
        food("Eggs", "Protein", "2 large", 143.0, 12.6, 9.5, 0.7),
        food("Brown rice", "Grains", "1 cup cooked", 216.0, 5.0, 1.8, 45.0),
        food("Oats", "Grains", "40 g", 150.0, 5.0, 2.5, 27.0),
        food("Greek yogurt", "Dairy", "170 g", 100.0, 17.0, 0.0, 6.0),
        food("Banana", "Fruit", "1 medium", 105.0, 1.3, 0.4, 27.0),
        food("Apple", "Fruit", "1 medium", 95.0, 0.5, 0.3, 25.0),
        food("Olive oil", "Fats", "1 tbsp", 119.0, 0.0, 13.5, 0.0),
        food("Protein shake", "Supplements", "1 scoop", 120.0, 24.0, 2.0, 3.0),
    ];

    let activities = vec![
        activity("Walking", "Cardio", 3.5),
        activity("Jogging (10 min/mile)", "Cardio", 9.8),
        activity("Cycling", "Cardio", 7.5),
        activity("Swimming", "Cardio", 6.0),
        activity("Rowing", "Cardio", 7.0),
        activity("Strength training", "Strength", 5.0),
        activity("Yoga", "Flexibility", 2.5),
    ];

    let exercises = vec![
        strength("Bench press", "Chest", Some("Barbell"), 5.0),
        strength("Back squat", "Legs", Some("Barbell"), 5.0),
        strength("Deadlift", "Back", Some("Barbell"), 6.0),
        strength("Lat pulldown", "Back", Some("Cable machine"), 3.5),
        strength("Leg press", "Legs", Some("Leg press machine"), 3.5),
        strength("Shoulder press", "Shoulders", Some("Dumbbells"), 3.5),
        strength("Push-up", "Chest", None, 3.8),
    ];

    Catalog {
        foods,
        activities,
        exercises,
    }
}
