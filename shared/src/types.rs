//! Request payloads accepted by the engine and the snapshots it returns
//!
//! Snapshots are owned values with snake_case keys; hosts serialize them
//! straight to JSON.

use crate::catalog::Food;
use crate::health_metrics::{ActivityLevel, BiologicalSex};
use crate::models::{hhmm, HabitKind};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Error payload handed to hosts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

// ============================================================================
// Log Requests
// ============================================================================

/// Log a food, either by catalog/custom food name or with manual numbers
///
/// Manual numbers override the looked-up food field by field. `kcal` wins
/// when positive; otherwise it is derived from the macros.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogFoodRequest {
    pub date: NaiveDate,
    #[serde(default, with = "hhmm::option")]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub name: String,
    pub quantity: Option<f64>,
    pub kcal: Option<f64>,
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
    pub alcohol: Option<f64>,
    pub fiber: Option<f64>,
    pub measure: Option<String>,
}

impl LogFoodRequest {
    /// A catalog or custom food by name
    pub fn named(date: NaiveDate, name: impl Into<String>, quantity: f64) -> Self {
        Self {
            date,
            time: None,
            name: name.into(),
            quantity: Some(quantity),
            kcal: None,
            protein: None,
            fat: None,
            carbs: None,
            alcohol: None,
            fiber: None,
            measure: None,
        }
    }

    /// Manual entry from macro grams
    pub fn manual(date: NaiveDate, name: impl Into<String>, protein: f64, fat: f64, carbs: f64) -> Self {
        Self {
            protein: Some(protein),
            fat: Some(fat),
            carbs: Some(carbs),
            ..Self::named(date, name, 1.0)
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StrengthInput {
    pub sets: u32,
    pub reps: u32,
    #[serde(default)]
    pub load_kg: f64,
}

/// Log an exercise
///
/// Duration comes from `duration_min`, or from `time` and `end_time` when
/// both are given. MET falls back to the catalog entry for the label, then
/// to 3.5.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogExerciseRequest {
    pub date: NaiveDate,
    #[serde(default, with = "hhmm::option")]
    pub time: Option<NaiveTime>,
    #[serde(default, with = "hhmm::option")]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub label: String,
    pub met: Option<f64>,
    pub duration_min: Option<f64>,
    pub kcal_burn: Option<f64>,
    pub distance_km: Option<f64>,
    pub incline_pct: Option<f64>,
    pub strength: Option<StrengthInput>,
}

impl LogExerciseRequest {
    pub fn cardio(date: NaiveDate, label: impl Into<String>, duration_min: f64) -> Self {
        Self {
            date,
            time: None,
            end_time: None,
            label: label.into(),
            met: None,
            duration_min: Some(duration_min),
            kcal_burn: None,
            distance_km: None,
            incline_pct: None,
            strength: None,
        }
    }
}

/// Partial profile update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub age: Option<u32>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub sex: Option<BiologicalSex>,
    pub activity_level: Option<ActivityLevel>,
    pub target_deficit: Option<f64>,
    #[serde(default, with = "hhmm::option")]
    pub fasting_start: Option<NaiveTime>,
    #[serde(default, with = "hhmm::option")]
    pub fasting_end: Option<NaiveTime>,
    /// Removes the fasting window
    #[serde(default)]
    pub clear_fasting_window: bool,
    pub initial_weight_kg: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHabitItemRequest {
    pub name: String,
    #[serde(default)]
    pub kind: HabitKind,
    pub unit: Option<String>,
}

// ============================================================================
// Snapshots
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroTotals {
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub alcohol: f64,
    pub fiber: f64,
}

/// Energy balance of one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub intake: f64,
    pub macros: MacroTotals,
    pub exercise_burn: f64,
    /// TDEE at the weight known on this date
    pub base_burn: f64,
    pub total_burn: f64,
    /// base + exercise - intake
    pub deficit: f64,
    pub weight_delta_kg: f64,
    pub predicted_weight: f64,
    pub weight_kg: f64,
    pub weekly_change: f64,
    pub monthly_change: f64,
    pub target_intake: f64,
    pub remaining: f64,
    /// intake - exercise burn
    pub net: f64,
}

/// One date of the weight projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub deficit: f64,
    pub predicted: f64,
    pub actual: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileMetrics {
    pub bmr: f64,
    pub tdee: f64,
    pub activity_multiplier: f64,
    pub activity_label: String,
    pub activity_description: String,
    pub target_intake: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAveragePoint {
    pub date: NaiveDate,
    pub weight_kg: f64,
}

/// Trends over a trailing window of days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: u32,
    /// Days with any intake or exercise logged
    pub days_logged: u32,
    /// Mean deficit over logged days
    pub average_deficit: Option<f64>,
    /// Mean of intake - exercise burn over logged days
    pub average_net: Option<f64>,
    pub weight_change: Option<f64>,
    pub weight_change_pct: Option<f64>,
    pub moving_average: Vec<MovingAveragePoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FastingPhase {
    Fasting,
    Eating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastingStatus {
    pub phase: FastingPhase,
    /// Minutes until the phase flips
    pub minutes_until_change: i64,
    #[serde(with = "hhmm")]
    pub window_start: NaiveTime,
    #[serde(with = "hhmm")]
    pub window_end: NaiveTime,
}

/// Foods offered for selection under one heading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodGroup {
    pub name: String,
    pub foods: Vec<Food>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserListing {
    pub id: String,
    pub active: bool,
    pub weight_kg: f64,
    pub foods: usize,
    pub exercises: usize,
    pub weights: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakInfo {
    pub streak_start: NaiveDate,
    pub days: i64,
}
