//! Energy model
//!
//! Provides the calculations behind every figure the tracker shows: basal
//! metabolic rate, total daily energy expenditure, exercise burn and
//! macro-derived food energy.
//!
//! # Design Principles
//!
//! 1. **Pure Functions**: All calculations are pure, no side effects
//! 2. **No Clamping**: Out-of-range inputs produce out-of-range outputs;
//!    sanitizing is the caller's job
//! 3. **Type Safety**: Sex and activity level are enums, not strings

use crate::models::Profile;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kilocalories of net energy balance per pound of body weight
pub const KCAL_PER_POUND: f64 = 3500.0;

/// Pound to kilogram factor used by the weight projection
pub const KG_PER_POUND: f64 = 0.4536;

// ============================================================================
// Profile Enums
// ============================================================================

/// Biological sex for the BMR offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BiologicalSex {
    #[default]
    #[serde(rename = "Male", alias = "male", alias = "M")]
    Male,
    #[serde(rename = "Female", alias = "female", alias = "F")]
    Female,
}

impl BiologicalSex {
    /// Constant term of the Mifflin-St Jeor equation
    pub fn bmr_offset(&self) -> f64 {
        match self {
            BiologicalSex::Male => 5.0,
            BiologicalSex::Female => -161.0,
        }
    }
}

impl fmt::Display for BiologicalSex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BiologicalSex::Male => write!(f, "Male"),
            BiologicalSex::Female => write!(f, "Female"),
        }
    }
}

impl std::str::FromStr for BiologicalSex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(BiologicalSex::Male),
            "female" | "f" => Ok(BiologicalSex::Female),
            _ => Err(format!("Unknown biological sex: {}", s)),
        }
    }
}

/// Activity level for TDEE calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise
    #[default]
    Sedentary,
    /// Light exercise 1-3 days/week
    LightlyActive,
    /// Moderate exercise 3-5 days/week
    ModeratelyActive,
    /// Hard exercise 6-7 days/week
    VeryActive,
    /// Very hard exercise, physical job
    ExtraActive,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 5] = [
        ActivityLevel::Sedentary,
        ActivityLevel::LightlyActive,
        ActivityLevel::ModeratelyActive,
        ActivityLevel::VeryActive,
        ActivityLevel::ExtraActive,
    ];

    /// Get the activity multiplier for TDEE calculation
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtraActive => 1.9,
        }
    }

    /// Short label shown next to TDEE
    pub fn label(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "Sedentary",
            ActivityLevel::LightlyActive => "Lightly active",
            ActivityLevel::ModeratelyActive => "Moderately active",
            ActivityLevel::VeryActive => "Very active",
            ActivityLevel::ExtraActive => "Extra active",
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "Little or no exercise",
            ActivityLevel::LightlyActive => "Light exercise 1-3 days/week",
            ActivityLevel::ModeratelyActive => "Moderate exercise 3-5 days/week",
            ActivityLevel::VeryActive => "Hard exercise 6-7 days/week",
            ActivityLevel::ExtraActive => "Very hard exercise or physical job",
        }
    }

    /// Map a stored multiplier back to its level
    pub fn from_multiplier(multiplier: f64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| (level.multiplier() - multiplier).abs() < 1e-9)
    }
}

impl std::str::FromStr for ActivityLevel {
    type Err = String;

    /// Accepts the snake_case names plus the labels older documents used
    /// ("Light", "Moderate", "Intense", "Extra", "Lightly active", ...)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "light" | "lightly_active" => Ok(ActivityLevel::LightlyActive),
            "moderate" | "moderately_active" => Ok(ActivityLevel::ModeratelyActive),
            "intense" | "very_active" => Ok(ActivityLevel::VeryActive),
            "extra" | "extra_active" => Ok(ActivityLevel::ExtraActive),
            _ => Err(format!("Unknown activity level: {}", s)),
        }
    }
}

// ============================================================================
// BMR and TDEE Calculations
// ============================================================================

/// Calculate Basal Metabolic Rate using Mifflin-St Jeor equation
///
/// Men: BMR = 10 × weight(kg) + 6.25 × height(cm) - 5 × age(y) + 5
/// Women: BMR = 10 × weight(kg) + 6.25 × height(cm) - 5 × age(y) - 161
pub fn calculate_bmr_mifflin(weight_kg: f64, height_cm: f64, age_years: u32, sex: BiologicalSex) -> f64 {
    10.0 * weight_kg + 6.25 * height_cm - 5.0 * age_years as f64 + sex.bmr_offset()
}

/// BMR of a profile at its current baseline weight
pub fn calculate_bmr(profile: &Profile) -> f64 {
    calculate_bmr_mifflin(profile.weight_kg, profile.height_cm, profile.age, profile.sex)
}

/// BMR of a profile with the weight replaced by the one known on some date
pub fn calculate_bmr_at_weight(profile: &Profile, weight_kg: f64) -> f64 {
    calculate_bmr_mifflin(weight_kg, profile.height_cm, profile.age, profile.sex)
}

/// Calculate Total Daily Energy Expenditure
///
/// TDEE = BMR × Activity Multiplier
pub fn calculate_tdee(bmr: f64, activity_multiplier: f64) -> f64 {
    bmr * activity_multiplier
}

/// TDEE calculation result with breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TdeeResult {
    /// Basal Metabolic Rate
    pub bmr: f64,
    /// Total Daily Energy Expenditure
    pub tdee: f64,
    /// Activity multiplier used
    pub activity_multiplier: f64,
    /// Daily intake that meets the profile's deficit target, never below zero
    pub target_intake: f64,
}

/// Calculate complete TDEE result for a profile
pub fn calculate_tdee_result(profile: &Profile) -> TdeeResult {
    let bmr = calculate_bmr(profile);
    let multiplier = profile.activity_level.multiplier();
    let tdee = calculate_tdee(bmr, multiplier);

    TdeeResult {
        bmr,
        tdee,
        activity_multiplier: multiplier,
        target_intake: (tdee - profile.target_deficit).max(0.0),
    }
}

// ============================================================================
// Food and Exercise Energy
// ============================================================================

/// Food energy from macronutrient grams using Atwater factors
///
/// protein 4, carbs 4, fat 9, alcohol 7, fiber 2 kcal per gram
pub fn kcal_from_macros(protein: f64, fat: f64, carbs: f64, alcohol: f64, fiber: f64) -> f64 {
    protein * 4.0 + carbs * 4.0 + fat * 9.0 + alcohol * 7.0 + fiber * 2.0
}

/// Exercise energy from MET intensity
///
/// kcal/min = MET × 3.5 × weight(kg) / 200
pub fn exercise_kcal(met: f64, duration_minutes: f64, weight_kg: f64) -> f64 {
    met * 3.5 * weight_kg / 200.0 * duration_minutes
}

/// Body weight change implied by an energy balance
///
/// A positive deficit yields a positive number of kilograms lost.
pub fn deficit_to_kg(deficit_kcal: f64) -> f64 {
    deficit_kcal / KCAL_PER_POUND * KG_PER_POUND
}
