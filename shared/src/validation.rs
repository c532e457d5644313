//! Input validation functions
//!
//! Boundary checks for values coming from forms, the CLI or JSON payloads.
//! Each returns a plain message; the engine attaches the field label.

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex_lite::Regex;

/// `YYYY-MM-DD`; `None` only if the pattern fails to compile
static ISO_DATE_SHAPE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").ok());

/// Validate weight value (in kg)
pub fn validate_weight(weight_kg: f64) -> Result<(), String> {
    if weight_kg.is_nan() || weight_kg.is_infinite() {
        return Err("Weight must be a valid number".to_string());
    }
    if weight_kg < 20.0 {
        return Err("Weight must be at least 20 kg".to_string());
    }
    if weight_kg > 500.0 {
        return Err("Weight must be at most 500 kg".to_string());
    }
    Ok(())
}

/// Validate calorie value
pub fn validate_calories(calories: f64) -> Result<(), String> {
    if calories.is_nan() || calories.is_infinite() {
        return Err("Calories must be a valid number".to_string());
    }
    if calories < 0.0 {
        return Err("Calories cannot be negative".to_string());
    }
    if calories > 50000.0 {
        return Err("Calorie value unreasonably high".to_string());
    }
    Ok(())
}

/// Longest insights window accepted
pub const MAX_INSIGHT_DAYS: u32 = 3650;

/// Validate the length of an insights window in days
pub fn validate_insight_days(days: u32) -> Result<(), String> {
    if days == 0 {
        return Err("Window must cover at least one day".to_string());
    }
    if days > MAX_INSIGHT_DAYS {
        return Err(format!("Window cannot exceed {} days", MAX_INSIGHT_DAYS));
    }
    Ok(())
}

/// Validate grams of one macronutrient
pub fn validate_grams(grams: f64) -> Result<(), String> {
    if grams.is_nan() || grams.is_infinite() {
        return Err("Amount must be a valid number".to_string());
    }
    if grams < 0.0 {
        return Err("Amount cannot be negative".to_string());
    }
    if grams > 5000.0 {
        return Err("Amount unreasonably high".to_string());
    }
    Ok(())
}

/// Validate a serving multiplier
pub fn validate_quantity(quantity: f64) -> Result<(), String> {
    if quantity.is_nan() || quantity.is_infinite() {
        return Err("Quantity must be a valid number".to_string());
    }
    if quantity <= 0.0 {
        return Err("Quantity must be greater than zero".to_string());
    }
    if quantity > 100.0 {
        return Err("Quantity must be at most 100 servings".to_string());
    }
    Ok(())
}

/// Validate duration in minutes
pub fn validate_duration_minutes(minutes: f64) -> Result<(), String> {
    if minutes.is_nan() || minutes.is_infinite() {
        return Err("Duration must be a valid number".to_string());
    }
    if minutes < 0.0 {
        return Err("Duration cannot be negative".to_string());
    }
    if minutes > 1440.0 {
        // 24 hours
        return Err("Duration cannot exceed 24 hours".to_string());
    }
    Ok(())
}

/// Validate a MET intensity
pub fn validate_met(met: f64) -> Result<(), String> {
    if met.is_nan() || met.is_infinite() {
        return Err("MET must be a valid number".to_string());
    }
    if met <= 0.0 {
        return Err("MET must be greater than zero".to_string());
    }
    if met > 25.0 {
        return Err("MET must be at most 25".to_string());
    }
    Ok(())
}

/// Validate a display name (food, exercise, habit)
pub fn validate_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty".to_string());
    }
    if trimmed.chars().count() > 120 {
        return Err("Name too long".to_string());
    }
    Ok(())
}

/// User ids become document keys and file-friendly labels
pub fn validate_user_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("User id cannot be empty".to_string());
    }
    if id.len() > 64 {
        return Err("User id too long".to_string());
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("User id may only contain letters, digits, '-' and '_'".to_string());
    }
    Ok(())
}

// ============================================================================
// Profile Validation
// ============================================================================

/// Validate height value (in cm)
/// Valid range: 50-300 cm (covers infants to tallest recorded humans)
pub fn validate_height_cm(height_cm: f64) -> Result<(), String> {
    if height_cm.is_nan() || height_cm.is_infinite() {
        return Err("Height must be a valid number".to_string());
    }
    if height_cm < 50.0 {
        return Err("Height must be at least 50 cm".to_string());
    }
    if height_cm > 300.0 {
        return Err("Height must be at most 300 cm".to_string());
    }
    Ok(())
}

pub fn validate_age(age: u32) -> Result<(), String> {
    if age > 150 {
        return Err("Age cannot exceed 150 years".to_string());
    }
    Ok(())
}

/// Validate the daily deficit goal (kcal)
pub fn validate_deficit(deficit: f64) -> Result<(), String> {
    if deficit.is_nan() || deficit.is_infinite() {
        return Err("Deficit must be a valid number".to_string());
    }
    if deficit < 0.0 {
        return Err("Deficit cannot be negative".to_string());
    }
    if deficit > 5000.0 {
        return Err("Deficit must be at most 5000 kcal".to_string());
    }
    Ok(())
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a strict `YYYY-MM-DD` calendar date
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, String> {
    let value = value.trim();
    let shape = ISO_DATE_SHAPE
        .as_ref()
        .ok_or_else(|| "Date pattern unavailable".to_string())?;
    if !shape.is_match(value) {
        return Err(format!("Expected a date like 2024-01-31, got '{}'", value));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("'{}' is not a calendar date", value))
}

/// Parse `HH:MM` (seconds tolerated)
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, String> {
    crate::models::hhmm::parse(value)
        .ok_or_else(|| format!("Expected a time like 07:30, got '{}'", value.trim()))
}

/// Round to one decimal, the precision stored for derived energy values
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ============================================================================
// User-Friendly Field Labels
// ============================================================================

/// Map technical field names to user-friendly display labels
pub fn get_field_display_label(field_name: &str) -> &str {
    match field_name {
        "weight" | "weight_kg" => "Current Weight",
        "initial_weight_kg" => "Initial Weight",
        "height" | "height_cm" => "Height",
        "age" => "Age",
        "activity_level" => "Activity Level",
        "target_deficit" => "Daily Deficit",
        "fasting_start" => "Fasting Start",
        "fasting_end" => "Fasting End",
        "fasting_window" => "Fasting Window",
        "habit" => "Habit",
        "date" => "Date",
        "time" => "Time",
        "name" => "Name",
        "quantity" => "Quantity",
        "kcal" => "Calories",
        "protein" => "Protein",
        "fat" => "Fat",
        "carbs" => "Carbs",
        "alcohol" => "Alcohol",
        "fiber" => "Fiber",
        "label" => "Exercise",
        "met" => "Intensity (MET)",
        "duration_min" => "Duration",
        "kcal_burn" => "Calories Burned",
        "sets" => "Sets",
        "reps" => "Reps",
        "load_kg" => "Load",
        "user_id" => "User",
        "days" => "Days",
        _ => field_name,
    }
}

/// Validation error with field context
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub display_label: String,
}

impl ValidationError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
            display_label: get_field_display_label(field).to_string(),
        }
    }

    /// Format as user-friendly error message
    pub fn user_message(&self) -> String {
        format!("{}: {}", self.display_label, self.message)
    }
}
