//! Calorie Tracker Shared Library
//!
//! This crate contains the persisted data model, the energy-balance
//! arithmetic, the reference catalog and boundary validation shared by the
//! engine, the command-line host and the WASM module.

pub mod catalog;
pub mod errors;
pub mod health_metrics;
pub mod models;
pub mod types;
pub mod units;
pub mod validation;

// Re-export commonly used items
pub use catalog::{Activity, Catalog, Food, StrengthExercise};
pub use errors::*;
pub use health_metrics::*;
pub use types::*;

// Export units module items (canonical source for unit types)
pub use units::*;

pub use models::{
    DetoxState, Document, ExerciseDetail, ExerciseEntry, FoodEntry, HabitEntry, HabitItem,
    HabitKind, HabitValue, Profile, User, WeightSample, CURRENT_SCHEMA_VERSION, DEFAULT_USER_ID,
};
