//! Business logic services
//!
//! Services are stateless: each operation takes the user (or document) it
//! works on. Persisting the result is the store's job.

pub mod exercise;
pub mod fasting;
pub mod food;
pub mod habits;
pub mod insights;
pub mod prediction;
pub mod profile;
pub mod summary;
pub mod users;
pub mod weight;

pub use exercise::ExerciseService;
pub use fasting::FastingService;
pub use food::FoodLogService;
pub use habits::HabitService;
pub use insights::InsightsService;
pub use prediction::PredictionService;
pub use profile::ProfileService;
pub use summary::SummaryService;
pub use users::UserService;
pub use weight::WeightService;

/// Move `name` to the front of a recently-used list
pub(crate) fn remember_recent(list: &mut Vec<String>, name: &str, limit: usize) {
    list.retain(|existing| !existing.eq_ignore_ascii_case(name));
    list.insert(0, name.to_string());
    list.truncate(limit);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remember_recent_moves_to_front() {
        let mut list = vec!["Oats".to_string(), "Banana".to_string(), "Eggs".to_string()];
        remember_recent(&mut list, "banana", 3);
        assert_eq!(list, vec!["banana", "Oats", "Eggs"]);

        remember_recent(&mut list, "Tofu", 3);
        assert_eq!(list, vec!["Tofu", "banana", "Oats"]);
    }
}
