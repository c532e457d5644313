//! Weight service
//!
//! Provides business logic for weight tracking including:
//! - One sample per date, kept in ascending order
//! - Weight lookup as of any date
//! - Moving average calculations

use crate::error::{check, TrackerResult};
use calorie_tracker_shared::validation::validate_weight;
use calorie_tracker_shared::{User, WeightSample};
use chrono::NaiveDate;

/// Weight service for business logic
pub struct WeightService;

impl WeightService {
    /// Record the weight for a date, replacing any sample already there
    ///
    /// The profile's current weight follows the latest recorded value.
    pub fn upsert_weight(user: &mut User, date: NaiveDate, weight_kg: f64) -> TrackerResult<WeightSample> {
        check("weight_kg", validate_weight(weight_kg))?;

        let sample = WeightSample { date, weight_kg };
        user.weights.retain(|w| w.date != date);
        user.weights.push(sample.clone());
        user.weights.sort_by_key(|w| w.date);
        user.profile.weight_kg = weight_kg;

        Ok(sample)
    }

    /// Drop the sample for a date; false when there was none
    pub fn remove_weight(user: &mut User, date: NaiveDate) -> bool {
        let before = user.weights.len();
        user.weights.retain(|w| w.date != date);
        user.weights.len() != before
    }

    /// Weight known on a date: the last sample on or before it, else the
    /// profile baseline
    pub fn weight_as_of(user: &User, date: NaiveDate) -> f64 {
        user.weights
            .iter()
            .take_while(|w| w.date <= date)
            .last()
            .map_or(user.profile.weight_kg, |w| w.weight_kg)
    }

    /// Calculate N-sample moving average
    ///
    /// Returns the arithmetic mean of the first N entries; callers pass
    /// samples most recent first.
    pub fn calculate_moving_average(weights: &[f64], n: usize) -> Option<f64> {
        if weights.is_empty() || n == 0 {
            return None;
        }

        let count = weights.len().min(n);
        let sum: f64 = weights.iter().take(count).sum();
        Some(sum / count as f64)
    }

    /// Trailing moving average at each sample, oldest first
    pub fn moving_average_series(samples: &[WeightSample], n: usize) -> Vec<(NaiveDate, f64)> {
        samples
            .iter()
            .enumerate()
            .filter_map(|(i, sample)| {
                let recent_first: Vec<f64> = samples[..=i].iter().rev().map(|w| w.weight_kg).collect();
                Self::calculate_moving_average(&recent_first, n).map(|avg| (sample.date, avg))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calorie_tracker_shared::Profile;
    use proptest::prelude::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn user() -> User {
        User::new(Profile { weight_kg: 85.0, ..Profile::default() }, day(1))
    }

    #[test]
    fn test_weight_as_of_walks_samples() {
        let mut user = user();
        WeightService::upsert_weight(&mut user, day(3), 78.0).unwrap();
        WeightService::upsert_weight(&mut user, day(1), 80.0).unwrap();
        user.profile.weight_kg = 85.0;

        assert_eq!(WeightService::weight_as_of(&user, day(2)), 80.0);
        assert_eq!(WeightService::weight_as_of(&user, day(3)), 78.0);
        assert_eq!(WeightService::weight_as_of(&user, day(9)), 78.0);
        assert_eq!(
            WeightService::weight_as_of(&user, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()),
            85.0
        );
    }

    #[test]
    fn test_upsert_replaces_same_date() {
        let mut user = user();
        WeightService::upsert_weight(&mut user, day(5), 80.0).unwrap();
        WeightService::upsert_weight(&mut user, day(5), 79.4).unwrap();
        assert_eq!(user.weights.len(), 1);
        assert_eq!(user.weights[0].weight_kg, 79.4);
        assert_eq!(user.profile.weight_kg, 79.4);
    }

    #[test]
    fn test_upsert_rejects_out_of_range() {
        let mut user = user();
        assert!(WeightService::upsert_weight(&mut user, day(5), 5.0).is_err());
        assert!(WeightService::upsert_weight(&mut user, day(5), f64::NAN).is_err());
        assert!(user.weights.is_empty());
    }

    #[test]
    fn test_remove_weight() {
        let mut user = user();
        WeightService::upsert_weight(&mut user, day(5), 80.0).unwrap();
        assert!(!WeightService::remove_weight(&mut user, day(6)));
        assert!(WeightService::remove_weight(&mut user, day(5)));
        assert!(user.weights.is_empty());
    }

    #[test]
    fn test_moving_average_series_is_trailing() {
        let samples: Vec<WeightSample> = [80.0, 82.0, 78.0]
            .iter()
            .enumerate()
            .map(|(i, w)| WeightSample { date: day(i as u32 + 1), weight_kg: *w })
            .collect();
        let series = WeightService::moving_average_series(&samples, 2);
        assert_eq!(series, vec![(day(1), 80.0), (day(2), 81.0), (day(3), 80.0)]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_moving_average_equals_arithmetic_mean(
            weights in prop::collection::vec(20.0f64..500.0, 1..50),
            n in 1usize..20
        ) {
            let avg = WeightService::calculate_moving_average(&weights, n);
            prop_assert!(avg.is_some());

            let count = weights.len().min(n);
            let expected: f64 = weights.iter().take(count).sum::<f64>() / count as f64;
            prop_assert!((avg.unwrap() - expected).abs() < 0.0001);
        }

        #[test]
        fn test_moving_average_zero_n_returns_none(
            weights in prop::collection::vec(20.0f64..500.0, 1..50)
        ) {
            prop_assert!(WeightService::calculate_moving_average(&weights, 0).is_none());
        }

        /// Property: weight_as_of(d) is the value of some sample on or before d,
        /// or the baseline when none precedes d
        #[test]
        fn prop_weight_as_of_uses_latest_preceding_sample(
            entries in prop::collection::btree_map(1u32..28, 40.0f64..150.0, 0..10),
            query in 1u32..28
        ) {
            let mut user = user();
            for (d, w) in &entries {
                WeightService::upsert_weight(&mut user, day(*d), *w).unwrap();
            }
            user.profile.weight_kg = 85.0;

            let expected = entries
                .range(..=query)
                .next_back()
                .map_or(85.0, |(_, w)| *w);
            prop_assert_eq!(WeightService::weight_as_of(&user, day(query)), expected);
        }
    }
}
