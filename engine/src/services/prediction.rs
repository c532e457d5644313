//! Weight projection from cumulative energy balance
//!
//! The curve starts at the earliest recorded weight (or the profile
//! baseline) and moves by 0.4536 kg per 3500 kcal of accumulated deficit.
//! Recorded samples are shown next to the curve but never pull it back.

use super::SummaryService;
use calorie_tracker_shared::{deficit_to_kg, SeriesPoint, User};
use chrono::NaiveDate;
use std::collections::BTreeSet;

pub struct PredictionService;

impl PredictionService {
    /// Earliest recorded weight, else the profile baseline
    pub fn anchor_weight(user: &User) -> f64 {
        user.weights
            .first()
            .map_or(user.profile.weight_kg, |w| w.weight_kg)
    }

    /// One point per date with any food, exercise or weight logged,
    /// ascending; `today` alone when nothing is logged
    pub fn build_series(user: &User, today: NaiveDate) -> Vec<SeriesPoint> {
        let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
        dates.extend(user.foods.iter().map(|f| f.date));
        dates.extend(user.exercises.iter().map(|e| e.date));
        dates.extend(user.weights.iter().map(|w| w.date));
        if dates.is_empty() {
            dates.insert(today);
        }

        let anchor = Self::anchor_weight(user);
        let mut cumulative = 0.0;

        dates
            .into_iter()
            .map(|date| {
                let deficit = SummaryService::day_energy(user, date).deficit();
                cumulative += deficit;
                SeriesPoint {
                    date,
                    deficit,
                    predicted: anchor - deficit_to_kg(cumulative),
                    actual: user
                        .weights
                        .iter()
                        .find(|w| w.date == date)
                        .map(|w| w.weight_kg),
                }
            })
            .collect()
    }

    /// Series value for a date in the series, else one step past the last
    /// point using that date's own deficit
    pub fn predicted_weight_on(user: &User, date: NaiveDate, today: NaiveDate) -> f64 {
        let series = Self::build_series(user, today);
        if let Some(point) = series.iter().find(|p| p.date == date) {
            return point.predicted;
        }

        let last = series
            .last()
            .map_or_else(|| Self::anchor_weight(user), |p| p.predicted);
        last - deficit_to_kg(SummaryService::day_energy(user, date).deficit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calorie_tracker_shared::{FoodEntry, Profile, WeightSample};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn food(date: NaiveDate, kcal: f64) -> FoodEntry {
        FoodEntry {
            id: format!("f-{}", date),
            date,
            time: None,
            name: "Meal".into(),
            quantity: 1.0,
            kcal,
            protein: 0.0,
            fat: 0.0,
            carbs: 0.0,
            alcohol: 0.0,
            fiber: 0.0,
            measure: None,
        }
    }

    #[test]
    fn test_empty_user_series_is_today() {
        let user = User::new(Profile::default(), day(1));
        let series = PredictionService::build_series(&user, day(9));
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].date, day(9));
        assert_eq!(series[0].actual, None);
    }

    #[test]
    fn test_anchor_is_earliest_sample() {
        let mut user = User::new(Profile { weight_kg: 90.0, ..Profile::default() }, day(1));
        user.weights = vec![
            WeightSample { date: day(2), weight_kg: 82.0 },
            WeightSample { date: day(5), weight_kg: 80.0 },
        ];
        assert_eq!(PredictionService::anchor_weight(&user), 82.0);
    }

    #[test]
    fn test_actual_samples_do_not_reanchor() {
        let mut user = User::new(Profile::default(), day(1));
        user.foods.push(food(day(1), 2000.0));
        user.foods.push(food(day(3), 1500.0));
        user.weights = vec![
            WeightSample { date: day(1), weight_kg: 70.0 },
            WeightSample { date: day(2), weight_kg: 60.0 },
        ];

        let series = PredictionService::build_series(&user, day(3));
        assert_eq!(series.iter().map(|p| p.date).collect::<Vec<_>>(), vec![day(1), day(2), day(3)]);
        assert_eq!(series[1].actual, Some(60.0));

        let mut cumulative = 0.0;
        for point in &series {
            cumulative += SummaryService::day_energy(&user, point.date).deficit();
            assert!((point.predicted - (70.0 - cumulative / 3500.0 * 0.4536)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_prediction_beyond_series() {
        let mut user = User::new(Profile::default(), day(1));
        user.foods.push(food(day(1), 1000.0));

        let series = PredictionService::build_series(&user, day(1));
        let next = PredictionService::predicted_weight_on(&user, day(10), day(1));
        let own = SummaryService::day_energy(&user, day(10)).deficit();
        assert!((next - (series[0].predicted - own / 3500.0 * 0.4536)).abs() < 1e-9);
        assert_eq!(PredictionService::predicted_weight_on(&user, day(1), day(1)), series[0].predicted);
    }
}
