//! Daily energy balance

use super::{ExerciseService, PredictionService, WeightService};
use calorie_tracker_shared::{
    calculate_bmr_at_weight, calculate_tdee, deficit_to_kg, DailySummary, MacroTotals, User,
};
use chrono::{Duration, NaiveDate};

/// Raw energy figures of one date
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayEnergy {
    pub intake: f64,
    pub macros: MacroTotals,
    pub exercise_burn: f64,
    /// TDEE at the weight known on the date
    pub base_burn: f64,
    pub weight_kg: f64,
    /// Any food or exercise logged
    pub logged: bool,
}

impl DayEnergy {
    pub fn total_burn(&self) -> f64 {
        self.base_burn + self.exercise_burn
    }

    pub fn deficit(&self) -> f64 {
        self.total_burn() - self.intake
    }
}

pub struct SummaryService;

impl SummaryService {
    pub fn day_energy(user: &User, date: NaiveDate) -> DayEnergy {
        let mut intake = 0.0;
        let mut macros = MacroTotals::default();
        let mut logged = false;
        for food in user.foods.iter().filter(|f| f.date == date) {
            intake += food.kcal;
            macros.protein += food.protein;
            macros.fat += food.fat;
            macros.carbs += food.carbs;
            macros.alcohol += food.alcohol;
            macros.fiber += food.fiber;
            logged = true;
        }

        let mut exercise_burn = 0.0;
        for exercise in user.exercises.iter().filter(|e| e.date == date) {
            exercise_burn += ExerciseService::burn_of(user, exercise);
            logged = true;
        }

        let weight_kg = WeightService::weight_as_of(user, date);
        let bmr = calculate_bmr_at_weight(&user.profile, weight_kg);
        let base_burn = calculate_tdee(bmr, user.profile.activity_level.multiplier());

        DayEnergy {
            intake,
            macros,
            exercise_burn,
            base_burn,
            weight_kg,
            logged,
        }
    }

    /// Snapshot of one date; `today` only matters when nothing is logged
    pub fn summarize(user: &User, date: NaiveDate, today: NaiveDate) -> DailySummary {
        let energy = Self::day_energy(user, date);
        let deficit = energy.deficit();
        let target_intake = (energy.base_burn - user.profile.target_deficit).max(0.0);

        let weight_kg = energy.weight_kg;
        let change_since = |days: i64| weight_kg - WeightService::weight_as_of(user, date - Duration::days(days));

        DailySummary {
            date,
            intake: energy.intake,
            macros: energy.macros,
            exercise_burn: energy.exercise_burn,
            base_burn: energy.base_burn,
            total_burn: energy.total_burn(),
            deficit,
            weight_delta_kg: deficit_to_kg(deficit),
            predicted_weight: PredictionService::predicted_weight_on(user, date, today),
            weight_kg,
            weekly_change: change_since(7),
            monthly_change: change_since(30),
            target_intake,
            remaining: target_intake - energy.intake,
            net: energy.intake - energy.exercise_burn,
        }
    }
}
