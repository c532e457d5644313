//! Exercise service
//!
//! Provides business logic for exercise tracking including:
//! - Cardio and strength entries
//! - Duration from minutes or from start/end clock times
//! - Burn frozen at creation from MET and the weight known on the date

use super::{remember_recent, WeightService};
use crate::error::{check, TrackerError, TrackerResult};
use calorie_tracker_shared::validation::{
    round1, validate_calories, validate_duration_minutes, validate_met, validate_name,
};
use calorie_tracker_shared::{exercise_kcal, Catalog, ExerciseDetail, ExerciseEntry, LogExerciseRequest, User};
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

/// MET assumed when neither the request nor the catalog has one
pub const DEFAULT_MET: f64 = 3.5;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Exercise service
pub struct ExerciseService;

impl ExerciseService {
    pub fn add_exercise(
        user: &mut User,
        catalog: &Catalog,
        request: LogExerciseRequest,
        recent_limit: usize,
    ) -> TrackerResult<ExerciseEntry> {
        let label = request.label.trim().to_string();
        check("label", validate_name(&label))?;

        let duration_min = match (request.duration_min, request.time, request.end_time) {
            (Some(minutes), _, _) => minutes,
            (None, Some(start), Some(end)) => Self::clock_duration_minutes(start, end),
            (None, _, _) if request.strength.is_some() => 0.0,
            _ => {
                return Err(TrackerError::invalid(
                    "duration_min",
                    "Enter minutes or a start and end time",
                ))
            }
        };
        check("duration_min", validate_duration_minutes(duration_min))?;

        let met = match request.met {
            Some(met) => {
                check("met", validate_met(met))?;
                met
            }
            None => catalog.met_for(&label).unwrap_or(DEFAULT_MET),
        };

        let detail = match request.strength {
            Some(strength) => {
                if strength.sets == 0 {
                    return Err(TrackerError::invalid("sets", "Sets must be at least 1"));
                }
                if strength.reps == 0 {
                    return Err(TrackerError::invalid("reps", "Reps must be at least 1"));
                }
                if !strength.load_kg.is_finite() || !(0.0..=1000.0).contains(&strength.load_kg) {
                    return Err(TrackerError::invalid("load_kg", "Load must be between 0 and 1000 kg"));
                }
                ExerciseDetail::strength(strength.sets, strength.reps, strength.load_kg)
            }
            None => {
                if duration_min <= 0.0 {
                    return Err(TrackerError::invalid(
                        "duration_min",
                        "Duration must be greater than zero",
                    ));
                }
                for (field, value) in [("distance_km", request.distance_km), ("incline_pct", request.incline_pct)] {
                    if value.map_or(false, |v| !v.is_finite() || v < 0.0) {
                        return Err(TrackerError::invalid(field, "Must be a non-negative number"));
                    }
                }
                ExerciseDetail::Cardio {
                    distance_km: request.distance_km,
                    incline_pct: request.incline_pct,
                }
            }
        };

        let kcal_burn = match request.kcal_burn {
            Some(kcal) => {
                check("kcal_burn", validate_calories(kcal))?;
                kcal
            }
            None => {
                let weight = WeightService::weight_as_of(user, request.date);
                exercise_kcal(met, duration_min, weight)
            }
        };

        let entry = ExerciseEntry {
            id: Uuid::new_v4().to_string(),
            date: request.date,
            time: request.time,
            label,
            met,
            duration_min,
            kcal_burn: Some(round1(kcal_burn)),
            detail,
        };

        remember_recent(&mut user.recent_exercises, &entry.label, recent_limit);
        user.exercises.push(entry.clone());
        Ok(entry)
    }

    pub fn remove_exercise(user: &mut User, id: &str) -> bool {
        let before = user.exercises.len();
        user.exercises.retain(|e| e.id != id);
        user.exercises.len() != before
    }

    /// Entries of one date, untimed first, then by start time
    pub fn exercises_on(user: &User, date: NaiveDate) -> Vec<ExerciseEntry> {
        let mut exercises: Vec<ExerciseEntry> = user
            .exercises
            .iter()
            .filter(|e| e.date == date)
            .cloned()
            .collect();
        exercises.sort_by_key(|e| e.time);
        exercises
    }

    /// Frozen burn, or the MET derivation for entries stored without one
    pub fn burn_of(user: &User, entry: &ExerciseEntry) -> f64 {
        entry.kcal_burn.unwrap_or_else(|| {
            exercise_kcal(
                entry.met,
                entry.duration_min,
                WeightService::weight_as_of(user, entry.date),
            )
        })
    }

    /// Minutes from start to end, wrapping past midnight when end <= start
    pub fn clock_duration_minutes(start: NaiveTime, end: NaiveTime) -> f64 {
        let mut minutes = (end - start).num_minutes();
        if minutes <= 0 {
            minutes += MINUTES_PER_DAY;
        }
        minutes as f64
    }
}
