//! Profile service - business logic for profile updates and derived metrics

use crate::error::{check, TrackerError, TrackerResult};
use calorie_tracker_shared::validation::{
    validate_age, validate_deficit, validate_height_cm, validate_weight,
};
use calorie_tracker_shared::{calculate_tdee_result, Profile, ProfileMetrics, UpdateProfileRequest};

/// Profile service for profile operations
pub struct ProfileService;

impl ProfileService {
    /// Apply a partial update. Nothing changes unless every field is valid.
    pub fn update(profile: &Profile, req: UpdateProfileRequest) -> TrackerResult<Profile> {
        Self::validate_profile_update(&req)?;

        let mut updated = profile.clone();
        if let Some(age) = req.age {
            updated.age = age;
        }
        if let Some(height_cm) = req.height_cm {
            updated.height_cm = height_cm;
        }
        if let Some(weight_kg) = req.weight_kg {
            updated.weight_kg = weight_kg;
        }
        if let Some(sex) = req.sex {
            updated.sex = sex;
        }
        if let Some(level) = req.activity_level {
            updated.activity_level = level;
        }
        if let Some(deficit) = req.target_deficit {
            updated.target_deficit = deficit;
        }
        if let Some(initial) = req.initial_weight_kg {
            updated.initial_weight_kg = Some(initial);
        }

        if req.clear_fasting_window {
            updated.fasting_start = None;
            updated.fasting_end = None;
        } else if let (Some(start), Some(end)) = (req.fasting_start, req.fasting_end) {
            updated.fasting_start = Some(start);
            updated.fasting_end = Some(end);
        }

        Ok(updated)
    }

    /// Energy figures at the profile's baseline weight
    pub fn metrics(profile: &Profile) -> ProfileMetrics {
        let result = calculate_tdee_result(profile);
        ProfileMetrics {
            bmr: result.bmr,
            tdee: result.tdee,
            activity_multiplier: result.activity_multiplier,
            activity_label: profile.activity_level.label().to_string(),
            activity_description: profile.activity_level.description().to_string(),
            target_intake: result.target_intake,
        }
    }

    fn validate_profile_update(req: &UpdateProfileRequest) -> TrackerResult<()> {
        if let Some(age) = req.age {
            check("age", validate_age(age))?;
        }
        if let Some(height_cm) = req.height_cm {
            check("height_cm", validate_height_cm(height_cm))?;
        }
        if let Some(weight_kg) = req.weight_kg {
            check("weight_kg", validate_weight(weight_kg))?;
        }
        if let Some(initial) = req.initial_weight_kg {
            check("initial_weight_kg", validate_weight(initial))?;
        }
        if let Some(deficit) = req.target_deficit {
            check("target_deficit", validate_deficit(deficit))?;
        }

        if !req.clear_fasting_window {
            match (req.fasting_start, req.fasting_end) {
                (Some(start), Some(end)) if start == end => {
                    return Err(TrackerError::invalid(
                        "fasting_window",
                        "Start and end of the fasting window must differ",
                    ))
                }
                (Some(_), None) | (None, Some(_)) => {
                    return Err(TrackerError::invalid(
                        "fasting_window",
                        "Set both the start and the end of the fasting window",
                    ))
                }
                _ => {}
            }
        }
        Ok(())
    }
}
