//! Multi-user management
//!
//! Several people can share one document. Exactly one user is active and
//! every log operation works on that user.

use crate::error::{check, TrackerError, TrackerResult};
use calorie_tracker_shared::validation::validate_user_id;
use calorie_tracker_shared::{Document, Profile, User, UserListing};
use chrono::NaiveDate;
use tracing::info;

pub struct UserService;

impl UserService {
    pub fn list(doc: &Document) -> Vec<UserListing> {
        doc.users
            .iter()
            .map(|(id, user)| UserListing {
                id: id.clone(),
                active: *id == doc.active_user_id,
                weight_kg: user.profile.weight_kg,
                foods: user.foods.len(),
                exercises: user.exercises.len(),
                weights: user.weights.len(),
            })
            .collect()
    }

    /// Add a user with `profile`; the active user does not change
    pub fn add_user(doc: &mut Document, id: &str, profile: Profile, today: NaiveDate) -> TrackerResult<()> {
        let id = id.trim();
        check("user_id", validate_user_id(id))?;
        if doc.users.contains_key(id) {
            return Err(TrackerError::Conflict(format!("User '{}' already exists", id)));
        }
        doc.users.insert(id.to_string(), User::new(profile, today));
        info!("Added user {}", id);
        Ok(())
    }

    pub fn switch_user(doc: &mut Document, id: &str) -> TrackerResult<()> {
        if !doc.users.contains_key(id) {
            return Err(TrackerError::NotFound(format!("User '{}' not found", id)));
        }
        if doc.active_user_id != id {
            info!("Switched active user from {} to {}", doc.active_user_id, id);
            doc.active_user_id = id.to_string();
        }
        Ok(())
    }

    /// Remove a user other than the active one
    pub fn remove_user(doc: &mut Document, id: &str) -> TrackerResult<()> {
        if !doc.users.contains_key(id) {
            return Err(TrackerError::NotFound(format!("User '{}' not found", id)));
        }
        if doc.active_user_id == id {
            return Err(TrackerError::Conflict(
                "The active user cannot be removed; switch to another user first".to_string(),
            ));
        }
        doc.users.remove(id);
        info!("Removed user {}", id);
        Ok(())
    }

    /// Returns whether the flag changed
    pub fn mark_onboarded(doc: &mut Document) -> bool {
        !std::mem::replace(&mut doc.onboarded, true)
    }
}
