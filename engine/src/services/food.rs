//! Food log service - business logic for food tracking
//!
//! Entries are priced once, at creation: kcal and macros are scaled by the
//! quantity, rounded to one decimal and never recomputed.

use super::remember_recent;
use crate::error::{check, TrackerError, TrackerResult};
use calorie_tracker_shared::validation::{
    round1, validate_calories, validate_grams, validate_name, validate_quantity,
};
use calorie_tracker_shared::{kcal_from_macros, Catalog, Food, FoodEntry, FoodGroup, LogFoodRequest, User};
use chrono::NaiveDate;
use uuid::Uuid;

/// Heading of the group listing recently logged foods
pub const RECENT_GROUP: &str = "Recently used";
const CUSTOM_GROUP: &str = "My foods";
const OTHER_GROUP: &str = "Other";

/// Food log service
pub struct FoodLogService;

impl FoodLogService {
    /// Log a food for a date
    ///
    /// Any number given on the request overrides the looked-up food. A
    /// request that names no known food must carry kcal or macros.
    pub fn add_food(
        user: &mut User,
        catalog: &Catalog,
        request: LogFoodRequest,
        recent_limit: usize,
    ) -> TrackerResult<FoodEntry> {
        let quantity = request.quantity.unwrap_or(1.0);
        check("quantity", validate_quantity(quantity))?;

        let manual = [
            request.kcal,
            request.protein,
            request.fat,
            request.carbs,
            request.alcohol,
            request.fiber,
        ];
        for (field, value) in ["kcal", "protein", "fat", "carbs", "alcohol", "fiber"]
            .into_iter()
            .zip(manual)
        {
            if let Some(value) = value {
                let result = match field {
                    // non-positive energy falls back to the macro value below
                    "kcal" if value.is_finite() && value <= 0.0 => Ok(()),
                    "kcal" => validate_calories(value),
                    _ => validate_grams(value),
                };
                check(field, result)?;
            }
        }

        let known = Self::lookup_food(user, catalog, &request.name).cloned();
        if known.is_none() && manual.iter().all(Option::is_none) {
            return Err(TrackerError::invalid(
                "name",
                format!("Unknown food '{}'; enter calories or macros", request.name.trim()),
            ));
        }

        let name = match request.name.trim() {
            "" => "Custom".to_string(),
            name => known.as_ref().map_or_else(|| name.to_string(), |f| f.name.clone()),
        };
        check("name", validate_name(&name))?;

        let per_serving = |field: Option<f64>, from_food: fn(&Food) -> f64| -> f64 {
            field.or_else(|| known.as_ref().map(from_food)).unwrap_or(0.0)
        };
        let protein = per_serving(request.protein, |f: &Food| f.protein);
        let fat = per_serving(request.fat, |f: &Food| f.fat);
        let carbs = per_serving(request.carbs, |f: &Food| f.carbs);
        let alcohol = request.alcohol.unwrap_or(0.0);
        let fiber = request.fiber.unwrap_or(0.0);

        let explicit_kcal = request
            .kcal
            .or_else(|| {
                // catalog energy only applies when its macros were not overridden
                let overridden = request.protein.is_some() || request.fat.is_some() || request.carbs.is_some();
                known.as_ref().filter(|_| !overridden).map(|f| f.kcal)
            })
            .filter(|kcal| *kcal > 0.0);
        let kcal = explicit_kcal.unwrap_or_else(|| kcal_from_macros(protein, fat, carbs, alcohol, fiber));

        let entry = FoodEntry {
            id: Uuid::new_v4().to_string(),
            date: request.date,
            time: request.time,
            name,
            quantity,
            kcal: round1(kcal * quantity),
            protein: round1(protein * quantity),
            fat: round1(fat * quantity),
            carbs: round1(carbs * quantity),
            alcohol: round1(alcohol * quantity),
            fiber: round1(fiber * quantity),
            measure: request
                .measure
                .or_else(|| known.as_ref().and_then(|f| f.measure.clone())),
        };

        remember_recent(&mut user.recent_foods, &entry.name, recent_limit);
        user.foods.push(entry.clone());
        Ok(entry)
    }

    /// Delete by id; false when no entry had that id
    pub fn remove_food(user: &mut User, id: &str) -> bool {
        let before = user.foods.len();
        user.foods.retain(|f| f.id != id);
        user.foods.len() != before
    }

    /// Entries of one date, untimed first, then by time of day
    pub fn foods_on(user: &User, date: NaiveDate) -> Vec<FoodEntry> {
        let mut foods: Vec<FoodEntry> = user.foods.iter().filter(|f| f.date == date).cloned().collect();
        foods.sort_by_key(|f| f.time);
        foods
    }

    /// Custom foods shadow catalog foods of the same name
    pub fn lookup_food<'a>(user: &'a User, catalog: &'a Catalog, name: &str) -> Option<&'a Food> {
        let needle = name.trim();
        if needle.is_empty() {
            return None;
        }
        user.custom_foods
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(needle))
            .or_else(|| catalog.find_food(needle))
    }

    pub fn add_custom_food(user: &mut User, mut food: Food) -> TrackerResult<Food> {
        food.name = food.name.trim().to_string();
        check("name", validate_name(&food.name))?;
        check("kcal", validate_calories(food.kcal))?;
        check("protein", validate_grams(food.protein))?;
        check("fat", validate_grams(food.fat))?;
        check("carbs", validate_grams(food.carbs))?;

        if user
            .custom_foods
            .iter()
            .any(|f| f.name.eq_ignore_ascii_case(&food.name))
        {
            return Err(TrackerError::Conflict(format!(
                "A custom food named '{}' already exists",
                food.name
            )));
        }

        user.custom_foods.push(food.clone());
        Ok(food)
    }

    pub fn remove_custom_food(user: &mut User, name: &str) -> bool {
        let before = user.custom_foods.len();
        user.custom_foods
            .retain(|f| !f.name.eq_ignore_ascii_case(name.trim()));
        user.custom_foods.len() != before
    }

    /// Selectable foods by category, recently used first
    pub fn food_groups(user: &User, catalog: &Catalog) -> Vec<FoodGroup> {
        let mut groups: Vec<FoodGroup> = Vec::new();

        let recent: Vec<Food> = user
            .recent_foods
            .iter()
            .filter_map(|name| Self::lookup_food(user, catalog, name).cloned())
            .collect();
        if !recent.is_empty() {
            groups.push(FoodGroup {
                name: RECENT_GROUP.to_string(),
                foods: recent,
            });
        }

        let shadowed = |food: &Food| {
            user.custom_foods
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(&food.name))
        };
        let custom = user.custom_foods.iter().map(|f| (f, CUSTOM_GROUP));
        let listed = catalog
            .foods
            .iter()
            .filter(|f| !shadowed(*f))
            .map(|f| (f, OTHER_GROUP));

        let mut by_category: Vec<FoodGroup> = Vec::new();
        for (food, fallback) in custom.chain(listed) {
            let category = match food.category.trim() {
                "" => fallback,
                category => category,
            };
            match by_category.iter_mut().find(|g| g.name == category) {
                Some(group) => group.foods.push(food.clone()),
                None => by_category.push(FoodGroup {
                    name: category.to_string(),
                    foods: vec![food.clone()],
                }),
            }
        }

        groups.extend(by_category);
        groups
    }
}
