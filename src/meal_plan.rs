use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{MealSlot, PlannedMeal, Recipe};

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct MealPlan {
    #[serde(default)]
    pub meals: Vec<PlannedMeal>,
}

impl MealPlan {
    /// Places a meal, replacing whatever was planned in the same date and slot.
    pub fn add(&mut self, meal: PlannedMeal) {
        self.remove(meal.date, meal.slot);
        self.meals.push(meal);
    }

    pub fn remove(&mut self, date: NaiveDate, slot: MealSlot) -> Option<PlannedMeal> {
        let index = self
            .meals
            .iter()
            .position(|meal| meal.date == date && meal.slot == slot)?;
        Some(self.meals.remove(index))
    }

    /// Meals in `[from, to]`, ordered by date then slot.
    pub fn meals_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<&PlannedMeal> {
        let mut meals: Vec<&PlannedMeal> = self
            .meals
            .iter()
            .filter(|meal| meal.date >= from && meal.date <= to)
            .collect();
        meals.sort_by_key(|meal| (meal.date, meal.slot));
        meals
    }

    /// Resolves planned meals in `[from, to]` to recipes with a scale factor
    /// of planned servings over the recipe's own servings.
    pub fn recipes_needed(&self, recipes: &[Recipe], from: NaiveDate, to: NaiveDate) -> Vec<(Recipe, f64)> {
        self.meals_between(from, to)
            .into_iter()
            .filter_map(|meal| {
                let Some(recipe) = recipes.iter().find(|recipe| recipe.id == meal.recipe_id) else {
                    warn!(recipe_id = %meal.recipe_id, date = %meal.date, "planned meal references an unknown recipe");
                    return None;
                };
                let scale = f64::from(meal.servings) / f64::from(recipe.servings.max(1));
                Some((recipe.clone(), scale))
            })
            .collect()
    }
}
