use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{CookedMeal, Macros, Recipe};
use crate::pantry::Pantry;

/// Share of each daily target reached, in percent. `None` where the target is zero.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct NutrientProgress {
    pub kcal: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub fiber_g: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct CookedMealLog {
    pub meals: Vec<CookedMeal>,
}

impl CookedMealLog {
    pub fn log(&mut self, meal: CookedMeal) {
        self.meals.push(meal);
    }

    /// Records a cooked recipe and deducts its ingredients from the pantry.
    /// Returns false (and logs nothing) when the recipe carries no macros.
    pub fn log_recipe(&mut self, date: NaiveDate, recipe: &Recipe, servings: u32, pantry: &mut Pantry) -> bool {
        let Some(macros) = recipe_macros(recipe, servings) else {
            return false;
        };
        pantry.consume(&recipe.ingredients, f64::from(servings) / f64::from(recipe.servings.max(1)));
        self.log(CookedMeal {
            date,
            recipe_title: recipe.title.clone(),
            servings,
            macros,
        });
        true
    }

    pub fn daily_totals(&self, date: NaiveDate) -> Macros {
        self.meals
            .iter()
            .filter(|meal| meal.date == date)
            .fold(Macros::default(), |total, meal| total + meal.macros)
    }

    pub fn totals_between(&self, from: NaiveDate, to: NaiveDate) -> BTreeMap<NaiveDate, Macros> {
        let mut totals: BTreeMap<NaiveDate, Macros> = BTreeMap::new();
        for meal in self.meals.iter().filter(|meal| meal.date >= from && meal.date <= to) {
            *totals.entry(meal.date).or_default() += meal.macros;
        }
        totals
    }
}

/// Macros for `servings` portions of a recipe, when the recipe carries them.
pub fn recipe_macros(recipe: &Recipe, servings: u32) -> Option<Macros> {
    recipe
        .macros_per_serving
        .map(|per_serving| per_serving.scaled(f64::from(servings)))
}

pub fn progress(totals: &Macros, targets: &Macros) -> NutrientProgress {
    let mut progress = NutrientProgress::default();
    macro_rules! percent_of_target {
        ($field:ident) => {
            if targets.$field > 0.0 {
                progress.$field = Some(totals.$field / targets.$field * 100.0);
            }
        };
    }
    percent_of_target!(kcal);
    percent_of_target!(protein_g);
    percent_of_target!(carbs_g);
    percent_of_target!(fat_g);
    percent_of_target!(fiber_g);
    progress
}
