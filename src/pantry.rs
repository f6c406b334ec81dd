use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::categorization::{categorize, Category};
use crate::model::{PantryItem, RecipeIngredient};
use crate::units::{compatible, convert};

/// Below this an item counts as used up.
const EMPTY_EPSILON: f64 = 1e-9;

/// Case-insensitive name equality, Unicode-aware to agree with shopping-list keys.
pub(crate) fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct Pantry {
    pub items: Vec<PantryItem>,
}

impl Pantry {
    pub fn new(items: Vec<PantryItem>) -> Self {
        let mut pantry = Self::default();
        for item in items {
            pantry.add(item);
        }
        pantry
    }

    /// Adds stock, merging into an existing entry with the same name and a compatible unit.
    pub fn add(&mut self, mut item: PantryItem) {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|existing| same_name(&existing.name, &item.name) && compatible(&existing.unit, &item.unit))
        {
            let added = convert(item.quantity, &item.unit, &existing.unit).unwrap_or(item.quantity);
            existing.quantity += added;
            existing.expires_on = match (existing.expires_on, item.expires_on) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
            debug!(name = %existing.name, quantity = existing.quantity, "merged pantry stock");
            return;
        }
        if item.category == Category::Other {
            item.category = categorize(&item.name);
        }
        self.items.push(item);
    }

    pub fn remove(&mut self, name: &str) -> Option<PantryItem> {
        let index = self.items.iter().position(|item| same_name(&item.name, name))?;
        Some(self.items.remove(index))
    }

    /// Quantity on hand for `name`, expressed in `unit`. Zero when absent or unit-incompatible.
    pub fn available(&self, name: &str, unit: &str) -> f64 {
        self.items
            .iter()
            .filter(|item| same_name(&item.name, name))
            .filter_map(|item| convert(item.quantity, &item.unit, unit))
            .sum()
    }

    /// Deducts what a cooked recipe used. Stock never goes negative; emptied items are dropped.
    pub fn consume(&mut self, ingredients: &[RecipeIngredient], servings_factor: f64) {
        for ingredient in ingredients {
            let mut remaining = ingredient.quantity * servings_factor;
            for item in self
                .items
                .iter_mut()
                .filter(|item| same_name(&item.name, &ingredient.name))
            {
                if remaining <= EMPTY_EPSILON {
                    break;
                }
                let Some(needed_in_item_unit) = convert(remaining, &ingredient.unit, &item.unit) else {
                    continue;
                };
                let taken = needed_in_item_unit.min(item.quantity);
                item.quantity -= taken;
                remaining -= convert(taken, &item.unit, &ingredient.unit).unwrap_or(taken);
            }
        }
        self.items.retain(|item| item.quantity > EMPTY_EPSILON);
    }

    /// Items with an expiry date on or before `today + days`, soonest first.
    pub fn expiring_within(&self, today: NaiveDate, days: i64) -> Vec<&PantryItem> {
        let horizon = today + Duration::days(days);
        let mut expiring: Vec<&PantryItem> = self
            .items
            .iter()
            .filter(|item| item.expires_on.is_some_and(|date| date <= horizon))
            .collect();
        expiring.sort_by_key(|item| item.expires_on);
        expiring
    }
}
