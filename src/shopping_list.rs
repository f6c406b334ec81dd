//! Consolidates ingredient needs from several recipes into one shopping list,
//! net of what the pantry already holds.
//!
//! Lines are keyed by case-insensitive name and unit family, so `200 g flour`
//! and `0.5 kg Flour` collapse into one line while `2 cups flour` stays
//! separate. A consolidated line keeps the unit and spelling it was first
//! seen with.

use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::categorization::{categorize, Category};
use crate::model::{Recipe, ShoppingItem};
use crate::pantry::{same_name, Pantry};
use crate::units::{compatible, convert, normalize_unit, UnitKind};

/// Shortfalls smaller than this are treated as covered.
const COVERED_EPSILON: f64 = 1e-6;

fn line_key(name: &str, unit: &str) -> (String, UnitKind) {
    (name.trim().to_lowercase(), normalize_unit(unit).0)
}

/// Sums ingredient quantities across `(recipe, scale)` pairs.
///
/// Ingredients with no measurable quantity ("salt, to taste") still produce a
/// line with quantity zero so they are not forgotten.
pub fn consolidate(needs: &[(Recipe, f64)]) -> Vec<ShoppingItem> {
    let mut lines: Vec<ShoppingItem> = Vec::new();
    let mut index: HashMap<(String, UnitKind), usize> = HashMap::new();

    for (recipe, scale) in needs {
        for ingredient in &recipe.ingredients {
            if ingredient.name.trim().is_empty() {
                continue;
            }
            let quantity = (ingredient.quantity * scale).max(0.0);
            let key = line_key(&ingredient.name, &ingredient.unit);

            match index.get(&key) {
                Some(&position) => {
                    let line = &mut lines[position];
                    line.quantity += convert(quantity, &ingredient.unit, &line.unit).unwrap_or(quantity);
                    if !line.sources.contains(&recipe.title) {
                        line.sources.push(recipe.title.clone());
                    }
                }
                None => {
                    index.insert(key, lines.len());
                    lines.push(ShoppingItem {
                        name: ingredient.name.trim().to_string(),
                        quantity,
                        unit: ingredient.unit.trim().to_string(),
                        category: categorize(&ingredient.name),
                        checked: false,
                        sources: vec![recipe.title.clone()],
                    });
                }
            }
        }
    }
    lines
}

/// Consolidates `needs` and removes whatever the pantry already covers.
///
/// Fully covered lines are dropped and partially covered lines carry only the
/// shortfall. Zero-quantity lines survive only when the pantry has no stock of
/// that ingredient at all. The result is sorted by category, then name.
pub fn build_shopping_list(needs: &[(Recipe, f64)], pantry: &Pantry) -> Vec<ShoppingItem> {
    let mut list: Vec<ShoppingItem> = consolidate(needs)
        .into_iter()
        .filter_map(|mut line| {
            if line.quantity <= 0.0 {
                let stocked = pantry.items.iter().any(|item| same_name(&item.name, &line.name));
                return (!stocked).then_some(line);
            }
            let on_hand = pantry.available(&line.name, &line.unit);
            let shortfall = line.quantity - on_hand;
            if shortfall <= COVERED_EPSILON {
                debug!(name = %line.name, "covered by pantry");
                return None;
            }
            line.quantity = shortfall;
            Some(line)
        })
        .collect();
    sort_list(&mut list);
    list
}

pub fn sort_list(list: &mut [ShoppingItem]) {
    list.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

/// Adds a hand-entered item, topping up an existing line instead of duplicating it.
pub fn merge_manual(list: &mut Vec<ShoppingItem>, mut item: ShoppingItem) {
    if let Some(existing) = list
        .iter_mut()
        .find(|line| same_name(&line.name, &item.name) && compatible(&line.unit, &item.unit))
    {
        existing.quantity += convert(item.quantity, &item.unit, &existing.unit).unwrap_or(item.quantity);
        existing.checked = false;
        for source in item.sources {
            if !existing.sources.contains(&source) {
                existing.sources.push(source);
            }
        }
        return;
    }
    if item.category == Category::Other {
        item.category = categorize(&item.name);
    }
    list.push(item);
}

/// Flips the checked state of the first line named `name`. Returns false when absent.
pub fn toggle_checked(list: &mut [ShoppingItem], name: &str) -> bool {
    match list.iter_mut().find(|line| same_name(&line.name, name)) {
        Some(line) => {
            line.checked = !line.checked;
            true
        }
        None => false,
    }
}

pub fn remaining(list: &[ShoppingItem]) -> Vec<&ShoppingItem> {
    list.iter().filter(|line| !line.checked).collect()
}

pub fn group_by_category(list: &[ShoppingItem]) -> BTreeMap<Category, Vec<&ShoppingItem>> {
    let mut groups: BTreeMap<Category, Vec<&ShoppingItem>> = BTreeMap::new();
    for line in list {
        groups.entry(line.category).or_default().push(line);
    }
    groups
}
