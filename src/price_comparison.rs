//! Per-store basket pricing over a shopping list.
//!
//! For every store in the catalog each shopping line is matched to a catalog
//! entry, bought in whole packs (`ceil(quantity / pack_size)`) and summed.
//! Lines a store does not price cost a flat fallback estimate.

use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

use crate::model::{ShoppingItem, StorePrice};
use crate::price_catalog::PriceCatalog;
use crate::matching::contains_phrase;
use crate::units::{convert, normalize_unit, UnitKind};

/// Absorbs float noise so 1.1 / 0.1 buys 11 packs, not 12.
const PACK_TOLERANCE: f64 = 1e-9;

/// Cheaper swaps offered when the alternative is priced at the same store.
const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("butter", "margarine"),
    ("beef mince", "turkey mince"),
    ("fresh basil", "dried basil"),
    ("cheddar", "mild cheese"),
    ("olive oil", "vegetable oil"),
    ("fresh tomato", "chopped tomatoes"),
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BasketLine {
    pub item_name: String,
    pub quantity: f64,
    pub unit: String,
    pub matched_item: Option<String>,
    pub packs: u32,
    pub unit_price: f64,
    pub line_total: f64,
    pub estimated: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StoreBasket {
    pub store: String,
    pub lines: Vec<BasketLine>,
    pub total: f64,
    pub priced_count: usize,
    pub unpriced_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PriceComparison {
    pub baskets: Vec<StoreBasket>,
    pub cheapest_store: Option<String>,
    /// Difference between the most and least expensive basket.
    pub savings: f64,
}

impl PriceComparison {
    pub fn cheapest(&self) -> Option<&StoreBasket> {
        let store = self.cheapest_store.as_deref()?;
        self.baskets.iter().find(|basket| basket.store == store)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ItemBestPrice {
    pub item_name: String,
    pub store: Option<String>,
    pub line_total: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Substitution {
    pub original: String,
    pub substitute: String,
    pub store: String,
    pub original_cost: f64,
    pub substitute_cost: f64,
    pub saving: f64,
}

/// Whole packs to buy. An unmeasured need ("to taste") still buys one pack.
pub fn packs_needed(quantity: f64, pack_size: f64) -> u32 {
    if pack_size <= 0.0 || !quantity.is_finite() {
        return 0;
    }
    if quantity <= 0.0 {
        return 1;
    }
    let packs = (quantity / pack_size - PACK_TOLERANCE).ceil().max(1.0);
    packs.min(f64::from(u32::MAX)) as u32
}

/// Packs of `entry` covering `item`. Quantities convert within a unit
/// family; plain counts against a named pack ("2" against a "loaf") divide
/// directly. Any other mismatch ("200 g" of apples sold in sixes) buys one pack.
fn packs_for(item: &ShoppingItem, entry: &StorePrice) -> u32 {
    if let Some(quantity) = convert(item.quantity, &item.unit, &entry.unit) {
        return packs_needed(quantity, entry.pack_size);
    }
    match (normalize_unit(&item.unit).0, normalize_unit(&entry.unit).0) {
        (UnitKind::Count, UnitKind::Other(_)) | (UnitKind::Other(_), UnitKind::Count) => {
            packs_needed(item.quantity, entry.pack_size)
        }
        _ => packs_needed(0.0, entry.pack_size),
    }
}

fn price_line(item: &ShoppingItem, entry: Option<&StorePrice>, fallback_price: f64) -> BasketLine {
    match entry {
        Some(entry) => {
            let packs = packs_for(item, entry);
            BasketLine {
                item_name: item.name.clone(),
                quantity: item.quantity,
                unit: item.unit.clone(),
                matched_item: Some(entry.item.clone()),
                packs,
                unit_price: entry.price,
                line_total: f64::from(packs) * entry.price,
                estimated: false,
            }
        }
        None => BasketLine {
            item_name: item.name.clone(),
            quantity: item.quantity,
            unit: item.unit.clone(),
            matched_item: None,
            packs: 1,
            unit_price: fallback_price,
            line_total: fallback_price,
            estimated: true,
        },
    }
}

pub fn basket_for_store(store: &str, items: &[ShoppingItem], catalog: &PriceCatalog, fallback_price: f64) -> StoreBasket {
    let lines: Vec<BasketLine> = items
        .iter()
        .map(|item| price_line(item, catalog.lookup(store, &item.name), fallback_price))
        .collect();
    let unpriced_count = lines.iter().filter(|line| line.estimated).count();
    StoreBasket {
        store: store.to_string(),
        total: lines.iter().map(|line| line.line_total).sum(),
        priced_count: lines.len() - unpriced_count,
        unpriced_count,
        lines,
    }
}

/// Prices `items` at every catalog store. The cheapest store is the argmin of
/// basket totals; ties go to the store listed first in the catalog.
pub fn compare_stores(items: &[ShoppingItem], catalog: &PriceCatalog, fallback_price: f64) -> PriceComparison {
    let baskets: Vec<StoreBasket> = catalog
        .stores()
        .into_iter()
        .map(|store| basket_for_store(store, items, catalog, fallback_price))
        .collect();

    let mut cheapest: Option<&StoreBasket> = None;
    let mut dearest: Option<&StoreBasket> = None;
    for basket in &baskets {
        if cheapest.map_or(true, |best| basket.total < best.total) {
            cheapest = Some(basket);
        }
        if dearest.map_or(true, |worst| basket.total > worst.total) {
            dearest = Some(basket);
        }
    }
    if let Some(best) = cheapest {
        debug!(store = %best.store, total = best.total, "cheapest basket");
    }

    PriceComparison {
        cheapest_store: cheapest.map(|basket| basket.store.clone()),
        savings: match (cheapest, dearest) {
            (Some(best), Some(worst)) => worst.total - best.total,
            _ => 0.0,
        },
        baskets,
    }
}

/// For each item, the store with the cheapest priced line (split-shop view).
pub fn cheapest_per_item(items: &[ShoppingItem], catalog: &PriceCatalog) -> Vec<ItemBestPrice> {
    let stores = catalog.stores();
    items
        .iter()
        .map(|item| {
            let best = stores
                .iter()
                .filter_map(|store| {
                    let entry = catalog.lookup(store, &item.name)?;
                    Some((*store, f64::from(packs_for(item, entry)) * entry.price))
                })
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
            ItemBestPrice {
                item_name: item.name.clone(),
                store: best.map(|(store, _)| store.to_string()),
                line_total: best.map(|(_, total)| total),
            }
        })
        .collect()
}

/// Cheaper alternatives available at `store`, largest saving first.
pub fn suggest_substitutions(items: &[ShoppingItem], store: &str, catalog: &PriceCatalog) -> Vec<Substitution> {
    let mut suggestions = Vec::new();
    for item in items {
        let Some(original_entry) = catalog.lookup(store, &item.name) else {
            continue;
        };
        let original_cost = f64::from(packs_for(item, original_entry)) * original_entry.price;

        for (original, alternative) in SUBSTITUTIONS {
            if !contains_phrase(&item.name, original) || contains_phrase(&item.name, alternative) {
                continue;
            }
            let Some(alternative_entry) = catalog.lookup(store, alternative) else {
                continue;
            };
            let substitute_cost = f64::from(packs_for(item, alternative_entry)) * alternative_entry.price;
            if substitute_cost < original_cost {
                suggestions.push(Substitution {
                    original: item.name.clone(),
                    substitute: alternative_entry.item.clone(),
                    store: alternative_entry.store.clone(),
                    original_cost,
                    substitute_cost,
                    saving: original_cost - substitute_cost,
                });
            }
        }
    }
    suggestions.sort_by(|a, b| b.saving.partial_cmp(&a.saving).unwrap_or(Ordering::Equal));
    suggestions
}
