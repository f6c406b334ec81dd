//! Unit normalization and free-text quantity parsing.
//!
//! Quantities are compared in base units: grams for mass, millilitres for
//! volume and items for counts. Units the table does not know stay in their
//! own family and only combine with the same spelling.

use fraction::Fraction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    Mass,
    Volume,
    Count,
    Other(String),
}

impl UnitKind {
    /// Label used when a quantity is expressed in this family's base unit.
    pub fn base_label(&self) -> &str {
        match self {
            UnitKind::Mass => "g",
            UnitKind::Volume => "ml",
            UnitKind::Count => "",
            UnitKind::Other(label) => label,
        }
    }
}

/// Returns the unit family and the factor converting one `unit` into the base unit.
pub fn normalize_unit(unit: &str) -> (UnitKind, f64) {
    let normalized = unit.trim().trim_end_matches('.').to_lowercase();
    match normalized.as_str() {
        "g" | "gr" | "gram" | "grams" => (UnitKind::Mass, 1.0),
        "kg" | "kilo" | "kilos" | "kilogram" | "kilograms" => (UnitKind::Mass, 1000.0),
        "mg" | "milligram" | "milligrams" => (UnitKind::Mass, 0.001),
        "oz" | "ounce" | "ounces" => (UnitKind::Mass, 28.35),
        "lb" | "lbs" | "pound" | "pounds" => (UnitKind::Mass, 453.59),

        "ml" | "millilitre" | "millilitres" | "milliliter" | "milliliters" => (UnitKind::Volume, 1.0),
        "cl" | "centilitre" | "centilitres" => (UnitKind::Volume, 10.0),
        "l" | "litre" | "litres" | "liter" | "liters" => (UnitKind::Volume, 1000.0),
        "cup" | "cups" => (UnitKind::Volume, 240.0),
        "tbsp" | "tablespoon" | "tablespoons" => (UnitKind::Volume, 15.0),
        "tsp" | "teaspoon" | "teaspoons" => (UnitKind::Volume, 5.0),
        "pint" | "pints" => (UnitKind::Volume, 568.0),

        "" | "x" | "each" | "whole" | "item" | "items" | "piece" | "pieces" | "pc" | "pcs" => {
            (UnitKind::Count, 1.0)
        }

        other => (UnitKind::Other(singular(other)), 1.0),
    }
}

fn singular(word: &str) -> String {
    match word.strip_suffix('s') {
        Some(stem) if stem.len() > 2 && !stem.ends_with('s') => stem.to_string(),
        _ => word.to_string(),
    }
}

/// Converts `quantity` of `unit` into its family's base unit.
pub fn to_base(quantity: f64, unit: &str) -> (f64, UnitKind) {
    let (kind, factor) = normalize_unit(unit);
    (quantity * factor, kind)
}

pub fn compatible(a: &str, b: &str) -> bool {
    normalize_unit(a).0 == normalize_unit(b).0
}

/// Converts between two units of the same family; `None` when they differ.
pub fn convert(quantity: f64, from: &str, to: &str) -> Option<f64> {
    let (from_kind, from_factor) = normalize_unit(from);
    let (to_kind, to_factor) = normalize_unit(to);
    (from_kind == to_kind).then(|| quantity * from_factor / to_factor)
}

fn unicode_fraction(c: char) -> Option<Fraction> {
    let (numerator, denominator) = match c {
        '¼' => (1u64, 4u64),
        '½' => (1, 2),
        '¾' => (3, 4),
        '⅓' => (1, 3),
        '⅔' => (2, 3),
        '⅛' => (1, 8),
        _ => return None,
    };
    Some(Fraction::new(numerator, denominator))
}

fn fraction_to_f64(fraction: Fraction) -> Option<f64> {
    let numerator = *fraction.numer()? as f64;
    let denominator = *fraction.denom()? as f64;
    Some(numerator / denominator)
}

/// One quantity token: `3`, `0.5`, `0,5`, `1/2` or `1½`.
fn parse_fraction(text: &str) -> Option<Fraction> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Some((numerator, denominator)) = text.split_once('/') {
        let numerator: u64 = numerator.trim().parse().ok()?;
        let denominator: u64 = denominator.trim().parse().ok()?;
        if denominator == 0 {
            return None;
        }
        return Some(Fraction::new(numerator, denominator));
    }
    let mut chars = text.chars();
    if let Some(last) = chars.next_back() {
        if let Some(fraction) = unicode_fraction(last) {
            let whole = chars.as_str().trim();
            return if whole.is_empty() {
                Some(fraction)
            } else {
                parse_fraction(whole).map(|whole| whole + fraction)
            };
        }
    }
    let value: f64 = text.replace(',', ".").parse().ok()?;
    (value.is_finite() && value >= 0.0).then(|| Fraction::from(value))
}

fn parse_exact(text: &str) -> Option<Fraction> {
    let trimmed = text.trim();
    if let Some((_, upper)) = trimmed.split_once('-').filter(|(lower, _)| !lower.trim().is_empty()) {
        return parse_exact(upper);
    }
    if let Some((whole, fraction)) = trimmed.split_once(' ').filter(|(_, f)| f.contains('/')) {
        return Some(parse_fraction(whole)? + parse_fraction(fraction)?);
    }
    parse_fraction(trimmed)
}

/// Parses recipe-style quantities: `2`, `0.5`, `1/2`, `1 1/2`, `1½`, `1-2`.
/// Ranges resolve to their upper bound. Negative or non-finite values are rejected.
pub fn parse_quantity(text: &str) -> Option<f64> {
    parse_exact(text)
        .and_then(fraction_to_f64)
        .filter(|value| value.is_finite() && *value >= 0.0)
}

/// Formats a quantity with at most two decimals and no trailing zeros.
pub fn format_quantity(quantity: f64) -> String {
    let formatted = format!("{:.2}", quantity);
    formatted.trim_end_matches('0').trim_end_matches('.').to_string()
}
