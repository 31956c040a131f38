//! Checks on calculation inputs before solving

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::catalog::Catalog;

/// Largest rate accepted for a single target, in items per minute.
pub const MAX_TARGET_RATE: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Please select a target item.")]
    MissingItem,

    #[error("Item '{0}' not found in database.")]
    UnknownItem(String),

    #[error("Production rate must be greater than 0.")]
    NonPositiveRate,

    #[error("Production rate is unreasonably high (max: 100,000/min).")]
    RateTooHigh,

    #[error("No recipes unlocked. Please unlock at least one recipe.")]
    NoUnlockedRecipes,

    #[error("Invalid recipe IDs: {}", .0.join(", "))]
    UnknownRecipes(Vec<String>),

    #[error("Cannot read rate '{0}' (expected e.g. 60, 60/min, 2.5/s, 3600/h)")]
    InvalidRate(String),
}

pub fn validate_target_item<C: Catalog + ?Sized>(catalog: &C, item_id: &str) -> Result<(), ValidationError> {
    if item_id.is_empty() {
        return Err(ValidationError::MissingItem);
    }
    if catalog.get_item(item_id).is_none() {
        return Err(ValidationError::UnknownItem(item_id.to_string()));
    }
    Ok(())
}

pub fn validate_target_rate(rate: f64) -> Result<(), ValidationError> {
    // written so NaN fails too
    if !(rate > 0.0) {
        return Err(ValidationError::NonPositiveRate);
    }
    if rate > MAX_TARGET_RATE {
        return Err(ValidationError::RateTooHigh);
    }
    Ok(())
}

pub fn validate_unlocked_recipes<C: Catalog + ?Sized>(
    catalog: &C,
    unlocked: &BTreeSet<String>,
) -> Result<(), ValidationError> {
    if unlocked.is_empty() {
        return Err(ValidationError::NoUnlockedRecipes);
    }

    let invalid: Vec<String> = unlocked
        .iter()
        .filter(|id| catalog.get_recipe(id).is_none())
        .cloned()
        .collect();
    if !invalid.is_empty() {
        return Err(ValidationError::UnknownRecipes(invalid));
    }
    Ok(())
}

/// Validate item, rate and unlocked recipes, reporting the first problem.
pub fn validate_calculation_inputs<C: Catalog + ?Sized>(
    catalog: &C,
    item_id: &str,
    rate: f64,
    unlocked: &BTreeSet<String>,
) -> Result<(), ValidationError> {
    validate_target_item(catalog, item_id)?;
    validate_target_rate(rate)?;
    validate_unlocked_recipes(catalog, unlocked)
}

static RATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d*)?|\.\d+)\s*(?:/\s*(s|sec|m|min|h|hr))?\s*$")
        .expect("rate pattern is valid")
});

/// Parse a rate such as `60`, `60/min`, `2.5/s` or `3600/h` into items per minute.
pub fn parse_rate(text: &str) -> Result<f64, ValidationError> {
    let caps = RATE_PATTERN
        .captures(text)
        .ok_or_else(|| ValidationError::InvalidRate(text.to_string()))?;

    let value: f64 = caps[1]
        .parse()
        .map_err(|_| ValidationError::InvalidRate(text.to_string()))?;
    let per_minute = match caps.get(2).map(|m| m.as_str()) {
        Some("s" | "sec") => value * 60.0,
        Some("h" | "hr") => value / 60.0,
        _ => value,
    };
    Ok(per_minute)
}

/// Hint for an item that cannot be produced with the current unlocks.
pub fn missing_recipe_message(item_name: &str, recipe_names: &[&str]) -> String {
    match recipe_names {
        [] => format!("No recipes available to produce {item_name}."),
        [only] => format!("To produce {item_name}, unlock the recipe: {only}"),
        many => format!(
            "To produce {item_name}, unlock one of these recipes: {}",
            many.join(", ")
        ),
    }
}
