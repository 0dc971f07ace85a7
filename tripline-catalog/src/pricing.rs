use crate::addon::{AddonCatalog, AddonItem};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A chosen instance of an add-on: the picked option variant, if any, and
/// the resolved quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectedAddon {
    pub option_id: Option<String>,
    pub quantity: i32,
}

impl SelectedAddon {
    pub fn new() -> Self {
        Self {
            option_id: None,
            quantity: 1,
        }
    }

    pub fn with_option(option_id: impl Into<String>) -> Self {
        Self {
            option_id: Some(option_id.into()),
            quantity: 1,
        }
    }

    pub fn with_quantity(quantity: i32) -> Self {
        Self {
            option_id: None,
            quantity,
        }
    }
}

impl Default for SelectedAddon {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("Base price must not be negative: {0}")]
    NegativeBasePrice(i32),

    #[error("Selection references an item no longer offered: {0}")]
    StaleSelection(String),

    #[error("Unknown option '{option_id}' for item '{item_id}'")]
    UnknownOption { item_id: String, option_id: String },

    #[error("Total exceeds the representable amount")]
    TotalOverflow,
}

/// Effective unit price for a selected add-on: the chosen option's price
/// when an option was picked, the item's base price otherwise.
pub fn unit_price(item: &AddonItem, selected: &SelectedAddon) -> Result<i32, PricingError> {
    match &selected.option_id {
        Some(option_id) => item
            .option(option_id)
            .map(|o| o.price_cents)
            .ok_or_else(|| PricingError::UnknownOption {
                item_id: item.id.clone(),
                option_id: option_id.clone(),
            }),
        None => Ok(item.base_price_cents),
    }
}

/// Total checkout price: base reservation plus every selected add-on line.
///
/// Pure and exact in integer minor units; callers re-evaluate on every
/// selection change because payment-mode eligibility depends on the live
/// total. Quantities are clamped to at least 1, and items without quantity
/// support always price a single unit. A selection entry whose item is no
/// longer in the catalog is an error, not a silently dropped line.
pub fn compute_total(
    base_price_cents: i32,
    catalog: &AddonCatalog,
    selections: &HashMap<String, SelectedAddon>,
) -> Result<i32, PricingError> {
    if base_price_cents < 0 {
        return Err(PricingError::NegativeBasePrice(base_price_cents));
    }

    // Lines accumulate in i64 so an oversized quantity surfaces as an
    // error instead of wrapping the total (a wrapped negative total would
    // corrupt payment-mode eligibility downstream)
    let mut total = i64::from(base_price_cents);
    for (item_id, selected) in selections {
        let item = catalog
            .get(item_id)
            .ok_or_else(|| PricingError::StaleSelection(item_id.clone()))?;

        let unit = unit_price(item, selected)?.max(0);
        let quantity = if item.supports_quantity {
            selected.quantity.max(1)
        } else {
            1
        };

        total += i64::from(unit) * i64::from(quantity);
    }

    i32::try_from(total).map_err(|_| PricingError::TotalOverflow)
}
