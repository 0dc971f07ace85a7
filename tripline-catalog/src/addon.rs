use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A mutually exclusive variant of an add-on (e.g. shared vs. luxury
/// airport transfer). Choosing an option replaces the item's base price.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddonOption {
    pub id: String,
    pub name: String,
    pub price_cents: i32,
}

/// An optional purchasable item attached to a base booking (insurance,
/// transfer, activity, upgrade)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddonItem {
    pub id: String,
    pub name: String,
    pub base_price_cents: i32,
    pub currency: String,
    /// Mutually exclusive variants; empty means the base price applies
    pub options: Vec<AddonOption>,
    pub supports_quantity: bool,
    pub recommended: bool,
    pub savings_note: Option<String>,
}

impl AddonItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, base_price_cents: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base_price_cents,
            currency: "USD".to_string(),
            options: Vec::new(),
            supports_quantity: false,
            recommended: false,
            savings_note: None,
        }
    }

    pub fn option(&self, option_id: &str) -> Option<&AddonOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

/// The set of add-ons currently on offer. Replaced wholesale when a fresh
/// recommendation load lands (latest value wins); selections referencing
/// items that disappeared are rejected at pricing time, never silently
/// repriced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddonCatalog {
    items: HashMap<String, AddonItem>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl AddonCatalog {
    pub fn new(items: Vec<AddonItem>) -> Self {
        Self {
            items: items.into_iter().map(|item| (item.id.clone(), item)).collect(),
            fetched_at: Some(Utc::now()),
        }
    }

    pub fn get(&self, item_id: &str) -> Option<&AddonItem> {
        self.items.get(item_id)
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.items.contains_key(item_id)
    }

    pub fn items(&self) -> impl Iterator<Item = &AddonItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cross-sell recommendation generator. Given a booking type and trip
/// metadata, returns the add-on catalog to offer alongside the base
/// reservation.
#[async_trait]
pub trait RecommendationSource: Send + Sync {
    async fn recommendations(
        &self,
        booking_type: &str,
        trip: &serde_json::Value,
    ) -> Result<Vec<AddonItem>, Box<dyn std::error::Error + Send + Sync>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_lookup() {
        let mut item = AddonItem::new("transfer", "Airport Transfer", 4500);
        item.options = vec![
            AddonOption {
                id: "shared".to_string(),
                name: "Shared Shuttle".to_string(),
                price_cents: 4500,
            },
            AddonOption {
                id: "luxury".to_string(),
                name: "Luxury Car".to_string(),
                price_cents: 8500,
            },
        ];

        assert_eq!(item.option("luxury").unwrap().price_cents, 8500);
        assert!(item.option("helicopter").is_none());
    }

    #[test]
    fn test_catalog_replacement_drops_old_items() {
        let first = AddonCatalog::new(vec![AddonItem::new("insurance", "Travel Insurance", 8900)]);
        assert!(first.contains("insurance"));

        let second = AddonCatalog::new(vec![AddonItem::new("excursion", "City Tour", 12000)]);
        assert!(!second.contains("insurance"));
        assert!(second.contains("excursion"));
        assert!(second.fetched_at.is_some());
    }
}
