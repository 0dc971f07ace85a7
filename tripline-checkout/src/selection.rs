use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tripline_catalog::pricing::SelectedAddon;
use tripline_core::payment::PaymentMode;

/// Most units of one add-on a single checkout will accept
pub const MAX_ADDON_QUANTITY: i32 = 99;

/// The user's current checkout state: the base reservation amount (fixed
/// for the session), the chosen add-ons, and the payment mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    base_price_cents: i32,
    addons: HashMap<String, SelectedAddon>,
    payment_mode: PaymentMode,
}

impl Selection {
    pub fn new(base_price_cents: i32) -> Self {
        Self {
            base_price_cents,
            addons: HashMap::new(),
            payment_mode: PaymentMode::Card,
        }
    }

    pub fn base_price_cents(&self) -> i32 {
        self.base_price_cents
    }

    pub fn addons(&self) -> &HashMap<String, SelectedAddon> {
        &self.addons
    }

    pub fn payment_mode(&self) -> PaymentMode {
        self.payment_mode
    }

    pub fn select_addon(&mut self, item_id: impl Into<String>, selected: SelectedAddon) {
        self.addons.insert(item_id.into(), selected);
    }

    /// Returns whether the item was selected
    pub fn deselect_addon(&mut self, item_id: &str) -> bool {
        self.addons.remove(item_id).is_some()
    }

    /// Returns whether the item was selected. Quantity is clamped to the
    /// `1..=MAX_ADDON_QUANTITY` range.
    pub fn set_quantity(&mut self, item_id: &str, quantity: i32) -> bool {
        match self.addons.get_mut(item_id) {
            Some(selected) => {
                selected.quantity = quantity.clamp(1, MAX_ADDON_QUANTITY);
                true
            }
            None => false,
        }
    }

    // Eligibility is validated by the session before the mode lands here
    pub(crate) fn set_payment_mode(&mut self, mode: PaymentMode) {
        self.payment_mode = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_round_trip() {
        let mut selection = Selection::new(315_000);
        assert_eq!(selection.payment_mode(), PaymentMode::Card);

        selection.select_addon("insurance", SelectedAddon::new());
        assert!(selection.addons().contains_key("insurance"));

        assert!(selection.deselect_addon("insurance"));
        assert!(!selection.deselect_addon("insurance"));
    }

    #[test]
    fn test_quantity_clamped_on_write() {
        let mut selection = Selection::new(315_000);
        selection.select_addon("excursion", SelectedAddon::with_quantity(2));

        assert!(selection.set_quantity("excursion", -4));
        assert_eq!(selection.addons()["excursion"].quantity, 1);

        assert!(selection.set_quantity("excursion", 1_000_000));
        assert_eq!(
            selection.addons()["excursion"].quantity,
            MAX_ADDON_QUANTITY
        );

        assert!(!selection.set_quantity("missing", 2));
    }
}
