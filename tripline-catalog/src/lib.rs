pub mod addon;
pub mod pricing;

pub use addon::{AddonCatalog, AddonItem, AddonOption, RecommendationSource};
pub use pricing::{compute_total, unit_price, PricingError, SelectedAddon};
