use crate::payment::PaymentMode;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome reported by the booking-creation collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingOutcome {
    /// Payment must be finalized on the hosted payment page
    RedirectRequired { redirect_reference: String },
    /// Stored funds covered the full total, nothing left to collect
    Completed,
}

/// Finalized checkout payload submitted for booking creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub booking_type: String,
    pub booking_data: serde_json::Value,
    pub customer_info: serde_json::Value,
    pub payment_mode: PaymentMode,
    pub fund_amount_cents: i32,
    pub total_cents: i32,
    pub currency: String,
    pub selected_addons: serde_json::Value,
    pub cross_sell_items: serde_json::Value,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingResponse {
    pub booking_id: Uuid,
    pub outcome: BookingOutcome,
}

/// The downstream booking-creation service
#[async_trait]
pub trait BookingBackend: Send + Sync {
    /// Submit a finalized checkout attempt for booking creation
    async fn create_booking(
        &self,
        request: &BookingRequest,
    ) -> Result<BookingResponse, Box<dyn std::error::Error + Send + Sync>>;
}
