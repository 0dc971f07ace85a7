use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tripline_catalog::pricing::SelectedAddon;
use tripline_core::payment::PaymentMode;
use tripline_core::CheckoutError;
use uuid::Uuid;

/// Booking attempt status in the lifecycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    Pending,
    AwaitingExternalPayment,
    Completed,
    Failed,
}

/// One submission record for a single try at finalizing a booking.
///
/// The snapshot fields (selection, totals, portions) are fixed at creation;
/// only the status and its companion fields move afterwards. A resubmission
/// always builds a new attempt with a fresh identifier, so the backend
/// never sees the same attempt twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingAttempt {
    pub id: Uuid,
    pub base_price_cents: i32,
    pub addons: HashMap<String, SelectedAddon>,
    pub payment_mode: PaymentMode,
    pub total_cents: i32,
    pub fund_portion_cents: i32,
    pub card_portion_cents: i32,
    pub currency: String,
    pub status: AttemptStatus,
    pub booking_id: Option<Uuid>,
    pub redirect_reference: Option<String>,
    pub failure_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BookingAttempt {
    pub fn new(
        base_price_cents: i32,
        addons: HashMap<String, SelectedAddon>,
        payment_mode: PaymentMode,
        total_cents: i32,
        fund_portion_cents: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            base_price_cents,
            addons,
            payment_mode,
            total_cents,
            fund_portion_cents,
            card_portion_cents: total_cents - fund_portion_cents,
            currency: "USD".to_string(),
            status: AttemptStatus::Pending,
            booking_id: None,
            redirect_reference: None,
            failure_message: None,
            created_at: Utc::now(),
        }
    }

    /// The backend issued a payment-redirect reference; completion will be
    /// observed on return navigation, not locally.
    pub fn mark_awaiting(&mut self, booking_id: Uuid, redirect_reference: String) {
        self.status = AttemptStatus::AwaitingExternalPayment;
        self.booking_id = Some(booking_id);
        self.redirect_reference = Some(redirect_reference);
    }

    /// Stored funds covered the full total; the booking is done.
    pub fn mark_completed(&mut self, booking_id: Uuid) {
        self.status = AttemptStatus::Completed;
        self.booking_id = Some(booking_id);
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.status = AttemptStatus::Failed;
        self.failure_message = Some(message.into());
    }

    /// Apply the payment processor's verdict observed on return navigation
    /// from the hosted payment page.
    pub fn settle_external(&mut self, succeeded: bool, message: Option<String>) {
        if succeeded {
            self.status = AttemptStatus::Completed;
        } else {
            self.status = AttemptStatus::Failed;
            self.failure_message =
                Some(message.unwrap_or_else(|| "External payment was not completed".to_string()));
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status == AttemptStatus::Completed
    }

    /// The user-facing error for a failed attempt, if any. `Failed` is
    /// recoverable: the selection survives and a retry builds a new attempt.
    pub fn failure(&self) -> Option<CheckoutError> {
        if self.status != AttemptStatus::Failed {
            return None;
        }
        Some(CheckoutError::Orchestration(
            self.failure_message
                .clone()
                .unwrap_or_else(|| "Booking could not be created".to_string()),
        ))
    }
}
