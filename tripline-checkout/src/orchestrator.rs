use crate::models::BookingAttempt;
use crate::selection::Selection;
use chrono::Utc;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tripline_catalog::addon::AddonCatalog;
use tripline_catalog::pricing;
use tripline_core::booking::{BookingBackend, BookingOutcome, BookingRequest, BookingResponse};
use tripline_core::loyalty::LoyaltySource;
use tripline_core::payment::{self, RedirectGateway};
use tripline_core::{CheckoutError, CheckoutResult};
use uuid::Uuid;

/// Drives one checkout attempt end to end: local validation, submission to
/// the booking backend, and interpretation of the redirect-or-complete
/// response. A single initiation may be in flight per orchestrator; errors
/// are never retried automatically.
pub struct BookingOrchestrator {
    backend: Arc<dyn BookingBackend>,
    gateway: Arc<dyn RedirectGateway>,
    loyalty: Arc<dyn LoyaltySource>,
    in_flight: AtomicBool,
}

// Releases the in-flight flag on every exit path
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl BookingOrchestrator {
    pub fn new(
        backend: Arc<dyn BookingBackend>,
        gateway: Arc<dyn RedirectGateway>,
        loyalty: Arc<dyn LoyaltySource>,
    ) -> Self {
        Self {
            backend,
            gateway,
            loyalty,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Initiate a booking for the finalized selection.
    ///
    /// Every call that passes the in-flight gate yields a fresh attempt
    /// with its own identifier, so a retry after a failure can never
    /// resubmit the same attempt to the backend. Local validation failures
    /// (stale selection, ineligible mode) mark the attempt failed before
    /// any network call is made.
    pub async fn initiate(
        &self,
        catalog: &AddonCatalog,
        selection: &Selection,
        fund_balance_cents: i32,
        booking_type: &str,
        booking_data: serde_json::Value,
        customer_info: serde_json::Value,
    ) -> CheckoutResult<BookingAttempt> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CheckoutError::InitiationInFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let mode = selection.payment_mode();

        // Local validation: no network call is made past a failure here
        let total = match pricing::compute_total(
            selection.base_price_cents(),
            catalog,
            selection.addons(),
        ) {
            Ok(total) => total,
            Err(e) => {
                let mut attempt = BookingAttempt::new(
                    selection.base_price_cents(),
                    selection.addons().clone(),
                    mode,
                    0,
                    0,
                );
                attempt.mark_failed(format!("Selection can no longer be priced: {e}"));
                tracing::warn!("Attempt {} rejected before submission: {e}", attempt.id);
                return Ok(attempt);
            }
        };

        let resolution = payment::resolve_modes(total, fund_balance_cents);
        if !resolution.is_eligible(mode) {
            let mut attempt = BookingAttempt::new(
                selection.base_price_cents(),
                selection.addons().clone(),
                mode,
                total,
                0,
            );
            attempt.mark_failed(format!(
                "Payment mode {mode:?} is not eligible for a total of {total} cents"
            ));
            tracing::warn!("Attempt {} rejected before submission: ineligible mode", attempt.id);
            return Ok(attempt);
        }

        let fund_amount_cents = payment::fund_amount_for(mode, total, &resolution);
        let mut attempt = BookingAttempt::new(
            selection.base_price_cents(),
            selection.addons().clone(),
            mode,
            total,
            fund_amount_cents,
        );

        tracing::info!(
            "Initiating booking attempt {} (mode {:?}, total {} cents, fund {} cents)",
            attempt.id,
            mode,
            total,
            fund_amount_cents
        );

        let request = BookingRequest {
            booking_type: booking_type.to_string(),
            booking_data,
            customer_info,
            payment_mode: mode,
            fund_amount_cents,
            total_cents: total,
            currency: attempt.currency.clone(),
            selected_addons: serde_json::to_value(selection.addons()).unwrap_or_default(),
            cross_sell_items: bundled_cross_sell(catalog, selection),
            requested_at: Utc::now(),
        };

        match self.backend.create_booking(&request).await {
            Ok(BookingResponse {
                booking_id,
                outcome: BookingOutcome::Completed,
            }) => {
                attempt.mark_completed(booking_id);
                tracing::info!(
                    "Booking {} completed without external payment (attempt {})",
                    booking_id,
                    attempt.id
                );
                self.spawn_accrual(attempt.id, total);
            }
            Ok(BookingResponse {
                booking_id,
                outcome: BookingOutcome::RedirectRequired { redirect_reference },
            }) => {
                attempt.mark_awaiting(booking_id, redirect_reference.clone());
                // The redirect hands control to the hosted payment page and
                // fires at most once per attempt; re-entrant initiation is
                // blocked by the in-flight gate above
                if let Err(e) = self.gateway.redirect(&redirect_reference).await {
                    tracing::error!(
                        "Redirect failed for attempt {} (reference {}): {e}",
                        attempt.id,
                        redirect_reference
                    );
                    attempt.mark_failed(format!("Payment redirect failed: {e}"));
                }
            }
            Err(e) => {
                tracing::error!("Booking creation failed for attempt {}: {e}", attempt.id);
                attempt.mark_failed(format!("Booking could not be created: {e}"));
            }
        }

        Ok(attempt)
    }

    // Accrual must never fail the booking, so it runs detached
    fn spawn_accrual(&self, attempt_id: Uuid, total_cents: i32) {
        let loyalty = Arc::clone(&self.loyalty);
        tokio::spawn(async move {
            if let Err(e) = loyalty.accrue(attempt_id, total_cents).await {
                tracing::warn!("Loyalty accrual failed for attempt {attempt_id}: {e}");
            }
        });
    }
}

/// Selected add-ons enriched from the live catalog, as the backend expects
/// them bundled alongside the booking payload
fn bundled_cross_sell(catalog: &AddonCatalog, selection: &Selection) -> serde_json::Value {
    let items: Vec<serde_json::Value> = selection
        .addons()
        .iter()
        .filter_map(|(item_id, selected)| {
            catalog.get(item_id).map(|item| {
                json!({
                    "item_id": item.id,
                    "name": item.name,
                    "option_id": selected.option_id,
                    "quantity": if item.supports_quantity { selected.quantity.max(1) } else { 1 },
                    "currency": item.currency,
                })
            })
        })
        .collect();

    serde_json::Value::Array(items)
}

/// In-memory booking backend: completes immediately when funds cover the
/// total, otherwise requires a redirect. `{"simulate_failure": true}` in
/// the booking data triggers a backend rejection.
pub struct MockBookingBackend;

#[async_trait::async_trait]
impl BookingBackend for MockBookingBackend {
    async fn create_booking(
        &self,
        request: &BookingRequest,
    ) -> Result<BookingResponse, Box<dyn std::error::Error + Send + Sync>> {
        if request.booking_data["simulate_failure"].as_bool().unwrap_or(false) {
            return Err("Simulated booking backend failure".into());
        }

        let booking_id = Uuid::new_v4();
        if request.fund_amount_cents >= request.total_cents {
            Ok(BookingResponse {
                booking_id,
                outcome: BookingOutcome::Completed,
            })
        } else {
            Ok(BookingResponse {
                booking_id,
                outcome: BookingOutcome::RedirectRequired {
                    redirect_reference: format!("mock_pay_{}", booking_id.simple()),
                },
            })
        }
    }
}

/// Counts redirects instead of leaving the process
#[derive(Default)]
pub struct MockRedirectGateway {
    issued: AtomicUsize,
}

impl MockRedirectGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::Acquire)
    }
}

#[async_trait::async_trait]
impl RedirectGateway for MockRedirectGateway {
    async fn redirect(
        &self,
        _reference: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.issued.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

/// In-memory loyalty ledger. `fail_accruals` simulates a ledger outage.
pub struct MockLoyaltyLedger {
    pub fail_accruals: bool,
    accrued_cents: AtomicUsize,
}

impl MockLoyaltyLedger {
    pub fn new() -> Self {
        Self {
            fail_accruals: false,
            accrued_cents: AtomicUsize::new(0),
        }
    }

    pub fn accrued_cents(&self) -> usize {
        self.accrued_cents.load(Ordering::Acquire)
    }
}

impl Default for MockLoyaltyLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LoyaltySource for MockLoyaltyLedger {
    async fn point_balance(&self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        Ok(1250)
    }

    async fn accrue(
        &self,
        _attempt_id: Uuid,
        total_cents: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.fail_accruals {
            return Err("Simulated loyalty ledger outage".into());
        }
        self.accrued_cents
            .fetch_add(total_cents.max(0) as usize, Ordering::AcqRel);
        Ok(())
    }
}
