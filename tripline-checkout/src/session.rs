use crate::models::{AttemptStatus, BookingAttempt};
use crate::orchestrator::BookingOrchestrator;
use crate::selection::Selection;
use serde::{Deserialize, Serialize};
use tripline_catalog::addon::AddonCatalog;
use tripline_catalog::pricing::{self, PricingError, SelectedAddon};
use tripline_core::payment::{self, ModeResolution, PaymentMode};
use tripline_core::{CheckoutError, CheckoutResult};

/// Checkout step in the session lifecycle; ordered, forward-gated,
/// backward-open
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStep {
    SelectExtras,
    ChoosePayment,
    ConfirmBooking,
    Complete,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid step transition from {from:?} to {to:?}")]
    InvalidTransition { from: SessionStep, to: SessionStep },

    #[error("Payment mode {mode:?} is not eligible for the current total")]
    IneligibleMode { mode: PaymentMode },

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),
}

/// Client-driven checkout state container, decoupled from any rendering
/// technology. Holds the step, the live selection, and the latest values
/// of the three background loads (catalog, fund balance, loyalty points);
/// total and mode eligibility are recomputed from scratch on every read.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    step: SessionStep,
    selection: Selection,
    catalog: AddonCatalog,
    fund_balance_cents: i32,
    loyalty_points: Option<i32>,
    forced_mode_notice: Option<PaymentMode>,
    last_attempt: Option<BookingAttempt>,
}

impl CheckoutSession {
    pub fn new(base_price_cents: i32) -> Self {
        Self {
            step: SessionStep::SelectExtras,
            selection: Selection::new(base_price_cents),
            catalog: AddonCatalog::default(),
            fund_balance_cents: 0,
            loyalty_points: None,
            forced_mode_notice: None,
            last_attempt: None,
        }
    }

    pub fn current_step(&self) -> SessionStep {
        self.step
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn catalog(&self) -> &AddonCatalog {
        &self.catalog
    }

    pub fn fund_balance_cents(&self) -> i32 {
        self.fund_balance_cents
    }

    pub fn loyalty_points(&self) -> Option<i32> {
        self.loyalty_points
    }

    pub fn last_attempt(&self) -> Option<&BookingAttempt> {
        self.last_attempt.as_ref()
    }

    /// Live total, recomputed synchronously from the current catalog and
    /// selection
    pub fn total(&self) -> Result<i32, PricingError> {
        pricing::compute_total(
            self.selection.base_price_cents(),
            &self.catalog,
            self.selection.addons(),
        )
    }

    pub fn resolution(&self) -> Result<ModeResolution, PricingError> {
        Ok(payment::resolve_modes(self.total()?, self.fund_balance_cents))
    }

    pub fn eligible_modes(&self) -> Result<Vec<PaymentMode>, PricingError> {
        Ok(self.resolution()?.eligible)
    }

    pub fn select_addon(
        &mut self,
        item_id: &str,
        selected: SelectedAddon,
    ) -> Result<(), SessionError> {
        if !self.catalog.contains(item_id) {
            return Err(PricingError::StaleSelection(item_id.to_string()).into());
        }
        self.selection.select_addon(item_id, selected);
        self.reconcile_mode();
        Ok(())
    }

    pub fn deselect_addon(&mut self, item_id: &str) -> bool {
        let removed = self.selection.deselect_addon(item_id);
        if removed {
            self.reconcile_mode();
        }
        removed
    }

    pub fn set_quantity(&mut self, item_id: &str, quantity: i32) -> bool {
        let updated = self.selection.set_quantity(item_id, quantity);
        if updated {
            self.reconcile_mode();
        }
        updated
    }

    /// Choose a payment mode. Rejected when the fund balance no longer
    /// supports it under the live total.
    pub fn set_payment_mode(&mut self, mode: PaymentMode) -> Result<(), SessionError> {
        let total = self.total()?;
        let resolution = payment::resolve_modes(total, self.fund_balance_cents);

        if !resolution.is_eligible(mode) {
            return Err(CheckoutError::BalanceInsufficient {
                required_cents: total,
                available_cents: self.fund_balance_cents,
            }
            .into());
        }

        self.selection.set_payment_mode(mode);
        Ok(())
    }

    /// Move forward one step. SelectExtras -> ChoosePayment is always
    /// allowed (zero add-ons is a valid selection) but reprices first so a
    /// stale selection surfaces here; ChoosePayment -> ConfirmBooking
    /// requires the chosen mode to be eligible under the live total.
    /// Complete is reached only through an orchestration outcome.
    pub fn advance_step(&mut self) -> Result<SessionStep, SessionError> {
        match self.step {
            SessionStep::SelectExtras => {
                self.total()?;
                self.step = SessionStep::ChoosePayment;
            }
            SessionStep::ChoosePayment => {
                let mode = self.selection.payment_mode();
                if !self.resolution()?.is_eligible(mode) {
                    return Err(SessionError::IneligibleMode { mode });
                }
                self.step = SessionStep::ConfirmBooking;
            }
            SessionStep::ConfirmBooking => {
                return Err(SessionError::InvalidTransition {
                    from: SessionStep::ConfirmBooking,
                    to: SessionStep::Complete,
                });
            }
            SessionStep::Complete => {
                return Err(SessionError::InvalidTransition {
                    from: SessionStep::Complete,
                    to: SessionStep::Complete,
                });
            }
        }
        Ok(self.step)
    }

    /// Move backward one step. Always permitted from the middle steps and
    /// never discards the selection.
    pub fn retreat_step(&mut self) -> Result<SessionStep, SessionError> {
        self.step = match self.step {
            SessionStep::ChoosePayment => SessionStep::SelectExtras,
            SessionStep::ConfirmBooking => SessionStep::ChoosePayment,
            from @ (SessionStep::SelectExtras | SessionStep::Complete) => {
                return Err(SessionError::InvalidTransition { from, to: from });
            }
        };
        Ok(self.step)
    }

    /// Latest value wins: a fresh recommendation load replaces the offered
    /// catalog wholesale. Entries selected for items that disappeared are
    /// not repriced silently; pricing rejects them on the next read.
    pub fn apply_catalog(&mut self, catalog: AddonCatalog) {
        self.catalog = catalog;
        self.reconcile_mode();
    }

    /// Latest value wins for the fund balance; a shrunken balance may force
    /// the mode back to `Card`.
    pub fn apply_fund_balance(&mut self, balance_cents: i32) {
        self.fund_balance_cents = balance_cents.max(0);
        self.reconcile_mode();
    }

    pub fn apply_loyalty_points(&mut self, points: i32) {
        self.loyalty_points = Some(points);
    }

    /// The mode that was forcibly abandoned since the last read, if any.
    /// Consumed by the UI to surface the change instead of retaining an
    /// ineligible mode silently.
    pub fn take_forced_mode_notice(&mut self) -> Option<PaymentMode> {
        self.forced_mode_notice.take()
    }

    fn reconcile_mode(&mut self) {
        // A stale selection cannot be priced; the error surfaces at the
        // next total() or advance_step() read instead.
        let total = match self.total() {
            Ok(total) => total,
            Err(_) => return,
        };

        let resolution = payment::resolve_modes(total, self.fund_balance_cents);
        let current = self.selection.payment_mode();
        let (mode, forced) = resolution.reconcile(current);
        if forced {
            self.forced_mode_notice = Some(current);
            self.selection.set_payment_mode(mode);
        }
    }

    /// Submit the finalized selection through the orchestrator and map the
    /// attempt outcome onto the step machine. A failed attempt returns the
    /// session to ChoosePayment with the selection intact; an attempt
    /// awaiting external payment leaves the step alone because control has
    /// left the process.
    pub async fn submit(
        &mut self,
        orchestrator: &BookingOrchestrator,
        booking_type: &str,
        booking_data: serde_json::Value,
        customer_info: serde_json::Value,
    ) -> CheckoutResult<BookingAttempt> {
        if self.step != SessionStep::ConfirmBooking {
            return Err(CheckoutError::Validation(
                "Submission requires the confirmation step".to_string(),
            ));
        }

        let attempt = orchestrator
            .initiate(
                &self.catalog,
                &self.selection,
                self.fund_balance_cents,
                booking_type,
                booking_data,
                customer_info,
            )
            .await?;

        self.record_attempt(attempt.clone());
        Ok(attempt)
    }

    /// Re-hydrate the session from a persisted attempt after return
    /// navigation from the hosted payment page. `succeeded` is the
    /// processor's verdict; a failure keeps the user on ChoosePayment with
    /// the selection intact, never back at SelectExtras.
    pub fn resume_from_external(
        &mut self,
        mut attempt: BookingAttempt,
        succeeded: bool,
        message: Option<String>,
    ) -> CheckoutResult<SessionStep> {
        if attempt.status != AttemptStatus::AwaitingExternalPayment {
            return Err(CheckoutError::Validation(
                "Return navigation requires an attempt awaiting external payment".to_string(),
            ));
        }

        attempt.settle_external(succeeded, message);
        let failure = attempt.failure_message.clone();
        self.resume(attempt);

        match failure {
            Some(message) if !succeeded => Err(CheckoutError::ExternalPayment(message)),
            _ => Ok(self.step),
        }
    }

    /// Re-hydrate the step machine from a persisted attempt.
    pub fn resume(&mut self, attempt: BookingAttempt) {
        self.step = match attempt.status {
            AttemptStatus::Completed => SessionStep::Complete,
            AttemptStatus::Failed => SessionStep::ChoosePayment,
            AttemptStatus::AwaitingExternalPayment | AttemptStatus::Pending => {
                SessionStep::ConfirmBooking
            }
        };
        self.last_attempt = Some(attempt);
    }

    fn record_attempt(&mut self, attempt: BookingAttempt) {
        match attempt.status {
            AttemptStatus::Completed => self.step = SessionStep::Complete,
            // Never back to SelectExtras: that would discard add-on choices
            AttemptStatus::Failed => self.step = SessionStep::ChoosePayment,
            // Control leaves the process on redirect; the step moves only
            // when return navigation re-hydrates the attempt
            AttemptStatus::AwaitingExternalPayment | AttemptStatus::Pending => {}
        }
        self.last_attempt = Some(attempt);
    }
}
