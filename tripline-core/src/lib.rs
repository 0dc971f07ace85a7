pub mod booking;
pub mod funds;
pub mod loyalty;
pub mod payment;

/// Checkout-wide error taxonomy. Local validation failures never reach the
/// network; orchestration and external-payment failures keep the selection
/// intact so the user can retry.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Fund balance insufficient: required {required_cents}, available {available_cents}")]
    BalanceInsufficient {
        required_cents: i32,
        available_cents: i32,
    },

    #[error("Booking creation failed: {0}")]
    Orchestration(String),

    #[error("External payment failed: {0}")]
    ExternalPayment(String),

    #[error("A booking initiation is already in flight for this session")]
    InitiationInFlight,
}

pub type CheckoutResult<T> = Result<T, CheckoutError>;
