use async_trait::async_trait;
use uuid::Uuid;

/// Loyalty-points ledger
#[async_trait]
pub trait LoyaltySource: Send + Sync {
    /// Current point balance for the user
    async fn point_balance(&self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>>;

    /// Accrue points for a completed booking attempt. Fire-and-forget at
    /// the call site: a failure is logged, never propagated into the
    /// booking outcome.
    async fn accrue(
        &self,
        attempt_id: Uuid,
        total_cents: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
