use async_trait::async_trait;

/// Stored-fund balance ledger for the current user
#[async_trait]
pub trait FundBalanceSource: Send + Sync {
    /// Current available balance in minor units
    async fn fund_balance(&self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>>;
}
