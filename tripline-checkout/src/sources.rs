use crate::session::CheckoutSession;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tripline_catalog::addon::{AddonCatalog, RecommendationSource};
use tripline_core::funds::FundBalanceSource;
use tripline_core::loyalty::LoyaltySource;

/// A checkout session shared with the background loads
pub type SharedSession = Arc<Mutex<CheckoutSession>>;

/// Fans out the three independent context loads: recommendations, fund
/// balance, loyalty balance. Each result lands on the session the moment
/// it resolves (latest value wins); none blocks the others or manual
/// add-on selection, and a failed load leaves the previous value in place.
pub struct ContextLoader {
    recommendations: Arc<dyn RecommendationSource>,
    funds: Arc<dyn FundBalanceSource>,
    loyalty: Arc<dyn LoyaltySource>,
}

impl ContextLoader {
    pub fn new(
        recommendations: Arc<dyn RecommendationSource>,
        funds: Arc<dyn FundBalanceSource>,
        loyalty: Arc<dyn LoyaltySource>,
    ) -> Self {
        Self {
            recommendations,
            funds,
            loyalty,
        }
    }

    /// Spawn the three loads for a session. Returns the join handles so
    /// callers that need settled context (tests, prefetch) can await them;
    /// interactive callers may drop them.
    pub fn spawn(
        &self,
        session: SharedSession,
        booking_type: String,
        trip: serde_json::Value,
    ) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(3);

        {
            let source = Arc::clone(&self.recommendations);
            let session = Arc::clone(&session);
            handles.push(tokio::spawn(async move {
                match source.recommendations(&booking_type, &trip).await {
                    Ok(items) => {
                        let catalog = AddonCatalog::new(items);
                        tracing::info!("Recommendation load landed ({} items)", catalog.len());
                        session.lock().await.apply_catalog(catalog);
                    }
                    Err(e) => tracing::warn!("Recommendation load failed: {e}"),
                }
            }));
        }

        {
            let source = Arc::clone(&self.funds);
            let session = Arc::clone(&session);
            handles.push(tokio::spawn(async move {
                match source.fund_balance().await {
                    Ok(balance) => session.lock().await.apply_fund_balance(balance),
                    Err(e) => tracing::warn!("Fund balance load failed: {e}"),
                }
            }));
        }

        {
            let source = Arc::clone(&self.loyalty);
            handles.push(tokio::spawn(async move {
                match source.point_balance().await {
                    Ok(points) => session.lock().await.apply_loyalty_points(points),
                    Err(e) => tracing::warn!("Loyalty balance load failed: {e}"),
                }
            }));
        }

        handles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::MockLoyaltyLedger;
    use async_trait::async_trait;
    use std::time::Duration;
    use tripline_catalog::addon::AddonItem;

    struct SlowRecommendations;

    #[async_trait]
    impl RecommendationSource for SlowRecommendations {
        async fn recommendations(
            &self,
            _booking_type: &str,
            _trip: &serde_json::Value,
        ) -> Result<Vec<AddonItem>, Box<dyn std::error::Error + Send + Sync>> {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok(vec![AddonItem::new("insurance", "Travel Insurance", 8900)])
        }
    }

    struct FastFunds;

    #[async_trait]
    impl FundBalanceSource for FastFunds {
        async fn fund_balance(&self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
            Ok(200_000)
        }
    }

    struct FailingFunds;

    #[async_trait]
    impl FundBalanceSource for FailingFunds {
        async fn fund_balance(&self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
            Err("ledger unavailable".into())
        }
    }

    #[tokio::test]
    async fn test_loads_land_independently_in_any_order() {
        let loader = ContextLoader::new(
            Arc::new(SlowRecommendations),
            Arc::new(FastFunds),
            Arc::new(MockLoyaltyLedger::new()),
        );

        let session = Arc::new(Mutex::new(CheckoutSession::new(315_000)));
        let handles = loader.spawn(
            Arc::clone(&session),
            "RESORT".to_string(),
            serde_json::json!({"destination": "Maui"}),
        );

        // The fund balance resolves well before the recommendations; the
        // session is usable in between
        tokio::time::sleep(Duration::from_millis(10)).await;
        {
            let session = session.lock().await;
            assert_eq!(session.fund_balance_cents(), 200_000);
            assert!(session.catalog().is_empty());
        }

        for handle in handles {
            handle.await.unwrap();
        }

        let session = session.lock().await;
        assert!(session.catalog().contains("insurance"));
        assert_eq!(session.loyalty_points(), Some(1250));
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_value() {
        let loader = ContextLoader::new(
            Arc::new(SlowRecommendations),
            Arc::new(FailingFunds),
            Arc::new(MockLoyaltyLedger::new()),
        );

        let session = Arc::new(Mutex::new(CheckoutSession::new(315_000)));
        session.lock().await.apply_fund_balance(50_000);

        let handles = loader.spawn(Arc::clone(&session), "RESORT".to_string(), serde_json::json!({}));
        for handle in handles {
            handle.await.unwrap();
        }

        let session = session.lock().await;
        assert_eq!(session.fund_balance_cents(), 50_000);
        assert!(session.catalog().contains("insurance"));
    }
}
