use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Payment modes offered at checkout
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    /// Full card payment via the hosted payment page
    Card,
    /// Full payment from the stored-fund balance
    Fund,
    /// Stored funds up to the balance, remainder on card
    Split,
}

/// Exact card/fund portions for a split payment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SplitAmounts {
    pub fund_portion_cents: i32,
    pub card_portion_cents: i32,
}

/// Which modes are currently selectable, plus the split portions when a
/// split is on offer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeResolution {
    pub eligible: Vec<PaymentMode>,
    pub split: Option<SplitAmounts>,
}

impl ModeResolution {
    pub fn is_eligible(&self, mode: PaymentMode) -> bool {
        self.eligible.contains(&mode)
    }

    /// Returns the mode to keep using and whether a forced change occurred.
    /// A mode that fell out of eligibility (e.g. the total grew past the
    /// fund balance) falls back to `Card`; the caller surfaces the change.
    pub fn reconcile(&self, current: PaymentMode) -> (PaymentMode, bool) {
        if self.is_eligible(current) {
            (current, false)
        } else {
            tracing::info!(
                "Payment mode {:?} no longer eligible, forcing CARD",
                current
            );
            (PaymentMode::Card, true)
        }
    }
}

/// Determine which payment modes are selectable for a total and the
/// available stored-fund balance.
///
/// `Card` is always selectable. `Fund` requires the balance to cover the
/// full total; `Split` is offered only for a strictly partial balance, so
/// the two are never offered together (balance == total resolves to `Fund`).
pub fn resolve_modes(total_cents: i32, fund_balance_cents: i32) -> ModeResolution {
    let mut eligible = vec![PaymentMode::Card];
    let mut split = None;

    if fund_balance_cents >= total_cents {
        eligible.push(PaymentMode::Fund);
    } else if fund_balance_cents > 0 {
        eligible.push(PaymentMode::Split);
        let fund_portion_cents = fund_balance_cents.min(total_cents);
        split = Some(SplitAmounts {
            fund_portion_cents,
            card_portion_cents: total_cents - fund_portion_cents,
        });
    }

    ModeResolution { eligible, split }
}

/// The fund amount to deduct for a mode: the full total for `Fund`, the
/// fund portion for `Split`, zero for `Card`.
pub fn fund_amount_for(mode: PaymentMode, total_cents: i32, resolution: &ModeResolution) -> i32 {
    match mode {
        PaymentMode::Card => 0,
        PaymentMode::Fund => total_cents,
        PaymentMode::Split => resolution
            .split
            .map(|s| s.fund_portion_cents)
            .unwrap_or(0),
    }
}

/// Hands control to the external payment processor's hosted page.
/// Irreversible once invoked; the orchestrator fires it at most once per
/// booking attempt.
#[async_trait]
pub trait RedirectGateway: Send + Sync {
    async fn redirect(
        &self,
        reference: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_partial_balance_offers_split() {
        let resolution = resolve_modes(332_400, 200_000);

        assert!(resolution.is_eligible(PaymentMode::Card));
        assert!(resolution.is_eligible(PaymentMode::Split));
        assert!(!resolution.is_eligible(PaymentMode::Fund));

        let split = resolution.split.unwrap();
        assert_eq!(split.fund_portion_cents, 200_000);
        assert_eq!(split.card_portion_cents, 132_400);
    }

    #[test]
    fn test_covering_balance_offers_fund_not_split() {
        let resolution = resolve_modes(332_400, 400_000);

        assert!(resolution.is_eligible(PaymentMode::Card));
        assert!(resolution.is_eligible(PaymentMode::Fund));
        assert!(!resolution.is_eligible(PaymentMode::Split));
        assert!(resolution.split.is_none());
    }

    #[test]
    fn test_balance_equal_to_total_is_fund() {
        let resolution = resolve_modes(332_400, 332_400);

        assert!(resolution.is_eligible(PaymentMode::Fund));
        assert!(!resolution.is_eligible(PaymentMode::Split));
    }

    #[test]
    fn test_zero_balance_is_card_only() {
        let resolution = resolve_modes(332_400, 0);

        assert_eq!(resolution.eligible, vec![PaymentMode::Card]);
        assert!(resolution.split.is_none());
    }

    #[test]
    fn test_fund_eligibility_over_random_pairs() {
        let mut rng = rand::thread_rng();

        for _ in 0..1000 {
            let total = rng.gen_range(0..=1_000_000);
            let balance = rng.gen_range(0..=1_000_000);
            let resolution = resolve_modes(total, balance);

            assert_eq!(
                resolution.is_eligible(PaymentMode::Fund),
                balance >= total,
                "fund eligibility mismatch at balance={balance} total={total}"
            );
        }
    }

    #[test]
    fn test_split_portions_sum_to_total_exactly() {
        let mut rng = rand::thread_rng();

        for _ in 0..1000 {
            let total = rng.gen_range(1..=1_000_000);
            let balance = rng.gen_range(0..=1_000_000);
            let resolution = resolve_modes(total, balance);

            if let Some(split) = resolution.split {
                assert!(resolution.is_eligible(PaymentMode::Split));
                assert_eq!(split.fund_portion_cents + split.card_portion_cents, total);
                assert!(split.fund_portion_cents > 0);
                assert!(split.card_portion_cents > 0);
            }
        }
    }

    #[test]
    fn test_reconcile_forces_card_when_total_outgrows_balance() {
        // Fund was valid at total 3324.00 with balance 4000.00
        let before = resolve_modes(332_400, 400_000);
        let (mode, forced) = before.reconcile(PaymentMode::Fund);
        assert_eq!(mode, PaymentMode::Fund);
        assert!(!forced);

        // A 1000.00 add-on pushes the total to 4324.00
        let after = resolve_modes(432_400, 400_000);
        let (mode, forced) = after.reconcile(PaymentMode::Fund);
        assert_eq!(mode, PaymentMode::Card);
        assert!(forced);
    }

    #[test]
    fn test_fund_amount_per_mode() {
        let resolution = resolve_modes(332_400, 200_000);

        assert_eq!(fund_amount_for(PaymentMode::Card, 332_400, &resolution), 0);
        assert_eq!(
            fund_amount_for(PaymentMode::Fund, 332_400, &resolution),
            332_400
        );
        assert_eq!(
            fund_amount_for(PaymentMode::Split, 332_400, &resolution),
            200_000
        );
    }
}
