//! Property-based tests for obligation balances and payment planning.
//!
//! - Property 5: Payments are conserved across obligations
//! - Property 6: Status follows the derived balance

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use beneficio_shared::money;

use super::ledger::{ObligationSnapshot, plan_operation};
use super::types::{
    LedgerOperation, MovementKind, Obligation, ObligationKind, ObligationMovement,
    ObligationStatus,
};

/// Strategy to generate principals (1.00 to 50,000.00).
fn principal() -> impl Strategy<Value = Decimal> {
    (100i64..5_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn snapshots(principals: &[Decimal]) -> (Uuid, Vec<ObligationSnapshot>) {
    let producer = Uuid::new_v4();
    let base = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    let snapshots = principals
        .iter()
        .zip(0i64..)
        .map(|(principal, day)| {
            let obligation = Obligation {
                id: Uuid::new_v4(),
                producer_id: producer,
                kind: ObligationKind::CashAdvance,
                principal: *principal,
                opened_at: base + Duration::days(day),
                status: ObligationStatus::Active,
            };
            let charge = ObligationMovement {
                id: Uuid::new_v4(),
                obligation_id: obligation.id,
                kind: MovementKind::ChargePrincipal,
                amount: *principal,
                at: obligation.opened_at,
                note: None,
            };
            ObligationSnapshot {
                obligation,
                movements: vec![charge],
            }
        })
        .collect();
    (producer, snapshots)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property 5: A principal payment is split without leakage.**
    ///
    /// *For any* set of loans and any payment up to their total principal, the
    /// planned postings SHALL sum to the payment and never exceed a loan's
    /// pending principal.
    #[test]
    fn prop_payment_conserved(
        principals in prop::collection::vec(principal(), 1..8),
        percent in 1u32..=100,
    ) {
        let (producer, snapshots) = snapshots(&principals);
        let total = money::sum(principals.iter().copied());
        let amount = money::round2(total * Decimal::from(percent) / Decimal::from(100));
        prop_assume!(amount > Decimal::ZERO);

        let plan = plan_operation(producer, LedgerOperation::PaymentPrincipal, amount, &snapshots)
            .unwrap();
        prop_assert_eq!(money::sum(plan.iter().map(|p| p.amount)), amount);
        for posting in &plan {
            prop_assert!(posting.amount <= posting.pending_before);
        }
    }

    /// **Property 6: Paying everything completes every obligation.**
    #[test]
    fn prop_full_payment_completes_all(
        principals in prop::collection::vec(principal(), 1..8),
    ) {
        let (producer, snapshots) = snapshots(&principals);
        let total = money::sum(principals.iter().copied());

        let plan = plan_operation(producer, LedgerOperation::PaymentPrincipal, total, &snapshots)
            .unwrap();
        prop_assert_eq!(plan.len(), principals.len());
        prop_assert!(plan.iter().all(|p| p.status_after == ObligationStatus::Completed));
    }
}
