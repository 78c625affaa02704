//! Property-based tests for the FIFO allocator.
//!
//! - Property 1: Conservation
//! - Property 2: No over-application
//! - Property 3: Oldest-first ordering
//! - Property 4: Strict allocation rejects shortfalls

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use beneficio_shared::money;

use super::fifo::{Bucket, OrderedBuckets, allocate, allocate_available};

/// Strategy to generate positive amounts (0.01 to 100,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate pending balances, zero included (0.00 to 10,000.00).
fn pending() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate 1-12 buckets with distinct days, in random order.
fn bucket_set() -> impl Strategy<Value = OrderedBuckets<u32>> {
    prop::collection::vec(pending(), 1..12)
        .prop_flat_map(|pendings| {
            let len = pendings.len();
            (Just(pendings), Just((0..len).collect::<Vec<_>>()).prop_shuffle())
        })
        .prop_map(|(pendings, order)| {
            let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
            OrderedBuckets::new(
                order
                    .into_iter()
                    .map(|i| {
                        let id = u32::try_from(i).unwrap();
                        Bucket::new(id, base + Duration::days(i64::from(id)), pendings[i])
                    })
                    .collect(),
            )
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // =========================================================================
    // Property 1: Conservation
    // =========================================================================

    /// **Property 1.1: Strict allocation applies exactly the requested amount.**
    ///
    /// *For any* bucket set and any amount not above the total pending, the
    /// applied amounts SHALL sum to the requested amount.
    #[test]
    fn prop_strict_allocation_conserves_amount(
        buckets in bucket_set(),
        fraction in 1u32..=100,
    ) {
        let total = buckets.total_pending();
        prop_assume!(total > Decimal::ZERO);
        let amount = money::round2(total * Decimal::from(fraction) / Decimal::from(100));
        prop_assume!(amount > Decimal::ZERO);

        let result = allocate(amount, &buckets).unwrap();
        prop_assert_eq!(money::sum(result.iter().map(|a| a.applied)), amount);
    }

    /// **Property 1.2: Partial allocation applies min(requested, available).**
    #[test]
    fn prop_partial_allocation_conserves_available(
        buckets in bucket_set(),
        amount in positive_amount(),
    ) {
        let result = allocate_available(amount, &buckets).unwrap();
        let applied = money::sum(result.iter().map(|a| a.applied));
        prop_assert_eq!(applied, money::min(amount, buckets.total_pending()));
    }

    // =========================================================================
    // Property 2: No over-application
    // =========================================================================

    /// **Property 2: No bucket receives more than it had pending.**
    #[test]
    fn prop_no_over_application(
        buckets in bucket_set(),
        amount in positive_amount(),
    ) {
        for allocation in allocate_available(amount, &buckets).unwrap() {
            prop_assert!(allocation.applied > Decimal::ZERO);
            prop_assert!(allocation.applied <= allocation.pending_before);
            prop_assert!(allocation.pending_after() >= Decimal::ZERO);
        }
    }

    // =========================================================================
    // Property 3: Oldest-first ordering
    // =========================================================================

    /// **Property 3: Only the last touched bucket may be left partially open.**
    ///
    /// *For any* allocation, every touched bucket except the last SHALL be
    /// exhausted, and touched buckets SHALL appear in ascending id (= age) order.
    #[test]
    fn prop_fifo_order(
        buckets in bucket_set(),
        amount in positive_amount(),
    ) {
        let result = allocate_available(amount, &buckets).unwrap();
        for pair in result.windows(2) {
            prop_assert!(pair[0].id < pair[1].id);
            prop_assert!(pair[0].exhausts());
        }
    }

    // =========================================================================
    // Property 4: Strict allocation rejects shortfalls
    // =========================================================================

    /// **Property 4: Requests above the total pending are rejected.**
    #[test]
    fn prop_strict_rejects_shortfall(
        buckets in bucket_set(),
        extra in positive_amount(),
    ) {
        let requested = money::add(buckets.total_pending(), extra);
        prop_assert!(allocate(requested, &buckets).is_err());
    }
}
