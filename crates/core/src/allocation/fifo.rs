//! Oldest-first allocation.
//!
//! Ordering contract: buckets are consumed by ascending `(opened_at, id)`.
//! [`OrderedBuckets::new`] sorts on construction, so the order a query
//! happened to return rows in never leaks into the result.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use beneficio_shared::money;

/// One obligation, document or lot with a pending balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket<I> {
    /// Identifier reported back in each [`Allocation`].
    pub id: I,
    /// Creation timestamp; primary ordering key.
    pub opened_at: DateTime<Utc>,
    /// Amount or quantity still available in this bucket.
    pub pending: Decimal,
}

impl<I> Bucket<I> {
    /// Creates a bucket, rounding `pending` to two places.
    pub fn new(id: I, opened_at: DateTime<Utc>, pending: Decimal) -> Self {
        Self {
            id,
            opened_at,
            pending: money::round2(pending),
        }
    }
}

/// Buckets sorted oldest first, ties broken by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedBuckets<I> {
    buckets: Vec<Bucket<I>>,
}

impl<I: Ord + Copy> OrderedBuckets<I> {
    /// Sorts `buckets` by `(opened_at, id)`.
    #[must_use]
    pub fn new(mut buckets: Vec<Bucket<I>>) -> Self {
        buckets.sort_by(|a, b| a.opened_at.cmp(&b.opened_at).then_with(|| a.id.cmp(&b.id)));
        Self { buckets }
    }

    /// Buckets in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = &Bucket<I>> {
        self.buckets.iter()
    }

    /// Number of buckets, open or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns true if there are no buckets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Sum of positive pending balances.
    #[must_use]
    pub fn total_pending(&self) -> Decimal {
        money::sum(
            self.buckets
                .iter()
                .map(|b| b.pending)
                .filter(|p| *p > Decimal::ZERO),
        )
    }

    /// The oldest bucket with any pending balance.
    ///
    /// Charges land on this single bucket instead of being distributed.
    #[must_use]
    pub fn first_open(&self) -> Option<&Bucket<I>> {
        self.buckets.iter().find(|b| b.pending > Decimal::ZERO)
    }
}

/// Amount applied to one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation<I> {
    /// Bucket the amount was applied to.
    pub id: I,
    /// Amount applied, never more than `pending_before`.
    pub applied: Decimal,
    /// The bucket's pending balance before this allocation.
    pub pending_before: Decimal,
}

impl<I> Allocation<I> {
    /// Pending balance left in the bucket.
    #[must_use]
    pub fn pending_after(&self) -> Decimal {
        money::sub(self.pending_before, self.applied)
    }

    /// Returns true if the allocation consumed the whole bucket.
    #[must_use]
    pub fn exhausts(&self) -> bool {
        self.pending_after() <= Decimal::ZERO
    }
}

/// Allocator failures. Callers translate these into their own taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// Zero or negative amount.
    #[error("amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// Requested more than the buckets hold.
    #[error("requested {requested} but only {available} is pending")]
    InsufficientBalance {
        /// Amount requested.
        requested: Decimal,
        /// Sum of pending balances.
        available: Decimal,
    },
}

/// Distributes `amount` across `buckets`, oldest first, and requires the
/// whole amount to fit.
///
/// Buckets with no pending balance are skipped without producing an
/// allocation. The applied amounts always sum exactly to `amount`.
///
/// # Errors
///
/// `InvalidAmount` for a non-positive amount, `InsufficientBalance` when the
/// buckets hold less than requested. Nothing is allocated on error.
pub fn allocate<I: Ord + Copy>(
    amount: Decimal,
    buckets: &OrderedBuckets<I>,
) -> Result<Vec<Allocation<I>>, AllocationError> {
    let amount = positive(amount)?;
    let available = buckets.total_pending();
    if amount > available {
        return Err(AllocationError::InsufficientBalance {
            requested: amount,
            available,
        });
    }
    Ok(walk(amount, buckets))
}

/// Distributes up to `amount` across `buckets`, oldest first.
///
/// When the buckets hold less than requested, everything pending is applied
/// and the shortfall is simply not allocated. May return an empty list.
///
/// # Errors
///
/// `InvalidAmount` for a non-positive amount.
pub fn allocate_available<I: Ord + Copy>(
    amount: Decimal,
    buckets: &OrderedBuckets<I>,
) -> Result<Vec<Allocation<I>>, AllocationError> {
    let amount = positive(amount)?;
    Ok(walk(amount, buckets))
}

fn positive(amount: Decimal) -> Result<Decimal, AllocationError> {
    let amount = money::round2(amount);
    if amount <= Decimal::ZERO {
        return Err(AllocationError::InvalidAmount(amount));
    }
    Ok(amount)
}

fn walk<I: Ord + Copy>(amount: Decimal, buckets: &OrderedBuckets<I>) -> Vec<Allocation<I>> {
    let mut remaining = amount;
    let mut allocations = Vec::new();

    for bucket in buckets.iter() {
        if remaining <= Decimal::ZERO {
            break;
        }
        if bucket.pending <= Decimal::ZERO {
            continue;
        }
        let applied = money::min(remaining, bucket.pending);
        allocations.push(Allocation {
            id: bucket.id,
            applied,
            pending_before: bucket.pending,
        });
        remaining = money::sub(remaining, applied);
    }

    allocations
}
