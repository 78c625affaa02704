//! Stock pool allocator.
//!
//! A pool is every lot of one product. Withdrawals walk the lots oldest
//! first through the shared FIFO allocator and are validated against the sum
//! across all lots, never a single lot.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use beneficio_shared::money;

use crate::allocation::{self, AllocationError, Bucket, OrderedBuckets};
use crate::error::{EngineError, ensure_positive};

use super::types::{Direction, Lot};

/// One lot change to write, with its journal row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlannedStockMovement {
    /// Lot to change.
    pub lot_id: Uuid,
    /// Journal direction.
    pub direction: Direction,
    /// Signed quantity.
    pub quantity: Decimal,
    /// Lot on-hand quantity after the change.
    pub on_hand_after: Decimal,
}

/// All lots of one product.
#[derive(Debug, Clone)]
pub struct StockPool {
    product_id: Uuid,
    lots: OrderedBuckets<Uuid>,
}

impl StockPool {
    /// Builds the pool from `lots`; lots of other products are ignored.
    #[must_use]
    pub fn new(product_id: Uuid, lots: &[Lot]) -> Self {
        let buckets = lots
            .iter()
            .filter(|lot| lot.product_id == product_id)
            .map(|lot| Bucket::new(lot.id, lot.opened_at, lot.on_hand))
            .collect();
        Self {
            product_id,
            lots: OrderedBuckets::new(buckets),
        }
    }

    /// Product of the pool.
    #[must_use]
    pub fn product_id(&self) -> Uuid {
        self.product_id
    }

    /// Total on hand across every lot.
    #[must_use]
    pub fn on_hand(&self) -> Decimal {
        self.lots.total_pending()
    }

    /// Plans drawing `quantity` oldest lot first, one movement per lot.
    ///
    /// `direction` is `Out` for shipments and `Transfer` for conversions.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for a non-positive quantity, `InsufficientInventory`
    /// when the pool holds less than requested.
    pub fn withdraw(
        &self,
        quantity: Decimal,
        direction: Direction,
    ) -> Result<Vec<PlannedStockMovement>, EngineError> {
        let quantity = ensure_positive("quantity", quantity)?;
        let allocations = allocation::allocate(quantity, &self.lots).map_err(|err| match err {
            AllocationError::InvalidAmount(value) => {
                EngineError::InvalidAmount(format!("quantity must be positive, got {value}"))
            }
            AllocationError::InsufficientBalance {
                requested,
                available,
            } => EngineError::InsufficientInventory {
                product_id: self.product_id,
                requested,
                available,
            },
        })?;

        Ok(allocations
            .into_iter()
            .map(|a| PlannedStockMovement {
                lot_id: a.id,
                direction,
                quantity: -a.applied,
                on_hand_after: a.pending_after(),
            })
            .collect())
    }
}

/// Plans a manual correction of one lot by a signed `delta`.
///
/// # Errors
///
/// `InvalidAmount` for a zero delta, `InsufficientInventory` if the lot
/// would go negative.
pub fn plan_adjustment(lot: &Lot, delta: Decimal) -> Result<PlannedStockMovement, EngineError> {
    let delta = money::round2(delta);
    if delta == Decimal::ZERO {
        return Err(EngineError::InvalidAmount(
            "adjustment must not be zero".to_string(),
        ));
    }
    let on_hand_after = money::add(lot.on_hand, delta);
    if on_hand_after < Decimal::ZERO {
        return Err(EngineError::InsufficientInventory {
            product_id: lot.product_id,
            requested: -delta,
            available: lot.on_hand,
        });
    }
    Ok(PlannedStockMovement {
        lot_id: lot.id,
        direction: Direction::Adjust,
        quantity: delta,
        on_hand_after,
    })
}

/// Plan of a conversion from one product to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferPlan {
    /// Draws on the source product's lots.
    pub draws: Vec<PlannedStockMovement>,
    /// Product receiving the new lot.
    pub to_product_id: Uuid,
    /// Quantity placed in the new destination lot.
    pub quantity: Decimal,
}

/// Plans moving `quantity` from `from` into a new lot of `to_product_id`.
///
/// # Errors
///
/// `InvalidRequest` when source and destination are the same product, plus
/// the errors of [`StockPool::withdraw`].
pub fn plan_transfer(
    from: &StockPool,
    to_product_id: Uuid,
    quantity: Decimal,
) -> Result<TransferPlan, EngineError> {
    if from.product_id() == to_product_id {
        return Err(EngineError::InvalidRequest(
            "transfer source and destination must be different products".to_string(),
        ));
    }
    let quantity = ensure_positive("quantity", quantity)?;
    let draws = from.withdraw(quantity, Direction::Transfer)?;
    Ok(TransferPlan {
        draws,
        to_product_id,
        quantity,
    })
}
