//! Sale liquidation engine.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::deposit::LiquidationDetail;
use crate::error::{EngineError, ensure_positive};
use crate::inventory::{Direction, PlannedStockMovement, StockPool};
use crate::settlement::{self, Position, Settlement};

use super::types::SaleCommitment;

/// Settlement lines plus the stock they ship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleLiquidationPlan {
    /// Priced lines per commitment.
    pub settlement: Settlement,
    /// Outflows drawn from the product's lots.
    pub stock: Vec<PlannedStockMovement>,
}

/// Position of `commitment` given every detail line that references it.
#[must_use]
pub fn commitment_position(commitment: &SaleCommitment, details: &[LiquidationDetail]) -> Position {
    Position::new(
        commitment.id,
        commitment.committed_at,
        commitment.quantity,
        details
            .iter()
            .filter(|d| d.document_id == commitment.id && !d.voided)
            .map(|d| d.quantity),
        commitment.unit_price,
        commitment.status,
    )
}

/// Plans liquidating `quantity` of a buyer's open commitments of one product.
///
/// Each line is priced at its commitment's unit price. The applied quantity
/// is withdrawn from `pool` oldest lot first.
///
/// # Errors
///
/// - `InvalidAmount` for a non-positive quantity.
/// - `NoPendingCommitments` when nothing would be applied.
/// - `InsufficientInventory` when the pool cannot ship the applied quantity.
pub fn plan_liquidation(
    buyer_id: Uuid,
    quantity: Decimal,
    commitments: &[SaleCommitment],
    details: &[LiquidationDetail],
    pool: &StockPool,
) -> Result<SaleLiquidationPlan, EngineError> {
    let quantity = ensure_positive("quantity", quantity)?;
    let product_id = pool.product_id();

    let positions: Vec<Position> = commitments
        .iter()
        .filter(|c| c.buyer_id == buyer_id && c.product_id == product_id)
        .map(|c| commitment_position(c, details))
        .collect();

    let settlement = settlement::settle(quantity, &positions)?.ok_or(
        EngineError::NoPendingCommitments {
            buyer_id,
            product_id,
        },
    )?;
    let stock = pool.withdraw(settlement.total_quantity, Direction::Out)?;

    Ok(SaleLiquidationPlan { settlement, stock })
}
