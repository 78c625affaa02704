//! Contract fulfillment tracker.

use rust_decimal::Decimal;
use serde::Serialize;

use beneficio_shared::money;

use crate::error::{EngineError, ensure_positive};
use crate::inventory::{Direction, PlannedStockMovement, StockPool};
use crate::reference::{Reference, ReferenceKind};
use crate::reversal::{VoidOutcome, ensure_no_dependents};
use crate::status::DocumentStatus;

use super::types::{ContractDirection, ContractPosition};

/// Inventory side of a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StockEffect {
    /// Incoming contract: open a new lot with this quantity.
    Receive {
        /// Quantity received.
        quantity: Decimal,
    },
    /// Outgoing contract: draw from the product's lots.
    Ship(Vec<PlannedStockMovement>),
}

/// Everything a delivery writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryPlan {
    /// Quantity delivered.
    pub quantity: Decimal,
    /// Price applied.
    pub unit_price: Decimal,
    /// `quantity × unit_price`.
    pub amount: Decimal,
    /// Quantity outstanding after the delivery.
    pub remaining_after: Decimal,
    /// Contract status after the delivery.
    pub status_after: DocumentStatus,
    /// Stock posting.
    pub stock: StockEffect,
}

/// Plans a delivery of `quantity` at `unit_price` against `position`.
///
/// `pool` is the contract product's stock and is only consulted for
/// outgoing contracts.
///
/// # Errors
///
/// - `ContractVoided` if the contract is voided.
/// - `InvalidAmount` for a non-positive quantity or price.
/// - `ExceedsContractBalance` if `quantity` is above the outstanding quantity.
/// - `InsufficientInventory` if an outgoing delivery cannot be shipped.
pub fn plan_delivery(
    position: &ContractPosition,
    quantity: Decimal,
    unit_price: Decimal,
    pool: &StockPool,
) -> Result<DeliveryPlan, EngineError> {
    let contract = &position.contract;
    if contract.status.is_voided() {
        return Err(EngineError::ContractVoided(contract.id));
    }
    let quantity = ensure_positive("quantity", quantity)?;
    let unit_price = ensure_positive("price", unit_price)?;

    let remaining = position.remaining();
    if quantity > remaining {
        return Err(EngineError::ExceedsContractBalance {
            contract_id: contract.id,
            requested: quantity,
            remaining,
        });
    }

    let stock = match contract.direction {
        ContractDirection::Incoming => StockEffect::Receive { quantity },
        ContractDirection::Outgoing => {
            if pool.product_id() != contract.product_id {
                return Err(EngineError::Internal(
                    "stock pool does not match contract product".to_string(),
                ));
            }
            StockEffect::Ship(pool.withdraw(quantity, Direction::Out)?)
        }
    };

    let remaining_after = money::sub(remaining, quantity);
    Ok(DeliveryPlan {
        quantity,
        unit_price,
        amount: money::mul(quantity, unit_price),
        remaining_after,
        status_after: contract.status.for_remaining(remaining_after),
        stock,
    })
}

/// Checks whether the contract itself may be voided.
///
/// # Errors
///
/// `HasDependentMovements` naming every live delivery.
pub fn plan_contract_void(position: &ContractPosition) -> Result<VoidOutcome, EngineError> {
    if position.contract.status.is_voided() {
        return Ok(VoidOutcome::AlreadyVoided);
    }
    ensure_no_dependents(
        Reference::new(ReferenceKind::Contract, position.contract.id),
        position
            .live_deliveries()
            .map(|d| Reference::new(ReferenceKind::ContractDelivery, d.id))
            .collect(),
    )?;
    Ok(VoidOutcome::Voided)
}
