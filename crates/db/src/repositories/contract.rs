//! Contract repository: incoming and outgoing contracts and their deliveries.

use beneficio_core::contract::{
    Contract, ContractDirection, ContractPosition, StockEffect, plan_contract_void, plan_delivery,
};
use beneficio_core::error::ensure_positive;
use beneficio_core::inventory::{Direction, StockPool};
use beneficio_core::{DocumentStatus, Reference, ReferenceKind, VoidOutcome};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::entities::{contract_deliveries, contracts, sea_orm_active_enums as db};

use super::convert::{self, stamp};
use super::error::{StoreResult, not_found, rejected};
use super::lock::for_update;
use super::stock::{self, Posting};

/// Input for a new contract.
#[derive(Debug, Clone)]
pub struct CreateContractInput {
    /// Incoming (from a producer) or outgoing (to a buyer).
    pub direction: ContractDirection,
    /// Producer or buyer.
    pub counterparty_id: Uuid,
    /// Product contracted.
    pub product_id: Uuid,
    /// Contracted quantity.
    pub quantity: Decimal,
    /// Agreed price per unit.
    pub unit_price: Decimal,
    /// Creation timestamp; defaults to now.
    pub at: Option<DateTime<Utc>>,
    /// Free-form note.
    pub note: Option<String>,
}

/// Input for a delivery against a contract.
#[derive(Debug, Clone)]
pub struct DeliverInput {
    /// Contract delivered against.
    pub contract_id: Uuid,
    /// Quantity delivered.
    pub quantity: Decimal,
    /// Price applied to this delivery.
    pub unit_price: Decimal,
    /// Delivery timestamp; defaults to now.
    pub at: Option<DateTime<Utc>>,
}

/// Result of a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    /// Delivery ID.
    pub delivery_id: Uuid,
    /// Quantity times price.
    pub amount: Decimal,
    /// Quantity still outstanding on the contract.
    pub remaining_quantity: Decimal,
    /// Contract status after the delivery.
    pub contract_status: DocumentStatus,
}

/// A contract with its fulfillment figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSummary {
    /// The contract.
    pub contract: Contract,
    /// Sum of live deliveries.
    pub fulfilled: Decimal,
    /// Quantity outstanding.
    pub remaining: Decimal,
    /// Live deliveries.
    pub deliveries: usize,
}

impl From<&ContractPosition> for ContractSummary {
    fn from(position: &ContractPosition) -> Self {
        Self {
            contract: position.contract.clone(),
            fulfilled: position.fulfilled(),
            remaining: position.remaining(),
            deliveries: position.live_deliveries().count(),
        }
    }
}

/// Contract repository.
#[derive(Debug, Clone)]
pub struct ContractRepository {
    db: DatabaseConnection,
    row_locking: bool,
}

impl ContractRepository {
    /// Creates a new contract repository with row locking enabled.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            row_locking: true,
        }
    }

    /// Enables or disables `FOR UPDATE` on contract and lot reads.
    #[must_use]
    pub fn with_row_locking(self, row_locking: bool) -> Self {
        Self {
            row_locking,
            ..self
        }
    }

    /// Creates a `PENDING` contract.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for a non-positive quantity or price, or a database error.
    pub async fn create(&self, input: CreateContractInput) -> StoreResult<Contract> {
        let quantity =
            ensure_positive("quantity", input.quantity).map_err(|e| rejected("create_contract", e))?;
        let unit_price =
            ensure_positive("unitPrice", input.unit_price).map_err(|e| rejected("create_contract", e))?;

        let row = contracts::ActiveModel {
            id: Set(Uuid::new_v4()),
            direction: Set(input.direction.into()),
            counterparty_id: Set(input.counterparty_id),
            product_id: Set(input.product_id),
            quantity: Set(quantity),
            unit_price: Set(unit_price),
            status: Set(db::DocumentStatus::Pending),
            note: Set(input.note),
            created_at: Set(stamp(input.at.unwrap_or_else(Utc::now))),
        }
        .insert(&self.db)
        .await?;

        info!(
            contract_id = %row.id,
            direction = %input.direction,
            counterparty_id = %input.counterparty_id,
            quantity = %quantity,
            "contract created"
        );
        Ok(convert::contract(&row))
    }

    /// Records a delivery. Incoming contracts open a lot owned by the
    /// producer; outgoing contracts ship from the product's lots.
    ///
    /// # Errors
    ///
    /// `EntityNotFound`, `ContractVoided`, `InvalidAmount`,
    /// `ExceedsContractBalance`, `InsufficientInventory`, or a database error.
    pub async fn deliver(&self, input: DeliverInput) -> StoreResult<DeliveryReceipt> {
        let txn = self.db.begin().await?;

        let position = load_position(&txn, input.contract_id, self.row_locking).await?;
        let contract = &position.contract;
        let pool = match contract.direction {
            ContractDirection::Outgoing => {
                let lots = stock::product_lots(&txn, contract.product_id, self.row_locking).await?;
                StockPool::new(contract.product_id, &lots)
            }
            ContractDirection::Incoming => StockPool::new(contract.product_id, &[]),
        };

        let plan = plan_delivery(&position, input.quantity, input.unit_price, &pool)
            .map_err(|e| rejected("deliver", e))?;

        let delivery_id = Uuid::new_v4();
        let at = input.at.unwrap_or_else(Utc::now);
        let movement = match plan.stock {
            StockEffect::Receive { .. } => Direction::In,
            StockEffect::Ship(_) => Direction::Out,
        };
        contract_deliveries::ActiveModel {
            id: Set(delivery_id),
            contract_id: Set(contract.id),
            quantity: Set(plan.quantity),
            unit_price: Set(plan.unit_price),
            amount: Set(plan.amount),
            movement_kind: Set(movement.into()),
            voided: Set(false),
            delivered_at: Set(stamp(at)),
        }
        .insert(&txn)
        .await?;

        let posting = Posting::new(
            Reference::new(ReferenceKind::ContractDelivery, delivery_id),
            at,
            None,
        );
        match &plan.stock {
            StockEffect::Receive { quantity } => {
                stock::open_lot(
                    &txn,
                    contract.product_id,
                    Some(contract.counterparty_id),
                    *quantity,
                    &posting,
                )
                .await?;
            }
            StockEffect::Ship(draws) => stock::apply_draws(&txn, draws, &posting).await?,
        }

        if plan.status_after != contract.status {
            set_status(&txn, contract.id, plan.status_after).await?;
        }

        txn.commit().await?;

        info!(
            %delivery_id,
            contract_id = %position.contract.id,
            quantity = %plan.quantity,
            remaining = %plan.remaining_after,
            status = %plan.status_after,
            "contract delivery committed"
        );
        Ok(DeliveryReceipt {
            delivery_id,
            amount: plan.amount,
            remaining_quantity: plan.remaining_after,
            contract_status: plan.status_after,
        })
    }

    /// Loads a contract with its fulfillment figures.
    ///
    /// # Errors
    ///
    /// `EntityNotFound` for an unknown id, or a database error.
    pub async fn summary(&self, contract_id: Uuid) -> StoreResult<ContractSummary> {
        let txn = self.db.begin().await?;
        let position = load_position(&txn, contract_id, false).await?;
        txn.commit().await?;
        Ok(ContractSummary::from(&position))
    }
}

// ============================================================================
// Voids
// ============================================================================

pub(crate) async fn void_contract(
    txn: &DatabaseTransaction,
    contract_id: Uuid,
    row_locking: bool,
) -> StoreResult<VoidOutcome> {
    let position = load_position(txn, contract_id, row_locking).await?;
    let outcome = plan_contract_void(&position)?;
    if outcome == VoidOutcome::Voided {
        set_status(txn, contract_id, DocumentStatus::Voided).await?;
        info!(%contract_id, "contract voided");
    }
    Ok(outcome)
}

pub(crate) async fn void_delivery(
    txn: &DatabaseTransaction,
    delivery_id: Uuid,
    row_locking: bool,
) -> StoreResult<VoidOutcome> {
    let delivery = contract_deliveries::Entity::find_by_id(delivery_id)
        .one(txn)
        .await?
        .ok_or_else(|| not_found("ContractDelivery", delivery_id))?;
    if delivery.voided {
        return Ok(VoidOutcome::AlreadyVoided);
    }
    let contract_id = delivery.contract_id;

    let reference = Reference::new(ReferenceKind::ContractDelivery, delivery_id);
    stock::reverse(txn, &Posting::new(reference, Utc::now(), None), row_locking).await?;

    let mut active: contract_deliveries::ActiveModel = delivery.into();
    active.voided = Set(true);
    active.update(txn).await?;

    let position = load_position(txn, contract_id, row_locking).await?;
    let status = position.derived_status();
    if status != position.contract.status {
        set_status(txn, contract_id, status).await?;
    }

    info!(%delivery_id, %contract_id, "contract delivery voided");
    Ok(VoidOutcome::Voided)
}

async fn load_position(
    txn: &DatabaseTransaction,
    contract_id: Uuid,
    row_locking: bool,
) -> StoreResult<ContractPosition> {
    let select = contracts::Entity::find().filter(contracts::Column::Id.eq(contract_id));
    let row = for_update(select, txn, row_locking)
        .one(txn)
        .await?
        .ok_or_else(|| not_found("Contract", contract_id))?;
    let deliveries = contract_deliveries::Entity::find()
        .filter(contract_deliveries::Column::ContractId.eq(contract_id))
        .order_by_asc(contract_deliveries::Column::DeliveredAt)
        .all(txn)
        .await?
        .iter()
        .map(convert::delivery)
        .collect();

    Ok(ContractPosition {
        contract: convert::contract(&row),
        deliveries,
    })
}

async fn set_status(
    txn: &DatabaseTransaction,
    contract_id: Uuid,
    status: DocumentStatus,
) -> StoreResult<()> {
    contracts::ActiveModel {
        id: Set(contract_id),
        status: Set(status.into()),
        ..Default::default()
    }
    .update(txn)
    .await?;
    Ok(())
}
