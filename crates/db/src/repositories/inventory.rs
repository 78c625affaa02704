//! Inventory repository: purchases, transfers, adjustments and stock levels.

use beneficio_core::error::ensure_positive;
use beneficio_core::inventory::{
    Lot, PlannedStockMovement, StockPool, plan_adjustment, plan_transfer,
};
use beneficio_core::{Reference, ReferenceKind, VoidOutcome};
use beneficio_shared::money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::entities::{inventory_lots, inventory_movements, purchases, transfers};

use super::convert::{self, stamp};
use super::error::{StoreResult, not_found, rejected};
use super::lock::for_update;
use super::stock::{self, Posting};

/// Input for an outright purchase from a producer.
#[derive(Debug, Clone)]
pub struct RecordPurchaseInput {
    /// Seller.
    pub producer_id: Uuid,
    /// Product bought.
    pub product_id: Uuid,
    /// Quantity received.
    pub quantity: Decimal,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Purchase timestamp; defaults to now.
    pub at: Option<DateTime<Utc>>,
    /// Free-form note.
    pub note: Option<String>,
}

/// Result of a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    /// Purchase ID.
    pub purchase_id: Uuid,
    /// Lot opened for the purchased stock.
    pub lot_id: Uuid,
    /// `quantity × unit_price`.
    pub amount: Decimal,
}

/// Input for converting stock of one product into another.
#[derive(Debug, Clone)]
pub struct TransferInput {
    /// Product drawn.
    pub from_product_id: Uuid,
    /// Product receiving the stock.
    pub to_product_id: Uuid,
    /// Quantity moved.
    pub quantity: Decimal,
    /// Transfer timestamp; defaults to now.
    pub at: Option<DateTime<Utc>>,
    /// Free-form note.
    pub note: Option<String>,
}

/// Result of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    /// Transfer ID.
    pub transfer_id: Uuid,
    /// Destination lot.
    pub lot_id: Uuid,
    /// Draws on the source lots.
    pub draws: Vec<PlannedStockMovement>,
}

/// Input for a manual lot correction.
#[derive(Debug, Clone)]
pub struct AdjustLotInput {
    /// Lot corrected.
    pub lot_id: Uuid,
    /// Signed change.
    pub delta: Decimal,
    /// Adjustment timestamp; defaults to now.
    pub at: Option<DateTime<Utc>>,
    /// Reason for the correction.
    pub note: Option<String>,
}

/// Result of an adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentReceipt {
    /// Id of the `Adjustment` reference.
    pub adjustment_id: Uuid,
    /// Lot on-hand after the correction.
    pub on_hand_after: Decimal,
}

/// Stock of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    /// Product.
    pub product_id: Uuid,
    /// Sum of on-hand across lots.
    pub on_hand: Decimal,
    /// Lots, oldest first.
    pub lots: Vec<Lot>,
}

/// Inventory repository.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    db: DatabaseConnection,
    row_locking: bool,
}

impl InventoryRepository {
    /// Creates a new inventory repository with row locking enabled.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            row_locking: true,
        }
    }

    /// Enables or disables `FOR UPDATE` on lot reads.
    #[must_use]
    pub fn with_row_locking(self, row_locking: bool) -> Self {
        Self {
            row_locking,
            ..self
        }
    }

    /// Records a purchase: purchase row, new lot and `IN` movement.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for a non-positive quantity or price, or a database error.
    pub async fn record_purchase(&self, input: RecordPurchaseInput) -> StoreResult<PurchaseReceipt> {
        let quantity =
            ensure_positive("quantity", input.quantity).map_err(|e| rejected("record_purchase", e))?;
        let unit_price = ensure_positive("unitPrice", input.unit_price)
            .map_err(|e| rejected("record_purchase", e))?;
        let amount = money::mul(quantity, unit_price);
        let at = input.at.unwrap_or_else(Utc::now);
        let purchase_id = Uuid::new_v4();

        let txn = self.db.begin().await?;

        purchases::ActiveModel {
            id: Set(purchase_id),
            producer_id: Set(input.producer_id),
            product_id: Set(input.product_id),
            quantity: Set(quantity),
            unit_price: Set(unit_price),
            amount: Set(amount),
            note: Set(input.note.clone()),
            voided: Set(false),
            purchased_at: Set(stamp(at)),
        }
        .insert(&txn)
        .await?;

        let posting = Posting::new(
            Reference::new(ReferenceKind::Purchase, purchase_id),
            at,
            input.note,
        );
        let lot = stock::open_lot(
            &txn,
            input.product_id,
            Some(input.producer_id),
            quantity,
            &posting,
        )
        .await?;

        txn.commit().await?;

        info!(
            %purchase_id,
            product_id = %input.product_id,
            quantity = %quantity,
            amount = %amount,
            "purchase recorded"
        );
        Ok(PurchaseReceipt {
            purchase_id,
            lot_id: lot.id,
            amount,
        })
    }

    /// Moves stock from one product into a new lot of another, drawing the
    /// source lots oldest first.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for identical products, `InvalidAmount`,
    /// `InsufficientInventory`, or a database error.
    pub async fn transfer(&self, input: TransferInput) -> StoreResult<TransferReceipt> {
        let txn = self.db.begin().await?;

        let lots = stock::product_lots(&txn, input.from_product_id, self.row_locking).await?;
        let pool = StockPool::new(input.from_product_id, &lots);
        let plan = plan_transfer(&pool, input.to_product_id, input.quantity)
            .map_err(|e| rejected("transfer", e))?;

        let at = input.at.unwrap_or_else(Utc::now);
        let transfer_id = Uuid::new_v4();
        transfers::ActiveModel {
            id: Set(transfer_id),
            from_product_id: Set(input.from_product_id),
            to_product_id: Set(plan.to_product_id),
            quantity: Set(plan.quantity),
            note: Set(input.note.clone()),
            voided: Set(false),
            transferred_at: Set(stamp(at)),
        }
        .insert(&txn)
        .await?;

        let posting = Posting::new(
            Reference::new(ReferenceKind::Transfer, transfer_id),
            at,
            input.note,
        );
        stock::apply_draws(&txn, &plan.draws, &posting).await?;
        let lot = stock::open_lot(&txn, plan.to_product_id, None, plan.quantity, &posting).await?;

        txn.commit().await?;

        info!(
            %transfer_id,
            from_product_id = %input.from_product_id,
            to_product_id = %plan.to_product_id,
            quantity = %plan.quantity,
            "transfer committed"
        );
        Ok(TransferReceipt {
            transfer_id,
            lot_id: lot.id,
            draws: plan.draws,
        })
    }

    /// Corrects one lot by a signed delta.
    ///
    /// # Errors
    ///
    /// `EntityNotFound` for an unknown lot, `InvalidAmount` for a zero delta,
    /// `InsufficientInventory` if the lot would go negative, or a database error.
    pub async fn adjust(&self, input: AdjustLotInput) -> StoreResult<AdjustmentReceipt> {
        let txn = self.db.begin().await?;

        let select =
            inventory_lots::Entity::find().filter(inventory_lots::Column::Id.eq(input.lot_id));
        let row = for_update(select, &txn, self.row_locking)
            .one(&txn)
            .await?
            .ok_or_else(|| not_found("InventoryLot", input.lot_id))?;
        let planned =
            plan_adjustment(&convert::lot(&row), input.delta).map_err(|e| rejected("adjust", e))?;

        let adjustment_id = Uuid::new_v4();
        let posting = Posting::new(
            Reference::new(ReferenceKind::Adjustment, adjustment_id),
            input.at.unwrap_or_else(Utc::now),
            input.note,
        );
        stock::apply_draws(&txn, std::slice::from_ref(&planned), &posting).await?;

        txn.commit().await?;

        info!(
            %adjustment_id,
            lot_id = %input.lot_id,
            delta = %planned.quantity,
            on_hand = %planned.on_hand_after,
            "lot adjusted"
        );
        Ok(AdjustmentReceipt {
            adjustment_id,
            on_hand_after: planned.on_hand_after,
        })
    }

    /// Current stock of a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn stock_level(&self, product_id: Uuid) -> StoreResult<StockLevel> {
        let txn = self.db.begin().await?;
        let lots = stock::product_lots(&txn, product_id, false).await?;
        txn.commit().await?;
        Ok(StockLevel {
            product_id,
            on_hand: StockPool::new(product_id, &lots).on_hand(),
            lots,
        })
    }
}

// ============================================================================
// Voids
// ============================================================================

pub(crate) async fn void_purchase(
    txn: &DatabaseTransaction,
    purchase_id: Uuid,
    row_locking: bool,
) -> StoreResult<VoidOutcome> {
    let purchase = purchases::Entity::find_by_id(purchase_id)
        .one(txn)
        .await?
        .ok_or_else(|| not_found("Purchase", purchase_id))?;
    if purchase.voided {
        return Ok(VoidOutcome::AlreadyVoided);
    }

    let posting = Posting::new(
        Reference::new(ReferenceKind::Purchase, purchase_id),
        Utc::now(),
        None,
    );
    stock::reverse(txn, &posting, row_locking).await?;

    let mut active: purchases::ActiveModel = purchase.into();
    active.voided = Set(true);
    active.update(txn).await?;
    info!(%purchase_id, "purchase voided");
    Ok(VoidOutcome::Voided)
}

pub(crate) async fn void_transfer(
    txn: &DatabaseTransaction,
    transfer_id: Uuid,
    row_locking: bool,
) -> StoreResult<VoidOutcome> {
    let transfer = transfers::Entity::find_by_id(transfer_id)
        .one(txn)
        .await?
        .ok_or_else(|| not_found("Transfer", transfer_id))?;
    if transfer.voided {
        return Ok(VoidOutcome::AlreadyVoided);
    }

    let posting = Posting::new(
        Reference::new(ReferenceKind::Transfer, transfer_id),
        Utc::now(),
        None,
    );
    stock::reverse(txn, &posting, row_locking).await?;

    let mut active: transfers::ActiveModel = transfer.into();
    active.voided = Set(true);
    active.update(txn).await?;
    info!(%transfer_id, "transfer voided");
    Ok(VoidOutcome::Voided)
}

pub(crate) async fn void_adjustment(
    txn: &DatabaseTransaction,
    adjustment_id: Uuid,
    row_locking: bool,
) -> StoreResult<VoidOutcome> {
    let reference = Reference::new(ReferenceKind::Adjustment, adjustment_id);
    let recorded = inventory_movements::Entity::find()
        .filter(inventory_movements::Column::ReferenceType.eq(reference.kind.as_str()))
        .filter(inventory_movements::Column::ReferenceId.eq(adjustment_id))
        .one(txn)
        .await?;
    if recorded.is_none() {
        return Err(not_found("Adjustment", adjustment_id));
    }

    let posting = Posting::new(reference, Utc::now(), None);
    let compensated = stock::reverse(txn, &posting, row_locking).await?;
    if compensated == 0 {
        return Ok(VoidOutcome::AlreadyVoided);
    }
    info!(%adjustment_id, "adjustment voided");
    Ok(VoidOutcome::Voided)
}
