//! Deposit repository: custody deposits and their liquidation.

use std::collections::HashMap;

use beneficio_core::deposit::{Deposit, LiquidationDetail, deposit_position, plan_liquidation};
use beneficio_core::error::ensure_positive;
use beneficio_core::reversal::ensure_no_dependents;
use beneficio_core::settlement::SettlementLine;
use beneficio_core::{DocumentStatus, Reference, ReferenceKind, VoidOutcome};
use beneficio_shared::money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::entities::{
    deposit_liquidation_details, deposit_liquidations, deposits, sea_orm_active_enums as db,
};

use super::convert::{self, stamp};
use super::error::{StoreResult, not_found, rejected};
use super::lock::for_update;
use super::stock::{self, Posting};

/// Input for a custody deposit.
#[derive(Debug, Clone)]
pub struct RecordDepositInput {
    /// Depositing producer.
    pub producer_id: Uuid,
    /// Product deposited.
    pub product_id: Uuid,
    /// Quantity received.
    pub quantity: Decimal,
    /// Deposit timestamp; defaults to now.
    pub at: Option<DateTime<Utc>>,
    /// Free-form note.
    pub note: Option<String>,
}

/// Result of a deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositReceipt {
    /// Deposit ID.
    pub deposit_id: Uuid,
    /// Lot holding the deposited stock.
    pub lot_id: Uuid,
}

/// Input for liquidating a producer's deposits of one product.
#[derive(Debug, Clone)]
pub struct LiquidateDepositsInput {
    /// Producer.
    pub producer_id: Uuid,
    /// Product.
    pub product_id: Uuid,
    /// Quantity requested.
    pub quantity: Decimal,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Free-form description.
    pub description: Option<String>,
    /// Liquidation timestamp; defaults to now.
    pub at: Option<DateTime<Utc>>,
}

/// Result of a deposit liquidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositLiquidationReceipt {
    /// Liquidation header ID.
    pub liquidation_id: Uuid,
    /// Quantity actually liquidated; may be below the request.
    pub applied_quantity: Decimal,
    /// Sum of detail amounts.
    pub applied_amount: Decimal,
    /// One line per deposit touched.
    pub lines: Vec<SettlementLine>,
}

/// Deposit repository.
#[derive(Debug, Clone)]
pub struct DepositRepository {
    db: DatabaseConnection,
    row_locking: bool,
}

impl DepositRepository {
    /// Creates a new deposit repository with row locking enabled.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            row_locking: true,
        }
    }

    /// Enables or disables `FOR UPDATE` on deposit reads.
    #[must_use]
    pub fn with_row_locking(self, row_locking: bool) -> Self {
        Self {
            row_locking,
            ..self
        }
    }

    /// Records a deposit: `PENDING` deposit, new lot and `IN` movement.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for a non-positive quantity, or a database error.
    pub async fn record(&self, input: RecordDepositInput) -> StoreResult<DepositReceipt> {
        let quantity =
            ensure_positive("quantity", input.quantity).map_err(|e| rejected("record_deposit", e))?;
        let at = input.at.unwrap_or_else(Utc::now);
        let deposit_id = Uuid::new_v4();

        let txn = self.db.begin().await?;

        deposits::ActiveModel {
            id: Set(deposit_id),
            producer_id: Set(input.producer_id),
            product_id: Set(input.product_id),
            quantity: Set(quantity),
            status: Set(db::DocumentStatus::Pending),
            note: Set(input.note.clone()),
            deposited_at: Set(stamp(at)),
        }
        .insert(&txn)
        .await?;

        let posting = Posting::new(
            Reference::new(ReferenceKind::Deposit, deposit_id),
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
            %deposit_id,
            producer_id = %input.producer_id,
            product_id = %input.product_id,
            quantity = %quantity,
            "deposit recorded"
        );
        Ok(DepositReceipt {
            deposit_id,
            lot_id: lot.id,
        })
    }

    /// Liquidates a producer's open deposits of one product, oldest first.
    ///
    /// Applies at most what is pending; the receipt reports the applied totals.
    ///
    /// # Errors
    ///
    /// `InvalidAmount`, `NoPendingDeposits`, or a database error.
    pub async fn liquidate(
        &self,
        input: LiquidateDepositsInput,
    ) -> StoreResult<DepositLiquidationReceipt> {
        let txn = self.db.begin().await?;

        let select = deposits::Entity::find()
            .filter(deposits::Column::ProducerId.eq(input.producer_id))
            .filter(deposits::Column::ProductId.eq(input.product_id))
            .filter(deposits::Column::Status.ne(db::DocumentStatus::Voided))
            .order_by_asc(deposits::Column::DepositedAt)
            .order_by_asc(deposits::Column::Id);
        let rows = for_update(select, &txn, self.row_locking).all(&txn).await?;
        let open: Vec<Deposit> = rows.iter().map(convert::deposit).collect();
        let details = load_details(&txn, open.iter().map(|d| d.id).collect()).await?;

        let settlement = plan_liquidation(
            input.producer_id,
            input.product_id,
            input.quantity,
            input.unit_price,
            &open,
            &details,
        )
        .map_err(|e| rejected("liquidate_deposits", e))?;

        let liquidation_id = Uuid::new_v4();
        deposit_liquidations::ActiveModel {
            id: Set(liquidation_id),
            producer_id: Set(input.producer_id),
            product_id: Set(input.product_id),
            quantity: Set(settlement.total_quantity),
            unit_price: Set(money::round2(input.unit_price)),
            amount: Set(settlement.total_amount),
            description: Set(input.description),
            voided: Set(false),
            liquidated_at: Set(stamp(input.at.unwrap_or_else(Utc::now))),
        }
        .insert(&txn)
        .await?;

        let current: HashMap<Uuid, DocumentStatus> = open.iter().map(|d| (d.id, d.status)).collect();
        for line in &settlement.lines {
            deposit_liquidation_details::ActiveModel {
                id: Set(Uuid::new_v4()),
                liquidation_id: Set(liquidation_id),
                deposit_id: Set(line.document_id),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                amount: Set(line.amount),
                voided: Set(false),
            }
            .insert(&txn)
            .await?;

            if current.get(&line.document_id) != Some(&line.status_after) {
                set_status(&txn, line.document_id, line.status_after).await?;
            }
        }

        txn.commit().await?;

        info!(
            %liquidation_id,
            producer_id = %input.producer_id,
            product_id = %input.product_id,
            requested = %input.quantity,
            applied = %settlement.total_quantity,
            amount = %settlement.total_amount,
            "deposit liquidation committed"
        );
        Ok(DepositLiquidationReceipt {
            liquidation_id,
            applied_quantity: settlement.total_quantity,
            applied_amount: settlement.total_amount,
            lines: settlement.lines,
        })
    }

    /// Loads one deposit.
    ///
    /// # Errors
    ///
    /// `EntityNotFound` for an unknown id, or a database error.
    pub async fn find(&self, deposit_id: Uuid) -> StoreResult<Deposit> {
        let row = deposits::Entity::find_by_id(deposit_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| not_found("Deposit", deposit_id))?;
        Ok(convert::deposit(&row))
    }
}

// ============================================================================
// Voids
// ============================================================================

pub(crate) async fn void_deposit(
    txn: &DatabaseTransaction,
    deposit_id: Uuid,
    row_locking: bool,
) -> StoreResult<VoidOutcome> {
    let select = deposits::Entity::find().filter(deposits::Column::Id.eq(deposit_id));
    let deposit = for_update(select, txn, row_locking)
        .one(txn)
        .await?
        .ok_or_else(|| not_found("Deposit", deposit_id))?;
    if deposit.status == db::DocumentStatus::Voided {
        return Ok(VoidOutcome::AlreadyVoided);
    }

    let reference = Reference::new(ReferenceKind::Deposit, deposit_id);
    let dependents = load_details(txn, vec![deposit_id])
        .await?
        .into_iter()
        .filter(|d| !d.voided)
        .map(|d| Reference::new(ReferenceKind::DepositLiquidation, d.liquidation_id))
        .collect();
    ensure_no_dependents(reference, dependents)?;

    stock::reverse(txn, &Posting::new(reference, Utc::now(), None), row_locking).await?;
    set_status(txn, deposit_id, DocumentStatus::Voided).await?;
    info!(%deposit_id, "deposit voided");
    Ok(VoidOutcome::Voided)
}

pub(crate) async fn void_liquidation(
    txn: &DatabaseTransaction,
    liquidation_id: Uuid,
    row_locking: bool,
) -> StoreResult<VoidOutcome> {
    let header = deposit_liquidations::Entity::find_by_id(liquidation_id)
        .one(txn)
        .await?
        .ok_or_else(|| not_found("DepositLiquidation", liquidation_id))?;
    if header.voided {
        return Ok(VoidOutcome::AlreadyVoided);
    }

    let lines = deposit_liquidation_details::Entity::find()
        .filter(deposit_liquidation_details::Column::LiquidationId.eq(liquidation_id))
        .all(txn)
        .await?;
    let mut deposit_ids: Vec<Uuid> = lines.iter().map(|l| l.deposit_id).collect();
    deposit_ids.sort();
    deposit_ids.dedup();

    for line in lines {
        let mut active: deposit_liquidation_details::ActiveModel = line.into();
        active.voided = Set(true);
        active.update(txn).await?;
    }
    let mut active: deposit_liquidations::ActiveModel = header.into();
    active.voided = Set(true);
    active.update(txn).await?;

    let select = deposits::Entity::find().filter(deposits::Column::Id.is_in(deposit_ids.clone()));
    let affected = for_update(select, txn, row_locking).all(txn).await?;
    let details = load_details(txn, deposit_ids).await?;
    for row in &affected {
        let deposit = convert::deposit(row);
        let status = deposit
            .status
            .for_remaining(deposit_position(&deposit, &details, Decimal::ZERO).remaining());
        if status != deposit.status {
            set_status(txn, deposit.id, status).await?;
        }
    }

    info!(%liquidation_id, deposits = affected.len(), "deposit liquidation voided");
    Ok(VoidOutcome::Voided)
}

async fn load_details(
    txn: &DatabaseTransaction,
    deposit_ids: Vec<Uuid>,
) -> StoreResult<Vec<LiquidationDetail>> {
    if deposit_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = deposit_liquidation_details::Entity::find()
        .filter(deposit_liquidation_details::Column::DepositId.is_in(deposit_ids))
        .all(txn)
        .await?;
    Ok(rows.iter().map(convert::deposit_detail).collect())
}

async fn set_status(
    txn: &DatabaseTransaction,
    deposit_id: Uuid,
    status: DocumentStatus,
) -> StoreResult<()> {
    deposits::ActiveModel {
        id: Set(deposit_id),
        status: Set(status.into()),
        ..Default::default()
    }
    .update(txn)
    .await?;
    Ok(())
}
