//! Sale repository: buyer commitments and their liquidation.
//!
//! A commitment reserves nothing. Stock is checked and drawn when the
//! commitment is liquidated.

use std::collections::HashMap;

use beneficio_core::deposit::LiquidationDetail;
use beneficio_core::error::ensure_positive;
use beneficio_core::inventory::{PlannedStockMovement, StockPool};
use beneficio_core::reversal::ensure_no_dependents;
use beneficio_core::sale::{SaleCommitment, commitment_position, plan_liquidation};
use beneficio_core::settlement::SettlementLine;
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

use crate::entities::{
    sale_commitments, sale_liquidation_details, sale_liquidations, sea_orm_active_enums as db,
};

use super::convert::{self, stamp};
use super::error::{StoreResult, not_found, rejected};
use super::lock::for_update;
use super::stock::{self, Posting};

/// Input for a sale commitment.
#[derive(Debug, Clone)]
pub struct CreateCommitmentInput {
    /// Buyer.
    pub buyer_id: Uuid,
    /// Product promised.
    pub product_id: Uuid,
    /// Quantity promised.
    pub quantity: Decimal,
    /// Agreed price per unit.
    pub unit_price: Decimal,
    /// Commitment timestamp; defaults to now.
    pub at: Option<DateTime<Utc>>,
    /// Free-form note.
    pub note: Option<String>,
}

/// Input for liquidating a buyer's commitments of one product.
#[derive(Debug, Clone)]
pub struct LiquidateSaleInput {
    /// Buyer.
    pub buyer_id: Uuid,
    /// Product.
    pub product_id: Uuid,
    /// Quantity requested.
    pub quantity: Decimal,
    /// Free-form description.
    pub description: Option<String>,
    /// Liquidation timestamp; defaults to now.
    pub at: Option<DateTime<Utc>>,
}

/// Result of a sale liquidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLiquidationReceipt {
    /// Liquidation header ID.
    pub liquidation_id: Uuid,
    /// Quantity actually liquidated.
    pub applied_quantity: Decimal,
    /// Sum of line amounts.
    pub applied_amount: Decimal,
    /// One line per commitment touched.
    pub lines: Vec<SettlementLine>,
    /// Stock drawn, one entry per lot.
    pub stock: Vec<PlannedStockMovement>,
}

/// Sale repository.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    db: DatabaseConnection,
    row_locking: bool,
}

impl SaleRepository {
    /// Creates a new sale repository with row locking enabled.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            row_locking: true,
        }
    }

    /// Enables or disables `FOR UPDATE` on commitment and lot reads.
    #[must_use]
    pub fn with_row_locking(self, row_locking: bool) -> Self {
        Self {
            row_locking,
            ..self
        }
    }

    /// Creates a `PENDING` commitment. No stock moves.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for a non-positive quantity or price, or a database error.
    pub async fn create_commitment(
        &self,
        input: CreateCommitmentInput,
    ) -> StoreResult<SaleCommitment> {
        let quantity = ensure_positive("quantity", input.quantity)
            .map_err(|e| rejected("create_commitment", e))?;
        let unit_price = ensure_positive("unitPrice", input.unit_price)
            .map_err(|e| rejected("create_commitment", e))?;

        let row = sale_commitments::ActiveModel {
            id: Set(Uuid::new_v4()),
            buyer_id: Set(input.buyer_id),
            product_id: Set(input.product_id),
            quantity: Set(quantity),
            unit_price: Set(unit_price),
            status: Set(db::DocumentStatus::Pending),
            note: Set(input.note),
            committed_at: Set(stamp(input.at.unwrap_or_else(Utc::now))),
        }
        .insert(&self.db)
        .await?;

        info!(
            commitment_id = %row.id,
            buyer_id = %input.buyer_id,
            product_id = %input.product_id,
            quantity = %quantity,
            "sale commitment created"
        );
        Ok(convert::commitment(&row))
    }

    /// Liquidates a buyer's open commitments of one product, oldest first,
    /// and ships the applied quantity from the product's lots.
    ///
    /// # Errors
    ///
    /// `InvalidAmount`, `NoPendingCommitments`, `InsufficientInventory`, or a
    /// database error.
    pub async fn liquidate(&self, input: LiquidateSaleInput) -> StoreResult<SaleLiquidationReceipt> {
        let txn = self.db.begin().await?;

        let select = sale_commitments::Entity::find()
            .filter(sale_commitments::Column::BuyerId.eq(input.buyer_id))
            .filter(sale_commitments::Column::ProductId.eq(input.product_id))
            .filter(sale_commitments::Column::Status.ne(db::DocumentStatus::Voided))
            .order_by_asc(sale_commitments::Column::CommittedAt)
            .order_by_asc(sale_commitments::Column::Id);
        let rows = for_update(select, &txn, self.row_locking).all(&txn).await?;
        let open: Vec<SaleCommitment> = rows.iter().map(convert::commitment).collect();
        let details = load_details(&txn, open.iter().map(|c| c.id).collect()).await?;
        let lots = stock::product_lots(&txn, input.product_id, self.row_locking).await?;
        let pool = StockPool::new(input.product_id, &lots);

        let plan = plan_liquidation(input.buyer_id, input.quantity, &open, &details, &pool)
            .map_err(|e| rejected("liquidate_sale", e))?;
        let settlement = plan.settlement;

        let liquidation_id = Uuid::new_v4();
        let at = input.at.unwrap_or_else(Utc::now);
        sale_liquidations::ActiveModel {
            id: Set(liquidation_id),
            buyer_id: Set(input.buyer_id),
            product_id: Set(input.product_id),
            quantity: Set(settlement.total_quantity),
            amount: Set(settlement.total_amount),
            description: Set(input.description.clone()),
            voided: Set(false),
            liquidated_at: Set(stamp(at)),
        }
        .insert(&txn)
        .await?;

        let current: HashMap<Uuid, DocumentStatus> =
            open.iter().map(|c| (c.id, c.status)).collect();
        for line in &settlement.lines {
            sale_liquidation_details::ActiveModel {
                id: Set(Uuid::new_v4()),
                liquidation_id: Set(liquidation_id),
                commitment_id: Set(line.document_id),
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

        let posting = Posting::new(
            Reference::new(ReferenceKind::SaleLiquidation, liquidation_id),
            at,
            input.description,
        );
        stock::apply_draws(&txn, &plan.stock, &posting).await?;

        txn.commit().await?;

        info!(
            %liquidation_id,
            buyer_id = %input.buyer_id,
            product_id = %input.product_id,
            requested = %input.quantity,
            applied = %settlement.total_quantity,
            amount = %settlement.total_amount,
            lots = plan.stock.len(),
            "sale liquidation committed"
        );
        Ok(SaleLiquidationReceipt {
            liquidation_id,
            applied_quantity: settlement.total_quantity,
            applied_amount: settlement.total_amount,
            lines: settlement.lines,
            stock: plan.stock,
        })
    }

    /// Loads one commitment.
    ///
    /// # Errors
    ///
    /// `EntityNotFound` for an unknown id, or a database error.
    pub async fn find_commitment(&self, commitment_id: Uuid) -> StoreResult<SaleCommitment> {
        let row = sale_commitments::Entity::find_by_id(commitment_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| not_found("SaleCommitment", commitment_id))?;
        Ok(convert::commitment(&row))
    }
}

// ============================================================================
// Voids
// ============================================================================

pub(crate) async fn void_commitment(
    txn: &DatabaseTransaction,
    commitment_id: Uuid,
    row_locking: bool,
) -> StoreResult<VoidOutcome> {
    let select =
        sale_commitments::Entity::find().filter(sale_commitments::Column::Id.eq(commitment_id));
    let commitment = for_update(select, txn, row_locking)
        .one(txn)
        .await?
        .ok_or_else(|| not_found("SaleCommitment", commitment_id))?;
    if commitment.status == db::DocumentStatus::Voided {
        return Ok(VoidOutcome::AlreadyVoided);
    }

    let dependents = load_details(txn, vec![commitment_id])
        .await?
        .into_iter()
        .filter(|d| !d.voided)
        .map(|d| Reference::new(ReferenceKind::SaleLiquidation, d.liquidation_id))
        .collect();
    ensure_no_dependents(
        Reference::new(ReferenceKind::SaleCommitment, commitment_id),
        dependents,
    )?;

    set_status(txn, commitment_id, DocumentStatus::Voided).await?;
    info!(%commitment_id, "sale commitment voided");
    Ok(VoidOutcome::Voided)
}

pub(crate) async fn void_liquidation(
    txn: &DatabaseTransaction,
    liquidation_id: Uuid,
    row_locking: bool,
) -> StoreResult<VoidOutcome> {
    let header = sale_liquidations::Entity::find_by_id(liquidation_id)
        .one(txn)
        .await?
        .ok_or_else(|| not_found("SaleLiquidation", liquidation_id))?;
    if header.voided {
        return Ok(VoidOutcome::AlreadyVoided);
    }

    let reference = Reference::new(ReferenceKind::SaleLiquidation, liquidation_id);
    stock::reverse(txn, &Posting::new(reference, Utc::now(), None), row_locking).await?;

    let lines = sale_liquidation_details::Entity::find()
        .filter(sale_liquidation_details::Column::LiquidationId.eq(liquidation_id))
        .all(txn)
        .await?;
    let mut commitment_ids: Vec<Uuid> = lines.iter().map(|l| l.commitment_id).collect();
    commitment_ids.sort();
    commitment_ids.dedup();

    for line in lines {
        let mut active: sale_liquidation_details::ActiveModel = line.into();
        active.voided = Set(true);
        active.update(txn).await?;
    }
    let mut active: sale_liquidations::ActiveModel = header.into();
    active.voided = Set(true);
    active.update(txn).await?;

    let select = sale_commitments::Entity::find()
        .filter(sale_commitments::Column::Id.is_in(commitment_ids.clone()));
    let affected = for_update(select, txn, row_locking).all(txn).await?;
    let details = load_details(txn, commitment_ids).await?;
    for row in &affected {
        let commitment = convert::commitment(row);
        let status = commitment
            .status
            .for_remaining(commitment_position(&commitment, &details).remaining());
        if status != commitment.status {
            set_status(txn, commitment.id, status).await?;
        }
    }

    info!(%liquidation_id, commitments = affected.len(), "sale liquidation voided");
    Ok(VoidOutcome::Voided)
}

async fn load_details(
    txn: &DatabaseTransaction,
    commitment_ids: Vec<Uuid>,
) -> StoreResult<Vec<LiquidationDetail>> {
    if commitment_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sale_liquidation_details::Entity::find()
        .filter(sale_liquidation_details::Column::CommitmentId.is_in(commitment_ids))
        .all(txn)
        .await?;
    Ok(rows.iter().map(convert::sale_detail).collect())
}

async fn set_status(
    txn: &DatabaseTransaction,
    commitment_id: Uuid,
    status: DocumentStatus,
) -> StoreResult<()> {
    sale_commitments::ActiveModel {
        id: Set(commitment_id),
        status: Set(status.into()),
        ..Default::default()
    }
    .update(txn)
    .await?;
    Ok(())
}
