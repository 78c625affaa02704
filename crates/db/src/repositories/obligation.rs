//! Obligation repository: loans and cash advances.
//!
//! Balances are never stored. Every operation loads the producer's
//! obligations with their full movement history, asks the engine for a plan
//! and writes it inside one transaction.

use std::collections::HashMap;

use beneficio_core::obligation::{
    LedgerOperation, MovementKind, Obligation, ObligationBalance, ObligationKind,
    ObligationSnapshot, ObligationStatus, ObligationVoidPlan, PlannedPosting, plan_movement_void,
    plan_obligation_void, plan_operation,
};
use beneficio_core::error::ensure_positive;
use beneficio_core::VoidOutcome;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Select, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::entities::{obligation_movements, obligations, sea_orm_active_enums as db};

use super::convert::{self, movement_kind_columns, stamp};
use super::error::{StoreResult, not_found, rejected};
use super::lock::for_update;

/// Input for opening a loan or cash advance.
#[derive(Debug, Clone)]
pub struct OpenObligationInput {
    /// Producer receiving the money.
    pub producer_id: Uuid,
    /// Loan or cash advance.
    pub kind: ObligationKind,
    /// Principal lent.
    pub principal: Decimal,
    /// Opening timestamp; defaults to now.
    pub at: Option<DateTime<Utc>>,
    /// Free-form note.
    pub note: Option<String>,
}

/// Input for a payment or interest charge.
#[derive(Debug, Clone)]
pub struct ApplyOperationInput {
    /// Producer whose obligations are affected.
    pub producer_id: Uuid,
    /// Which obligations are considered.
    pub kind: ObligationKind,
    /// Payment or charge.
    pub operation: LedgerOperation,
    /// Amount to apply.
    pub amount: Decimal,
    /// Restricts the operation to one obligation.
    pub obligation_id: Option<Uuid>,
    /// Movement timestamp; defaults to now.
    pub at: Option<DateTime<Utc>>,
    /// Free-form note.
    pub note: Option<String>,
}

/// An obligation with its derived balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObligationSummary {
    /// The obligation.
    pub obligation: Obligation,
    /// Derived pending balances.
    pub balance: ObligationBalance,
    /// Status implied by the balance.
    pub status: ObligationStatus,
}

impl From<&ObligationSnapshot> for ObligationSummary {
    fn from(snapshot: &ObligationSnapshot) -> Self {
        Self {
            obligation: snapshot.obligation.clone(),
            balance: snapshot.balance(),
            status: snapshot.derived_status(),
        }
    }
}

/// A posting as written, with the id of its movement row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostedMovement {
    /// Movement row ID; voidable as an `ObligationMovement` reference.
    pub movement_id: Uuid,
    /// The planned posting.
    #[serde(flatten)]
    pub posting: PlannedPosting,
}

/// Obligation repository.
#[derive(Debug, Clone)]
pub struct ObligationRepository {
    db: DatabaseConnection,
    row_locking: bool,
}

impl ObligationRepository {
    /// Creates a new obligation repository with row locking enabled.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            row_locking: true,
        }
    }

    /// Enables or disables `FOR UPDATE` on balance reads.
    #[must_use]
    pub fn with_row_locking(self, row_locking: bool) -> Self {
        Self {
            row_locking,
            ..self
        }
    }

    /// Opens an obligation: `ACTIVE` status plus its `CHARGE_PRINCIPAL` movement.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for a non-positive principal, or a database error.
    pub async fn open(&self, input: OpenObligationInput) -> StoreResult<Obligation> {
        let principal =
            ensure_positive("principal", input.principal).map_err(|e| rejected("open_obligation", e))?;
        let at = input.at.unwrap_or_else(Utc::now);

        let txn = self.db.begin().await?;

        let row = obligations::ActiveModel {
            id: Set(Uuid::new_v4()),
            producer_id: Set(input.producer_id),
            kind: Set(input.kind.into()),
            principal: Set(principal),
            status: Set(db::ObligationStatus::Active),
            note: Set(input.note.clone()),
            opened_at: Set(stamp(at)),
        }
        .insert(&txn)
        .await?;

        insert_movement(
            &txn,
            row.id,
            MovementKind::ChargePrincipal,
            principal,
            at,
            input.note,
        )
        .await?;

        txn.commit().await?;

        info!(
            obligation_id = %row.id,
            producer_id = %input.producer_id,
            kind = %input.kind,
            principal = %principal,
            "obligation opened"
        );
        Ok(convert::obligation(&row))
    }

    /// Applies a payment or interest charge across the producer's obligations
    /// of one kind, oldest first.
    ///
    /// # Errors
    ///
    /// - `EntityNotFound` if `obligation_id` names no obligation of the producer.
    /// - `NoPendingObligations`, `InsufficientBalance` or `InvalidAmount` from
    ///   the engine.
    /// - A database error; nothing is written in any failure case.
    pub async fn apply(&self, input: ApplyOperationInput) -> StoreResult<Vec<PostedMovement>> {
        let txn = self.db.begin().await?;

        let mut select = obligations::Entity::find()
            .filter(obligations::Column::ProducerId.eq(input.producer_id))
            .filter(obligations::Column::Kind.eq(db::ObligationKind::from(input.kind)));
        if let Some(id) = input.obligation_id {
            select = select.filter(obligations::Column::Id.eq(id));
        }
        let snapshots = load_snapshots(&txn, select, self.row_locking).await?;
        if let Some(id) = input.obligation_id
            && snapshots.is_empty()
        {
            return Err(not_found("Obligation", id));
        }

        let postings = plan_operation(input.producer_id, input.operation, input.amount, &snapshots)
            .map_err(|e| rejected("apply_obligation_operation", e))?;

        let at = input.at.unwrap_or_else(Utc::now);
        let mut posted = Vec::with_capacity(postings.len());
        for posting in postings {
            let row = insert_movement(
                &txn,
                posting.obligation_id,
                posting.kind,
                posting.amount,
                at,
                input.note.clone(),
            )
            .await?;

            let current = snapshots
                .iter()
                .find(|s| s.obligation.id == posting.obligation_id)
                .map(|s| s.obligation.status);
            if current != Some(posting.status_after) {
                set_status(&txn, posting.obligation_id, posting.status_after).await?;
            }
            posted.push(PostedMovement {
                movement_id: row.id,
                posting,
            });
        }

        txn.commit().await?;

        info!(
            producer_id = %input.producer_id,
            kind = %input.kind,
            operation = ?input.operation,
            amount = %input.amount,
            postings = posted.len(),
            "obligation operation committed"
        );
        Ok(posted)
    }

    /// Derived balance of one obligation.
    ///
    /// # Errors
    ///
    /// `EntityNotFound` for an unknown id, or a database error.
    pub async fn summary(&self, obligation_id: Uuid) -> StoreResult<ObligationSummary> {
        let txn = self.db.begin().await?;
        let snapshot = load_snapshot(&txn, obligation_id, false).await?;
        txn.commit().await?;
        Ok(ObligationSummary::from(&snapshot))
    }

    /// Every obligation of a producer, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_producer(
        &self,
        producer_id: Uuid,
        kind: Option<ObligationKind>,
    ) -> StoreResult<Vec<ObligationSummary>> {
        let txn = self.db.begin().await?;
        let mut select =
            obligations::Entity::find().filter(obligations::Column::ProducerId.eq(producer_id));
        if let Some(kind) = kind {
            select = select.filter(obligations::Column::Kind.eq(db::ObligationKind::from(kind)));
        }
        let snapshots = load_snapshots(&txn, select, false).await?;
        txn.commit().await?;
        Ok(snapshots.iter().map(ObligationSummary::from).collect())
    }
}

// ============================================================================
// Voids
// ============================================================================

/// Voids the whole obligation.
pub(crate) async fn void_obligation(
    txn: &DatabaseTransaction,
    obligation_id: Uuid,
    row_locking: bool,
) -> StoreResult<VoidOutcome> {
    let snapshot = load_snapshot(txn, obligation_id, row_locking).await?;
    let plan = plan_obligation_void(&snapshot)?;
    write_void(txn, plan).await
}

/// Voids one payment or charge.
pub(crate) async fn void_movement(
    txn: &DatabaseTransaction,
    movement_id: Uuid,
    row_locking: bool,
) -> StoreResult<VoidOutcome> {
    let movement = obligation_movements::Entity::find_by_id(movement_id)
        .one(txn)
        .await?
        .ok_or_else(|| not_found("ObligationMovement", movement_id))?;
    let snapshot = load_snapshot(txn, movement.obligation_id, row_locking).await?;
    let plan = plan_movement_void(&snapshot, movement_id)?;
    write_void(txn, plan).await
}

async fn write_void(txn: &DatabaseTransaction, plan: ObligationVoidPlan) -> StoreResult<VoidOutcome> {
    let now = Utc::now();
    match plan {
        ObligationVoidPlan::AlreadyVoided => Ok(VoidOutcome::AlreadyVoided),
        ObligationVoidPlan::VoidObligation {
            obligation_id,
            charge_movement,
        } => {
            if let Some(target) = charge_movement {
                let charge = obligation_movements::Entity::find_by_id(target)
                    .one(txn)
                    .await?
                    .ok_or_else(|| not_found("ObligationMovement", target))?;
                insert_movement(
                    txn,
                    obligation_id,
                    MovementKind::Void { target },
                    convert::obligation_movement(&charge)?.amount,
                    now,
                    None,
                )
                .await?;
            }
            set_status(txn, obligation_id, ObligationStatus::Voided).await?;
            info!(%obligation_id, "obligation voided");
            Ok(VoidOutcome::Voided)
        }
        ObligationVoidPlan::VoidMovement {
            movement_id,
            amount,
            status_after,
        } => {
            let movement = obligation_movements::Entity::find_by_id(movement_id)
                .one(txn)
                .await?
                .ok_or_else(|| not_found("ObligationMovement", movement_id))?;
            insert_movement(
                txn,
                movement.obligation_id,
                MovementKind::Void {
                    target: movement_id,
                },
                amount,
                now,
                None,
            )
            .await?;
            set_status(txn, movement.obligation_id, status_after).await?;
            info!(%movement_id, obligation_id = %movement.obligation_id, "obligation movement voided");
            Ok(VoidOutcome::Voided)
        }
    }
}

// ============================================================================
// Loading and writing
// ============================================================================

async fn load_snapshot(
    txn: &DatabaseTransaction,
    obligation_id: Uuid,
    row_locking: bool,
) -> StoreResult<ObligationSnapshot> {
    let select = obligations::Entity::find().filter(obligations::Column::Id.eq(obligation_id));
    load_snapshots(txn, select, row_locking)
        .await?
        .pop()
        .ok_or_else(|| not_found("Obligation", obligation_id))
}

/// Loads the selected obligations, oldest first, with their movements.
async fn load_snapshots(
    txn: &DatabaseTransaction,
    select: Select<obligations::Entity>,
    row_locking: bool,
) -> StoreResult<Vec<ObligationSnapshot>> {
    let select = select
        .order_by_asc(obligations::Column::OpenedAt)
        .order_by_asc(obligations::Column::Id);
    let rows = for_update(select, txn, row_locking).all(txn).await?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let movement_rows = obligation_movements::Entity::find()
        .filter(obligation_movements::Column::ObligationId.is_in(ids))
        .order_by_asc(obligation_movements::Column::OccurredAt)
        .order_by_asc(obligation_movements::Column::Id)
        .all(txn)
        .await?;

    let mut by_obligation: HashMap<Uuid, Vec<_>> = HashMap::new();
    for row in &movement_rows {
        by_obligation
            .entry(row.obligation_id)
            .or_default()
            .push(convert::obligation_movement(row)?);
    }

    Ok(rows
        .iter()
        .map(|row| ObligationSnapshot {
            obligation: convert::obligation(row),
            movements: by_obligation.remove(&row.id).unwrap_or_default(),
        })
        .collect())
}

async fn insert_movement(
    txn: &DatabaseTransaction,
    obligation_id: Uuid,
    kind: MovementKind,
    amount: Decimal,
    at: DateTime<Utc>,
    note: Option<String>,
) -> StoreResult<obligation_movements::Model> {
    let (code, voids) = movement_kind_columns(kind);
    let row = obligation_movements::ActiveModel {
        id: Set(Uuid::new_v4()),
        obligation_id: Set(obligation_id),
        kind: Set(code),
        amount: Set(amount),
        voids: Set(voids),
        note: Set(note),
        occurred_at: Set(stamp(at)),
    }
    .insert(txn)
    .await?;
    Ok(row)
}

async fn set_status(
    txn: &DatabaseTransaction,
    obligation_id: Uuid,
    status: ObligationStatus,
) -> StoreResult<()> {
    obligations::ActiveModel {
        id: Set(obligation_id),
        status: Set(status.into()),
        ..Default::default()
    }
    .update(txn)
    .await?;
    Ok(())
}
