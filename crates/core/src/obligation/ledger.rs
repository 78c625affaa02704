//! Payment, charge and void planning for a producer's obligations.
//!
//! Payments are distributed oldest first across every open obligation of the
//! requested kind. Charges land whole on the oldest obligation that still has
//! anything pending.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::allocation::{self, AllocationError, Bucket, OrderedBuckets};
use crate::error::{EngineError, ensure_positive};
use crate::reference::{Reference, ReferenceKind};

use super::balance::{ObligationBalance, compute_balance, compute_balance_excluding, voided_ids};
use super::types::{
    LedgerOperation, MovementKind, Obligation, ObligationMovement, ObligationStatus,
};

/// An obligation together with its full movement history.
#[derive(Debug, Clone)]
pub struct ObligationSnapshot {
    /// The obligation.
    pub obligation: Obligation,
    /// Every movement, void rows included.
    pub movements: Vec<ObligationMovement>,
}

impl ObligationSnapshot {
    /// Derived balance.
    #[must_use]
    pub fn balance(&self) -> ObligationBalance {
        compute_balance(&self.obligation, &self.movements)
    }

    /// Status implied by the derived balance.
    #[must_use]
    pub fn derived_status(&self) -> ObligationStatus {
        self.balance().status(self.obligation.status)
    }

    fn is_voided(&self) -> bool {
        self.obligation.status == ObligationStatus::Voided
    }

    fn pending_for(&self, operation: LedgerOperation) -> Decimal {
        let balance = self.balance();
        match operation {
            LedgerOperation::PaymentPrincipal => balance.principal_pending,
            LedgerOperation::PaymentInterest => balance.interest_pending,
            LedgerOperation::ChargeInterest => balance.total_pending(),
        }
    }

    /// Non-voided movements other than the opening charge and void rows.
    fn live_postings(&self) -> Vec<&ObligationMovement> {
        let voided = voided_ids(&self.movements);
        self.movements
            .iter()
            .filter(|m| !voided.contains(&m.id))
            .filter(|m| {
                !matches!(
                    m.kind,
                    MovementKind::ChargePrincipal | MovementKind::Void { .. }
                )
            })
            .collect()
    }
}

/// One movement to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedPosting {
    /// Obligation the movement is written against.
    pub obligation_id: Uuid,
    /// Movement kind.
    pub kind: MovementKind,
    /// Amount applied to this obligation.
    pub amount: Decimal,
    /// Pending balance (of the targeted component) before the posting.
    pub pending_before: Decimal,
    /// Obligation status after the posting.
    pub status_after: ObligationStatus,
}

/// Plans a payment or charge against `snapshots`, all owned by `producer_id`.
///
/// Voided obligations are ignored. Each obligation touched gets exactly one
/// posting.
///
/// # Errors
///
/// - `InvalidAmount` for a non-positive amount.
/// - `NoPendingObligations` when no obligation has anything pending in the
///   component the operation touches.
/// - `InsufficientBalance` when a payment exceeds the total pending of its
///   component across all obligations.
pub fn plan_operation(
    producer_id: Uuid,
    operation: LedgerOperation,
    amount: Decimal,
    snapshots: &[ObligationSnapshot],
) -> Result<Vec<PlannedPosting>, EngineError> {
    let amount = ensure_positive("amount", amount)?;
    let open: Vec<&ObligationSnapshot> = snapshots
        .iter()
        .filter(|s| !s.is_voided())
        .filter(|s| s.pending_for(operation) > Decimal::ZERO)
        .collect();

    if open.is_empty() {
        return Err(EngineError::NoPendingObligations { producer_id });
    }

    let buckets = OrderedBuckets::new(
        open.iter()
            .map(|s| Bucket::new(s.obligation.id, s.obligation.opened_at, s.pending_for(operation)))
            .collect(),
    );

    let allocations = match operation {
        LedgerOperation::ChargeInterest => {
            let target = buckets
                .first_open()
                .ok_or(EngineError::NoPendingObligations { producer_id })?;
            vec![allocation::Allocation {
                id: target.id,
                applied: amount,
                pending_before: target.pending,
            }]
        }
        LedgerOperation::PaymentPrincipal | LedgerOperation::PaymentInterest => {
            allocation::allocate(amount, &buckets).map_err(|err| match err {
                AllocationError::InvalidAmount(value) => {
                    EngineError::InvalidAmount(format!("amount must be positive, got {value}"))
                }
                AllocationError::InsufficientBalance {
                    requested,
                    available,
                } => EngineError::InsufficientBalance {
                    requested,
                    available,
                },
            })?
        }
    };

    let kind = operation.movement_kind();
    allocations
        .into_iter()
        .map(|allocation| {
            let snapshot = open
                .iter()
                .find(|s| s.obligation.id == allocation.id)
                .ok_or_else(|| EngineError::Internal("allocated to unknown obligation".into()))?;
            let status_after = status_after_posting(snapshot, kind, allocation.applied);
            Ok(PlannedPosting {
                obligation_id: allocation.id,
                kind,
                amount: allocation.applied,
                pending_before: allocation.pending_before,
                status_after,
            })
        })
        .collect()
}

fn status_after_posting(
    snapshot: &ObligationSnapshot,
    kind: MovementKind,
    amount: Decimal,
) -> ObligationStatus {
    let mut movements = snapshot.movements.clone();
    movements.push(ObligationMovement {
        id: Uuid::max(),
        obligation_id: snapshot.obligation.id,
        kind,
        amount,
        at: DateTime::<Utc>::MAX_UTC,
        note: None,
    });
    compute_balance(&snapshot.obligation, &movements).status(snapshot.obligation.status)
}

/// Result of planning a void on an obligation or one of its movements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObligationVoidPlan {
    /// Nothing to do; the target is already voided.
    AlreadyVoided,
    /// Void the whole obligation; `charge_movement` is its opening charge.
    VoidObligation {
        /// Obligation to mark `VOIDED`.
        obligation_id: Uuid,
        /// Opening `CHARGE_PRINCIPAL` movement to cancel with a void row.
        charge_movement: Option<Uuid>,
    },
    /// Write a void row for `movement_id`.
    VoidMovement {
        /// The movement to cancel.
        movement_id: Uuid,
        /// Amount carried by the void row.
        amount: Decimal,
        /// Obligation status once the movement no longer counts.
        status_after: ObligationStatus,
    },
}

/// Plans voiding the obligation itself.
///
/// # Errors
///
/// `HasDependentMovements` if any payment or interest charge still counts.
pub fn plan_obligation_void(snapshot: &ObligationSnapshot) -> Result<ObligationVoidPlan, EngineError> {
    if snapshot.is_voided() {
        return Ok(ObligationVoidPlan::AlreadyVoided);
    }

    let mut dependents: Vec<Reference> = snapshot
        .live_postings()
        .into_iter()
        .map(|m| Reference::new(ReferenceKind::ObligationMovement, m.id))
        .collect();
    if !dependents.is_empty() {
        dependents.sort();
        return Err(EngineError::HasDependentMovements {
            reference: Reference::new(ReferenceKind::Obligation, snapshot.obligation.id),
            dependents,
        });
    }

    let voided = voided_ids(&snapshot.movements);
    let charge_movement = snapshot
        .movements
        .iter()
        .find(|m| m.kind == MovementKind::ChargePrincipal && !voided.contains(&m.id))
        .map(|m| m.id);

    Ok(ObligationVoidPlan::VoidObligation {
        obligation_id: snapshot.obligation.id,
        charge_movement,
    })
}

/// Plans voiding one movement.
///
/// Voiding the opening principal charge voids the whole obligation. An
/// interest charge cannot be voided while the interest payments made against
/// it would leave interest pending negative.
///
/// # Errors
///
/// - `EntityNotFound` if the movement is not part of the snapshot.
/// - `InvalidRequest` when targeting a void row.
/// - `HasDependentMovements` as described above.
pub fn plan_movement_void(
    snapshot: &ObligationSnapshot,
    movement_id: Uuid,
) -> Result<ObligationVoidPlan, EngineError> {
    let movement = snapshot
        .movements
        .iter()
        .find(|m| m.id == movement_id)
        .ok_or(EngineError::EntityNotFound {
            entity: "ObligationMovement",
            id: movement_id,
        })?;

    if snapshot.is_voided() || voided_ids(&snapshot.movements).contains(&movement_id) {
        return Ok(ObligationVoidPlan::AlreadyVoided);
    }

    match movement.kind {
        MovementKind::Void { .. } => Err(EngineError::InvalidRequest(
            "a void movement cannot itself be voided".to_string(),
        )),
        MovementKind::ChargePrincipal => plan_obligation_void(snapshot),
        MovementKind::ChargeInterest => {
            let after =
                compute_balance_excluding(&snapshot.obligation, &snapshot.movements, Some(movement_id));
            if after.interest_pending < Decimal::ZERO {
                let mut dependents: Vec<Reference> = snapshot
                    .live_postings()
                    .into_iter()
                    .filter(|m| m.kind == MovementKind::PaymentInterest)
                    .map(|m| Reference::new(ReferenceKind::ObligationMovement, m.id))
                    .collect();
                dependents.sort();
                return Err(EngineError::HasDependentMovements {
                    reference: Reference::new(ReferenceKind::ObligationMovement, movement_id),
                    dependents,
                });
            }
            Ok(void_movement(snapshot, movement, after))
        }
        MovementKind::PaymentPrincipal | MovementKind::PaymentInterest => {
            let after =
                compute_balance_excluding(&snapshot.obligation, &snapshot.movements, Some(movement_id));
            Ok(void_movement(snapshot, movement, after))
        }
    }
}

fn void_movement(
    snapshot: &ObligationSnapshot,
    movement: &ObligationMovement,
    after: ObligationBalance,
) -> ObligationVoidPlan {
    ObligationVoidPlan::VoidMovement {
        movement_id: movement.id,
        amount: movement.amount,
        status_after: after.status(snapshot.obligation.status),
    }
}
