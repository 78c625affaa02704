//! Mapping between stored rows and engine snapshot types.
//!
//! Every decimal read back is re-rounded to two places; SQLite hands them
//! back through a float.

use beneficio_core::contract::{Contract, ContractDirection, Delivery};
use beneficio_core::deposit::{Deposit, LiquidationDetail};
use beneficio_core::inventory::{Direction, Lot, StockMovement};
use beneficio_core::obligation::{
    MovementKind, Obligation, ObligationKind, ObligationMovement, ObligationStatus,
};
use beneficio_core::sale::SaleCommitment;
use beneficio_core::{DocumentStatus, EngineError, Reference};
use beneficio_shared::money;
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;

use crate::entities::{
    contract_deliveries, contracts, deposit_liquidation_details, deposits, inventory_lots,
    inventory_movements, obligation_movements, obligations, sale_commitments,
    sale_liquidation_details, sea_orm_active_enums as db,
};

pub(crate) fn utc(at: DateTimeWithTimeZone) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

pub(crate) fn stamp(at: DateTime<Utc>) -> DateTimeWithTimeZone {
    at.fixed_offset()
}

// ============================================================================
// Enums
// ============================================================================

impl From<ObligationKind> for db::ObligationKind {
    fn from(kind: ObligationKind) -> Self {
        match kind {
            ObligationKind::Loan => Self::Loan,
            ObligationKind::CashAdvance => Self::CashAdvance,
        }
    }
}

impl From<db::ObligationKind> for ObligationKind {
    fn from(kind: db::ObligationKind) -> Self {
        match kind {
            db::ObligationKind::Loan => Self::Loan,
            db::ObligationKind::CashAdvance => Self::CashAdvance,
        }
    }
}

impl From<ObligationStatus> for db::ObligationStatus {
    fn from(status: ObligationStatus) -> Self {
        match status {
            ObligationStatus::Active => Self::Active,
            ObligationStatus::Completed => Self::Completed,
            ObligationStatus::Voided => Self::Voided,
        }
    }
}

impl From<db::ObligationStatus> for ObligationStatus {
    fn from(status: db::ObligationStatus) -> Self {
        match status {
            db::ObligationStatus::Active => Self::Active,
            db::ObligationStatus::Completed => Self::Completed,
            db::ObligationStatus::Voided => Self::Voided,
        }
    }
}

impl From<DocumentStatus> for db::DocumentStatus {
    fn from(status: DocumentStatus) -> Self {
        match status {
            DocumentStatus::Pending => Self::Pending,
            DocumentStatus::Liquidated => Self::Liquidated,
            DocumentStatus::Voided => Self::Voided,
        }
    }
}

impl From<db::DocumentStatus> for DocumentStatus {
    fn from(status: db::DocumentStatus) -> Self {
        match status {
            db::DocumentStatus::Pending => Self::Pending,
            db::DocumentStatus::Liquidated => Self::Liquidated,
            db::DocumentStatus::Voided => Self::Voided,
        }
    }
}

impl From<ContractDirection> for db::ContractDirection {
    fn from(direction: ContractDirection) -> Self {
        match direction {
            ContractDirection::Incoming => Self::Incoming,
            ContractDirection::Outgoing => Self::Outgoing,
        }
    }
}

impl From<db::ContractDirection> for ContractDirection {
    fn from(direction: db::ContractDirection) -> Self {
        match direction {
            db::ContractDirection::Incoming => Self::Incoming,
            db::ContractDirection::Outgoing => Self::Outgoing,
        }
    }
}

impl From<Direction> for db::StockDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::In => Self::In,
            Direction::Out => Self::Out,
            Direction::Transfer => Self::Transfer,
            Direction::Void => Self::Void,
            Direction::Adjust => Self::Adjust,
        }
    }
}

impl From<db::StockDirection> for Direction {
    fn from(direction: db::StockDirection) -> Self {
        match direction {
            db::StockDirection::In => Self::In,
            db::StockDirection::Out => Self::Out,
            db::StockDirection::Transfer => Self::Transfer,
            db::StockDirection::Void => Self::Void,
            db::StockDirection::Adjust => Self::Adjust,
        }
    }
}

/// Splits a movement kind into its stored code and void target.
pub(crate) fn movement_kind_columns(
    kind: MovementKind,
) -> (db::ObligationMovementKind, Option<uuid::Uuid>) {
    let code = match kind {
        MovementKind::ChargePrincipal => db::ObligationMovementKind::ChargePrincipal,
        MovementKind::PaymentPrincipal => db::ObligationMovementKind::PaymentPrincipal,
        MovementKind::ChargeInterest => db::ObligationMovementKind::ChargeInterest,
        MovementKind::PaymentInterest => db::ObligationMovementKind::PaymentInterest,
        MovementKind::Void { .. } => db::ObligationMovementKind::Void,
    };
    (code, kind.void_target())
}

// ============================================================================
// Rows
// ============================================================================

pub(crate) fn obligation(model: &obligations::Model) -> Obligation {
    Obligation {
        id: model.id,
        producer_id: model.producer_id,
        kind: model.kind.into(),
        principal: money::round2(model.principal),
        opened_at: utc(model.opened_at),
        status: model.status.into(),
    }
}

pub(crate) fn obligation_movement(
    model: &obligation_movements::Model,
) -> Result<ObligationMovement, EngineError> {
    let kind = match model.kind {
        db::ObligationMovementKind::ChargePrincipal => MovementKind::ChargePrincipal,
        db::ObligationMovementKind::PaymentPrincipal => MovementKind::PaymentPrincipal,
        db::ObligationMovementKind::ChargeInterest => MovementKind::ChargeInterest,
        db::ObligationMovementKind::PaymentInterest => MovementKind::PaymentInterest,
        db::ObligationMovementKind::Void => MovementKind::Void {
            target: model.voids.ok_or_else(|| {
                EngineError::Internal(format!("void movement {} has no target", model.id))
            })?,
        },
    };
    Ok(ObligationMovement {
        id: model.id,
        obligation_id: model.obligation_id,
        kind,
        amount: money::round2(model.amount),
        at: utc(model.occurred_at),
        note: model.note.clone(),
    })
}

pub(crate) fn lot(model: &inventory_lots::Model) -> Lot {
    Lot {
        id: model.id,
        product_id: model.product_id,
        owner_id: model.owner_id,
        on_hand: money::round2(model.quantity_on_hand),
        opened_at: utc(model.opened_at),
    }
}

pub(crate) fn stock_movement(
    model: &inventory_movements::Model,
) -> Result<StockMovement, EngineError> {
    let kind = model.reference_type.parse().map_err(|_| {
        EngineError::Internal(format!(
            "movement {} has unknown reference type '{}'",
            model.id, model.reference_type
        ))
    })?;
    Ok(StockMovement {
        id: model.id,
        lot_id: model.lot_id,
        direction: model.direction.into(),
        quantity: money::round2(model.quantity),
        reference: Reference::new(kind, model.reference_id),
        at: utc(model.occurred_at),
        voided: model.voided,
        reverses: model.reverses,
    })
}

pub(crate) fn deposit(model: &deposits::Model) -> Deposit {
    Deposit {
        id: model.id,
        producer_id: model.producer_id,
        product_id: model.product_id,
        quantity: money::round2(model.quantity),
        status: model.status.into(),
        deposited_at: utc(model.deposited_at),
    }
}

pub(crate) fn deposit_detail(model: &deposit_liquidation_details::Model) -> LiquidationDetail {
    LiquidationDetail {
        id: model.id,
        liquidation_id: model.liquidation_id,
        document_id: model.deposit_id,
        quantity: money::round2(model.quantity),
        unit_price: money::round2(model.unit_price),
        amount: money::round2(model.amount),
        voided: model.voided,
    }
}

pub(crate) fn commitment(model: &sale_commitments::Model) -> SaleCommitment {
    SaleCommitment {
        id: model.id,
        buyer_id: model.buyer_id,
        product_id: model.product_id,
        quantity: money::round2(model.quantity),
        unit_price: money::round2(model.unit_price),
        status: model.status.into(),
        committed_at: utc(model.committed_at),
    }
}

pub(crate) fn sale_detail(model: &sale_liquidation_details::Model) -> LiquidationDetail {
    LiquidationDetail {
        id: model.id,
        liquidation_id: model.liquidation_id,
        document_id: model.commitment_id,
        quantity: money::round2(model.quantity),
        unit_price: money::round2(model.unit_price),
        amount: money::round2(model.amount),
        voided: model.voided,
    }
}

pub(crate) fn contract(model: &contracts::Model) -> Contract {
    Contract {
        id: model.id,
        direction: model.direction.into(),
        counterparty_id: model.counterparty_id,
        product_id: model.product_id,
        quantity: money::round2(model.quantity),
        unit_price: money::round2(model.unit_price),
        status: model.status.into(),
        created_at: utc(model.created_at),
    }
}

pub(crate) fn delivery(model: &contract_deliveries::Model) -> Delivery {
    Delivery {
        id: model.id,
        contract_id: model.contract_id,
        quantity: money::round2(model.quantity),
        unit_price: money::round2(model.unit_price),
        delivered_at: utc(model.delivered_at),
        voided: model.voided,
    }
}
