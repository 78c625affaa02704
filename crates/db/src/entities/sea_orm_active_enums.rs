//! `SeaORM` active enums, stored as short text codes.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Obligation variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ObligationKind {
    /// Loan.
    #[sea_orm(string_value = "loan")]
    Loan,
    /// Cash advance.
    #[sea_orm(string_value = "cash_advance")]
    CashAdvance,
}

/// Obligation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ObligationStatus {
    /// Balance pending.
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    /// Fully paid.
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    /// Cancelled.
    #[sea_orm(string_value = "VOIDED")]
    Voided,
}

/// Obligation movement kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ObligationMovementKind {
    /// Opening principal charge.
    #[sea_orm(string_value = "CHARGE_PRINCIPAL")]
    ChargePrincipal,
    /// Principal payment.
    #[sea_orm(string_value = "PAYMENT_PRINCIPAL")]
    PaymentPrincipal,
    /// Interest charge.
    #[sea_orm(string_value = "CHARGE_INTEREST")]
    ChargeInterest,
    /// Interest payment.
    #[sea_orm(string_value = "PAYMENT_INTEREST")]
    PaymentInterest,
    /// Cancels the movement in `voids`.
    #[sea_orm(string_value = "VOID")]
    Void,
}

/// Status of deposits, sale commitments and contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum DocumentStatus {
    /// Quantity outstanding.
    #[sea_orm(string_value = "PENDING")]
    Pending,
    /// Settled or fulfilled.
    #[sea_orm(string_value = "LIQUIDATED")]
    Liquidated,
    /// Cancelled.
    #[sea_orm(string_value = "VOIDED")]
    Voided,
}

/// Contract direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ContractDirection {
    /// Coffee received.
    #[sea_orm(string_value = "INCOMING")]
    Incoming,
    /// Coffee delivered.
    #[sea_orm(string_value = "OUTGOING")]
    Outgoing,
}

/// Inventory movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum StockDirection {
    /// Inbound.
    #[sea_orm(string_value = "IN")]
    In,
    /// Outbound.
    #[sea_orm(string_value = "OUT")]
    Out,
    /// Transfer draw.
    #[sea_orm(string_value = "TRANSFER")]
    Transfer,
    /// Compensating row.
    #[sea_orm(string_value = "VOID")]
    Void,
    /// Manual adjustment.
    #[sea_orm(string_value = "ADJUST")]
    Adjust,
}
