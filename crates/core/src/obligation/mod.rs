//! Loans and cash advances.
//!
//! This module implements:
//! - Obligation and movement types
//! - The balance calculator
//! - Payment, charge and void planning

pub mod balance;
pub mod ledger;
pub mod types;

#[cfg(test)]
mod props;

pub use balance::{ObligationBalance, compute_balance};
pub use ledger::{
    ObligationSnapshot, ObligationVoidPlan, PlannedPosting, plan_movement_void,
    plan_obligation_void, plan_operation,
};
pub use types::{
    LedgerOperation, MovementKind, Obligation, ObligationKind, ObligationMovement,
    ObligationStatus,
};
