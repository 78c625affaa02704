//! Obligation domain types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

/// The two structurally identical obligation variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationKind {
    /// Loan to a producer.
    Loan,
    /// Cash advance against future deliveries.
    CashAdvance,
}

impl ObligationKind {
    /// Stable textual name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Loan => "loan",
            Self::CashAdvance => "cash_advance",
        }
    }
}

impl fmt::Display for ObligationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObligationKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "loan" => Ok(Self::Loan),
            "cash_advance" | "cashadvance" | "advance" => Ok(Self::CashAdvance),
            other => Err(EngineError::InvalidRequest(format!(
                "unknown obligation kind '{other}'"
            ))),
        }
    }
}

/// Obligation lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObligationStatus {
    /// Principal or interest still pending.
    Active,
    /// Principal and interest fully paid.
    Completed,
    /// Cancelled.
    Voided,
}

impl ObligationStatus {
    /// Stable textual name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Voided => "VOIDED",
        }
    }
}

impl fmt::Display for ObligationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of an obligation movement.
///
/// `Void` cancels the movement it targets. History is never rewritten; a
/// voided movement stays in the list and is skipped by the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "kind")]
pub enum MovementKind {
    /// Opening charge; only written when the obligation is created.
    ChargePrincipal,
    /// Repayment of principal.
    PaymentPrincipal,
    /// Interest charged by the operator.
    ChargeInterest,
    /// Repayment of interest.
    PaymentInterest,
    /// Cancels another movement.
    Void {
        /// The cancelled movement.
        target: Uuid,
    },
}

impl MovementKind {
    /// Storage code of the kind (the void target is stored separately).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ChargePrincipal => "CHARGE_PRINCIPAL",
            Self::PaymentPrincipal => "PAYMENT_PRINCIPAL",
            Self::ChargeInterest => "CHARGE_INTEREST",
            Self::PaymentInterest => "PAYMENT_INTEREST",
            Self::Void { .. } => "VOID",
        }
    }

    /// Rebuilds a kind from its storage code and optional void target.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for an unknown code or a `VOID` without target.
    pub fn from_parts(code: &str, target: Option<Uuid>) -> Result<Self, EngineError> {
        match (code.trim().to_ascii_uppercase().as_str(), target) {
            ("CHARGE_PRINCIPAL", _) => Ok(Self::ChargePrincipal),
            ("PAYMENT_PRINCIPAL", _) => Ok(Self::PaymentPrincipal),
            ("CHARGE_INTEREST", _) => Ok(Self::ChargeInterest),
            ("PAYMENT_INTEREST", _) => Ok(Self::PaymentInterest),
            ("VOID", Some(target)) => Ok(Self::Void { target }),
            ("VOID", None) => Err(EngineError::InvalidRequest(
                "VOID movement without a target".to_string(),
            )),
            (other, _) => Err(EngineError::InvalidRequest(format!(
                "unknown movement kind '{other}'"
            ))),
        }
    }

    /// The movement this one cancels, if it is a void.
    #[must_use]
    pub const fn void_target(self) -> Option<Uuid> {
        match self {
            Self::Void { target } => Some(target),
            _ => None,
        }
    }
}

/// Operation requested against a producer's obligations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerOperation {
    /// Distribute a principal payment oldest first.
    PaymentPrincipal,
    /// Distribute an interest payment oldest first.
    PaymentInterest,
    /// Charge interest on the oldest open obligation.
    ChargeInterest,
}

impl LedgerOperation {
    /// Movement kind written for this operation.
    #[must_use]
    pub const fn movement_kind(self) -> MovementKind {
        match self {
            Self::PaymentPrincipal => MovementKind::PaymentPrincipal,
            Self::PaymentInterest => MovementKind::PaymentInterest,
            Self::ChargeInterest => MovementKind::ChargeInterest,
        }
    }
}

impl FromStr for LedgerOperation {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PAYMENT_PRINCIPAL" => Ok(Self::PaymentPrincipal),
            "PAYMENT_INTEREST" => Ok(Self::PaymentInterest),
            "CHARGE_INTEREST" => Ok(Self::ChargeInterest),
            "CHARGE_PRINCIPAL" => Err(EngineError::InvalidRequest(
                "principal is charged only when the obligation is opened".to_string(),
            )),
            other => Err(EngineError::InvalidRequest(format!(
                "unknown operation '{other}'"
            ))),
        }
    }
}

/// A loan or cash advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obligation {
    /// Obligation ID.
    pub id: Uuid,
    /// Producer who owes it.
    pub producer_id: Uuid,
    /// Loan or cash advance.
    pub kind: ObligationKind,
    /// Principal; immutable after creation.
    pub principal: Decimal,
    /// Creation timestamp, the FIFO ordering key.
    pub opened_at: DateTime<Utc>,
    /// Stored status.
    pub status: ObligationStatus,
}

/// One row of an obligation's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObligationMovement {
    /// Movement ID.
    pub id: Uuid,
    /// Obligation the movement belongs to.
    pub obligation_id: Uuid,
    /// Movement kind.
    pub kind: MovementKind,
    /// Two-decimal amount; always positive.
    pub amount: Decimal,
    /// When the movement took effect.
    pub at: DateTime<Utc>,
    /// Free-text note.
    pub note: Option<String>,
}
