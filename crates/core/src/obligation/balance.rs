//! Obligation balance calculator.
//!
//! Balances are always derived from the full movement history; nothing
//! stores a running balance.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use beneficio_shared::money;

use super::types::{MovementKind, Obligation, ObligationMovement, ObligationStatus};

/// Derived pending balances of one obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObligationBalance {
    /// Principal minus non-voided principal payments.
    pub principal_pending: Decimal,
    /// Non-voided interest charges minus non-voided interest payments.
    pub interest_pending: Decimal,
}

impl ObligationBalance {
    /// Principal plus interest.
    #[must_use]
    pub fn total_pending(&self) -> Decimal {
        money::add(self.principal_pending, self.interest_pending)
    }

    /// Returns true when neither principal nor interest is pending.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.principal_pending <= Decimal::ZERO && self.interest_pending <= Decimal::ZERO
    }

    /// Status implied by this balance for an obligation currently in `current`.
    #[must_use]
    pub fn status(&self, current: ObligationStatus) -> ObligationStatus {
        match current {
            ObligationStatus::Voided => ObligationStatus::Voided,
            _ if self.is_settled() => ObligationStatus::Completed,
            _ => ObligationStatus::Active,
        }
    }
}

/// Ids of movements cancelled by a `Void` row.
#[must_use]
pub fn voided_ids(movements: &[ObligationMovement]) -> HashSet<Uuid> {
    movements.iter().filter_map(|m| m.kind.void_target()).collect()
}

/// Computes pending principal and interest.
///
/// Movements are applied in `(at, id)` order and each accumulation step is
/// rounded to two decimals. Voided movements, void rows themselves and the
/// opening principal charge (already carried by `obligation.principal`) do
/// not move the balance.
#[must_use]
pub fn compute_balance(
    obligation: &Obligation,
    movements: &[ObligationMovement],
) -> ObligationBalance {
    compute_balance_excluding(obligation, movements, None)
}

/// Same as [`compute_balance`], treating `excluded` as if it were voided.
#[must_use]
pub fn compute_balance_excluding(
    obligation: &Obligation,
    movements: &[ObligationMovement],
    excluded: Option<Uuid>,
) -> ObligationBalance {
    let voided = voided_ids(movements);
    let mut ordered: Vec<&ObligationMovement> = movements
        .iter()
        .filter(|m| m.obligation_id == obligation.id)
        .filter(|m| !voided.contains(&m.id) && Some(m.id) != excluded)
        .collect();
    ordered.sort_by(|a, b| a.at.cmp(&b.at).then_with(|| a.id.cmp(&b.id)));

    let mut principal_pending = money::round2(obligation.principal);
    let mut interest_pending = Decimal::ZERO;

    for movement in ordered {
        match movement.kind {
            MovementKind::PaymentPrincipal => {
                principal_pending = money::sub(principal_pending, movement.amount);
            }
            MovementKind::ChargeInterest => {
                interest_pending = money::add(interest_pending, movement.amount);
            }
            MovementKind::PaymentInterest => {
                interest_pending = money::sub(interest_pending, movement.amount);
            }
            MovementKind::ChargePrincipal | MovementKind::Void { .. } => {}
        }
    }

    ObligationBalance {
        principal_pending,
        interest_pending,
    }
}
