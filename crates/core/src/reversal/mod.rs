//! Reversal (anulación) planning.
//!
//! A void never deletes history. Originals are flagged voided, compensating
//! rows restore the prior quantities, and any live downstream posting blocks
//! the void until it is voided first.

pub mod stock;

use serde::Serialize;

use crate::error::EngineError;
use crate::reference::Reference;

pub use stock::{Compensation, plan_stock_reversal};

/// Outcome of a void request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoidOutcome {
    /// The reference was voided by this call.
    Voided,
    /// The reference was already voided; nothing changed.
    AlreadyVoided,
}

/// Fails with `HasDependentMovements` if `dependents` is not empty.
///
/// Dependents are reported sorted and deduplicated.
pub fn ensure_no_dependents(
    reference: Reference,
    mut dependents: Vec<Reference>,
) -> Result<(), EngineError> {
    if dependents.is_empty() {
        return Ok(());
    }
    dependents.sort();
    dependents.dedup();
    Err(EngineError::HasDependentMovements {
        reference,
        dependents,
    })
}
