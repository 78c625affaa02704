//! Reversal repository: voids any posting by its reference.
//!
//! Each reference kind is voided inside one transaction by the repository
//! that owns it. Voiding an already-voided reference succeeds and changes
//! nothing.

use beneficio_core::{Reference, ReferenceKind, VoidOutcome};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::info;

use super::error::{LedgerStoreError, StoreResult, rejected};
use super::{contract, deposit, inventory, obligation, sale};

/// Reversal repository.
#[derive(Debug, Clone)]
pub struct ReversalRepository {
    db: DatabaseConnection,
    row_locking: bool,
}

impl ReversalRepository {
    /// Creates a new reversal repository with row locking enabled.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            row_locking: true,
        }
    }

    /// Enables or disables `FOR UPDATE` on the rows a void reads.
    #[must_use]
    pub fn with_row_locking(self, row_locking: bool) -> Self {
        Self {
            row_locking,
            ..self
        }
    }

    /// Voids the posting identified by `reference`.
    ///
    /// # Errors
    ///
    /// `EntityNotFound` for an unknown id, `HasDependentMovements` while a
    /// live downstream posting exists, `InsufficientInventory` when the stock
    /// a posting brought in has already left, or a database error.
    pub async fn void(&self, reference: Reference) -> StoreResult<VoidOutcome> {
        let txn = self.db.begin().await?;
        let id = reference.id;
        let locking = self.row_locking;

        let result = match reference.kind {
            ReferenceKind::Purchase => inventory::void_purchase(&txn, id, locking).await,
            ReferenceKind::Transfer => inventory::void_transfer(&txn, id, locking).await,
            ReferenceKind::Adjustment => inventory::void_adjustment(&txn, id, locking).await,
            ReferenceKind::Deposit => deposit::void_deposit(&txn, id, locking).await,
            ReferenceKind::DepositLiquidation => {
                deposit::void_liquidation(&txn, id, locking).await
            }
            ReferenceKind::SaleCommitment => sale::void_commitment(&txn, id, locking).await,
            ReferenceKind::SaleLiquidation => sale::void_liquidation(&txn, id, locking).await,
            ReferenceKind::Contract => contract::void_contract(&txn, id, locking).await,
            ReferenceKind::ContractDelivery => contract::void_delivery(&txn, id, locking).await,
            ReferenceKind::Obligation => obligation::void_obligation(&txn, id, locking).await,
            ReferenceKind::ObligationMovement => {
                obligation::void_movement(&txn, id, locking).await
            }
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(LedgerStoreError::Engine(err)) => return Err(rejected("void", err)),
            Err(err) => return Err(err),
        };
        txn.commit().await?;

        info!(%reference, ?outcome, "void committed");
        Ok(outcome)
    }
}
