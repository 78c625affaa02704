//! Quantity settlement shared by deposit and sale liquidation.
//!
//! A liquidation walks the counterparty's open documents oldest first,
//! applies as much of the requested quantity as they hold, and prices each
//! line. Requests above the pending total are applied partially.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use beneficio_shared::money;

use crate::allocation::{self, AllocationError, Bucket, OrderedBuckets};
use crate::error::EngineError;
use crate::status::DocumentStatus;

/// A deposit or sale commitment with what has already been settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Document ID.
    pub document_id: Uuid,
    /// Creation timestamp, the FIFO ordering key.
    pub opened_at: DateTime<Utc>,
    /// Quantity originally deposited or committed.
    pub quantity: Decimal,
    /// Sum of non-voided settlement lines.
    pub settled: Decimal,
    /// Price applied to each settled unit of this document.
    pub unit_price: Decimal,
    /// Stored status.
    pub status: DocumentStatus,
}

impl Position {
    /// Builds a position from the quantities of its non-voided lines.
    pub fn new(
        document_id: Uuid,
        opened_at: DateTime<Utc>,
        quantity: Decimal,
        settled_lines: impl IntoIterator<Item = Decimal>,
        unit_price: Decimal,
        status: DocumentStatus,
    ) -> Self {
        Self {
            document_id,
            opened_at,
            quantity: money::round2(quantity),
            settled: money::sum(settled_lines),
            unit_price: money::round2(unit_price),
            status,
        }
    }

    /// Quantity still open.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        money::sub(self.quantity, self.settled)
    }
}

/// One priced settlement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettlementLine {
    /// Document settled.
    pub document_id: Uuid,
    /// Quantity applied to the document.
    pub quantity: Decimal,
    /// Unit price.
    pub unit_price: Decimal,
    /// `quantity × unit_price`, rounded.
    pub amount: Decimal,
    /// Quantity left open on the document.
    pub remaining_after: Decimal,
    /// Document status after this line.
    pub status_after: DocumentStatus,
}

/// Lines plus header totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    /// One line per document touched, oldest first.
    pub lines: Vec<SettlementLine>,
    /// Sum of line quantities.
    pub total_quantity: Decimal,
    /// Sum of line amounts.
    pub total_amount: Decimal,
}

/// Settles up to `quantity` across `positions`.
///
/// Voided documents are skipped. Returns `Ok(None)` when nothing is open.
///
/// # Errors
///
/// `InvalidAmount` for a non-positive quantity.
pub fn settle(quantity: Decimal, positions: &[Position]) -> Result<Option<Settlement>, EngineError> {
    let buckets = OrderedBuckets::new(
        positions
            .iter()
            .filter(|p| !p.status.is_voided())
            .map(|p| Bucket::new(p.document_id, p.opened_at, p.remaining()))
            .collect(),
    );

    let allocations = allocation::allocate_available(quantity, &buckets).map_err(|err| match err {
        AllocationError::InvalidAmount(value) => {
            EngineError::InvalidAmount(format!("quantity must be positive, got {value}"))
        }
        AllocationError::InsufficientBalance { .. } => {
            EngineError::Internal("partial allocation reported a shortfall".to_string())
        }
    })?;

    if allocations.is_empty() {
        return Ok(None);
    }

    let mut lines = Vec::with_capacity(allocations.len());
    for allocation in allocations {
        let position = positions
            .iter()
            .find(|p| p.document_id == allocation.id)
            .ok_or_else(|| EngineError::Internal("allocated to unknown document".to_string()))?;
        let remaining_after = allocation.pending_after();
        lines.push(SettlementLine {
            document_id: allocation.id,
            quantity: allocation.applied,
            unit_price: position.unit_price,
            amount: money::mul(allocation.applied, position.unit_price),
            remaining_after,
            status_after: position.status.for_remaining(remaining_after),
        });
    }

    Ok(Some(Settlement {
        total_quantity: money::sum(lines.iter().map(|l| l.quantity)),
        total_amount: money::sum(lines.iter().map(|l| l.amount)),
        lines,
    }))
}
