//! Deposit domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::DocumentStatus;

/// Coffee deposited by a producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    /// Deposit ID.
    pub id: Uuid,
    /// Depositing producer.
    pub producer_id: Uuid,
    /// Product deposited.
    pub product_id: Uuid,
    /// Quantity deposited.
    pub quantity: Decimal,
    /// Stored status.
    pub status: DocumentStatus,
    /// Deposit timestamp, the FIFO ordering key.
    pub deposited_at: DateTime<Utc>,
}

/// A settlement line written by a liquidation.
///
/// Deposit and sale liquidations share this shape; `document_id` is the
/// deposit or the sale commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationDetail {
    /// Line ID.
    pub id: Uuid,
    /// Liquidation header.
    pub liquidation_id: Uuid,
    /// Deposit or commitment settled.
    pub document_id: Uuid,
    /// Quantity applied.
    pub quantity: Decimal,
    /// Unit price.
    pub unit_price: Decimal,
    /// Line amount.
    pub amount: Decimal,
    /// Set when the liquidation is voided.
    pub voided: bool,
}
