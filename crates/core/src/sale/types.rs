//! Sale commitment type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::DocumentStatus;

/// Quantity of a product promised to a buyer at a fixed unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleCommitment {
    /// Commitment ID.
    pub id: Uuid,
    /// Buyer.
    pub buyer_id: Uuid,
    /// Product committed.
    pub product_id: Uuid,
    /// Quantity committed.
    pub quantity: Decimal,
    /// Agreed unit price.
    pub unit_price: Decimal,
    /// Stored status.
    pub status: DocumentStatus,
    /// Commitment timestamp, the FIFO ordering key.
    pub committed_at: DateTime<Utc>,
}
