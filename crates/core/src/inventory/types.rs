//! Stock lot and movement types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::reference::Reference;

/// Direction of an inventory movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Stock received (purchase, deposit, incoming contract, transfer destination).
    In,
    /// Stock shipped (sale liquidation, outgoing contract).
    Out,
    /// Stock drawn from a source product by a transfer.
    Transfer,
    /// Compensating row written by a void.
    Void,
    /// Manual correction.
    Adjust,
}

impl Direction {
    /// Stable textual name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
            Self::Transfer => "TRANSFER",
            Self::Void => "VOID",
            Self::Adjust => "ADJUST",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(Self::In),
            "OUT" => Ok(Self::Out),
            "TRANSFER" => Ok(Self::Transfer),
            "VOID" => Ok(Self::Void),
            "ADJUST" => Ok(Self::Adjust),
            other => Err(EngineError::InvalidRequest(format!(
                "unknown movement direction '{other}'"
            ))),
        }
    }
}

/// A physical lot of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    /// Lot ID.
    pub id: Uuid,
    /// Product stored in the lot.
    pub product_id: Uuid,
    /// Producer or buyer the stock came from; informational only.
    pub owner_id: Option<Uuid>,
    /// Quantity currently on hand, never negative once committed.
    pub on_hand: Decimal,
    /// Creation timestamp, the FIFO ordering key.
    pub opened_at: DateTime<Utc>,
}

/// One row of the inventory journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    /// Movement ID.
    pub id: Uuid,
    /// Lot the movement changed.
    pub lot_id: Uuid,
    /// Direction.
    pub direction: Direction,
    /// Signed quantity: positive adds stock, negative removes it.
    pub quantity: Decimal,
    /// Document the movement belongs to.
    pub reference: Reference,
    /// When the movement took effect.
    pub at: DateTime<Utc>,
    /// Set once a compensating row has been written.
    pub voided: bool,
    /// For compensating rows, the movement they cancel.
    pub reverses: Option<Uuid>,
}

impl StockMovement {
    /// Returns true for an original (non-compensating) row that still counts.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.voided && self.direction != Direction::Void
    }

    /// Returns true if the movement removed stock.
    #[must_use]
    pub fn is_outflow(&self) -> bool {
        self.quantity < Decimal::ZERO
    }
}
