//! Contract domain types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use beneficio_shared::money;

use crate::error::EngineError;
use crate::status::DocumentStatus;

/// Which way the coffee flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractDirection {
    /// Coffee received from a producer.
    Incoming,
    /// Coffee delivered to a buyer.
    Outgoing,
}

impl ContractDirection {
    /// Stable textual name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Incoming => "INCOMING",
            Self::Outgoing => "OUTGOING",
        }
    }
}

impl fmt::Display for ContractDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractDirection {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCOMING" => Ok(Self::Incoming),
            "OUTGOING" => Ok(Self::Outgoing),
            other => Err(EngineError::InvalidRequest(format!(
                "unknown contract direction '{other}'"
            ))),
        }
    }
}

/// A contract for a fixed quantity of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    /// Contract ID.
    pub id: Uuid,
    /// Incoming or outgoing.
    pub direction: ContractDirection,
    /// Producer or buyer.
    pub counterparty_id: Uuid,
    /// Product contracted.
    pub product_id: Uuid,
    /// Contracted quantity.
    pub quantity: Decimal,
    /// Agreed unit price.
    pub unit_price: Decimal,
    /// Stored status.
    pub status: DocumentStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One delivery against a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// Delivery ID.
    pub id: Uuid,
    /// Contract delivered against.
    pub contract_id: Uuid,
    /// Quantity delivered.
    pub quantity: Decimal,
    /// Price applied.
    pub unit_price: Decimal,
    /// Delivery timestamp.
    pub delivered_at: DateTime<Utc>,
    /// Set when the delivery is voided.
    pub voided: bool,
}

/// A contract with its deliveries.
#[derive(Debug, Clone)]
pub struct ContractPosition {
    /// The contract.
    pub contract: Contract,
    /// Every delivery, voided ones included.
    pub deliveries: Vec<Delivery>,
}

impl ContractPosition {
    /// Sum of non-voided delivered quantities.
    #[must_use]
    pub fn fulfilled(&self) -> Decimal {
        money::sum(
            self.deliveries
                .iter()
                .filter(|d| d.contract_id == self.contract.id && !d.voided)
                .map(|d| d.quantity),
        )
    }

    /// Quantity still outstanding, floored at zero.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        money::sub(self.contract.quantity, self.fulfilled()).max(Decimal::ZERO)
    }

    /// Status implied by the fulfilled quantity.
    #[must_use]
    pub fn derived_status(&self) -> DocumentStatus {
        self.contract.status.for_remaining(self.remaining())
    }

    /// Live deliveries.
    pub fn live_deliveries(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries.iter().filter(|d| !d.voided)
    }
}
