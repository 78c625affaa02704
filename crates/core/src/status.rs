//! Lifecycle status shared by deposits, sale commitments and contracts.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Status of a quantity-bearing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    /// Quantity still outstanding.
    Pending,
    /// Fully settled or fulfilled.
    Liquidated,
    /// Cancelled; excluded from every balance.
    Voided,
}

impl DocumentStatus {
    /// Status implied by the quantity still outstanding.
    ///
    /// Voided documents keep their status regardless of balance.
    #[must_use]
    pub fn for_remaining(self, remaining: Decimal) -> Self {
        match self {
            Self::Voided => Self::Voided,
            _ if remaining <= Decimal::ZERO => Self::Liquidated,
            _ => Self::Pending,
        }
    }

    /// Returns true if the document is voided.
    #[must_use]
    pub const fn is_voided(self) -> bool {
        matches!(self, Self::Voided)
    }

    /// Stable textual name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Liquidated => "LIQUIDATED",
            Self::Voided => "VOIDED",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "LIQUIDATED" => Ok(Self::Liquidated),
            "VOIDED" => Ok(Self::Voided),
            other => Err(EngineError::InvalidRequest(format!(
                "unknown document status '{other}'"
            ))),
        }
    }
}
