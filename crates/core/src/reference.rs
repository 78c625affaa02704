//! Typed references to committed ledger documents.
//!
//! Every inventory movement and every void request names the document it
//! belongs to as `<Kind>#<uuid>` (e.g. `Purchase#0190...`). The reversal
//! engine uses the same references to locate postings and to report the
//! documents that block a void.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

/// Kind of document a posting belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// Coffee bought outright from a producer.
    Purchase,
    /// Coffee left in custody by a producer, settled later.
    Deposit,
    /// Settlement of deposited coffee.
    DepositLiquidation,
    /// Quantity promised to a buyer.
    SaleCommitment,
    /// Settlement of sale commitments; stock leaves the warehouse.
    SaleLiquidation,
    /// Incoming or outgoing contract.
    Contract,
    /// One delivery against a contract.
    ContractDelivery,
    /// Conversion of stock from one product to another.
    Transfer,
    /// Manual stock correction on a single lot.
    Adjustment,
    /// Loan or cash advance.
    Obligation,
    /// A payment or charge posted on an obligation.
    ObligationMovement,
}

impl ReferenceKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::Purchase,
        Self::Deposit,
        Self::DepositLiquidation,
        Self::SaleCommitment,
        Self::SaleLiquidation,
        Self::Contract,
        Self::ContractDelivery,
        Self::Transfer,
        Self::Adjustment,
        Self::Obligation,
        Self::ObligationMovement,
    ];

    /// Stable textual name used in storage and at the API boundary.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "Purchase",
            Self::Deposit => "Deposit",
            Self::DepositLiquidation => "DepositLiquidation",
            Self::SaleCommitment => "SaleCommitment",
            Self::SaleLiquidation => "SaleLiquidation",
            Self::Contract => "Contract",
            Self::ContractDelivery => "ContractDelivery",
            Self::Transfer => "Transfer",
            Self::Adjustment => "Adjustment",
            Self::Obligation => "Obligation",
            Self::ObligationMovement => "ObligationMovement",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EngineError::InvalidRequest(format!("unknown reference type '{s}'")))
    }
}

/// A committed document, e.g. `Purchase#<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reference {
    /// Document kind.
    pub kind: ReferenceKind,
    /// Document id.
    pub id: Uuid,
}

impl Reference {
    /// Creates a new reference.
    #[must_use]
    pub const fn new(kind: ReferenceKind, id: Uuid) -> Self {
        Self { kind, id }
    }

    /// Builds a reference from the separate type/id strings of a void request.
    pub fn parse_parts(kind: &str, id: &str) -> Result<Self, EngineError> {
        let kind = kind.parse()?;
        let id = Uuid::parse_str(id.trim())
            .map_err(|_| EngineError::InvalidRequest(format!("invalid reference id '{id}'")))?;
        Ok(Self { kind, id })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

impl FromStr for Reference {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once('#')
            .ok_or_else(|| EngineError::InvalidRequest(format!("malformed reference '{s}'")))?;
        Self::parse_parts(kind, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let id = Uuid::new_v4();
        let reference = Reference::new(ReferenceKind::Purchase, id);
        let text = reference.to_string();
        assert_eq!(text, format!("Purchase#{id}"));
        assert_eq!(text.parse::<Reference>().unwrap(), reference);
    }

    #[test]
    fn test_kind_parse_is_case_insensitive() {
        assert_eq!(
            "saleliquidation".parse::<ReferenceKind>().unwrap(),
            ReferenceKind::SaleLiquidation
        );
        assert_eq!(
            " ContractDelivery ".parse::<ReferenceKind>().unwrap(),
            ReferenceKind::ContractDelivery
        );
    }

    #[test]
    fn test_every_kind_round_trips_through_its_name() {
        for kind in ReferenceKind::ALL {
            assert_eq!(kind.as_str().parse::<ReferenceKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_rejects_unknown_kind_and_bad_id() {
        assert!(matches!(
            Reference::parse_parts("Invoice", &Uuid::new_v4().to_string()),
            Err(EngineError::InvalidRequest(_))
        ));
        assert!(matches!(
            Reference::parse_parts("Purchase", "123"),
            Err(EngineError::InvalidRequest(_))
        ));
        assert!("Purchase".parse::<Reference>().is_err());
    }
}
