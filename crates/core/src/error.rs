//! Engine error taxonomy.
//!
//! Every business rejection is detected before the first write of an
//! operation, so callers never see a partially applied allocation. Each
//! variant carries enough structured detail (available amounts, blocking
//! references) for the calling layer to render an actionable message.

use rust_decimal::Decimal;
use serde_json::{Value, json};
use thiserror::Error;
use uuid::Uuid;

use beneficio_shared::{FixedParseError, money};

use crate::reference::Reference;

/// Errors that can occur during allocation, liquidation, delivery or void.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    // ========== Input Errors ==========
    /// Amount or quantity is non-positive or unparsable.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Request is malformed (unknown reference type, same-product transfer...).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    EntityNotFound {
        /// Entity name (e.g. "Contract").
        entity: &'static str,
        /// The missing id.
        id: Uuid,
    },

    // ========== Balance Errors ==========
    /// Payment exceeds the total pending balance.
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Amount requested.
        requested: Decimal,
        /// Total pending across all candidate obligations.
        available: Decimal,
    },

    /// Not enough stock across all lots of the product.
    #[error("Insufficient inventory for product {product_id}: requested {requested}, available {available}")]
    InsufficientInventory {
        /// Product being drawn.
        product_id: Uuid,
        /// Quantity requested.
        requested: Decimal,
        /// Total on hand across all lots of the product.
        available: Decimal,
    },

    /// The producer has no obligation with a pending balance.
    #[error("Producer {producer_id} has no pending obligations")]
    NoPendingObligations {
        /// Producer the operation targeted.
        producer_id: Uuid,
    },

    /// No deposit of the product has remaining quantity.
    #[error("Producer {producer_id} has no pending deposits of product {product_id}")]
    NoPendingDeposits {
        /// Producer.
        producer_id: Uuid,
        /// Product.
        product_id: Uuid,
    },

    /// No sale commitment of the product has remaining quantity.
    #[error("Buyer {buyer_id} has no pending commitments of product {product_id}")]
    NoPendingCommitments {
        /// Buyer.
        buyer_id: Uuid,
        /// Product.
        product_id: Uuid,
    },

    // ========== Contract Errors ==========
    /// Delivery exceeds the contract's outstanding quantity.
    #[error("Delivery of {requested} exceeds contract {contract_id} balance of {remaining}")]
    ExceedsContractBalance {
        /// Contract.
        contract_id: Uuid,
        /// Quantity delivered.
        requested: Decimal,
        /// Quantity still outstanding.
        remaining: Decimal,
    },

    /// Contract has been voided; no delivery is accepted.
    #[error("Contract {0} is voided")]
    ContractVoided(Uuid),

    // ========== Reversal Errors ==========
    /// Later postings depend on the document being voided.
    #[error("{reference} has dependent movements: {}", format_references(.dependents))]
    HasDependentMovements {
        /// Document the void was requested for.
        reference: Reference,
        /// Documents that must be voided first.
        dependents: Vec<Reference>,
    },

    // ========== Infrastructure Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_references(references: &[Reference]) -> String {
    references
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl EngineError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "InvalidAmount",
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::EntityNotFound { .. } => "EntityNotFound",
            Self::InsufficientBalance { .. } => "InsufficientBalance",
            Self::InsufficientInventory { .. } => "InsufficientInventory",
            Self::NoPendingObligations { .. } => "NoPendingObligations",
            Self::NoPendingDeposits { .. } => "NoPendingDeposits",
            Self::NoPendingCommitments { .. } => "NoPendingCommitments",
            Self::ExceedsContractBalance { .. } => "ExceedsContractBalance",
            Self::ContractVoided(_) => "ContractVoided",
            Self::HasDependentMovements { .. } => "HasDependentMovements",
            Self::Database(_) | Self::Internal(_) => "InternalError",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - malformed input
            Self::InvalidAmount(_) | Self::InvalidRequest(_) => 400,

            // 404 Not Found
            Self::EntityNotFound { .. } => 404,

            // 409 Conflict - history blocks the void
            Self::HasDependentMovements { .. } => 409,

            // 422 Unprocessable - balances do not allow the operation
            Self::InsufficientBalance { .. }
            | Self::InsufficientInventory { .. }
            | Self::NoPendingObligations { .. }
            | Self::NoPendingDeposits { .. }
            | Self::NoPendingCommitments { .. }
            | Self::ExceedsContractBalance { .. }
            | Self::ContractVoided(_) => 422,

            // 500 Internal Server Error
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true for business rejections (as opposed to storage failures).
    #[must_use]
    pub fn is_business_rule(&self) -> bool {
        !matches!(self, Self::Database(_) | Self::Internal(_))
    }

    /// Structured detail for the API `detail` field.
    #[must_use]
    pub fn detail(&self) -> Value {
        match self {
            Self::InvalidAmount(reason) | Self::InvalidRequest(reason) => {
                json!({ "reason": reason })
            }
            Self::EntityNotFound { entity, id } => json!({ "entity": entity, "id": id }),
            Self::InsufficientBalance {
                requested,
                available,
            } => json!({
                "requested": money::format(*requested),
                "available": money::format(*available),
            }),
            Self::InsufficientInventory {
                product_id,
                requested,
                available,
            } => json!({
                "productId": product_id,
                "requested": money::format(*requested),
                "available": money::format(*available),
            }),
            Self::NoPendingObligations { producer_id } => json!({ "producerId": producer_id }),
            Self::NoPendingDeposits {
                producer_id,
                product_id,
            } => json!({ "producerId": producer_id, "productId": product_id }),
            Self::NoPendingCommitments {
                buyer_id,
                product_id,
            } => json!({ "buyerId": buyer_id, "productId": product_id }),
            Self::ExceedsContractBalance {
                contract_id,
                requested,
                remaining,
            } => json!({
                "contractId": contract_id,
                "requested": money::format(*requested),
                "remaining": money::format(*remaining),
            }),
            Self::ContractVoided(id) => json!({ "contractId": id }),
            Self::HasDependentMovements {
                reference,
                dependents,
            } => json!({
                "reference": reference.to_string(),
                "dependents": dependents.iter().map(ToString::to_string).collect::<Vec<_>>(),
            }),
            Self::Database(_) | Self::Internal(_) => Value::Null,
        }
    }
}

impl From<FixedParseError> for EngineError {
    fn from(err: FixedParseError) -> Self {
        Self::InvalidAmount(err.to_string())
    }
}

/// Rejects zero and negative amounts.
pub fn ensure_positive(field: &str, value: Decimal) -> Result<Decimal, EngineError> {
    let value = money::round2(value);
    if value <= Decimal::ZERO {
        return Err(EngineError::InvalidAmount(format!(
            "{field} must be positive, got {}",
            money::format(value)
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceKind;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes_use_taxonomy_names() {
        assert_eq!(
            EngineError::InsufficientBalance {
                requested: dec!(10),
                available: dec!(5),
            }
            .error_code(),
            "InsufficientBalance"
        );
        assert_eq!(
            EngineError::HasDependentMovements {
                reference: Reference::new(ReferenceKind::Purchase, Uuid::nil()),
                dependents: vec![],
            }
            .error_code(),
            "HasDependentMovements"
        );
        assert_eq!(EngineError::Database("x".into()).error_code(), "InternalError");
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(EngineError::InvalidAmount(String::new()).http_status_code(), 400);
        assert_eq!(
            EngineError::EntityNotFound {
                entity: "Contract",
                id: Uuid::nil(),
            }
            .http_status_code(),
            404
        );
        assert_eq!(EngineError::ContractVoided(Uuid::nil()).http_status_code(), 422);
        assert_eq!(EngineError::Internal(String::new()).http_status_code(), 500);
        assert!(!EngineError::Internal(String::new()).is_business_rule());
        assert!(EngineError::ContractVoided(Uuid::nil()).is_business_rule());
    }

    #[test]
    fn test_detail_carries_amounts_as_fixed_strings() {
        let detail = EngineError::InsufficientBalance {
            requested: dec!(1200),
            available: dec!(999.5),
        }
        .detail();
        assert_eq!(detail["requested"], "1200.00");
        assert_eq!(detail["available"], "999.50");
    }

    #[test]
    fn test_dependent_movements_display_and_detail() {
        let blocked = Reference::new(ReferenceKind::Deposit, Uuid::nil());
        let dependent = Reference::new(ReferenceKind::DepositLiquidation, Uuid::nil());
        let err = EngineError::HasDependentMovements {
            reference: blocked,
            dependents: vec![dependent],
        };
        assert_eq!(
            err.to_string(),
            format!("{blocked} has dependent movements: {dependent}")
        );
        assert_eq!(err.detail()["dependents"][0], dependent.to_string());
    }

    #[test]
    fn test_ensure_positive() {
        assert_eq!(ensure_positive("amount", dec!(1.005)).unwrap(), dec!(1.01));
        assert!(matches!(
            ensure_positive("amount", dec!(0.001)),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(ensure_positive("amount", dec!(-5)).is_err());
    }
}
