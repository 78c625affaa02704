//! Error type shared by the ledger repositories.

use beneficio_core::EngineError;
use sea_orm::DbErr;

/// Error returned by every ledger repository operation.
///
/// Business rejections come back as `Engine`; anything the database raised is
/// `Database`. Either way the surrounding transaction has been rolled back.
#[derive(Debug, thiserror::Error)]
pub enum LedgerStoreError {
    /// Rejected by the allocation engine.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl LedgerStoreError {
    /// The engine error, if this is a business rejection.
    #[must_use]
    pub const fn engine(&self) -> Option<&EngineError> {
        match self {
            Self::Engine(err) => Some(err),
            Self::Database(_) => None,
        }
    }

    /// Flattens into the engine taxonomy; storage failures become `Database`.
    #[must_use]
    pub fn into_engine(self) -> EngineError {
        match self {
            Self::Engine(err) => err,
            Self::Database(err) => EngineError::Database(err.to_string()),
        }
    }
}

/// Result alias for repository operations.
pub type StoreResult<T> = Result<T, LedgerStoreError>;

/// Logs a business rejection and wraps it.
pub(crate) fn rejected(operation: &'static str, err: EngineError) -> LedgerStoreError {
    tracing::warn!(
        operation,
        code = err.error_code(),
        detail = %err.detail(),
        "ledger operation rejected: {err}"
    );
    LedgerStoreError::Engine(err)
}

/// Shorthand for a missing row.
pub(crate) fn not_found(entity: &'static str, id: uuid::Uuid) -> LedgerStoreError {
    LedgerStoreError::Engine(EngineError::EntityNotFound { entity, id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_database_errors_flatten_to_internal_code() {
        let err = LedgerStoreError::from(DbErr::Custom("connection reset".to_string()));
        assert!(err.engine().is_none());
        let engine = err.into_engine();
        assert_eq!(engine.error_code(), "InternalError");
        assert_eq!(engine.http_status_code(), 500);
    }

    #[test]
    fn test_engine_errors_pass_through() {
        let id = Uuid::new_v4();
        let err = not_found("Deposit", id);
        assert_eq!(
            err.engine(),
            Some(&EngineError::EntityNotFound {
                entity: "Deposit",
                id
            })
        );
        assert_eq!(err.into_engine().error_code(), "EntityNotFound");
    }
}
