//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST routes for obligations, inventory, deposits, sales, contracts and voids
//! - Error responses carrying the ledger's error taxonomy
//!
//! Amounts and quantities cross the boundary as decimal strings.

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use beneficio_db::{
    ContractRepository, DepositRepository, InventoryRepository, ObligationRepository,
    ReversalRepository, SaleRepository,
};
use beneficio_shared::config::LedgerConfig;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Whether balance reads take row locks.
    pub row_locking: bool,
}

impl AppState {
    /// Builds the state from a pool and the ledger settings.
    #[must_use]
    pub fn new(db: DatabaseConnection, ledger: &LedgerConfig) -> Self {
        Self {
            db: Arc::new(db),
            row_locking: ledger.row_locking,
        }
    }

    fn conn(&self) -> DatabaseConnection {
        (*self.db).clone()
    }

    /// Obligation repository bound to this state.
    #[must_use]
    pub fn obligations(&self) -> ObligationRepository {
        ObligationRepository::new(self.conn()).with_row_locking(self.row_locking)
    }

    /// Inventory repository bound to this state.
    #[must_use]
    pub fn inventory(&self) -> InventoryRepository {
        InventoryRepository::new(self.conn()).with_row_locking(self.row_locking)
    }

    /// Deposit repository bound to this state.
    #[must_use]
    pub fn deposits(&self) -> DepositRepository {
        DepositRepository::new(self.conn()).with_row_locking(self.row_locking)
    }

    /// Sale repository bound to this state.
    #[must_use]
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.conn()).with_row_locking(self.row_locking)
    }

    /// Contract repository bound to this state.
    #[must_use]
    pub fn contracts(&self) -> ContractRepository {
        ContractRepository::new(self.conn()).with_row_locking(self.row_locking)
    }

    /// Reversal repository bound to this state.
    #[must_use]
    pub fn reversals(&self) -> ReversalRepository {
        ReversalRepository::new(self.conn()).with_row_locking(self.row_locking)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
