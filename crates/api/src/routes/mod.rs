//! API route definitions.

use axum::{Json, Router, extract::rejection::JsonRejection};
use beneficio_core::settlement::SettlementLine;
use beneficio_shared::money;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::{AppState, error::ApiResult};

pub mod contracts;
pub mod deposits;
pub mod health;
pub mod inventory;
pub mod obligations;
pub mod sales;
pub mod voids;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(obligations::routes())
        .merge(inventory::routes())
        .merge(deposits::routes())
        .merge(sales::routes())
        .merge(contracts::routes())
        .merge(voids::routes())
}

/// Unwraps a JSON body, turning decode failures into validation errors.
pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    let Json(value) = payload?;
    Ok(value)
}

/// Parses a decimal string; range checks are left to the ledger.
pub(crate) fn decimal(input: &str) -> ApiResult<Decimal> {
    Ok(money::parse(input)?)
}

/// One document settled by a liquidation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementLineResponse {
    /// Deposit or commitment settled.
    pub document_id: Uuid,
    /// Quantity taken from the document.
    pub quantity: String,
    /// Price applied.
    pub unit_price: String,
    /// Quantity times price.
    pub amount: String,
    /// Quantity still pending on the document.
    pub remaining_after: String,
    /// Document status after the line.
    pub status_after: &'static str,
}

impl From<&SettlementLine> for SettlementLineResponse {
    fn from(line: &SettlementLine) -> Self {
        Self {
            document_id: line.document_id,
            quantity: money::format(line.quantity),
            unit_price: money::format(line.unit_price),
            amount: money::format(line.amount),
            remaining_after: money::format(line.remaining_after),
            status_after: line.status_after.as_str(),
        }
    }
}
