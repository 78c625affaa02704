//! Deposit routes.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use beneficio_core::deposit::Deposit;
use beneficio_db::repositories::{LiquidateDepositsInput, RecordDepositInput};
use beneficio_shared::money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{SettlementLineResponse, body, decimal};
use crate::{AppState, error::ApiResult};

/// Creates the deposit routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/deposits", post(record_deposit))
        .route("/deposits/liquidations", post(liquidate_deposits))
        .route("/deposits/{deposit_id}", get(get_deposit))
}

/// Request body for a deposit.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDepositRequest {
    /// Depositing producer.
    pub producer_id: Uuid,
    /// Product deposited.
    pub product_id: Uuid,
    /// Quantity as a decimal string.
    pub quantity: String,
    /// Deposit timestamp; defaults to now.
    pub timestamp: Option<DateTime<Utc>>,
    /// Free-form note.
    pub note: Option<String>,
}

/// Response for a deposit.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositReceiptResponse {
    /// Deposit ID.
    pub deposit_id: Uuid,
    /// Lot holding the deposited stock.
    pub lot_id: Uuid,
}

/// Request body for a deposit liquidation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidateDepositsRequest {
    /// Producer whose deposits are bought.
    pub producer_id: Uuid,
    /// Product bought.
    pub product_id: Uuid,
    /// Quantity requested, as a decimal string.
    pub quantity: String,
    /// Price per unit, as a decimal string.
    pub unit_price: String,
    /// Header description.
    pub description: Option<String>,
    /// Liquidation timestamp; defaults to now.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Response for a deposit liquidation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositLiquidationResponse {
    /// Liquidation ID.
    pub liquidation_id: Uuid,
    /// Quantity settled; may be less than requested.
    pub applied_quantity: String,
    /// Sum of line amounts.
    pub applied_amount: String,
    /// Deposits settled, oldest first.
    pub lines: Vec<SettlementLineResponse>,
}

/// A deposit with its current status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositResponse {
    /// Deposit ID.
    pub id: Uuid,
    /// Depositing producer.
    pub producer_id: Uuid,
    /// Product deposited.
    pub product_id: Uuid,
    /// Quantity deposited.
    pub quantity: String,
    /// Current status.
    pub status: &'static str,
    /// Deposit timestamp.
    pub deposited_at: DateTime<Utc>,
}

impl From<Deposit> for DepositResponse {
    fn from(deposit: Deposit) -> Self {
        Self {
            id: deposit.id,
            producer_id: deposit.producer_id,
            product_id: deposit.product_id,
            quantity: money::format(deposit.quantity),
            status: deposit.status.as_str(),
            deposited_at: deposit.deposited_at,
        }
    }
}

/// POST `/deposits` - Record a producer deposit.
async fn record_deposit(
    State(state): State<AppState>,
    payload: Result<Json<RecordDepositRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DepositReceiptResponse>)> {
    let request = body(payload)?;
    let receipt = state
        .deposits()
        .record(RecordDepositInput {
            producer_id: request.producer_id,
            product_id: request.product_id,
            quantity: decimal(&request.quantity)?,
            at: request.timestamp,
            note: request.note,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DepositReceiptResponse {
            deposit_id: receipt.deposit_id,
            lot_id: receipt.lot_id,
        }),
    ))
}

/// POST `/deposits/liquidations` - Buy pending deposits, oldest first.
async fn liquidate_deposits(
    State(state): State<AppState>,
    payload: Result<Json<LiquidateDepositsRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DepositLiquidationResponse>)> {
    let request = body(payload)?;
    let receipt = state
        .deposits()
        .liquidate(LiquidateDepositsInput {
            producer_id: request.producer_id,
            product_id: request.product_id,
            quantity: decimal(&request.quantity)?,
            unit_price: decimal(&request.unit_price)?,
            description: request.description,
            at: request.timestamp,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DepositLiquidationResponse {
            liquidation_id: receipt.liquidation_id,
            applied_quantity: money::format(receipt.applied_quantity),
            applied_amount: money::format(receipt.applied_amount),
            lines: receipt.lines.iter().map(SettlementLineResponse::from).collect(),
        }),
    ))
}

/// GET `/deposits/{deposit_id}` - One deposit.
async fn get_deposit(
    State(state): State<AppState>,
    Path(deposit_id): Path<Uuid>,
) -> ApiResult<Json<DepositResponse>> {
    let deposit = state.deposits().find(deposit_id).await?;
    Ok(Json(deposit.into()))
}
