//! Sale commitment routes.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use beneficio_core::sale::SaleCommitment;
use beneficio_db::repositories::{CreateCommitmentInput, LiquidateSaleInput};
use beneficio_shared::money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::inventory::DrawResponse;
use super::{SettlementLineResponse, body, decimal};
use crate::{AppState, error::ApiResult};

/// Creates the sale routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales/commitments", post(create_commitment))
        .route("/sales/liquidations", post(liquidate_sale))
        .route("/sales/commitments/{commitment_id}", get(get_commitment))
}

/// Request body for a sale commitment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommitmentRequest {
    /// Buyer.
    pub buyer_id: Uuid,
    /// Product sold.
    pub product_id: Uuid,
    /// Quantity as a decimal string.
    pub quantity: String,
    /// Agreed unit price as a decimal string.
    pub unit_price: String,
    /// Commitment timestamp; defaults to now.
    pub timestamp: Option<DateTime<Utc>>,
    /// Free-form note.
    pub note: Option<String>,
}

/// Request body for a sale liquidation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidateSaleRequest {
    /// Buyer whose commitments are settled.
    pub buyer_id: Uuid,
    /// Product shipped.
    pub product_id: Uuid,
    /// Quantity requested, as a decimal string.
    pub quantity: String,
    /// Header description.
    pub description: Option<String>,
    /// Liquidation timestamp; defaults to now.
    pub timestamp: Option<DateTime<Utc>>,
}

/// A sale commitment with its current status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentResponse {
    /// Commitment ID.
    pub id: Uuid,
    /// Buyer.
    pub buyer_id: Uuid,
    /// Product sold.
    pub product_id: Uuid,
    /// Quantity committed.
    pub quantity: String,
    /// Agreed unit price.
    pub unit_price: String,
    /// Current status.
    pub status: &'static str,
    /// Commitment timestamp.
    pub committed_at: DateTime<Utc>,
}

impl From<SaleCommitment> for CommitmentResponse {
    fn from(commitment: SaleCommitment) -> Self {
        Self {
            id: commitment.id,
            buyer_id: commitment.buyer_id,
            product_id: commitment.product_id,
            quantity: money::format(commitment.quantity),
            unit_price: money::format(commitment.unit_price),
            status: commitment.status.as_str(),
            committed_at: commitment.committed_at,
        }
    }
}

/// Response for a sale liquidation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLiquidationResponse {
    /// Liquidation ID.
    pub liquidation_id: Uuid,
    /// Quantity shipped; may be less than requested.
    pub applied_quantity: String,
    /// Sum of line amounts.
    pub applied_amount: String,
    /// Commitments settled, oldest first.
    pub lines: Vec<SettlementLineResponse>,
    /// Lots drawn, oldest first.
    pub draws: Vec<DrawResponse>,
}

/// POST `/sales/commitments` - Commit stock to a buyer.
async fn create_commitment(
    State(state): State<AppState>,
    payload: Result<Json<CreateCommitmentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CommitmentResponse>)> {
    let request = body(payload)?;
    let commitment = state
        .sales()
        .create_commitment(CreateCommitmentInput {
            buyer_id: request.buyer_id,
            product_id: request.product_id,
            quantity: decimal(&request.quantity)?,
            unit_price: decimal(&request.unit_price)?,
            at: request.timestamp,
            note: request.note,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(commitment.into())))
}

/// POST `/sales/liquidations` - Ship against pending commitments.
async fn liquidate_sale(
    State(state): State<AppState>,
    payload: Result<Json<LiquidateSaleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SaleLiquidationResponse>)> {
    let request = body(payload)?;
    let receipt = state
        .sales()
        .liquidate(LiquidateSaleInput {
            buyer_id: request.buyer_id,
            product_id: request.product_id,
            quantity: decimal(&request.quantity)?,
            description: request.description,
            at: request.timestamp,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SaleLiquidationResponse {
            liquidation_id: receipt.liquidation_id,
            applied_quantity: money::format(receipt.applied_quantity),
            applied_amount: money::format(receipt.applied_amount),
            lines: receipt.lines.iter().map(SettlementLineResponse::from).collect(),
            draws: receipt.stock.iter().map(DrawResponse::from).collect(),
        }),
    ))
}

/// GET `/sales/commitments/{commitment_id}` - One commitment.
async fn get_commitment(
    State(state): State<AppState>,
    Path(commitment_id): Path<Uuid>,
) -> ApiResult<Json<CommitmentResponse>> {
    let commitment = state.sales().find_commitment(commitment_id).await?;
    Ok(Json(commitment.into()))
}
