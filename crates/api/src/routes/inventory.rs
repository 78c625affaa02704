//! Purchase, transfer, adjustment and stock routes.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use beneficio_core::inventory::PlannedStockMovement;
use beneficio_db::repositories::{AdjustLotInput, RecordPurchaseInput, TransferInput};
use beneficio_shared::money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{body, decimal};
use crate::{AppState, error::ApiResult};

/// Creates the inventory routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/purchases", post(record_purchase))
        .route("/transfers", post(transfer))
        .route("/lots/{lot_id}/adjustments", post(adjust_lot))
        .route("/products/{product_id}/stock", get(stock_level))
}

/// Request body for a purchase.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPurchaseRequest {
    /// Seller.
    pub producer_id: Uuid,
    /// Product bought.
    pub product_id: Uuid,
    /// Quantity as a decimal string.
    pub quantity: String,
    /// Unit price as a decimal string.
    pub unit_price: String,
    /// Purchase timestamp; defaults to now.
    pub timestamp: Option<DateTime<Utc>>,
    /// Free-form note.
    pub note: Option<String>,
}

/// Response for a purchase.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    /// Purchase ID.
    pub purchase_id: Uuid,
    /// Lot opened.
    pub lot_id: Uuid,
    /// Quantity times price.
    pub amount: String,
}

/// Request body for a transfer between products.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Product drawn.
    pub from_product_id: Uuid,
    /// Product receiving the stock.
    pub to_product_id: Uuid,
    /// Quantity as a decimal string.
    pub quantity: String,
    /// Transfer timestamp; defaults to now.
    pub timestamp: Option<DateTime<Utc>>,
    /// Free-form note.
    pub note: Option<String>,
}

/// One lot touched by a draw.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawResponse {
    /// Lot drawn from.
    pub lot_id: Uuid,
    /// Signed quantity moved.
    pub quantity: String,
    /// Lot on-hand after the draw.
    pub on_hand_after: String,
}

impl From<&PlannedStockMovement> for DrawResponse {
    fn from(draw: &PlannedStockMovement) -> Self {
        Self {
            lot_id: draw.lot_id,
            quantity: money::format(draw.quantity),
            on_hand_after: money::format(draw.on_hand_after),
        }
    }
}

/// Response for a transfer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    /// Transfer ID.
    pub transfer_id: Uuid,
    /// Destination lot.
    pub lot_id: Uuid,
    /// Source lots drawn, oldest first.
    pub draws: Vec<DrawResponse>,
}

/// Request body for a lot adjustment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustLotRequest {
    /// Signed change as a decimal string.
    pub delta: String,
    /// Reason for the correction.
    pub note: Option<String>,
    /// Adjustment timestamp; defaults to now.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Response for an adjustment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentResponse {
    /// Id to void the adjustment with.
    pub adjustment_id: Uuid,
    /// Lot on-hand after the correction.
    pub on_hand_after: String,
}

/// One lot of a product.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LotResponse {
    /// Lot ID.
    pub id: Uuid,
    /// Depositor or contract counterparty, if any.
    pub owner_id: Option<Uuid>,
    /// Current on-hand.
    pub on_hand: String,
    /// Opening timestamp.
    pub opened_at: DateTime<Utc>,
}

/// Stock of one product.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockResponse {
    /// Product.
    pub product_id: Uuid,
    /// Sum across lots.
    pub on_hand: String,
    /// Lots, oldest first.
    pub lots: Vec<LotResponse>,
}

/// POST `/purchases` - Record a purchase.
async fn record_purchase(
    State(state): State<AppState>,
    payload: Result<Json<RecordPurchaseRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PurchaseResponse>)> {
    let request = body(payload)?;
    let receipt = state
        .inventory()
        .record_purchase(RecordPurchaseInput {
            producer_id: request.producer_id,
            product_id: request.product_id,
            quantity: decimal(&request.quantity)?,
            unit_price: decimal(&request.unit_price)?,
            at: request.timestamp,
            note: request.note,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PurchaseResponse {
            purchase_id: receipt.purchase_id,
            lot_id: receipt.lot_id,
            amount: money::format(receipt.amount),
        }),
    ))
}

/// POST `/transfers` - Convert stock of one product into another.
async fn transfer(
    State(state): State<AppState>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TransferResponse>)> {
    let request = body(payload)?;
    let receipt = state
        .inventory()
        .transfer(TransferInput {
            from_product_id: request.from_product_id,
            to_product_id: request.to_product_id,
            quantity: decimal(&request.quantity)?,
            at: request.timestamp,
            note: request.note,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TransferResponse {
            transfer_id: receipt.transfer_id,
            lot_id: receipt.lot_id,
            draws: receipt.draws.iter().map(DrawResponse::from).collect(),
        }),
    ))
}

/// POST `/lots/{lot_id}/adjustments` - Correct a lot by a signed delta.
async fn adjust_lot(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
    payload: Result<Json<AdjustLotRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AdjustmentResponse>)> {
    let request = body(payload)?;
    let receipt = state
        .inventory()
        .adjust(AdjustLotInput {
            lot_id,
            delta: decimal(&request.delta)?,
            at: request.timestamp,
            note: request.note,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AdjustmentResponse {
            adjustment_id: receipt.adjustment_id,
            on_hand_after: money::format(receipt.on_hand_after),
        }),
    ))
}

/// GET `/products/{product_id}/stock` - Current stock of a product.
async fn stock_level(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<StockResponse>> {
    let level = state.inventory().stock_level(product_id).await?;
    Ok(Json(StockResponse {
        product_id: level.product_id,
        on_hand: money::format(level.on_hand),
        lots: level
            .lots
            .iter()
            .map(|lot| LotResponse {
                id: lot.id,
                owner_id: lot.owner_id,
                on_hand: money::format(lot.on_hand),
                opened_at: lot.opened_at,
            })
            .collect(),
    }))
}
