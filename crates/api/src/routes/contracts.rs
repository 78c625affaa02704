//! Contract routes.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use beneficio_core::contract::ContractDirection;
use beneficio_db::repositories::{ContractSummary, CreateContractInput, DeliverInput};
use beneficio_shared::money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{body, decimal};
use crate::{AppState, error::ApiResult};

/// Creates the contract routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/contracts", post(create_contract))
        .route("/contracts/deliveries", post(deliver))
        .route("/contracts/{contract_id}", get(get_contract))
}

/// Request body for a contract.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContractRequest {
    /// `INCOMING` or `OUTGOING`.
    pub direction: String,
    /// Supplier or customer.
    pub counterparty_id: Uuid,
    /// Product contracted.
    pub product_id: Uuid,
    /// Contracted quantity as a decimal string.
    pub quantity: String,
    /// Contracted unit price as a decimal string.
    pub unit_price: String,
    /// Contract timestamp; defaults to now.
    pub timestamp: Option<DateTime<Utc>>,
    /// Free-form note.
    pub note: Option<String>,
}

/// Request body for a delivery.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverRequest {
    /// Contract delivered against.
    pub contract_id: Uuid,
    /// Quantity as a decimal string.
    pub quantity: String,
    /// Price applied to this delivery.
    pub price: String,
    /// Delivery timestamp; defaults to now.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Response for a delivery.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResponse {
    /// Delivery ID, voidable as `ContractDelivery`.
    pub delivery_id: Uuid,
    /// Quantity times price.
    pub amount: String,
    /// Quantity still to deliver.
    pub remaining_quantity: String,
    /// Contract status after the delivery.
    pub contract_status: &'static str,
}

/// A contract with its fulfillment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractResponse {
    /// Contract ID.
    pub id: Uuid,
    /// `INCOMING` or `OUTGOING`.
    pub direction: &'static str,
    /// Supplier or customer.
    pub counterparty_id: Uuid,
    /// Product contracted.
    pub product_id: Uuid,
    /// Contracted quantity.
    pub contracted_quantity: String,
    /// Contracted unit price.
    pub unit_price: String,
    /// Delivered so far, voided deliveries excluded.
    pub fulfilled_quantity: String,
    /// Quantity still to deliver.
    pub remaining_quantity: String,
    /// Live deliveries.
    pub deliveries: usize,
    /// Current status.
    pub status: &'static str,
}

impl From<ContractSummary> for ContractResponse {
    fn from(summary: ContractSummary) -> Self {
        let contract = summary.contract;
        Self {
            id: contract.id,
            direction: contract.direction.as_str(),
            counterparty_id: contract.counterparty_id,
            product_id: contract.product_id,
            contracted_quantity: money::format(contract.quantity),
            unit_price: money::format(contract.unit_price),
            fulfilled_quantity: money::format(summary.fulfilled),
            remaining_quantity: money::format(summary.remaining),
            deliveries: summary.deliveries,
            status: contract.status.as_str(),
        }
    }
}

/// POST `/contracts` - Create a supply or export contract.
async fn create_contract(
    State(state): State<AppState>,
    payload: Result<Json<CreateContractRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ContractResponse>)> {
    let request = body(payload)?;
    let direction: ContractDirection = request.direction.parse()?;
    let contract = state
        .contracts()
        .create(CreateContractInput {
            direction,
            counterparty_id: request.counterparty_id,
            product_id: request.product_id,
            quantity: decimal(&request.quantity)?,
            unit_price: decimal(&request.unit_price)?,
            at: request.timestamp,
            note: request.note,
        })
        .await?;

    let summary = state.contracts().summary(contract.id).await?;
    Ok((StatusCode::CREATED, Json(summary.into())))
}

/// POST `/contracts/deliveries` - Deliver against a contract.
async fn deliver(
    State(state): State<AppState>,
    payload: Result<Json<DeliverRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DeliveryResponse>)> {
    let request = body(payload)?;
    let receipt = state
        .contracts()
        .deliver(DeliverInput {
            contract_id: request.contract_id,
            quantity: decimal(&request.quantity)?,
            unit_price: decimal(&request.price)?,
            at: request.timestamp,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DeliveryResponse {
            delivery_id: receipt.delivery_id,
            amount: money::format(receipt.amount),
            remaining_quantity: money::format(receipt.remaining_quantity),
            contract_status: receipt.contract_status.as_str(),
        }),
    ))
}

/// GET `/contracts/{contract_id}` - One contract with its fulfillment.
async fn get_contract(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
) -> ApiResult<Json<ContractResponse>> {
    let summary = state.contracts().summary(contract_id).await?;
    Ok(Json(summary.into()))
}
