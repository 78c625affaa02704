//! Loan and cash-advance routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use beneficio_core::obligation::{LedgerOperation, ObligationKind};
use beneficio_db::repositories::{
    ApplyOperationInput, ObligationSummary, OpenObligationInput, PostedMovement,
};
use beneficio_shared::money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{body, decimal};
use crate::{AppState, error::ApiResult};

/// Creates the obligation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/obligations", post(open_obligation))
        .route("/obligations/operations", post(apply_operation))
        .route("/obligations/{obligation_id}", get(get_obligation))
        .route("/producers/{producer_id}/obligations", get(list_obligations))
}

/// Request body for opening an obligation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenObligationRequest {
    /// Producer receiving the money.
    pub producer_id: Uuid,
    /// `loan` (default) or `cash_advance`.
    pub kind: Option<String>,
    /// Principal as a decimal string.
    pub principal: String,
    /// Opening timestamp; defaults to now.
    pub timestamp: Option<DateTime<Utc>>,
    /// Free-form note.
    pub note: Option<String>,
}

/// Request body for a payment or interest charge.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOperationRequest {
    /// Producer whose obligations are affected.
    pub subject_id: Uuid,
    /// `PAYMENT_PRINCIPAL`, `PAYMENT_INTEREST` or `CHARGE_INTEREST`.
    pub kind: String,
    /// `loan` (default) or `cash_advance`.
    pub obligation_type: Option<String>,
    /// Restricts the operation to one obligation.
    pub obligation_id: Option<Uuid>,
    /// Amount as a decimal string.
    pub amount: String,
    /// Movement timestamp; defaults to now.
    pub timestamp: Option<DateTime<Utc>>,
    /// Free-form note.
    pub note: Option<String>,
}

/// Query parameters for listing a producer's obligations.
#[derive(Debug, Deserialize)]
pub struct ListObligationsQuery {
    /// Filter by `loan` or `cash_advance`.
    pub kind: Option<String>,
}

/// One obligation with its derived balance.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObligationResponse {
    /// Obligation ID.
    pub id: Uuid,
    /// Producer.
    pub producer_id: Uuid,
    /// `loan` or `cash_advance`.
    pub kind: &'static str,
    /// Principal lent.
    pub principal: String,
    /// Principal still owed.
    pub principal_pending: String,
    /// Interest still owed.
    pub interest_pending: String,
    /// Derived status.
    pub status: &'static str,
    /// Opening timestamp.
    pub opened_at: DateTime<Utc>,
}

impl From<&ObligationSummary> for ObligationResponse {
    fn from(summary: &ObligationSummary) -> Self {
        let obligation = &summary.obligation;
        Self {
            id: obligation.id,
            producer_id: obligation.producer_id,
            kind: obligation.kind.as_str(),
            principal: money::format(obligation.principal),
            principal_pending: money::format(summary.balance.principal_pending),
            interest_pending: money::format(summary.balance.interest_pending),
            status: summary.status.as_str(),
            opened_at: obligation.opened_at,
        }
    }
}

/// One movement written by an operation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingResponse {
    /// Movement ID, voidable as `ObligationMovement`.
    pub movement_id: Uuid,
    /// Obligation the movement belongs to.
    pub obligation_id: Uuid,
    /// Movement kind.
    pub kind: &'static str,
    /// Amount applied.
    pub amount: String,
    /// Obligation status after the movement.
    pub status_after: &'static str,
}

impl From<&PostedMovement> for PostingResponse {
    fn from(posted: &PostedMovement) -> Self {
        Self {
            movement_id: posted.movement_id,
            obligation_id: posted.posting.obligation_id,
            kind: posted.posting.kind.code(),
            amount: money::format(posted.posting.amount),
            status_after: posted.posting.status_after.as_str(),
        }
    }
}

/// Response for a payment or charge.
#[derive(Debug, Serialize)]
pub struct ApplyOperationResponse {
    /// Always `true`; failures use the error body.
    pub ok: bool,
    /// Movements written, oldest obligation first.
    pub postings: Vec<PostingResponse>,
}

fn obligation_kind(input: Option<&str>) -> ApiResult<ObligationKind> {
    Ok(input
        .map(str::parse::<ObligationKind>)
        .transpose()?
        .unwrap_or(ObligationKind::Loan))
}

/// POST `/obligations` - Open a loan or cash advance.
async fn open_obligation(
    State(state): State<AppState>,
    payload: Result<Json<OpenObligationRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ObligationResponse>)> {
    let request = body(payload)?;
    let obligation = state
        .obligations()
        .open(OpenObligationInput {
            producer_id: request.producer_id,
            kind: obligation_kind(request.kind.as_deref())?,
            principal: decimal(&request.principal)?,
            at: request.timestamp,
            note: request.note,
        })
        .await?;

    let summary = state.obligations().summary(obligation.id).await?;
    Ok((StatusCode::CREATED, Json(ObligationResponse::from(&summary))))
}

/// POST `/obligations/operations` - Apply a payment or interest charge.
async fn apply_operation(
    State(state): State<AppState>,
    payload: Result<Json<ApplyOperationRequest>, JsonRejection>,
) -> ApiResult<Json<ApplyOperationResponse>> {
    let request = body(payload)?;
    let operation: LedgerOperation = request.kind.parse()?;
    let posted = state
        .obligations()
        .apply(ApplyOperationInput {
            producer_id: request.subject_id,
            kind: obligation_kind(request.obligation_type.as_deref())?,
            operation,
            amount: decimal(&request.amount)?,
            obligation_id: request.obligation_id,
            at: request.timestamp,
            note: request.note,
        })
        .await?;

    Ok(Json(ApplyOperationResponse {
        ok: true,
        postings: posted.iter().map(PostingResponse::from).collect(),
    }))
}

/// GET `/obligations/{obligation_id}` - Derived balance of one obligation.
async fn get_obligation(
    State(state): State<AppState>,
    Path(obligation_id): Path<Uuid>,
) -> ApiResult<Json<ObligationResponse>> {
    let summary = state.obligations().summary(obligation_id).await?;
    Ok(Json(ObligationResponse::from(&summary)))
}

/// GET `/producers/{producer_id}/obligations` - A producer's obligations.
async fn list_obligations(
    State(state): State<AppState>,
    Path(producer_id): Path<Uuid>,
    Query(query): Query<ListObligationsQuery>,
) -> ApiResult<Json<Vec<ObligationResponse>>> {
    let kind = query
        .kind
        .as_deref()
        .map(str::parse::<ObligationKind>)
        .transpose()?;
    let summaries = state.obligations().list_for_producer(producer_id, kind).await?;
    Ok(Json(summaries.iter().map(ObligationResponse::from).collect()))
}
