//! Void route.

use axum::{Json, Router, extract::State, extract::rejection::JsonRejection, routing::post};
use beneficio_core::{Reference, VoidOutcome};
use serde::{Deserialize, Serialize};

use super::body;
use crate::{AppState, error::ApiResult};

/// Creates the void routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/voids", post(void_reference))
}

/// Request body for a void.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoidRequest {
    /// Reference kind, e.g. `DepositLiquidation`.
    pub reference_type: String,
    /// Id of the referenced posting.
    pub reference_id: String,
}

/// Response for a void.
#[derive(Debug, Serialize)]
pub struct VoidResponse {
    /// Always `true`; failures use the error body.
    pub ok: bool,
    /// `voided`, or `already_voided` when repeated.
    pub outcome: VoidOutcome,
}

/// POST `/voids` - Void a posting and everything it wrote.
async fn void_reference(
    State(state): State<AppState>,
    payload: Result<Json<VoidRequest>, JsonRejection>,
) -> ApiResult<Json<VoidResponse>> {
    let request = body(payload)?;
    let reference = Reference::parse_parts(&request.reference_type, &request.reference_id)?;
    let outcome = state.reversals().void(reference).await?;
    Ok(Json(VoidResponse { ok: true, outcome }))
}
