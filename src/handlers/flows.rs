//! Flow handlers
//!
//! Exposes each flow as `POST /api/flows/{name}`

use crate::handlers::AppState;
use crate::middleware::CallerKey;
use crate::services::flows::{Flow, FlowError, FlowResponse, FLOW_NAMES};
use crate::utils::error::{AppError, AppResult};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{StatusCode, Uri},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// List available flows
///
/// GET /api/flows
pub async fn list_flows() -> Json<Value> {
    Json(json!({ "flows": FLOW_NAMES }))
}

/// Run flow `F` for one request
///
/// POST /api/flows/{name}
pub async fn handle_flow<F: Flow>(
    State(state): State<Arc<AppState>>,
    CallerKey(caller_key): CallerKey,
    body: Result<Json<F::Input>, JsonRejection>,
) -> AppResult<Json<FlowResponse<F::Output>>> {
    let Json(input) = body.map_err(|rejection| {
        warn!("Flow {} received an unreadable body: {}", F::NAME, rejection);
        if exceeds_body_limit(&rejection) {
            AppError::PayloadTooLarge(state.settings.request.max_request_size)
        } else {
            FlowError::Validation(rejection.body_text()).into()
        }
    })?;

    debug!(
        "Flow {} requested ({} key)",
        F::NAME,
        if caller_key.is_some() { "caller" } else { "pooled" }
    );

    let output = state.runner.run(&F::default(), input, caller_key).await?;
    Ok(Json(FlowResponse::ok(output)))
}

/// Fallback for paths without a route
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

fn exceeds_body_limit(rejection: &JsonRejection) -> bool {
    matches!(rejection, JsonRejection::BytesRejection(_))
        && (rejection.status() == StatusCode::PAYLOAD_TOO_LARGE
            || rejection.body_text().contains("length limit exceeded"))
}
