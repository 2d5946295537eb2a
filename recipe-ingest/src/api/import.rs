//! Import endpoints
//!
//! - `POST /webhook` - run the full import for a database automation event
//! - `POST /extract` - run only the extraction cascade for a URL

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::api::webhook::validate_url;
use crate::error::{ApiError, ApiResult};
use crate::types::ExtractionResult;
use crate::AppState;

/// POST /webhook
///
/// The body is parsed here rather than by `Json` so malformed JSON gets the
/// same `{ "error": ... }` 400 response as any other invalid event.
pub async fn webhook(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            let message = format!("Request body is not valid JSON: {}", e);
            warn!(error = %e, "Rejected webhook body");
            state.record_error(&message).await;
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response();
        }
    };

    let response = state.importer.handle_event(&payload).await;
    if let Some(error) = response.error() {
        state.record_error(error).await;
    }

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body)).into_response()
}

/// Extraction request
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub url: String,
}

/// POST /extract
pub async fn extract(
    State(state): State<AppState>,
    request: Result<Json<ExtractRequest>, JsonRejection>,
) -> ApiResult<Json<ExtractionResult>> {
    let Json(request) = request.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let url = validate_url(&request.url).map_err(ApiError::from)?;
    let result = state.importer.orchestrator().extract(&url).await;
    Ok(Json(result))
}

/// Build import routes
pub fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/extract", post(extract))
}
