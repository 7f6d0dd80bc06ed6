//! Claude chat relay route handler.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::instrument;

use crate::claude::ChatRelayRequest;
use crate::error::{AppError, Result};
use crate::state::AppState;

const MESSAGES_REQUIRED: &str = "messages array is required";

/// Relay a chat request to Claude.
///
/// POST /api/claude
///
/// The response body is Anthropic's, unchanged. Anthropic errors keep their
/// status code and carry the raw error body as `detail`.
#[instrument(skip_all)]
pub async fn relay(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRelayRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>> {
    let client = state
        .claude()
        .ok_or_else(|| AppError::ConfigurationMissing("Missing ANTHROPIC_API_KEY".to_string()))?;

    let Json(request) = payload.map_err(|e| {
        tracing::debug!(error = %e, "Rejected chat body");
        AppError::BadRequest(MESSAGES_REQUIRED.to_string())
    })?;
    if request.messages.is_empty() {
        return Err(AppError::BadRequest(MESSAGES_REQUIRED.to_string()));
    }

    Ok(Json(client.relay(request).await?))
}
