//! Session inspection and reset

use axum::{extract::State, http::StatusCode, Json};

use crate::error::{ApiError, ApiResult};
use crate::session::SessionView;
use crate::AppState;

/// GET /api/session
///
/// Current session snapshot; 404 before the first upload.
pub async fn get_session(State(state): State<AppState>) -> ApiResult<Json<SessionView>> {
    let guard = state.session.read().await;
    let session = guard
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("No upload session".to_string()))?;

    Ok(Json(session.view(&state.config.archive_name)))
}

/// DELETE /api/session
///
/// Drops the session and all uploaded bytes.
pub async fn clear_session(State(state): State<AppState>) -> StatusCode {
    if let Some(session) = state.session.write().await.take() {
        tracing::info!(session_id = %session.id(), "Session cleared");
    }
    StatusCode::NO_CONTENT
}
