//! Edit operation endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use lto_common::range_edit::EditOp;

use crate::error::{ApiError, ApiResult};
use crate::session::SessionView;
use crate::AppState;

/// PUT /api/edit
///
/// Sets the edit operation and recomputes every final name and preview.
/// Parameters below the form minimums are rejected; ranges that do not fit a
/// given filename are reported per file in the returned view. Malformed bodies
/// (unknown operation, negative numbers) get the same 400 error envelope.
pub async fn update_edit(
    State(state): State<AppState>,
    payload: Result<Json<EditOp>, JsonRejection>,
) -> ApiResult<Json<SessionView>> {
    let Json(op) = payload?;
    op.validate()?;

    let mut guard = state.session.write().await;
    let session = guard
        .as_mut()
        .ok_or_else(|| ApiError::NotFound("No upload session".to_string()))?;

    session.set_edit(op);

    Ok(Json(session.view(&state.config.archive_name)))
}
