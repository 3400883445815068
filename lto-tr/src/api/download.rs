//! Archive download endpoint

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /api/download
///
/// Returns the zip of final names and original bytes. Refused with 409 when
/// no archive is offered: no session, nothing sequenced, or a missing payload.
pub async fn download_archive(State(state): State<AppState>) -> ApiResult<Response> {
    let guard = state.session.read().await;
    let session = guard
        .as_ref()
        .ok_or_else(|| ApiError::Conflict("No upload session".to_string()))?;

    let entries = session.archive_entries()?;
    let bytes = state.archive_writer.write_archive(&entries)?;

    tracing::info!(
        session_id = %session.id(),
        members = entries.len(),
        archive = %state.config.archive_name,
        "Serving archive download"
    );

    let disposition = format!("attachment; filename=\"{}\"", state.config.archive_name);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
