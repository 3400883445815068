//! Upload endpoint
//!
//! POST /api/upload takes a multipart body with one part per file. Every
//! part carrying a filename is an upload; other parts are ignored. A
//! successful upload replaces the current session.

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::error::{ApiError, ApiResult};
use crate::session::{Session, SessionView, Upload};
use crate::AppState;

/// POST /api/upload
pub async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<SessionView>> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data = field.bytes().await?;
        tracing::debug!(file = %name, size_bytes = data.len(), "Received upload");
        uploads.push(Upload { name, data });
    }

    if uploads.is_empty() {
        return Err(ApiError::BadRequest("No files uploaded".to_string()));
    }

    let session = Session::from_uploads(uploads);
    let view = session.view(&state.config.archive_name);

    *state.session.write().await = Some(session);

    tracing::info!(
        session_id = %view.session_id,
        uploaded = view.uploads.len(),
        sequenced = view.sequenced.len(),
        "Upload session ready"
    );

    Ok(Json(view))
}
