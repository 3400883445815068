//! lto-tr library - Track Reorder module
//!
//! Upload a batch of `..._key<Key>_<BPM>bpm.wav` files, get them back ordered
//! by tempo and pitch class, renamed with an order index, optionally edited,
//! and packed into one zip.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use lto_common::config::ServiceConfig;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod archive;
pub mod error;
pub mod session;

pub use crate::error::{ApiError, ApiResult};

use crate::archive::{ArchiveWriter, ZipArchiveWriter};
use crate::session::Session;

/// Application state shared across HTTP handlers
///
/// One service instance drives one session. Each upload or edit change takes
/// the write lock and replaces or recomputes the session in full.
#[derive(Clone)]
pub struct AppState {
    /// Current upload session, `None` until the first upload
    pub session: Arc<RwLock<Option<Session>>>,
    /// Resolved service configuration
    pub config: Arc<ServiceConfig>,
    /// Archive writer used by the download endpoint
    pub archive_writer: Arc<dyn ArchiveWriter>,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Create new application state with the zip archive writer
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_writer(config, Arc::new(ZipArchiveWriter::default()))
    }

    pub fn with_writer(config: ServiceConfig, archive_writer: Arc<dyn ArchiveWriter>) -> Self {
        Self {
            session: Arc::new(RwLock::new(None)),
            config: Arc::new(config),
            archive_writer,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .merge(api::ui_routes())
        .merge(api::session_routes())
        .merge(api::health_routes())
        .route("/api/buildinfo", get(api::get_build_info))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
