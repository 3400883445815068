//! HTTP API handlers for lto-tr

pub mod buildinfo;
pub mod download;
pub mod edit;
pub mod health;
pub mod session;
pub mod ui;
pub mod upload;

pub use buildinfo::get_build_info;
pub use download::download_archive;
pub use edit::update_edit;
pub use health::health_routes;
pub use session::{clear_session, get_session};
pub use ui::{serve_app_js, serve_index, ui_routes};
pub use upload::upload_files;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::AppState;

/// Session lifecycle routes: upload, inspect, edit, download, clear
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/upload", post(upload_files))
        .route("/api/session", get(get_session).delete(clear_session))
        .route("/api/edit", put(update_edit))
        .route("/api/download", get(download_archive))
}
