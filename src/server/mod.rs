//! HTTP upload service.
//!
//! | Route | Behaviour |
//! |-------|-----------|
//! | `GET /` | `<web_dir>/index.html` |
//! | `POST /api/convert` | multipart upload, one conversion, JSON with a download link |
//! | `GET /downloads/<file>` | static files from the download directory |
//!
//! Uploads are stored under a unique name in the upload directory and removed
//! once the request finishes. Converted TIFFs accumulate in the download
//! directory.

pub mod error;
pub mod handlers;

use crate::config::ConversionConfig;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::ApiError;
pub use handlers::ConvertResponse;

/// Default request body limit: 64 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Shared state handed to every handler.
#[derive(Debug)]
pub struct AppState {
    /// Transient home of uploaded PDFs.
    pub upload_dir: PathBuf,
    /// Where converted TIFFs are written and served from.
    pub download_dir: PathBuf,
    /// Holds `index.html`.
    pub web_dir: PathBuf,
    pub config: ConversionConfig,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        upload_dir: impl Into<PathBuf>,
        download_dir: impl Into<PathBuf>,
        web_dir: impl Into<PathBuf>,
        config: ConversionConfig,
    ) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            download_dir: download_dir.into(),
            web_dir: web_dir.into(),
            config,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Create the upload and download directories if they are missing.
    pub fn prepare_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.upload_dir)?;
        std::fs::create_dir_all(&self.download_dir)?;
        info!(
            "Uploads in {}, downloads in {}",
            self.upload_dir.display(),
            self.download_dir.display()
        );
        Ok(())
    }
}

/// Build the router.
pub fn router(state: Arc<AppState>) -> Router {
    let downloads = ServeDir::new(&state.download_dir);
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::index))
        .route("/api/convert", post(handlers::convert_upload))
        .nest_service("/downloads", downloads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
