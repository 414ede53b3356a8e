//! HTTP handlers for the upload API.

use axum::{
    extract::{Multipart, State},
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::ApiError;
use super::AppState;
use crate::config::{Compression, ConversionRequest};
use crate::convert::convert;
use crate::pipeline::input::has_pdf_extension;

/// Compression used when the form omits the field.
pub const DEFAULT_COMPRESSION_CHOICE: &str = "LZW";

/// Body of a successful `POST /api/convert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertResponse {
    pub success: bool,
    pub message: String,
    pub download_url: String,
}

/// `GET /`: the upload page.
pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let page = state.web_dir.join("index.html");
    match tokio::fs::read_to_string(&page).await {
        Ok(body) => Ok(Html(body)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::MissingStaticAsset("index.html".into()))
        }
        Err(e) => Err(ApiError::Internal(format!("{}: {}", page.display(), e))),
    }
}

/// `POST /api/convert`: multipart `file` plus optional `compression`.
pub async fn convert_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ConvertResponse>, ApiError> {
    let mut upload: Option<UploadGuard> = None;
    let mut compression = DEFAULT_COMPRESSION_CHOICE.to_string();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                if upload.is_some() {
                    return Err(ApiError::InvalidRequest("only one file per request".into()));
                }
                let file_name = field.file_name().unwrap_or_default().to_string();
                if !has_pdf_extension(&file_name) {
                    return Err(ApiError::InvalidUploadType);
                }

                let path = state.upload_dir.join(unique_upload_name(&file_name));
                let guard = UploadGuard::new(path);
                let mut out = tokio::fs::File::create(guard.path())
                    .await
                    .map_err(|e| ApiError::Internal(format!("cannot store upload: {}", e)))?;
                while let Some(chunk) = field.chunk().await? {
                    out.write_all(&chunk)
                        .await
                        .map_err(|e| ApiError::Internal(format!("cannot store upload: {}", e)))?;
                }
                out.flush()
                    .await
                    .map_err(|e| ApiError::Internal(format!("cannot store upload: {}", e)))?;
                debug!("Stored upload '{}' as {}", file_name, guard.path().display());
                upload = Some(guard);
            }
            Some("compression") => {
                compression = field.text().await?;
            }
            _ => {}
        }
    }

    let upload = upload.ok_or(ApiError::MissingField("file"))?;

    let request = ConversionRequest::new(
        upload.path(),
        &state.download_dir,
        Compression::from_choice(&compression),
    );
    let output = convert(&request, &state.config)
        .await
        .map_err(|e| ApiError::ConversionFailed(e.to_string()))?;

    let download_url = format!("downloads/{}", output.output_file_name());
    info!("Upload converted: {}", download_url);

    Ok(Json(ConvertResponse {
        success: true,
        message: "File converted successfully!".into(),
        download_url,
    }))
}

/// `<stem>_<uuid hex>.pdf`, with any client-side directories stripped.
fn unique_upload_name(client_name: &str) -> String {
    let base = client_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(client_name);
    let stem = Path::new(base)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty() && s != "..")
        .unwrap_or_else(|| "upload".into());
    format!("{}_{}.pdf", stem, Uuid::new_v4().simple())
}

/// Deletes the stored upload when the request finishes, whatever the outcome.
struct UploadGuard {
    path: PathBuf,
}

impl UploadGuard {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed upload {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove upload {}: {}", self.path.display(), e),
        }
    }
}
