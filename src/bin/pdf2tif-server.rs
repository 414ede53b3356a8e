//! pdf2tif upload server.
//!
//! Serves the upload page, accepts PDFs on `POST /api/convert`, and hands
//! converted TIFFs back from `/downloads`.

use anyhow::{Context, Result};
use clap::Parser;
use pdf2tif::server::{router, AppState, DEFAULT_MAX_UPLOAD_BYTES};
use pdf2tif::{default_base_dir, resolve_engine_dir, ConversionConfig, EngineLocation};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// HTTP front-end for pdf2tif.
#[derive(Parser, Debug)]
#[command(name = "pdf2tif-server", version, about = "HTTP upload service for pdf2tif")]
struct Args {
    /// Address to bind.
    #[arg(long, env = "PDF2TIF_HOST", default_value = "127.0.0.1")]
    host: std::net::IpAddr,

    /// Port to listen on.
    #[arg(short, long, env = "PDF2TIF_PORT", default_value_t = 28888)]
    port: u16,

    /// Where uploads are kept while they convert.
    #[arg(long, env = "PDF2TIF_UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Where converted TIFFs are written and served from.
    #[arg(long, env = "PDF2TIF_DOWNLOAD_DIR", default_value = "downloads")]
    download_dir: PathBuf,

    /// Directory holding index.html.
    #[arg(long, env = "PDF2TIF_WEB_DIR", default_value = "web")]
    web_dir: PathBuf,

    /// PDFium directory. Skips config.ini lookup.
    #[arg(long, env = "PDF2TIF_ENGINE_DIR")]
    engine_dir: Option<PathBuf>,

    /// Directory holding config.ini and the bundled pdfium/ folder.
    #[arg(long, env = "PDF2TIF_BASE_DIR")]
    base_dir: Option<PathBuf>,

    /// Request body limit in MiB.
    #[arg(long, env = "PDF2TIF_MAX_UPLOAD_MB", default_value_t = DEFAULT_MAX_UPLOAD_BYTES / (1024 * 1024))]
    max_upload_mb: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("pdf2tif=info,pdf2tif_server=info,tower_http=info")
            }),
        )
        .init();

    let args = Args::parse();

    let engine = match args.engine_dir {
        Some(ref dir) => EngineLocation::explicit(dir),
        None => resolve_engine_dir(&args.base_dir.clone().unwrap_or_else(default_base_dir)),
    };
    // Conversions re-check on every request; a missing engine only warns here.
    match engine.ensure_exists() {
        Ok(()) => info!("PDFium at {} ({})", engine.dir().display(), engine.source()),
        Err(e) => warn!("{}", e),
    }

    let config = ConversionConfig::builder(engine)
        .build()
        .context("Invalid configuration")?;

    let state = AppState::new(&args.upload_dir, &args.download_dir, &args.web_dir, config)
        .with_max_upload_bytes(args.max_upload_mb.saturating_mul(1024 * 1024));
    state
        .prepare_dirs()
        .context("Failed to create upload/download directories")?;

    let app = router(Arc::new(state));

    let addr = SocketAddr::new(args.host, args.port);
    info!("Starting pdf2tif server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
