//! The convert-one-document operation.
//!
//! [`convert_blocking`] runs the whole pipeline on the calling thread;
//! [`convert`] moves it onto tokio's blocking pool so async callers (the
//! batch worker, the HTTP handler) never stall a runtime worker on pdfium.
//!
//! Steps, in order:
//!
//! 1. the engine directory must exist, before anything touches the source
//! 2. the source must be a readable PDF
//! 3. the output path is chosen (overwrite policy applied)
//! 4. pages are rasterised, reduced to 1-bit, and encoded in memory
//! 5. the TIFF is written to a temp file in the output directory and renamed
//!    into place, so a failure never leaves a truncated `.tif` behind

use crate::config::{ConversionConfig, ConversionRequest, OverwritePolicy};
use crate::error::Pdf2TifError;
use crate::output::ConversionOutput;
use crate::pipeline::binarize::BilevelPage;
use crate::pipeline::encode::{self, EncodeError};
use crate::pipeline::input;
use crate::pipeline::render::{PdfiumRasterizer, Rasterizer};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Convert one PDF into one multi-page TIFF.
///
/// # Errors
/// Every failure is returned as a [`Pdf2TifError`]; nothing panics across
/// this boundary. In particular:
/// - [`Pdf2TifError::EngineNotFound`] before the source is even opened
/// - [`Pdf2TifError::NoPagesProduced`] when the engine yields no pages
///
/// In both cases no output file is created.
pub async fn convert(
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2TifError> {
    let request = request.clone();
    let config = config.clone();

    tokio::task::spawn_blocking(move || convert_blocking(&request, &config))
        .await
        .map_err(|e| Pdf2TifError::Internal(format!("Conversion task panicked: {}", e)))?
}

/// Blocking implementation of [`convert`].
pub fn convert_blocking(
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2TifError> {
    let start = Instant::now();
    let file = request.file_name();
    info!(
        "Converting {} ({}, {} dpi)",
        request.source().display(),
        request.compression(),
        request.dpi()
    );

    // ── Step 1: Engine ───────────────────────────────────────────────────
    config.engine.ensure_exists()?;

    // ── Step 2: Source ───────────────────────────────────────────────────
    input::validate_source(request.source())?;

    // ── Step 3: Output path ──────────────────────────────────────────────
    let output_dir = request.output_dir();
    std::fs::create_dir_all(output_dir).map_err(|e| Pdf2TifError::OutputWriteFailed {
        path: output_dir.to_path_buf(),
        source: e,
    })?;
    let output_path = choose_output_path(&request.default_output_path(), config.overwrite)?;

    // ── Step 4: Rasterise ────────────────────────────────────────────────
    let rendered = match config.rasterizer.as_deref() {
        Some(custom) => custom.rasterize(&config.engine, request.source(), request.dpi())?,
        None => PdfiumRasterizer.rasterize(&config.engine, request.source(), request.dpi())?,
    };
    if rendered.is_empty() {
        return Err(Pdf2TifError::NoPagesProduced { file });
    }
    debug!("Rasterised {} pages", rendered.len());

    // ── Step 5: 1-bit ────────────────────────────────────────────────────
    let pages: Vec<BilevelPage> = rendered
        .iter()
        .map(|gray| BilevelPage::from_gray(gray, config.binarization))
        .collect();
    drop(rendered);

    // ── Step 6: Encode ───────────────────────────────────────────────────
    let tiff = encode::encode_multipage(&pages, request.compression())
        .map_err(|e| encode_error(&file, e))?;

    // ── Step 7: Write ────────────────────────────────────────────────────
    write_atomic(&output_path, &tiff, config.overwrite)?;

    let output = ConversionOutput {
        source_path: request.source().to_path_buf(),
        output_path,
        page_count: pages.len(),
        compression: request.compression(),
        bytes_written: tiff.len() as u64,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Wrote {} ({} pages, {} bytes) in {}ms",
        output.output_path.display(),
        output.page_count,
        output.bytes_written,
        output.duration_ms
    );

    Ok(output)
}

/// Synchronous wrapper around [`convert`] for callers without a runtime.
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2TifError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2TifError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(request, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Apply `policy` to the natural output path.
fn choose_output_path(natural: &Path, policy: OverwritePolicy) -> Result<PathBuf, Pdf2TifError> {
    if !natural.exists() {
        return Ok(natural.to_path_buf());
    }

    match policy {
        OverwritePolicy::Overwrite => {
            debug!("Replacing existing {}", natural.display());
            Ok(natural.to_path_buf())
        }
        OverwritePolicy::Reject => Err(Pdf2TifError::OutputExists {
            path: natural.to_path_buf(),
        }),
        OverwritePolicy::Suffix => {
            let dir = natural.parent().unwrap_or_else(|| Path::new("."));
            let stem = natural
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            (1u32..)
                .map(|n| dir.join(format!("{stem}-{n}.tif")))
                .find(|candidate| !candidate.exists())
                .ok_or_else(|| Pdf2TifError::Internal("no free output name".into()))
        }
    }
}

/// Write `bytes` to a temp file beside `path`, then move it into place.
///
/// Under [`OverwritePolicy::Overwrite`] the rename replaces an existing file.
/// Otherwise the final step refuses to clobber, which also closes the gap
/// between choosing the name and writing it.
fn write_atomic(path: &Path, bytes: &[u8], policy: OverwritePolicy) -> Result<(), Pdf2TifError> {
    let write_err = |source: std::io::Error| Pdf2TifError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".pdf2tif-")
        .suffix(".tif.tmp")
        .tempfile_in(dir)
        .map_err(write_err)?;

    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    let persisted = match policy {
        OverwritePolicy::Overwrite => tmp.persist(path),
        OverwritePolicy::Reject | OverwritePolicy::Suffix => tmp.persist_noclobber(path),
    };

    match persisted {
        Ok(_) => Ok(()),
        Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
            Err(Pdf2TifError::OutputExists {
                path: path.to_path_buf(),
            })
        }
        Err(e) => Err(write_err(e.error)),
    }
}

fn encode_error(file: &str, e: EncodeError) -> Pdf2TifError {
    match e {
        EncodeError::TooWide { page, width } => Pdf2TifError::PageTooLarge {
            file: file.to_string(),
            page,
            width,
            max: encode::MAX_GROUP4_WIDTH,
        },
        EncodeError::NoPages => Pdf2TifError::NoPagesProduced {
            file: file.to_string(),
        },
        other => Pdf2TifError::EncodeFailed {
            file: file.to_string(),
            detail: other.to_string(),
        },
    }
}
