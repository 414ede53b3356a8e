//! # pdf2tif
//!
//! Convert PDF documents into multi-page, 1-bit, fax-resolution TIFF files.
//!
//! Each page is rasterised with PDFium, reduced to black and white, and
//! written as one page of a single TIFF compressed with CCITT T.6 (Group 4)
//! or LZW. Every page is stamped 204 × 196 dpi, the standard fax fine mode.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Engine   locate the PDFium directory (config.ini / bundled default)
//!  ├─ 2. Input    check the source exists and starts with %PDF
//!  ├─ 3. Render   rasterise pages to grayscale (spawn_blocking)
//!  ├─ 4. 1-bit    dither or threshold each page
//!  ├─ 5. Encode   one IFD per page, Group 4 or LZW strips
//!  └─ 6. Output   temp file + rename into <output_dir>/<stem>.tif
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2tif::{convert, resolve_engine_dir, default_base_dir, Compression,
//!               ConversionConfig, ConversionRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = resolve_engine_dir(&default_base_dir());
//!     let config = ConversionConfig::builder(engine).build()?;
//!     let request = ConversionRequest::new("invoice.pdf", "out", Compression::Group4);
//!     let output = convert(&request, &config).await?;
//!     println!("{} pages → {}", output.page_count, output.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `pdf2tif` batch binary (clap + indicatif + tracing-subscriber) |
//! | `server` | on      | Enables the `pdf2tif-server` HTTP upload service (axum + tower-http) |
//!
//! Disable both when using only the library:
//! ```toml
//! pdf2tif = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{convert_batch, BatchQueue, BatchReport, ErrorPolicy, FileOutcome, FileReport};
pub use config::{
    Binarization, Compression, ConversionConfig, ConversionConfigBuilder, ConversionRequest,
    OverwritePolicy, DEFAULT_DPI, FAX_RESOLUTION, MAX_DPI, MIN_DPI,
};
pub use convert::{convert, convert_blocking, convert_sync};
pub use error::Pdf2TifError;
pub use output::ConversionOutput;
pub use pipeline::render::{PdfiumRasterizer, Rasterizer};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};

pub use pdfium_locate::{default_base_dir, resolve_engine_dir, EngineLocation, LocationSource};
