//! Error types for the pdf2tif library.
//!
//! A conversion is all-or-nothing, so there is a single fatal error type,
//! [`Pdf2TifError`]. Every variant that concerns a particular document
//! carries the source file name so the `Display` text alone is enough for a
//! status line, a modal, or an HTTP `detail` string.

use pdfium_locate::LocateError;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2tif library.
#[derive(Debug, Error)]
pub enum Pdf2TifError {
    // ── Engine errors ─────────────────────────────────────────────────────
    /// The resolved PDFium directory does not exist.
    #[error(
        "Rasterization engine not found at '{}'\nUnpack PDFium there or set [Settings] engine_path in config.ini.",
        path.display()
    )]
    EngineNotFound { path: PathBuf },

    /// The directory exists but the library could not be loaded from it.
    #[error("Failed to bind PDFium from '{}': {detail}", path.display())]
    EngineBindingFailed { path: PathBuf, detail: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{}'", path.display())]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{}'", path.display())]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{}'\nFirst bytes: {magic:?}", path.display())]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// PDFium refused to open the document.
    #[error("An error occurred while converting {file}: cannot open PDF: {detail}")]
    CorruptPdf { file: String, detail: String },

    /// PDFium failed on a specific page.
    #[error("An error occurred while converting {file}: page {page} failed to render: {detail}")]
    RasterisationFailed {
        file: String,
        page: usize,
        detail: String,
    },

    /// Rasterisation succeeded but yielded nothing to encode.
    #[error("No images produced from {file}: the file may be empty or corrupted")]
    NoPagesProduced { file: String },

    /// Group 4 line widths are 16-bit; wider pages cannot be encoded.
    #[error("An error occurred while converting {file}: page {page} is {width}px wide, the fax encoder limit is {max}px (lower the DPI)")]
    PageTooLarge {
        file: String,
        page: usize,
        width: u32,
        max: u32,
    },

    /// TIFF container or strip compression failed.
    #[error("An error occurred while converting {file}: TIFF encoding failed: {detail}")]
    EncodeFailed { file: String, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// `OverwritePolicy::Reject` and the target already exists.
    #[error("Output file already exists: '{}'", path.display())]
    OutputExists { path: PathBuf },

    /// Could not create or write the output TIFF.
    #[error("Failed to write output file '{}': {source}", path.display())]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<LocateError> for Pdf2TifError {
    fn from(e: LocateError) -> Self {
        match e {
            LocateError::EngineNotFound { path } => Pdf2TifError::EngineNotFound { path },
            LocateError::Bind { path, reason } => Pdf2TifError::EngineBindingFailed {
                path,
                detail: reason,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_pages_display_names_file() {
        let e = Pdf2TifError::NoPagesProduced {
            file: "scan.pdf".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("scan.pdf"), "got: {msg}");
        assert!(msg.contains("empty or corrupted"), "got: {msg}");
    }

    #[test]
    fn rasterisation_display_names_file_and_page() {
        let e = Pdf2TifError::RasterisationFailed {
            file: "invoice.pdf".into(),
            page: 3,
            detail: "bad xref".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("invoice.pdf"));
        assert!(msg.contains("page 3"));
        assert!(msg.contains("bad xref"));
    }

    #[test]
    fn locate_error_maps_to_engine_not_found() {
        let e: Pdf2TifError = LocateError::EngineNotFound {
            path: PathBuf::from("/missing/pdfium"),
        }
        .into();
        assert!(matches!(e, Pdf2TifError::EngineNotFound { .. }));
        assert!(e.to_string().contains("/missing/pdfium"));
    }

    #[test]
    fn bind_error_keeps_reason() {
        let e: Pdf2TifError = LocateError::Bind {
            path: PathBuf::from("/opt/pdfium/lib"),
            reason: "wrong architecture".into(),
        }
        .into();
        assert!(e.to_string().contains("wrong architecture"));
    }
}
