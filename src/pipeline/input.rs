//! Input validation: make sure the source is a readable PDF before the
//! engine is involved.
//!
//! pdfium reports a truncated download or a renamed `.docx` as a generic
//! load failure. Checking the `%PDF` magic bytes first gives callers an
//! error that says what is actually wrong.

use crate::error::Pdf2TifError;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Validate that `path` exists, is readable, and starts with `%PDF`.
///
/// Files shorter than four bytes are let through; the engine rejects them
/// and the converter reports that as a rasterisation failure.
pub fn validate_source(path: &Path) -> Result<(), Pdf2TifError> {
    if !path.is_file() {
        return Err(Pdf2TifError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(Pdf2TifError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2TifError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(Pdf2TifError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Validated source PDF: {}", path.display());
    Ok(())
}

/// Case-insensitive `.pdf` extension check used by the upload endpoint.
pub fn has_pdf_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
