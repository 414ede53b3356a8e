//! Result types returned by a successful conversion.

use crate::config::Compression;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a successful conversion produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The PDF that was converted. Never modified or deleted.
    pub source_path: PathBuf,
    /// The TIFF that was written.
    pub output_path: PathBuf,
    /// Pages in the TIFF, equal to the pages in the source.
    pub page_count: usize,
    pub compression: Compression,
    /// Size of the TIFF on disk.
    pub bytes_written: u64,
    /// Wall-clock time for the whole conversion.
    pub duration_ms: u64,
}

impl ConversionOutput {
    /// Output file name, for links and status lines.
    pub fn output_file_name(&self) -> String {
        self.output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
