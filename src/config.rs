//! Configuration types for PDF-to-TIFF conversion.
//!
//! Two structs split the knobs by lifetime:
//!
//! * [`ConversionRequest`]: what to convert. One per document, immutable
//!   once built: source, output directory, compression, DPI.
//! * [`ConversionConfig`]: how the converter behaves for every document:
//!   where the engine lives, how pages are reduced to 1-bit, what to do when
//!   the output name is taken. Built via [`ConversionConfig::builder()`] and
//!   passed explicitly to every call; there is no global engine path.

use crate::error::Pdf2TifError;
use crate::pipeline::render::Rasterizer;
use pdfium_locate::EngineLocation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Default rasterisation DPI.
pub const DEFAULT_DPI: u32 = 300;

/// Accepted DPI range.
pub const MIN_DPI: u32 = 72;
pub const MAX_DPI: u32 = 600;

/// Resolution stamped into every output page (standard fax fine mode),
/// independent of the DPI the page was rasterised at.
pub const FAX_RESOLUTION: (u32, u32) = (204, 196);

// ── Compression ──────────────────────────────────────────────────────────

/// TIFF compression scheme for the 1-bit pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Compression {
    /// CCITT T.6 (Group 4). Fallback for unrecognised choices.
    #[default]
    Group4,
    /// Lempel-Ziv-Welch.
    Lzw,
}

impl Compression {
    /// Strict parse of a user-facing choice.
    ///
    /// Accepts the UI labels (`"CCITT T.6"`, `"LZW"`), the encoder tags
    /// (`"group4"`, `"tiff_lzw"`) and a few short aliases, case-insensitively.
    pub fn parse(choice: &str) -> Option<Self> {
        match choice.trim().to_ascii_lowercase().as_str() {
            "ccitt t.6" | "ccitt" | "t.6" | "t6" | "group4" | "g4" | "fax4" => {
                Some(Compression::Group4)
            }
            "lzw" | "tiff_lzw" => Some(Compression::Lzw),
            _ => None,
        }
    }

    /// Lenient parse: unrecognised values fall back to [`Compression::Group4`].
    ///
    /// The fallback is logged so that a typo in a form field or flag is
    /// visible rather than silently producing Group 4 output.
    pub fn from_choice(choice: &str) -> Self {
        Self::parse(choice).unwrap_or_else(|| {
            warn!(
                "Unrecognised compression '{}', falling back to {}",
                choice,
                Compression::Group4
            );
            Compression::Group4
        })
    }

    /// Encoder-level tag name.
    pub fn encoder_tag(&self) -> &'static str {
        match self {
            Compression::Group4 => "group4",
            Compression::Lzw => "tiff_lzw",
        }
    }

    /// Value written to the TIFF `Compression` tag (259).
    pub fn tiff_code(&self) -> u16 {
        match self {
            Compression::Group4 => 4,
            Compression::Lzw => 5,
        }
    }

    /// Label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            Compression::Group4 => "CCITT T.6",
            Compression::Lzw => "LZW",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Binarization ─────────────────────────────────────────────────────────

/// How a grayscale page is reduced to black and white.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Binarization {
    /// Floyd–Steinberg error diffusion. Keeps photos and shading legible.
    #[default]
    Dither,
    /// Luma strictly below the value becomes black.
    Threshold(u8),
}

// ── Overwrite policy ─────────────────────────────────────────────────────

/// What to do when `<stem>.tif` already exists in the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverwritePolicy {
    /// Replace the existing file.
    #[default]
    Overwrite,
    /// Fail with [`Pdf2TifError::OutputExists`] before rasterising.
    Reject,
    /// Write `<stem>-1.tif`, `<stem>-2.tif`, … instead.
    Suffix,
}

// ── ConversionRequest ────────────────────────────────────────────────────

/// One document to convert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    source: PathBuf,
    output_dir: PathBuf,
    compression: Compression,
    dpi: u32,
}

impl ConversionRequest {
    /// Request at [`DEFAULT_DPI`].
    pub fn new(
        source: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        compression: Compression,
    ) -> Self {
        Self {
            source: source.into(),
            output_dir: output_dir.into(),
            compression,
            dpi: DEFAULT_DPI,
        }
    }

    /// Same request at another DPI. Clamped to [`MIN_DPI`]..=[`MAX_DPI`],
    /// with a warning when the value had to change.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi.clamp(MIN_DPI, MAX_DPI);
        if self.dpi != dpi {
            warn!(
                "DPI {} for {} is outside {}..={}, using {}",
                dpi,
                self.source.display(),
                MIN_DPI,
                MAX_DPI,
                self.dpi
            );
        }
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// Source file name for messages; falls back to the full path.
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }

    /// `<output_dir>/<source stem>.tif`, before any overwrite policy applies.
    pub fn default_output_path(&self) -> PathBuf {
        let stem = self
            .source
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| "output".into());
        let mut name = stem;
        name.push(".tif");
        self.output_dir.join(name)
    }
}

// ── ConversionConfig ─────────────────────────────────────────────────────

/// Converter-wide settings shared by every request.
#[derive(Clone)]
pub struct ConversionConfig {
    /// Directory holding the PDFium library. Checked before each conversion.
    pub engine: EngineLocation,

    /// 1-bit reduction mode. Default: [`Binarization::Dither`].
    pub binarization: Binarization,

    /// Output-name collision handling. Default: [`OverwritePolicy::Overwrite`].
    pub overwrite: OverwritePolicy,

    /// Pre-constructed rasterizer. Takes precedence over binding PDFium from
    /// [`Self::engine`]; the engine directory is still required to exist.
    pub rasterizer: Option<Arc<dyn Rasterizer>>,
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("engine", &self.engine)
            .field("binarization", &self.binarization)
            .field("overwrite", &self.overwrite)
            .field(
                "rasterizer",
                &self.rasterizer.as_ref().map(|_| "<dyn Rasterizer>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder(engine: EngineLocation) -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self {
                engine,
                binarization: Binarization::default(),
                overwrite: OverwritePolicy::default(),
                rasterizer: None,
            },
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn binarization(mut self, mode: Binarization) -> Self {
        self.config.binarization = mode;
        self
    }

    pub fn overwrite(mut self, policy: OverwritePolicy) -> Self {
        self.config.overwrite = policy;
        self
    }

    pub fn rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.config.rasterizer = Some(rasterizer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2TifError> {
        if let Binarization::Threshold(0) = self.config.binarization {
            return Err(Pdf2TifError::InvalidConfig(
                "Threshold must be 1–255 (0 would make every page white)".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ui_labels_map_to_encoder_tags() {
        assert_eq!(Compression::from_choice("CCITT T.6").encoder_tag(), "group4");
        assert_eq!(Compression::from_choice("LZW").encoder_tag(), "tiff_lzw");
    }

    #[test]
    fn unknown_choice_falls_back_to_group4() {
        assert_eq!(Compression::parse("zip"), None);
        assert_eq!(Compression::from_choice("zip"), Compression::Group4);
        assert_eq!(Compression::from_choice(""), Compression::Group4);
    }

    #[test]
    fn aliases_are_case_insensitive() {
        assert_eq!(Compression::parse("lzw"), Some(Compression::Lzw));
        assert_eq!(Compression::parse(" Tiff_LZW "), Some(Compression::Lzw));
        assert_eq!(Compression::parse("ccitt t.6"), Some(Compression::Group4));
        assert_eq!(Compression::parse("G4"), Some(Compression::Group4));
    }

    #[test]
    fn tiff_codes() {
        assert_eq!(Compression::Group4.tiff_code(), 4);
        assert_eq!(Compression::Lzw.tiff_code(), 5);
    }

    #[test]
    fn request_defaults_to_300_dpi() {
        let req = ConversionRequest::new("a.pdf", "/out", Compression::Lzw);
        assert_eq!(req.dpi(), DEFAULT_DPI);
        assert_eq!(req.with_dpi(10).dpi(), MIN_DPI);
    }

    /// Collects formatted log output for the duration of `f`.
    fn captured_logs(f: impl FnOnce()) -> String {
        use std::io::Write;
        use std::sync::Mutex;

        #[derive(Clone, Default)]
        struct Sink(Arc<Mutex<Vec<u8>>>);

        impl Write for Sink {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let sink = Sink::default();
        let writer = sink.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = sink.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn out_of_range_dpi_is_clamped_with_warning() {
        let mut dpi = 0;
        let logs = captured_logs(|| {
            dpi = ConversionRequest::new("big.pdf", "/out", Compression::Lzw)
                .with_dpi(1200)
                .dpi();
        });
        assert_eq!(dpi, MAX_DPI);
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("DPI 1200 for big.pdf"), "{logs}");
    }

    #[test]
    fn in_range_dpi_is_silent() {
        let mut dpi = 0;
        let logs = captured_logs(|| {
            dpi = ConversionRequest::new("a.pdf", "/out", Compression::Lzw)
                .with_dpi(150)
                .dpi();
        });
        assert_eq!(dpi, 150);
        assert_eq!(logs, "");
    }

    #[test]
    fn output_path_replaces_extension() {
        let req = ConversionRequest::new("/in/Quarterly Report.PDF", "/out", Compression::Lzw);
        assert_eq!(
            req.default_output_path(),
            PathBuf::from("/out/Quarterly Report.tif")
        );
        assert_eq!(req.file_name(), "Quarterly Report.PDF");
    }

    #[test]
    fn output_path_keeps_inner_dots() {
        let req = ConversionRequest::new("scan.v2.pdf", "out", Compression::Group4);
        assert_eq!(req.default_output_path(), PathBuf::from("out/scan.v2.tif"));
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let err = ConversionConfig::builder(EngineLocation::explicit("/x"))
            .binarization(Binarization::Threshold(0))
            .build()
            .unwrap_err();
        assert!(matches!(err, Pdf2TifError::InvalidConfig(_)));
    }

    #[test]
    fn builder_defaults() {
        let cfg = ConversionConfig::builder(EngineLocation::explicit("/x"))
            .build()
            .unwrap();
        assert_eq!(cfg.binarization, Binarization::Dither);
        assert_eq!(cfg.overwrite, OverwritePolicy::Overwrite);
        assert!(cfg.rasterizer.is_none());
    }
}
