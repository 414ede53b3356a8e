//! # pdfium-locate
//!
//! Decide which directory holds the [PDFium](https://pdfium.googlesource.com/pdfium/)
//! shared library, then bind `pdfium-render` to it.
//!
//! ## Resolution order
//!
//! 1. `<base_dir>/config.ini`, section `[Settings]`, key `engine_path` or the
//!    legacy `poppler_path`. A non-blank value is used verbatim (trimmed): backslashes
//!    and quotes are kept as written.
//! 2. Otherwise the bundled default `<base_dir>/pdfium/lib`
//!    (`<base_dir>\pdfium\bin` on Windows), which is where the
//!    pdfium-binaries archives keep the library.
//!
//! Resolution never touches the directory itself. Callers check it with
//! [`EngineLocation::ensure_exists`] right before a conversion so that a
//! missing engine is reported as a result, not discovered mid-render.
//!
//! ```rust,no_run
//! use pdfium_locate::{default_base_dir, resolve_engine_dir, bind_pdfium};
//!
//! let engine = resolve_engine_dir(&default_base_dir());
//! engine.ensure_exists().expect("PDFium directory missing");
//! let pdfium = bind_pdfium(&engine).expect("bind failed");
//! ```
//!
//! ## Platform library names
//!
//! | OS      | Library               | Default sub-directory |
//! |---------|-----------------------|-----------------------|
//! | macOS   | `libpdfium.dylib`     | `pdfium/lib`          |
//! | Linux   | `libpdfium.so`        | `pdfium/lib`          |
//! | Windows | `pdfium.dll`          | `pdfium/bin`          |

use std::fmt;
use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption};
use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{debug, warn};

// ── Public constants ─────────────────────────────────────────────────────────

/// Name of the optional settings file looked up in the base directory.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// INI section holding the engine path.
pub const SETTINGS_SECTION: &str = "Settings";

/// Preferred key for the engine directory.
pub const ENGINE_PATH_KEY: &str = "engine_path";

/// Key used by older config files; still honoured.
pub const LEGACY_ENGINE_PATH_KEY: &str = "poppler_path";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by pdfium-locate operations.
#[derive(Error, Debug)]
pub enum LocateError {
    /// The resolved directory does not exist (or is not a directory).
    #[error(
        "Rasterization engine not found: '{}' is not a directory.\n\
Check that PDFium is unpacked there, or set [Settings] engine_path in config.ini.",
        path.display()
    )]
    EngineNotFound { path: PathBuf },

    /// `pdfium-render` could not load the library.
    #[error("Failed to bind PDFium from '{}': {reason}", path.display())]
    Bind { path: PathBuf, reason: String },
}

// ── EngineLocation ───────────────────────────────────────────────────────────

/// Where an [`EngineLocation`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    /// Read from `config.ini`.
    Configured,
    /// Fixed path relative to the base directory.
    BundledDefault,
    /// Supplied directly by the caller (e.g. a CLI flag).
    Explicit,
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationSource::Configured => f.write_str("config.ini"),
            LocationSource::BundledDefault => f.write_str("bundled default"),
            LocationSource::Explicit => f.write_str("explicit"),
        }
    }
}

/// A resolved directory for the PDFium library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineLocation {
    dir: PathBuf,
    source: LocationSource,
}

impl EngineLocation {
    /// Use `dir` as-is, bypassing `config.ini`.
    pub fn explicit(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            source: LocationSource::Explicit,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn source(&self) -> LocationSource {
        self.source
    }

    /// Full path of the platform library file inside [`Self::dir`].
    pub fn library_path(&self) -> PathBuf {
        self.dir.join(Pdfium::pdfium_platform_library_name())
    }

    /// Fail with [`LocateError::EngineNotFound`] unless the directory exists.
    pub fn ensure_exists(&self) -> Result<(), LocateError> {
        if self.dir.is_dir() {
            Ok(())
        } else {
            Err(LocateError::EngineNotFound {
                path: self.dir.clone(),
            })
        }
    }
}

// ── Resolution ───────────────────────────────────────────────────────────────

/// Directory of the running executable, or the current directory when that
/// cannot be determined.
pub fn default_base_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// The bundled fallback location under `base_dir`.
pub fn bundled_engine_dir(base_dir: &Path) -> PathBuf {
    let sub = if cfg!(target_os = "windows") { "bin" } else { "lib" };
    base_dir.join("pdfium").join(sub)
}

/// Resolve the engine directory for `base_dir`.
///
/// See the crate docs for the resolution order. Never fails: an unreadable
/// config file is logged and the bundled default is used.
pub fn resolve_engine_dir(base_dir: &Path) -> EngineLocation {
    let config_file = base_dir.join(CONFIG_FILE_NAME);

    if config_file.is_file() {
        match Ini::load_from_file_opt(&config_file, verbatim_values()) {
            Ok(ini) => {
                if let Some(dir) = configured_engine_dir(&ini) {
                    debug!("Engine path from {}: {}", config_file.display(), dir.display());
                    return EngineLocation {
                        dir,
                        source: LocationSource::Configured,
                    };
                }
            }
            Err(e) => warn!("Ignoring unreadable {}: {}", config_file.display(), e),
        }
    }

    EngineLocation {
        dir: bundled_engine_dir(base_dir),
        source: LocationSource::BundledDefault,
    }
}

/// Values are kept as written: backslashes are path separators, not escapes,
/// and surrounding quotes stay part of the value.
fn verbatim_values() -> ParseOption {
    ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    }
}

/// Extract a non-blank engine path from parsed settings.
///
/// Keys are matched case-insensitively; `engine_path` wins over `poppler_path`.
fn configured_engine_dir(ini: &Ini) -> Option<PathBuf> {
    let settings = ini.section(Some(SETTINGS_SECTION))?;

    let lookup = |key: &str| {
        settings
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    };

    lookup(ENGINE_PATH_KEY).or_else(|| lookup(LEGACY_ENGINE_PATH_KEY))
}

// ── Binding ──────────────────────────────────────────────────────────────────

/// Bind `pdfium-render` to the library inside `location`.
pub fn bind_pdfium(location: &EngineLocation) -> Result<Pdfium, LocateError> {
    location.ensure_exists()?;
    let path = location.library_path();
    Pdfium::bind_to_library(&path)
        .map(Pdfium::new)
        .map_err(|e| LocateError::Bind {
            path,
            reason: e.to_string(),
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
