//! Shared helpers for the integration tests.
//!
//! Real rasterisation needs a PDFium build, so most tests plug a
//! [`FakeRasterizer`] into `ConversionConfig`. It reads a tiny text "PDF":
//!
//! ```text
//! %PDF-fake
//! pages=3
//! ```
//!
//! and returns that many grayscale pages. Page `i` (1-based) is `8 + 8*i`
//! pixels wide so page order can be read back from the TIFF. A body
//! containing `fail` makes it return a rasterisation error.

#![allow(dead_code)]

use image::{GrayImage, Luma};
use pdf2tif::{ConversionConfig, EngineLocation, Pdf2TifError, Rasterizer};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const PAGE_HEIGHT: u32 = 12;

pub fn page_width(page: usize) -> u32 {
    8 + 8 * page as u32
}

#[derive(Default)]
pub struct FakeRasterizer {
    calls: AtomicUsize,
}

impl FakeRasterizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Rasterizer for FakeRasterizer {
    fn rasterize(
        &self,
        _engine: &EngineLocation,
        pdf_path: &Path,
        _dpi: u32,
    ) -> Result<Vec<GrayImage>, Pdf2TifError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let body = std::fs::read_to_string(pdf_path).unwrap_or_default();
        let file = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if body.contains("fail") {
            return Err(Pdf2TifError::RasterisationFailed {
                file,
                page: 1,
                detail: "synthetic failure".into(),
            });
        }

        let pages: usize = body
            .lines()
            .find_map(|l| l.strip_prefix("pages="))
            .and_then(|n| n.trim().parse().ok())
            .unwrap_or(1);

        Ok((1..=pages)
            .map(|i| {
                GrayImage::from_fn(page_width(i), PAGE_HEIGHT, |x, y| {
                    if (x + y) % 3 == 0 {
                        Luma([0])
                    } else {
                        Luma([255])
                    }
                })
            })
            .collect())
    }
}

/// Write a fake PDF with `pages` pages.
pub fn write_pdf(dir: &Path, name: &str, pages: usize) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("%PDF-fake\npages={pages}\n")).unwrap();
    path
}

/// Write a fake PDF the fake rasterizer refuses.
pub fn write_broken_pdf(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, "%PDF-fake\nfail\n").unwrap();
    path
}

/// An engine directory that exists.
pub fn engine_dir(root: &Path) -> EngineLocation {
    let dir = root.join("pdfium");
    std::fs::create_dir_all(&dir).unwrap();
    EngineLocation::explicit(dir)
}

pub fn config_with(engine: EngineLocation, rasterizer: Arc<FakeRasterizer>) -> ConversionConfig {
    ConversionConfig::builder(engine)
        .rasterizer(rasterizer)
        .build()
        .unwrap()
}

/// Directory entries, sorted, as strings.
pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
