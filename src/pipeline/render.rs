//! PDF rasterisation: render every page to an 8-bit grayscale bitmap.
//!
//! [`Rasterizer`] is the seam between the converter and the engine. The
//! production implementation, [`PdfiumRasterizer`], binds pdfium from the
//! resolved [`EngineLocation`] on every call; tests plug in synthetic
//! rasterizers through [`crate::ConversionConfig::rasterizer`].
//!
//! All implementations are blocking. The async entry points run them inside
//! `tokio::task::spawn_blocking` because pdfium keeps thread-local state and
//! rendering at 300 DPI is CPU-heavy.

use crate::error::Pdf2TifError;
use image::GrayImage;
use pdfium_locate::EngineLocation;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// PDF points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Turns a PDF into one grayscale bitmap per page, in page order.
pub trait Rasterizer: Send + Sync {
    /// Rasterise every page of `pdf_path` at `dpi`.
    ///
    /// An empty vector is a valid answer; the converter turns it into
    /// [`Pdf2TifError::NoPagesProduced`].
    fn rasterize(
        &self,
        engine: &EngineLocation,
        pdf_path: &Path,
        dpi: u32,
    ) -> Result<Vec<GrayImage>, Pdf2TifError>;
}

/// Rasterizer backed by the pdfium library in the engine directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumRasterizer;

impl Rasterizer for PdfiumRasterizer {
    fn rasterize(
        &self,
        engine: &EngineLocation,
        pdf_path: &Path,
        dpi: u32,
    ) -> Result<Vec<GrayImage>, Pdf2TifError> {
        let pdfium = pdfium_locate::bind_pdfium(engine)?;
        let file = display_name(pdf_path);

        let document = pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| Pdf2TifError::CorruptPdf {
                file: file.clone(),
                detail: format!("{:?}", e),
            })?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!("PDF loaded: {} pages", total_pages);

        let mut results = Vec::with_capacity(total_pages);

        for idx in 0..total_pages {
            let page = pages
                .get(idx as u16)
                .map_err(|e| Pdf2TifError::RasterisationFailed {
                    file: file.clone(),
                    page: idx + 1,
                    detail: format!("{:?}", e),
                })?;

            let target_width = points_to_pixels(page.width().value, dpi);
            let render_config = PdfRenderConfig::new().set_target_width(target_width);

            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                Pdf2TifError::RasterisationFailed {
                    file: file.clone(),
                    page: idx + 1,
                    detail: format!("{:?}", e),
                }
            })?;

            let gray = bitmap.as_image().to_luma8();
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                gray.width(),
                gray.height()
            );

            results.push(gray);
        }

        Ok(results)
    }
}

/// Pixel width of `points` at `dpi`, at least one pixel.
pub fn points_to_pixels(points: f32, dpi: u32) -> i32 {
    ((points * dpi as f32 / POINTS_PER_INCH).round() as i32).max(1)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
