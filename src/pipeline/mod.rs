//! Pipeline stages for PDF-to-TIFF conversion.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the rendering backend can be swapped through the
//! [`render::Rasterizer`] trait.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ binarize ──▶ encode
//! (%PDF)    (pdfium)   (1-bit)      (multi-page TIFF)
//! ```
//!
//! 1. [`input`]: check the source exists, is readable and starts with `%PDF`
//! 2. [`render`]: rasterise every page to an 8-bit grayscale bitmap
//! 3. [`binarize`]: dither or threshold each bitmap to packed 1-bit rows
//! 4. [`encode`]: compress the rows (Group 4 or LZW) and write one TIFF
//!    directory per page

pub mod binarize;
pub mod encode;
pub mod input;
pub mod render;
