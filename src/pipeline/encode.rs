//! Multi-page TIFF encoding for 1-bit pages.
//!
//! Each [`BilevelPage`] becomes one image file directory (IFD) with a single
//! strip. Pages keep their input order: the first page is the base image
//! and every later page is appended after it in the IFD chain.
//!
//! The `tiff` crate writes the container (header, IFD chain, tag layout) but
//! its image encoder has no bilevel colour type and no CCITT compressor, so
//! strips are compressed here and placed with `DirectoryEncoder::write_data`:
//!
//! | Compression | TIFF code | Strip codec |
//! |-------------|-----------|-------------|
//! | CCITT T.6   | 4         | `fax` Group 4 encoder |
//! | LZW         | 5         | `weezl` with TIFF code-size switch, MSB-first |
//!
//! Every page is stamped 204 × 196 dpi whatever DPI it was rendered at.

use crate::config::{Compression, FAX_RESOLUTION};
use crate::pipeline::binarize::BilevelPage;
use fax::encoder::Encoder as FaxEncoder;
use fax::{Color, VecWriter};
use std::io::Cursor;
use thiserror::Error;
use tiff::encoder::{Rational, TiffEncoder};
use tiff::tags::Tag;
use tracing::debug;

/// Widest line the Group 4 encoder accepts.
pub const MAX_GROUP4_WIDTH: u32 = u16::MAX as u32;

const SUBFILE_TYPE_PAGE: u32 = 2;
const PHOTOMETRIC_WHITE_IS_ZERO: u16 = 0;
const RESOLUTION_UNIT_INCH: u16 = 2;
const TAG_T6_OPTIONS: Tag = Tag::Unknown(293);
const TAG_PAGE_NUMBER: Tag = Tag::Unknown(297);
const SOFTWARE: &str = concat!("pdf2tif ", env!("CARGO_PKG_VERSION"));

/// Failures while building the TIFF.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("nothing to encode")]
    NoPages,

    #[error("page {page} is {width}px wide, Group 4 lines are limited to {}px", MAX_GROUP4_WIDTH)]
    TooWide { page: usize, width: u32 },

    #[error("Group 4 compression failed on page {page}")]
    Group4 { page: usize },

    #[error("LZW compression failed on page {page}: {detail}")]
    Lzw { page: usize, detail: String },

    #[error("TIFF container: {0}")]
    Tiff(#[from] tiff::TiffError),
}

/// Encode `pages` into one TIFF held in memory.
///
/// The output is small (1-bit, compressed) so building it in memory and
/// writing it in one go keeps partial files off the disk.
pub fn encode_multipage(
    pages: &[BilevelPage],
    compression: Compression,
) -> Result<Vec<u8>, EncodeError> {
    if pages.is_empty() {
        return Err(EncodeError::NoPages);
    }

    let total = page_index(pages.len());
    let (x_res, y_res) = FAX_RESOLUTION;
    let mut buf = Cursor::new(Vec::new());

    {
        let mut tiff = TiffEncoder::new(&mut buf)?;

        for (idx, page) in pages.iter().enumerate() {
            let page_num = idx + 1;
            let strip = compress_strip(page, compression, page_num)?;
            debug!(
                "Page {} → {}x{} px, {} {} bytes",
                page_num,
                page.width(),
                page.height(),
                compression,
                strip.len()
            );

            let mut dir = tiff.new_directory()?;
            dir.write_tag(Tag::NewSubfileType, SUBFILE_TYPE_PAGE)?;
            dir.write_tag(Tag::ImageWidth, page.width())?;
            dir.write_tag(Tag::ImageLength, page.height())?;
            dir.write_tag(Tag::BitsPerSample, 1u16)?;
            dir.write_tag(Tag::Compression, compression.tiff_code())?;
            dir.write_tag(Tag::PhotometricInterpretation, PHOTOMETRIC_WHITE_IS_ZERO)?;
            dir.write_tag(Tag::SamplesPerPixel, 1u16)?;
            dir.write_tag(Tag::RowsPerStrip, page.height())?;
            dir.write_tag(Tag::XResolution, Rational { n: x_res, d: 1 })?;
            dir.write_tag(Tag::YResolution, Rational { n: y_res, d: 1 })?;
            dir.write_tag(Tag::ResolutionUnit, RESOLUTION_UNIT_INCH)?;
            dir.write_tag(Tag::Software, SOFTWARE)?;
            dir.write_tag(TAG_PAGE_NUMBER, &[page_index(idx), total][..])?;
            if compression == Compression::Group4 {
                dir.write_tag(TAG_T6_OPTIONS, 0u32)?;
            }

            let offset = dir.write_data(strip.as_slice())?;
            dir.write_tag(Tag::StripOffsets, offset as u32)?;
            dir.write_tag(Tag::StripByteCounts, strip.len() as u32)?;
            dir.finish()?;
        }
    }

    Ok(buf.into_inner())
}

/// Compress one page into a single strip.
pub fn compress_strip(
    page: &BilevelPage,
    compression: Compression,
    page_num: usize,
) -> Result<Vec<u8>, EncodeError> {
    match compression {
        Compression::Group4 => compress_group4(page, page_num),
        Compression::Lzw => compress_lzw(page, page_num),
    }
}

fn compress_group4(page: &BilevelPage, page_num: usize) -> Result<Vec<u8>, EncodeError> {
    let width = u16::try_from(page.width()).map_err(|_| EncodeError::TooWide {
        page: page_num,
        width: page.width(),
    })?;

    let mut encoder = FaxEncoder::new(VecWriter::new());
    for y in 0..page.height() {
        let line = (0..page.width()).map(|x| {
            if page.is_black(x, y) {
                Color::Black
            } else {
                Color::White
            }
        });
        encoder
            .encode_line(line, width)
            .map_err(|_| EncodeError::Group4 { page: page_num })?;
    }

    let writer = encoder
        .finish()
        .map_err(|_| EncodeError::Group4 { page: page_num })?;
    Ok(writer.finish())
}

fn compress_lzw(page: &BilevelPage, page_num: usize) -> Result<Vec<u8>, EncodeError> {
    weezl::encode::Encoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8)
        .encode(page.data())
        .map_err(|e| EncodeError::Lzw {
            page: page_num,
            detail: e.to_string(),
        })
}

/// Page numbers are 16-bit in the PageNumber tag; saturate beyond that.
fn page_index(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}
