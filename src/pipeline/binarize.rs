//! 1-bit reduction: grayscale bitmap → packed black/white rows.
//!
//! Rows are packed MSB-first, one bit per pixel, each row padded to a whole
//! byte, with `1` meaning black. That is exactly the uncompressed strip
//! layout of a TIFF with `PhotometricInterpretation = WhiteIsZero`, so the
//! LZW path compresses the buffer as-is and the Group 4 path reads colours
//! straight from it.

use crate::config::Binarization;
use image::imageops::{self, BiLevel};
use image::GrayImage;

/// A 1-bit page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BilevelPage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BilevelPage {
    /// Reduce `gray` to black and white with `mode`.
    pub fn from_gray(gray: &GrayImage, mode: Binarization) -> Self {
        let (width, height) = gray.dimensions();

        let dithered;
        let (source, cutoff) = match mode {
            Binarization::Dither => {
                let mut copy = gray.clone();
                imageops::dither(&mut copy, &BiLevel);
                dithered = copy;
                // BiLevel maps every pixel to exactly 0 or 255.
                (&dithered, 128u8)
            }
            Binarization::Threshold(t) => (gray, t),
        };

        let mut page = Self::blank(width, height);
        for (x, y, px) in source.enumerate_pixels() {
            if px.0[0] < cutoff {
                page.set_black(x, y);
            }
        }
        page
    }

    /// An all-white page.
    pub fn blank(width: u32, height: u32) -> Self {
        let stride = Self::stride_for(width);
        Self {
            width,
            height,
            data: vec![0; stride * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per packed row.
    pub fn stride(&self) -> usize {
        Self::stride_for(self.width)
    }

    /// The packed rows, top to bottom.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// One packed row.
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    pub fn is_black(&self, x: u32, y: u32) -> bool {
        let byte = self.row(y)[(x / 8) as usize];
        byte & (0x80 >> (x % 8)) != 0
    }

    pub fn set_black(&mut self, x: u32, y: u32) {
        let idx = y as usize * self.stride() + (x / 8) as usize;
        self.data[idx] |= 0x80 >> (x % 8);
    }

    /// Number of black pixels.
    pub fn black_count(&self) -> usize {
        self.data.iter().map(|b| b.count_ones() as usize).sum()
    }

    fn stride_for(width: u32) -> usize {
        (width as usize).div_ceil(8)
    }
}
