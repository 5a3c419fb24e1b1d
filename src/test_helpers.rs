//! Shared test utilities: synthetic chessboard images and frames.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let photo = write_board_photo(tmp.path(), 800, 600);
//! let frame = board_frame(640, 480);
//! ```

use crate::types::CapturedFrame;
use image::{DynamicImage, ImageEncoder, ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

// =========================================================================
// Synthetic images
// =========================================================================

/// An 8×8 checkerboard filling the whole image.
pub fn board_image(width: u32, height: u32) -> DynamicImage {
    let cell_w = (width / 8).max(1);
    let cell_h = (height / 8).max(1);
    let img = RgbImage::from_fn(width, height, |x, y| {
        if ((x / cell_w) + (y / cell_h)) % 2 == 0 {
            image::Rgb([238, 238, 210])
        } else {
            image::Rgb([118, 150, 86])
        }
    });
    DynamicImage::ImageRgb8(img)
}

/// A checkerboard encoded the way the camera encodes captured stills.
pub fn board_frame(width: u32, height: u32) -> CapturedFrame {
    let mut buf = Cursor::new(Vec::new());
    board_image(width, height)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    CapturedFrame::new(buf.into_inner(), width, height)
}

/// Write a checkerboard JPEG into `dir` and return its path.
pub fn write_board_photo(dir: &Path, width: u32, height: u32) -> PathBuf {
    let path = dir.join(format!("board-{width}x{height}.jpg"));
    let img = board_image(width, height).to_rgb8();
    let file = std::fs::File::create(&path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    path
}

// =========================================================================
// Decoding helpers
// =========================================================================

/// Decode JPEG bytes and return their dimensions. Panics if they are not a JPEG.
pub fn jpeg_dimensions(bytes: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .unwrap_or_else(|e| panic!("expected a decodable JPEG ({} bytes): {e}", bytes.len()));
    (img.width(), img.height())
}
