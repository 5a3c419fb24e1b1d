//! Payload types passed between the camera, crop and submission stages.
//!
//! All three are immutable once built: a retake or reset discards them and a
//! fresh one is produced, they are never edited in place.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A still frame rasterized from the live video surface.
///
/// Holds the PNG-encoded pixels at the surface's native resolution.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    png: Vec<u8>,
    width: u32,
    height: u32,
}

impl CapturedFrame {
    pub fn new(png: Vec<u8>, width: u32, height: u32) -> Self {
        Self { png, width, height }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl fmt::Debug for CapturedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.png.len())
            .finish()
    }
}

/// The fixed-size JPEG a crop session finalizes into; the upload payload.
#[derive(Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
}

impl NormalizedImage {
    pub const CONTENT_TYPE: &'static str = "image/jpeg";

    pub fn new(jpeg: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            jpeg,
            width,
            height,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.jpeg
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.jpeg
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl fmt::Debug for NormalizedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.jpeg.len())
            .finish()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("position string is empty")]
pub struct EmptyFen;

/// A position string returned by the recognition service.
///
/// Guaranteed non-empty after trimming; otherwise kept exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FenResult(String);

impl FenResult {
    pub fn new(fen: impl Into<String>) -> Result<Self, EmptyFen> {
        let fen = fen.into();
        if fen.trim().is_empty() {
            return Err(EmptyFen);
        }
        Ok(Self(fen))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The piece-placement field (everything before the first space).
    pub fn placement(&self) -> &str {
        self.0.split_whitespace().next().unwrap_or("")
    }
}

impl TryFrom<String> for FenResult {
    type Error = EmptyFen;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FenResult> for String {
    fn from(fen: FenResult) -> Self {
        fen.0
    }
}

impl fmt::Display for FenResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
