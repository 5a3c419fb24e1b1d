//! Crop engine trait and shared error type.
//!
//! The [`CropEngine`] trait is the narrow capability the rest of the crate
//! sees: mount an interactive [`CropSurface`] over a captured frame, adjust
//! it, render the selection at an arbitrary size, tear it down.
//!
//! The production implementation is
//! [`RustCropEngine`](super::rust_engine::RustCropEngine), built on the
//! `image` crate. Tests use the recording `MockCropEngine` below.

use super::params::{CropAction, CropBox, CropOptions};
use crate::error::{ErrorInfo, ErrorKind};
use crate::types::CapturedFrame;
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CropError {
    #[error("crop engine unavailable: {0}")]
    EngineUnavailable(String),
    #[error("failed to decode captured frame: {0}")]
    Decode(String),
    #[error("crop render failed: {0}")]
    Render(String),
    #[error("failed to encode cropped image: {0}")]
    Encode(String),
    #[error("crop session is already closed")]
    Closed,
}

impl CropError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CropError::EngineUnavailable(_) => ErrorKind::CropEngineUnavailable,
            CropError::Decode(_) | CropError::Render(_) | CropError::Encode(_) | CropError::Closed => {
                ErrorKind::ImageEncodingFailed
            }
        }
    }
}

impl From<CropError> for ErrorInfo {
    fn from(err: CropError) -> Self {
        ErrorInfo::new(err.kind(), err.to_string())
    }
}

/// A source of crop surfaces.
pub trait CropEngine: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Bind a new surface to `frame`. Fails with
    /// [`CropError::EngineUnavailable`] when the engine cannot be used.
    fn mount(
        &self,
        frame: &CapturedFrame,
        options: &CropOptions,
    ) -> Result<Box<dyn CropSurface>, CropError>;
}

/// An interactive selection over one frame.
pub trait CropSurface: Send {
    /// Apply one adjustment. Returns `false` when the options disable it.
    fn apply(&mut self, action: CropAction) -> bool;

    /// Current selection, in oriented image pixels.
    fn selection(&self) -> CropBox;

    /// Render the selection scaled to exactly `width`×`height`.
    fn render(&self, width: u32, height: u32) -> Result<DynamicImage, CropError>;

    /// Release everything the surface holds.
    fn destroy(&mut self);
}
