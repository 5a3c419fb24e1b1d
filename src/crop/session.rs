//! Crop session lifecycle: open, adjust, finalize, close.
//!
//! A [`CropSession`] owns one mounted [`CropSurface`]. Closing destroys the
//! surface; a session that is dropped without being closed is closed then,
//! so every successful [`CropSession::open`] is matched by exactly one
//! teardown no matter how the owner exits.

use super::engine::{CropEngine, CropError, CropSurface};
use super::params::{CropAction, CropBox, CropOptions, OutputSpec, Quality};
use crate::types::{CapturedFrame, NormalizedImage};
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use std::fmt;
use tracing::debug;

pub struct CropSession {
    surface: Option<Box<dyn CropSurface>>,
    engine: String,
}

impl CropSession {
    /// Mount a crop surface over `frame`.
    pub fn open(
        engine: &dyn CropEngine,
        frame: &CapturedFrame,
        options: &CropOptions,
    ) -> Result<Self, CropError> {
        let surface = engine.mount(frame, options)?;
        debug!(
            engine = engine.name(),
            width = frame.width(),
            height = frame.height(),
            "crop session opened"
        );
        Ok(Self {
            surface: Some(surface),
            engine: engine.name().to_string(),
        })
    }

    pub fn is_open(&self) -> bool {
        self.surface.is_some()
    }

    pub fn selection(&self) -> Option<CropBox> {
        self.surface.as_ref().map(|s| s.selection())
    }

    /// Forward one user adjustment. Returns whether it was applied.
    pub fn adjust(&mut self, action: CropAction) -> bool {
        self.surface.as_mut().is_some_and(|s| s.apply(action))
    }

    /// Render the selection into a `size`×`size` JPEG.
    pub fn finalize(&self, output: &OutputSpec) -> Result<NormalizedImage, CropError> {
        let surface = self.surface.as_ref().ok_or(CropError::Closed)?;
        let size = output.size;

        let rendered = surface.render(size, size)?;
        if rendered.width() == 0 || rendered.height() == 0 {
            return Err(CropError::Render("render produced no pixels".into()));
        }
        let rendered = if (rendered.width(), rendered.height()) == (size, size) {
            rendered
        } else {
            rendered.resize_exact(size, size, FilterType::Lanczos3)
        };

        let jpeg = encode_jpeg(&rendered, output.quality)?;
        debug!(size, bytes = jpeg.len(), "crop finalized");
        Ok(NormalizedImage::new(jpeg, size, size))
    }

    /// Destroy the surface. Consumes the session so it cannot be closed twice.
    pub fn close(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.destroy();
            debug!(engine = %self.engine, "crop session closed");
        }
    }
}

impl Drop for CropSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for CropSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CropSession")
            .field("engine", &self.engine)
            .field("open", &self.is_open())
            .finish()
    }
}

fn encode_jpeg(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, CropError> {
    let rgb = img.to_rgb8();
    let mut jpeg = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, quality.value() as u8)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| CropError::Encode(e.to_string()))?;
    if jpeg.is_empty() {
        return Err(CropError::Encode("encoder produced no data".into()));
    }
    Ok(jpeg)
}
