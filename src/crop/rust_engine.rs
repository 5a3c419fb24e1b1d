//! Pure Rust crop engine on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode frame (PNG, JPEG) | `image::load_from_memory` |
//! | Rotate | `DynamicImage::rotate90` / `rotate180` / `rotate270` |
//! | Crop | `DynamicImage::crop_imm` |
//! | Resample to output size | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Mirror | `DynamicImage::fliph` / `flipv` |
//!
//! Rotation is in quarter turns only; a rotation resets the selection to the
//! default box for the new orientation.

use super::calculations::{
    constrain_box, default_crop_box, normalize_turns, pixel_rect, rotated_dimensions,
    translate_box, zoom_box,
};
use super::engine::{CropEngine, CropError, CropSurface};
use super::params::{CropAction, CropBox, CropOptions, DragMode};
use crate::types::CapturedFrame;
use image::DynamicImage;
use image::imageops::FilterType;
use tracing::debug;

/// Crop engine backed by the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustCropEngine;

impl RustCropEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCropEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CropEngine for RustCropEngine {
    fn name(&self) -> &str {
        "rust"
    }

    fn mount(
        &self,
        frame: &CapturedFrame,
        options: &CropOptions,
    ) -> Result<Box<dyn CropSurface>, CropError> {
        let source = image::load_from_memory(frame.bytes())
            .map_err(|e| CropError::Decode(e.to_string()))?;
        if source.width() == 0 || source.height() == 0 {
            return Err(CropError::Decode("frame has no pixels".into()));
        }
        Ok(Box::new(RustCropSurface::new(source, options.clone())))
    }
}

struct RustCropSurface {
    source: Option<DynamicImage>,
    dimensions: (u32, u32),
    options: CropOptions,
    quarter_turns: u8,
    flip_horizontal: bool,
    flip_vertical: bool,
    selection: CropBox,
}

impl RustCropSurface {
    fn new(source: DynamicImage, options: CropOptions) -> Self {
        let dimensions = (source.width(), source.height());
        let selection = default_crop_box(dimensions, options.aspect_ratio, options.auto_crop_area);
        Self {
            source: Some(source),
            dimensions,
            options,
            quarter_turns: 0,
            flip_horizontal: false,
            flip_vertical: false,
            selection,
        }
    }

    fn oriented_dimensions(&self) -> (u32, u32) {
        rotated_dimensions(self.dimensions, self.quarter_turns)
    }

    fn set_selection(&mut self, selection: CropBox) {
        self.selection = constrain_box(
            selection,
            self.oriented_dimensions(),
            self.options.view_mode,
        );
    }
}

impl CropSurface for RustCropSurface {
    fn apply(&mut self, action: CropAction) -> bool {
        if self.source.is_none() {
            return false;
        }
        match action {
            CropAction::Move { dx, dy } => {
                if !self.options.movable {
                    return false;
                }
                let moved = match self.options.drag_mode {
                    // Dragging the image right brings content from the left into view
                    DragMode::Move => translate_box(self.selection, -dx, -dy),
                    DragMode::Crop => translate_box(self.selection, dx, dy),
                    DragMode::None => return false,
                };
                self.set_selection(moved);
            }
            CropAction::Zoom(ratio) => {
                if !self.options.zoomable {
                    return false;
                }
                self.set_selection(zoom_box(self.selection, ratio));
            }
            CropAction::Rotate(turns) => {
                if !self.options.rotatable {
                    return false;
                }
                self.quarter_turns = normalize_turns(self.quarter_turns, turns);
                self.selection = default_crop_box(
                    self.oriented_dimensions(),
                    self.options.aspect_ratio,
                    self.options.auto_crop_area,
                );
            }
            CropAction::Flip {
                horizontal,
                vertical,
            } => {
                if !self.options.scalable {
                    return false;
                }
                self.flip_horizontal ^= horizontal;
                self.flip_vertical ^= vertical;
            }
            CropAction::Select(selection) => self.set_selection(selection),
        }
        debug!(?action, selection = ?self.selection, "crop adjusted");
        true
    }

    fn selection(&self) -> CropBox {
        self.selection
    }

    fn render(&self, width: u32, height: u32) -> Result<DynamicImage, CropError> {
        let source = self.source.as_ref().ok_or(CropError::Closed)?;
        if width == 0 || height == 0 {
            return Err(CropError::Render(format!(
                "invalid output size {width}x{height}"
            )));
        }

        let oriented = match self.quarter_turns {
            1 => source.rotate90(),
            2 => source.rotate180(),
            3 => source.rotate270(),
            _ => source.clone(),
        };
        let (x, y, w, h) = pixel_rect(self.selection, self.oriented_dimensions());
        let cropped = oriented.crop_imm(x, y, w, h);

        let mut rendered = cropped.resize_exact(width, height, FilterType::Lanczos3);
        if self.flip_horizontal {
            rendered = rendered.fliph();
        }
        if self.flip_vertical {
            rendered = rendered.flipv();
        }
        Ok(rendered)
    }

    fn destroy(&mut self) {
        self.source = None;
    }
}
