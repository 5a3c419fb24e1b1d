//! Parameter types for crop sessions.
//!
//! These describe *what* the crop surface should do, not *how*. They sit
//! between the [`session`](super::session) (which drives a crop) and the
//! [`engine`](super::engine) (which does the pixel work), so engines can be
//! swapped (e.g. for a mock in tests) without touching session logic.
//!
//! ## Types
//!
//! - [`CropOptions`]: Construction options for the crop surface. Loaded from the `[crop]` config table.
//! - [`OutputSpec`]: Size and JPEG quality of the finalized image.
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`CropBox`]: A selection rectangle in source-image pixels.
//! - [`CropAction`]: One user adjustment of the selection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// What dragging on the image does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragMode {
    /// Dragging moves the selection box itself.
    Crop,
    /// Dragging moves the image underneath the selection.
    #[default]
    Move,
    /// Dragging does nothing.
    None,
}

impl fmt::Display for DragMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DragMode::Crop => "crop",
            DragMode::Move => "move",
            DragMode::None => "none",
        })
    }
}

/// Crop surface construction options.
///
/// `view_mode` follows the usual crop-widget convention: `0` leaves the
/// selection unrestricted, `1` and above keep it inside the image.
/// `background` only affects how an interactive surface is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropOptions {
    /// Selection width / height. `1.0` for a square board.
    pub aspect_ratio: f64,
    pub view_mode: u8,
    pub drag_mode: DragMode,
    pub background: bool,
    /// Share of the image the initial selection covers (0–1].
    pub auto_crop_area: f64,
    pub movable: bool,
    pub zoomable: bool,
    pub scalable: bool,
    pub rotatable: bool,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            aspect_ratio: 1.0,
            view_mode: 1,
            drag_mode: DragMode::Move,
            background: false,
            auto_crop_area: 0.9,
            movable: true,
            zoomable: true,
            scalable: true,
            rotatable: true,
        }
    }
}

/// Shape of the finalized image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSpec {
    /// Edge length of the square output, in pixels.
    pub size: u32,
    pub quality: Quality,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            size: 512,
            quality: Quality::default(),
        }
    }
}

/// Selection rectangle in (oriented) source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropBox {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A single adjustment applied to a live crop surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropAction {
    /// Drag by `(dx, dy)` pixels; what moves depends on [`DragMode`].
    Move { dx: f64, dy: f64 },
    /// Relative zoom: positive zooms in, negative zooms out.
    Zoom(f64),
    /// Rotate the image by quarter turns (positive = clockwise).
    Rotate(i32),
    /// Mirror the output.
    Flip { horizontal: bool, vertical: bool },
    /// Replace the selection outright.
    Select(CropBox),
}
