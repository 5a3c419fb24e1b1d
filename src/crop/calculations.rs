//! Pure selection geometry.
//!
//! All functions here are pure and testable without any images.

use super::params::CropBox;

/// Smallest selection edge, in pixels.
const MIN_EDGE: f64 = 1.0;

/// Initial selection for an image: the largest box with `aspect` that fits,
/// scaled by `area`, centered.
///
/// # Examples
/// ```
/// # use fen_capture::crop::calculations::default_crop_box;
/// // Square selection over 90% of a 1000x800 landscape → 720x720 centered
/// let b = default_crop_box((1000, 800), 1.0, 0.9);
/// assert_eq!((b.width, b.height), (720.0, 720.0));
/// assert_eq!((b.x, b.y), (140.0, 40.0));
/// ```
pub fn default_crop_box(image: (u32, u32), aspect: f64, area: f64) -> CropBox {
    let (img_w, img_h) = (image.0 as f64, image.1 as f64);

    let (fit_w, fit_h) = if img_w / img_h > aspect {
        // Image is wider than the selection: height limits
        (img_h * aspect, img_h)
    } else {
        // Image is taller: width limits
        (img_w, img_w / aspect)
    };

    let width = fit_w * area;
    let height = fit_h * area;
    CropBox {
        x: (img_w - width) / 2.0,
        y: (img_h - height) / 2.0,
        width,
        height,
    }
}

/// Keep a selection inside the image (view mode ≥ 1).
///
/// Oversized selections shrink around their center, keeping their aspect
/// ratio, then the box is shifted back inside. View mode `0` is unrestricted.
pub fn constrain_box(selection: CropBox, image: (u32, u32), view_mode: u8) -> CropBox {
    if view_mode == 0 {
        return selection;
    }
    let (img_w, img_h) = (image.0 as f64, image.1 as f64);

    let scale = (img_w / selection.width)
        .min(img_h / selection.height)
        .min(1.0);
    let width = (selection.width * scale).max(MIN_EDGE.min(img_w));
    let height = (selection.height * scale).max(MIN_EDGE.min(img_h));
    let (cx, cy) = selection.center();

    CropBox {
        x: (cx - width / 2.0).clamp(0.0, (img_w - width).max(0.0)),
        y: (cy - height / 2.0).clamp(0.0, (img_h - height).max(0.0)),
        width,
        height,
    }
}

/// Zoom relative to the current view, keeping the selection's center.
///
/// Zooming in by `ratio` makes the selection cover `1 / (1 + ratio)` of its
/// current extent. Ratios at or below `-1` are meaningless and ignored.
pub fn zoom_box(selection: CropBox, ratio: f64) -> CropBox {
    if ratio <= -1.0 || !ratio.is_finite() {
        return selection;
    }
    let factor = 1.0 / (1.0 + ratio);
    let width = (selection.width * factor).max(MIN_EDGE);
    let height = (selection.height * factor).max(MIN_EDGE);
    let (cx, cy) = selection.center();
    CropBox {
        x: cx - width / 2.0,
        y: cy - height / 2.0,
        width,
        height,
    }
}

/// Shift a selection by `(dx, dy)`.
pub fn translate_box(selection: CropBox, dx: f64, dy: f64) -> CropBox {
    CropBox {
        x: selection.x + dx,
        y: selection.y + dy,
        ..selection
    }
}

/// Image dimensions after `quarter_turns` clockwise rotations.
pub fn rotated_dimensions(image: (u32, u32), quarter_turns: u8) -> (u32, u32) {
    if quarter_turns % 2 == 1 {
        (image.1, image.0)
    } else {
        image
    }
}

/// Normalize any quarter-turn count into `0..4`.
pub fn normalize_turns(current: u8, delta: i32) -> u8 {
    (i32::from(current % 4) + delta.rem_euclid(4)).rem_euclid(4) as u8
}

/// Integer pixel rectangle `(x, y, width, height)` covered by a selection,
/// clipped to the image and at least one pixel in each direction.
pub fn pixel_rect(selection: CropBox, image: (u32, u32)) -> (u32, u32, u32, u32) {
    let (img_w, img_h) = image;
    let x = (selection.x.max(0.0).floor() as u32).min(img_w.saturating_sub(1));
    let y = (selection.y.max(0.0).floor() as u32).min(img_h.saturating_sub(1));
    let w = (selection.width.round() as u32).clamp(1, (img_w - x).max(1));
    let h = (selection.height.round() as u32).clamp(1, (img_h - y).max(1));
    (x, y, w, h)
}
