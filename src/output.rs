//! CLI output formatting for the capture lifecycle.
//!
//! # State Display Contract
//!
//! Every [`CaptureState`] has exactly one rendering, chosen by an exhaustive
//! match, so a new state cannot be added without deciding how it looks.
//! Each rendering follows the same two-level pattern:
//!
//! 1. **Header line**: what the user is looking at
//! 2. **Context lines**: indented detail (camera status, FEN, error message)
//!
//! # Output Format
//!
//! ## Completed
//!
//! ```text
//! Position
//!     FEN: rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1
//!
//!     8 r n b q k b n r
//!     7 p p p p p p p p
//!     6 . . . . . . . .
//!     ...
//!     1 R N B Q K B N R
//!       a b c d e f g h
//! ```
//!
//! ## Failed
//!
//! ```text
//! Could not reach the recognition service
//!     service responded with HTTP 500 Internal Server Error
//!     Retry to start over
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes it out. Format functions
//! are pure: no I/O, no side effects.

use crate::config::CaptureConfig;
use crate::error::ErrorInfo;
use crate::machine::{CaptureSnapshot, CaptureState};
use crate::types::{FenResult, NormalizedImage};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

// ============================================================================
// State
// ============================================================================

pub fn format_state(snapshot: &CaptureSnapshot) -> Vec<String> {
    let mut lines = Vec::new();
    match &snapshot.state {
        CaptureState::Idle => {
            lines.push("Ready".to_string());
            lines.push(format!("{}Capture a photo of a chessboard", indent(1)));
        }
        CaptureState::CameraOpen => {
            lines.push("Camera".to_string());
            let status = if snapshot.resources.camera {
                "Live"
            } else {
                "Waiting for camera"
            };
            lines.push(format!("{}{}", indent(1), status));
        }
        CaptureState::ImageCaptured => {
            lines.push("Image captured".to_string());
            lines.push(format!("{}Adjust the crop, then submit", indent(1)));
        }
        CaptureState::Submitting => {
            lines.push("Submitting".to_string());
            lines.push(format!("{}Recognizing position", indent(1)));
        }
        CaptureState::Completed(fen) => {
            lines.push("Position".to_string());
            lines.push(format!("{}FEN: {}", indent(1), fen));
            let board = format_board(fen);
            if !board.is_empty() {
                lines.push(String::new());
                lines.extend(board.into_iter().map(|l| format!("{}{}", indent(1), l)));
            }
        }
        CaptureState::Failed(info) => {
            lines.push(info.title().to_string());
            lines.push(format!("{}{}", indent(1), info.message));
            lines.push(format!("{}Retry to start over", indent(1)));
        }
    }
    lines
}

pub fn print_state(snapshot: &CaptureSnapshot) {
    for line in format_state(snapshot) {
        println!("{}", line);
    }
}

/// Render the piece placement of a FEN as an 8×8 diagram, white at the
/// bottom. Returns no lines when the placement is not a regular board.
pub fn format_board(fen: &FenResult) -> Vec<String> {
    let ranks: Vec<&str> = fen.placement().split('/').collect();
    if ranks.len() != 8 {
        return Vec::new();
    }

    let mut lines = Vec::with_capacity(9);
    for (i, rank) in ranks.iter().enumerate() {
        let mut squares = Vec::with_capacity(8);
        for c in rank.chars() {
            match c.to_digit(10) {
                Some(n) => squares.extend(std::iter::repeat_n('.', n as usize)),
                None if c.is_ascii_alphabetic() => squares.push(c),
                None => return Vec::new(),
            }
        }
        if squares.len() != 8 {
            return Vec::new();
        }
        let row: Vec<String> = squares.iter().map(char::to_string).collect();
        lines.push(format!("{} {}", 8 - i, row.join(" ")));
    }
    lines.push("  a b c d e f g h".to_string());
    lines
}

// ============================================================================
// Notifications
// ============================================================================

/// One-line toast for a failure.
pub fn format_notification(info: &ErrorInfo) -> String {
    format!("[{}] {}", info.kind, info)
}

pub fn print_notification(info: &ErrorInfo) {
    eprintln!("{}", format_notification(info));
}

/// Toast line followed by the view of the state the machine was left in.
pub fn format_failure(info: &ErrorInfo, snapshot: &CaptureSnapshot) -> Vec<String> {
    let mut lines = vec![format_notification(info)];
    lines.extend(format_state(snapshot));
    lines
}

/// Toast to stderr, state view to stdout.
pub fn print_failure(info: &ErrorInfo, snapshot: &CaptureSnapshot) {
    print_notification(info);
    print_state(snapshot);
}

// ============================================================================
// Crop
// ============================================================================

pub fn format_crop_output(image: &NormalizedImage, path: &Path) -> Vec<String> {
    let (width, height) = image.dimensions();
    vec![
        format!("Cropped {}x{}", width, height),
        format!("{}Output: {}", indent(1), path.display()),
        format!("{}{} bytes ({})", indent(1), image.bytes().len(), NormalizedImage::CONTENT_TYPE),
    ]
}

pub fn print_crop_output(image: &NormalizedImage, path: &Path) {
    for line in format_crop_output(image, path) {
        println!("{}", line);
    }
}

// ============================================================================
// Config
// ============================================================================

pub fn format_config(config: &CaptureConfig) -> Vec<String> {
    let crop = &config.crop;
    vec![
        "Service".to_string(),
        format!("{}endpoint: {}", indent(1), config.service.endpoint),
        "Camera".to_string(),
        format!("{}facing: {}", indent(1), config.camera.facing),
        "Crop".to_string(),
        format!("{}aspect ratio: {}", indent(1), crop.aspect_ratio),
        format!("{}view mode: {}", indent(1), crop.view_mode),
        format!("{}drag mode: {}", indent(1), crop.drag_mode),
        format!("{}auto crop area: {}", indent(1), crop.auto_crop_area),
        format!(
            "{}movable: {}, zoomable: {}, scalable: {}, rotatable: {}",
            indent(1),
            crop.movable,
            crop.zoomable,
            crop.scalable,
            crop.rotatable
        ),
        "Output".to_string(),
        format!(
            "{}{}x{} JPEG, quality {}",
            indent(1),
            config.output.size,
            config.output.size,
            config.output.quality
        ),
    ]
}

pub fn print_config(config: &CaptureConfig) {
    for line in format_config(config) {
        println!("{}", line);
    }
}
