//! Error classification shared by every component.
//!
//! Each component keeps its own `thiserror` enum ([`CameraError`],
//! [`CropError`], [`SubmitError`]) so it can carry component-specific detail.
//! What leaves a component toward the state machine is always classified into
//! one of five [`ErrorKind`]s; the machine turns that into an [`ErrorInfo`]
//! held by the `Failed` state and handed to the notification surface.
//!
//! [`CameraError`]: crate::camera::CameraError
//! [`CropError`]: crate::crop::CropError
//! [`SubmitError`]: crate::submit::SubmitError

use std::fmt;

/// The five failure classes the UI knows how to present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Camera access refused, or no usable camera device.
    PermissionDenied,
    /// The crop engine could not be mounted.
    CropEngineUnavailable,
    /// Rasterizing, decoding or encoding produced no usable image.
    ImageEncodingFailed,
    /// Transport error or non-2xx status from the prediction service.
    NetworkFailure,
    /// 2xx response that is not JSON or lacks a non-empty `fen`.
    InvalidServerResponse,
}

impl ErrorKind {
    /// Heading for the persistent error view.
    pub fn title(self) -> &'static str {
        match self {
            ErrorKind::PermissionDenied => "Camera unavailable",
            ErrorKind::CropEngineUnavailable => "Cropping unavailable",
            ErrorKind::ImageEncodingFailed => "Could not process image",
            ErrorKind::NetworkFailure => "Could not reach the recognition service",
            ErrorKind::InvalidServerResponse => "Unexpected response from the recognition service",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::PermissionDenied => "permission-denied",
            ErrorKind::CropEngineUnavailable => "crop-engine-unavailable",
            ErrorKind::ImageEncodingFailed => "image-encoding-failed",
            ErrorKind::NetworkFailure => "network-failure",
            ErrorKind::InvalidServerResponse => "invalid-server-response",
        };
        f.write_str(name)
    }
}

/// A fully classified failure: what went wrong (`kind`) and the detail to
/// show alongside it (`message`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn title(&self) -> &'static str {
        self.kind.title()
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.title(), self.message)
    }
}

impl std::error::Error for ErrorInfo {}
