//! Camera resource management.
//!
//! A [`CameraDevice`] hands out [`MediaStream`]s; the [`CameraManager`] binds
//! one to a [`VideoSurface`], starts playback and wraps the result in a
//! [`CameraSession`]. The session is the only owner of the stream: releasing
//! it stops every track and detaches the surface, and dropping it does the
//! same.
//!
//! | Operation | Result |
//! |---|---|
//! | [`CameraManager::acquire`] | live session, or a classified error with nothing left allocated |
//! | [`CameraManager::release`] | idempotent; `None` is a no-op |
//! | [`CameraManager::capture_frame`] | PNG still at the surface's native resolution |

pub mod file;

pub use file::FileCamera;

use crate::error::{ErrorInfo, ErrorKind};
use crate::types::CapturedFrame;
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failure reported by a device when a stream is requested.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("camera access was denied")]
    Denied,
    #[error("no camera device found")]
    NotFound,
    #[error("camera device failed: {0}")]
    Failed(String),
}

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("camera access was denied")]
    PermissionDenied,
    #[error("no camera device found")]
    NoDevice,
    #[error("camera device failed: {0}")]
    Device(String),
    #[error("video playback could not start: {0}")]
    Playback(String),
    #[error("the video surface has no frame yet")]
    NoFrame,
    #[error("failed to encode captured frame: {0}")]
    Encode(String),
}

impl CameraError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CameraError::PermissionDenied
            | CameraError::NoDevice
            | CameraError::Device(_)
            | CameraError::Playback(_) => ErrorKind::PermissionDenied,
            CameraError::NoFrame | CameraError::Encode(_) => ErrorKind::ImageEncodingFailed,
        }
    }

    /// The permission outcome this failure implies.
    pub fn permission(&self) -> Permission {
        match self {
            CameraError::PermissionDenied => Permission::Denied,
            _ => Permission::Unknown,
        }
    }
}

impl From<DeviceError> for CameraError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::Denied => CameraError::PermissionDenied,
            DeviceError::NotFound => CameraError::NoDevice,
            DeviceError::Failed(msg) => CameraError::Device(msg),
        }
    }
}

impl From<CameraError> for ErrorInfo {
    fn from(err: CameraError) -> Self {
        ErrorInfo::new(err.kind(), err.to_string())
    }
}

/// Which way the requested camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Rear camera, pointing away from the user.
    #[default]
    Environment,
    User,
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Facing::Environment => "environment",
            Facing::User => "user",
        })
    }
}

/// What a stream request asks the device for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing: Facing,
    pub audio: bool,
}

impl StreamConstraints {
    pub fn video(facing: Facing) -> Self {
        Self {
            facing,
            audio: false,
        }
    }
}

/// Permission outcome of a camera request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    Unknown,
}

/// A live stream of video tracks handed out by a [`CameraDevice`].
pub trait MediaStream: Send {
    /// Number of tracks still running.
    fn live_tracks(&self) -> usize;

    /// Stop every track. Must be safe to call more than once.
    fn stop_all_tracks(&mut self);

    /// The frame currently being shown, if the stream has produced one.
    fn current_frame(&mut self) -> Option<DynamicImage>;
}

/// A source of camera streams.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    async fn open_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, DeviceError>;
}

/// The surface a stream is attached to for playback.
#[derive(Default)]
pub struct VideoSurface {
    stream: Option<Box<dyn MediaStream>>,
    playing: bool,
}

impl VideoSurface {
    fn attach(&mut self, stream: Box<dyn MediaStream>) {
        self.stream = Some(stream);
        self.playing = false;
    }

    fn play(&mut self) -> Result<(), CameraError> {
        match &self.stream {
            Some(stream) if stream.live_tracks() > 0 => {
                self.playing = true;
                Ok(())
            }
            Some(_) => Err(CameraError::Playback("stream has no live video track".into())),
            None => Err(CameraError::Playback("no stream attached".into())),
        }
    }

    fn detach(&mut self) -> Option<Box<dyn MediaStream>> {
        self.playing = false;
        self.stream.take()
    }

    fn rasterize(&mut self) -> Option<DynamicImage> {
        if !self.playing {
            return None;
        }
        self.stream.as_mut().and_then(|s| s.current_frame())
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

/// An acquired camera: a stream bound to a playing surface.
pub struct CameraSession {
    surface: VideoSurface,
    permission: Permission,
}

impl CameraSession {
    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// Whether the session still holds running tracks.
    pub fn is_live(&self) -> bool {
        self.surface
            .stream
            .as_ref()
            .is_some_and(|s| s.live_tracks() > 0)
    }

    fn release(&mut self) {
        if let Some(mut stream) = self.surface.detach() {
            stream.stop_all_tracks();
            info!("camera session released");
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraSession")
            .field("permission", &self.permission)
            .field("playing", &self.surface.playing)
            .field("live", &self.is_live())
            .finish()
    }
}

/// Acquires, releases and captures from camera sessions on one device.
#[derive(Clone)]
pub struct CameraManager {
    device: Arc<dyn CameraDevice>,
    constraints: StreamConstraints,
}

impl CameraManager {
    pub fn new(device: Arc<dyn CameraDevice>, facing: Facing) -> Self {
        Self {
            device,
            constraints: StreamConstraints::video(facing),
        }
    }

    /// Request a stream and start playing it.
    pub async fn acquire(&self) -> Result<CameraSession, CameraError> {
        debug!(facing = ?self.constraints.facing, "requesting camera stream");
        let stream = self
            .device
            .open_stream(&self.constraints)
            .await
            .map_err(CameraError::from)
            .inspect_err(|e| warn!(error = %e, "camera request failed"))?;

        let mut surface = VideoSurface::default();
        surface.attach(stream);
        if let Err(e) = surface.play() {
            if let Some(mut stream) = surface.detach() {
                stream.stop_all_tracks();
            }
            warn!(error = %e, "camera playback failed");
            return Err(e);
        }

        info!("camera session acquired");
        Ok(CameraSession {
            surface,
            permission: Permission::Granted,
        })
    }

    /// Stop every track and detach the surface. Safe on released or absent sessions.
    pub fn release(&self, session: Option<&mut CameraSession>) {
        if let Some(session) = session {
            session.release();
        }
    }

    /// Rasterize the current surface frame at its native resolution.
    pub fn capture_frame(&self, session: &mut CameraSession) -> Result<CapturedFrame, CameraError> {
        let frame = session.surface.rasterize().ok_or(CameraError::NoFrame)?;
        if frame.width() == 0 || frame.height() == 0 {
            return Err(CameraError::NoFrame);
        }
        let (width, height) = (frame.width(), frame.height());
        let rgb = DynamicImage::ImageRgb8(frame.to_rgb8());

        let mut buf = Cursor::new(Vec::new());
        rgb.write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| CameraError::Encode(e.to_string()))?;
        let png = buf.into_inner();
        if png.is_empty() {
            return Err(CameraError::Encode("encoder produced no data".into()));
        }

        debug!(width, height, bytes = png.len(), "frame captured");
        Ok(CapturedFrame::new(png, width, height))
    }
}
