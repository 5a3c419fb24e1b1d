//! A camera device backed by a photo on disk.
//!
//! The stream has a single video track that keeps showing the decoded photo
//! until it is stopped. Used by the CLI, and handy anywhere a real device is
//! not available.

use super::{CameraDevice, DeviceError, MediaStream, StreamConstraints};
use async_trait::async_trait;
use image::DynamicImage;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;
use tracing::debug;

pub struct FileCamera {
    path: PathBuf,
}

impl FileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

struct StillStream {
    frame: Option<DynamicImage>,
}

impl MediaStream for StillStream {
    fn live_tracks(&self) -> usize {
        usize::from(self.frame.is_some())
    }

    fn stop_all_tracks(&mut self) {
        self.frame = None;
    }

    fn current_frame(&mut self) -> Option<DynamicImage> {
        self.frame.clone()
    }
}

#[async_trait]
impl CameraDevice for FileCamera {
    async fn open_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, DeviceError> {
        debug!(path = %self.path.display(), facing = ?constraints.facing, "opening file camera");
        let data = tokio::fs::read(&self.path).await.map_err(|e| match e.kind() {
            IoErrorKind::NotFound => DeviceError::NotFound,
            IoErrorKind::PermissionDenied => DeviceError::Denied,
            _ => DeviceError::Failed(format!("{}: {e}", self.path.display())),
        })?;
        let frame = image::load_from_memory(&data).map_err(|e| {
            DeviceError::Failed(format!("Failed to decode {}: {e}", self.path.display()))
        })?;
        Ok(Box::new(StillStream { frame: Some(frame) }))
    }
}
