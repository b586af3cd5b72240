//! Still capture and live preview: the camera collaborator the control loop drives.

mod calibration;
mod preview;
mod still;
#[cfg(test)]
mod tests;

pub use calibration::{CalibrationEntry, CalibrationTable};
pub use preview::{MjpegSplitter, PreviewStream};
pub use still::StillCommandCamera;

use crate::error::CameraError;
use crate::exposure::ExposureSetting;
use crate::overlay::Bitmap;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Result of one capture
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    pub path: PathBuf,
    /// Downscaled copy for on-screen review, when one could be produced
    pub review: Option<Bitmap>,
}

#[async_trait]
pub trait Camera: Send {
    /// Exposure to use for the next capture
    fn set_exposure(&mut self, setting: ExposureSetting);

    /// Start the live preview, if this camera has one
    async fn start_preview(&mut self) -> Result<(), CameraError> {
        Ok(())
    }

    /// Stop the live preview
    async fn stop_preview(&mut self) {}

    /// Newest preview frame not returned before
    fn take_preview_frame(&mut self) -> Option<Bitmap> {
        None
    }

    /// Capture a still to `path`
    async fn capture(&mut self, path: &Path) -> Result<CapturedPhoto, CameraError>;
}
