use super::{CalibrationEntry, Camera, CapturedPhoto, PreviewStream};
use crate::config::{CameraConfig, Rotation};
use crate::error::CameraError;
use crate::exposure::ExposureSetting;
use crate::overlay::Bitmap;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Exposure arguments shared by the still and preview commands
pub(super) fn exposure_args(exposure: Option<ExposureSetting>) -> Vec<String> {
    match exposure {
        Some(ExposureSetting::ShutterSpeed { micros }) => {
            vec!["--shutter".to_string(), micros.to_string()]
        }
        Some(ExposureSetting::Compensation { value }) => {
            // Compensation steps are sixths of a stop
            vec!["--ev".to_string(), format!("{:.2}", f64::from(value) / 6.0)]
        }
        None => Vec::new(),
    }
}

/// Captures stills by running an rpicam-still compatible command
///
/// The command owns the sensor only for the duration of one capture, so a running
/// preview stream is stopped first and restarted once the command exits. The photo
/// is then optionally dewarped in place and a review copy is produced.
pub struct StillCommandCamera {
    program: String,
    leading_args: Vec<String>,
    resolution: (u32, u32),
    preview_resolution: (u32, u32),
    quality: u8,
    gain: f32,
    rotation: Option<Rotation>,
    exposure: Option<ExposureSetting>,
    calibration: Option<Arc<CalibrationEntry>>,
    preview: Option<PreviewStream>,
}

impl StillCommandCamera {
    pub fn new(config: &CameraConfig, calibration: Option<Arc<CalibrationEntry>>) -> Self {
        let mut parts = config.still_command.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_else(|| "rpicam-still".to_string());
        let leading_args = parts.collect();

        if calibration.is_none() {
            info!(
                "No calibration for {}x{}, photos are saved as captured",
                config.photo_resolution.0, config.photo_resolution.1
            );
        } else if cfg!(not(feature = "imaging")) {
            warn!("Built without imaging support, calibration will not be applied");
        }

        Self {
            program,
            leading_args,
            resolution: config.photo_resolution,
            preview_resolution: config.preview_resolution,
            quality: config.jpeg_quality,
            gain: config.gain,
            rotation: config.rotation,
            exposure: None,
            calibration,
            preview: config.preview_enabled.then(|| PreviewStream::new(config)),
        }
    }

    /// Exposure the next capture will use
    pub fn exposure(&self) -> Option<ExposureSetting> {
        self.exposure
    }

    /// Arguments for one capture to `path`
    pub fn capture_args(&self, path: &Path) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.extend([
            "--nopreview".to_string(),
            "--immediate".to_string(),
            "--width".to_string(),
            self.resolution.0.to_string(),
            "--height".to_string(),
            self.resolution.1.to_string(),
            "--quality".to_string(),
            self.quality.to_string(),
            "--gain".to_string(),
            format!("{:.2}", self.gain),
        ]);

        if let Some(rotation) = self.rotation {
            args.push("--rotation".to_string());
            args.push(rotation.degrees().to_string());
        }

        args.extend(exposure_args(self.exposure));
        args.push("-o".to_string());
        args.push(path.to_string_lossy().to_string());
        args
    }

    async fn run_command(&self, path: &Path) -> Result<(), CameraError> {
        let args = self.capture_args(path);
        debug!("Running {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|source| CameraError::Launch {
                command: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CameraError::CommandFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !path.exists() {
            return Err(CameraError::MissingOutput {
                path: path.display().to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Camera for StillCommandCamera {
    fn set_exposure(&mut self, setting: ExposureSetting) {
        if self.exposure != Some(setting) {
            debug!("Camera exposure set to {}", setting);
        }
        self.exposure = Some(setting);
    }

    async fn start_preview(&mut self) -> Result<(), CameraError> {
        match self.preview.as_mut() {
            Some(preview) => preview.start(self.exposure),
            None => Ok(()),
        }
    }

    async fn stop_preview(&mut self) {
        if let Some(preview) = self.preview.as_mut() {
            preview.stop().await;
        }
    }

    fn take_preview_frame(&mut self) -> Option<Bitmap> {
        self.preview.as_mut()?.take_frame()
    }

    async fn capture(&mut self, path: &Path) -> Result<CapturedPhoto, CameraError> {
        let resume_preview = match self.preview.as_mut() {
            Some(preview) if preview.is_running() => {
                preview.stop().await;
                true
            }
            _ => false,
        };

        let result = self.run_command(path).await;

        if resume_preview {
            if let Err(e) = self.start_preview().await {
                warn!("Failed to restart preview after capture: {}", e);
            }
        }

        result?;
        info!("Photo captured to {}", path.display());

        let review = post_process(
            path,
            self.calibration.clone(),
            self.quality,
            self.preview_resolution,
        )
        .await?;

        Ok(CapturedPhoto {
            path: path.to_path_buf(),
            review,
        })
    }
}

/// Dewarp in place (fatal on failure) and build the review copy (best effort)
#[cfg(feature = "imaging")]
async fn post_process(
    path: &Path,
    calibration: Option<Arc<CalibrationEntry>>,
    quality: u8,
    preview: (u32, u32),
) -> Result<Option<Bitmap>, CameraError> {
    let owned_path = path.to_path_buf();
    tokio::task::spawn_blocking(move || imaging::process_photo(&owned_path, calibration.as_deref(), quality, preview))
        .await
        .map_err(|e| CameraError::PostProcess {
            path: path.display().to_string(),
            details: format!("Post-processing task failed: {}", e),
        })?
}

#[cfg(not(feature = "imaging"))]
async fn post_process(
    _path: &Path,
    _calibration: Option<Arc<CalibrationEntry>>,
    _quality: u8,
    _preview: (u32, u32),
) -> Result<Option<Bitmap>, CameraError> {
    Ok(None)
}

#[cfg(feature = "imaging")]
mod imaging {
    use super::CalibrationEntry;
    use crate::error::CameraError;
    use crate::overlay::Bitmap;
    use image::codecs::jpeg::JpegEncoder;
    use image::imageops::FilterType;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::fs;
    use std::io::BufWriter;
    use std::path::Path;
    use tracing::{debug, warn};

    fn post_process_error(path: &Path, details: String) -> CameraError {
        CameraError::PostProcess {
            path: path.display().to_string(),
            details,
        }
    }

    pub(super) fn process_photo(
        path: &Path,
        calibration: Option<&CalibrationEntry>,
        quality: u8,
        preview: (u32, u32),
    ) -> Result<Option<Bitmap>, CameraError> {
        let decoded = fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|data| {
                image::load_from_memory_with_format(&data, ImageFormat::Jpeg).map_err(|e| e.to_string())
            });

        let photo = match (decoded, calibration) {
            (Ok(img), _) => img.to_rgb8(),
            (Err(details), Some(_)) => {
                return Err(post_process_error(path, format!("Failed to decode photo: {}", details)))
            }
            (Err(details), None) => {
                warn!("Skipping review of {}: {}", path.display(), details);
                return Ok(None);
            }
        };

        let photo = match calibration {
            Some(entry) => dewarp(path, photo, entry, quality)?,
            None => photo,
        };

        let review = image::imageops::resize(&photo, preview.0, preview.1, FilterType::Triangle);
        let rgba = DynamicImage::ImageRgb8(review).to_rgba8();
        match Bitmap::from_rgba(preview.0, preview.1, rgba.into_raw()) {
            Ok(bitmap) => Ok(Some(bitmap)),
            Err(e) => {
                warn!("Skipping review of {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    fn dewarp(path: &Path, photo: RgbImage, entry: &CalibrationEntry, quality: u8) -> Result<RgbImage, CameraError> {
        if photo.dimensions() != (entry.width, entry.height) {
            return Err(post_process_error(
                path,
                format!(
                    "Photo is {}x{}, calibration is {}x{}",
                    photo.width(),
                    photo.height(),
                    entry.width,
                    entry.height
                ),
            ));
        }

        let remapped = entry.remap_rgb(photo.as_raw());
        let remapped = RgbImage::from_raw(entry.width, entry.height, remapped)
            .ok_or_else(|| post_process_error(path, "Remapped buffer has the wrong size".to_string()))?;

        let file = fs::File::create(path).map_err(|e| post_process_error(path, e.to_string()))?;
        let mut writer = BufWriter::new(file);
        JpegEncoder::new_with_quality(&mut writer, quality)
            .encode_image(&remapped)
            .map_err(|e| post_process_error(path, format!("Failed to encode photo: {}", e)))?;

        debug!("Dewarped photo {}", path.display());
        Ok(remapped)
    }
}
