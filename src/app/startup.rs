use super::{Hardware, ShuttercamApp};
use crate::camera::{CalibrationTable, StillCommandCamera};
use crate::config::ShuttercamConfig;
use crate::display::{FramebufferSurface, HeadlessSurface, OverlaySurface};
use crate::error::Result;
use crate::gpio::{RpiDischargeLine, RpiInputLine};
use tracing::{info, warn};

impl ShuttercamApp {
    /// Open the real hardware described by `config` and build the app around it
    pub fn from_config(config: ShuttercamConfig) -> Result<Self> {
        let trigger_line = RpiInputLine::open(config.trigger.pin, config.trigger.active_low)?;
        let photocell_line = RpiDischargeLine::open(config.photocell.pin)?;

        let calibration = match config.camera.calibration_path.as_deref() {
            Some(path) => CalibrationTable::load(path)?
                .and_then(|table| table.entry(config.camera.photo_resolution)),
            None => None,
        };
        let camera = StillCommandCamera::new(&config.camera, calibration);

        let hardware = Hardware {
            trigger_line: Box::new(trigger_line),
            photocell_line: Box::new(photocell_line),
            camera: Box::new(camera),
            surface: open_surface(&config),
        };

        Self::new(config, hardware)
    }
}

fn open_surface(config: &ShuttercamConfig) -> Box<dyn OverlaySurface> {
    if !config.overlay.enabled {
        info!("Overlay disabled, running headless");
        return Box::new(HeadlessSurface::new());
    }

    match FramebufferSurface::open(
        &config.overlay.framebuffer_device,
        config.camera.preview_resolution,
    ) {
        Ok(surface) => Box::new(surface),
        Err(e) => {
            warn!(
                "Failed to open framebuffer {}: {}, running headless",
                config.overlay.framebuffer_device, e
            );
            Box::new(HeadlessSurface::new())
        }
    }
}
