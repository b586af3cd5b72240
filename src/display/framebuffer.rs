use super::{DisplayConverter, OverlaySlot, OverlaySurface};
use crate::error::DisplayError;
use crate::overlay::Bitmap;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info};

/// Composites overlay layers and writes them to an RGB565 framebuffer device
pub struct FramebufferSurface {
    device: File,
    path: String,
    width: u32,
    height: u32,
    layers: BTreeMap<OverlaySlot, Bitmap>,
}

impl FramebufferSurface {
    pub fn open<P: AsRef<Path>>(path: P, size: (u32, u32)) -> Result<Self, DisplayError> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let device = OpenOptions::new()
            .write(true)
            .open(path.as_ref())
            .map_err(|e| DisplayError::Framebuffer {
                details: format!("Failed to open framebuffer {}: {}", path_str, e),
            })?;

        info!(
            "Overlay output on framebuffer {} ({}x{})",
            path_str, size.0, size.1
        );

        Ok(Self {
            device,
            path: path_str,
            width: size.0,
            height: size.1,
            layers: BTreeMap::new(),
        })
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        // BTreeMap iterates in slot order, bottom layer first
        let layers: Vec<&Bitmap> = self.layers.values().collect();
        let rgb24 = DisplayConverter::composite_rgb24(&layers, self.width, self.height)?;
        let rgb565 = DisplayConverter::rgb24_to_rgb565(&rgb24, self.width, self.height)?;

        self.device
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.device.write_all(&rgb565))
            .and_then(|_| self.device.flush())
            .map_err(|e| DisplayError::Framebuffer {
                details: format!("Failed to write framebuffer {}: {}", self.path, e),
            })?;

        debug!("Framebuffer refreshed with {} layers", layers.len());
        Ok(())
    }
}

impl OverlaySurface for FramebufferSurface {
    fn show(&mut self, slot: OverlaySlot, bitmap: &Bitmap) -> Result<(), DisplayError> {
        self.layers.insert(slot, bitmap.clone());
        self.flush()
    }

    fn clear(&mut self, slot: OverlaySlot) -> Result<(), DisplayError> {
        if self.layers.remove(&slot).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}
