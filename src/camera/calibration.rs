use crate::error::CalibrationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Remap grids for one resolution
///
/// `map_x[i]`/`map_y[i]` give the source coordinate sampled for output pixel `i`
/// (row-major). Produced offline by the fisheye calibration tool.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CalibrationEntry {
    pub width: u32,
    pub height: u32,
    pub map_x: Vec<f32>,
    pub map_y: Vec<f32>,
}

#[derive(Debug, Deserialize, Serialize)]
struct CalibrationFile {
    entries: Vec<CalibrationEntry>,
}

impl CalibrationEntry {
    pub fn validate(&self) -> Result<(), CalibrationError> {
        let expected = (self.width as usize) * (self.height as usize);
        for actual in [self.map_x.len(), self.map_y.len()] {
            if actual != expected {
                return Err(CalibrationError::GridSize {
                    width: self.width,
                    height: self.height,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Bilinear remap of an RGB24 image of this entry's size; outside samples are black
    pub fn remap_rgb(&self, src: &[u8]) -> Vec<u8> {
        let (w, h) = (self.width as i64, self.height as i64);
        let mut dst = vec![0u8; src.len()];

        let sample = |x: i64, y: i64, c: usize| -> f32 {
            if x < 0 || y < 0 || x >= w || y >= h {
                0.0
            } else {
                f32::from(src[((y * w + x) * 3) as usize + c])
            }
        };

        for (i, out) in dst.chunks_exact_mut(3).enumerate() {
            let (sx, sy) = (self.map_x[i], self.map_y[i]);
            if !sx.is_finite() || !sy.is_finite() {
                continue;
            }

            let (x0, y0) = (sx.floor(), sy.floor());
            let (fx, fy) = (sx - x0, sy - y0);
            let (x0, y0) = (x0 as i64, y0 as i64);

            for (c, value) in out.iter_mut().enumerate() {
                let top = sample(x0, y0, c) * (1.0 - fx) + sample(x0 + 1, y0, c) * fx;
                let bottom = sample(x0, y0 + 1, c) * (1.0 - fx) + sample(x0 + 1, y0 + 1, c) * fx;
                *value = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
            }
        }

        dst
    }
}

/// Remap grids keyed by resolution, loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct CalibrationTable {
    entries: HashMap<(u32, u32), Arc<CalibrationEntry>>,
}

impl CalibrationTable {
    pub fn from_json(data: &str) -> Result<Self, CalibrationError> {
        let file: CalibrationFile = serde_json::from_str(data).map_err(|e| CalibrationError::Read {
            path: "<inline>".to_string(),
            details: e.to_string(),
        })?;

        let mut entries = HashMap::new();
        for entry in file.entries {
            entry.validate()?;
            let key = (entry.width, entry.height);
            if entries.insert(key, Arc::new(entry)).is_some() {
                return Err(CalibrationError::Duplicate {
                    width: key.0,
                    height: key.1,
                });
            }
        }

        Ok(Self { entries })
    }

    /// Load the table at `path`; a missing file yields `None`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>, CalibrationError> {
        let path = path.as_ref();
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Calibration table {} not found, photos will not be dewarped",
                    path.display()
                );
                return Ok(None);
            }
            Err(e) => {
                return Err(CalibrationError::Read {
                    path: path.display().to_string(),
                    details: e.to_string(),
                })
            }
        };

        let table = Self::from_json(&data).map_err(|e| match e {
            CalibrationError::Read { details, .. } => CalibrationError::Read {
                path: path.display().to_string(),
                details,
            },
            other => other,
        })?;

        info!(
            "Loaded calibration table {} with resolutions {:?}",
            path.display(),
            table.resolutions()
        );
        Ok(Some(table))
    }

    pub fn entry(&self, resolution: (u32, u32)) -> Option<Arc<CalibrationEntry>> {
        self.entries.get(&resolution).cloned()
    }

    pub fn resolutions(&self) -> Vec<(u32, u32)> {
        let mut resolutions: Vec<_> = self.entries.keys().copied().collect();
        resolutions.sort_unstable();
        resolutions
    }
}
