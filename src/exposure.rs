//! Mapping from stable photocell readings to camera exposure parameters.

use crate::config::{CompensationScale, ExposureConfig, ExposurePolicyKind};
use std::fmt;
use tracing::{debug, info};

/// Camera exposure parameter produced for one stable reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureSetting {
    /// Absolute shutter speed in microseconds
    ShutterSpeed { micros: u32 },
    /// Exposure compensation steps relative to the auto-exposure result
    Compensation { value: i32 },
}

impl fmt::Display for ExposureSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExposureSetting::ShutterSpeed { micros } => {
                write!(f, "{} ms", (u64::from(*micros) + 500) / 1000)
            }
            ExposureSetting::Compensation { value } if *value > 0 => write!(f, "+{}", value),
            ExposureSetting::Compensation { value } if *value < 0 => write!(f, "{}", value),
            ExposureSetting::Compensation { .. } => write!(f, "±0"),
        }
    }
}

/// Reference reading the compensation policy measures against
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Baseline {
    /// Takes the value of the next stable reading
    Uninitialized,
    Value(f64),
}

/// Linear map from a clamped reading range onto a shutter speed range
#[derive(Debug, Clone, PartialEq)]
pub struct ShutterSpeedPolicy {
    min_reading: f64,
    max_reading: f64,
    min_shutter_us: u32,
    shutter_span_us: u32,
}

impl ShutterSpeedPolicy {
    pub fn new(config: &ExposureConfig) -> Self {
        Self {
            min_reading: config.min_reading,
            max_reading: config.max_reading,
            min_shutter_us: config.min_shutter_us,
            shutter_span_us: config.shutter_span_us,
        }
    }

    /// Position of `reading` within the calibrated range, clamped to [0, 1]
    pub fn fraction(&self, reading: f64) -> f64 {
        ((reading - self.min_reading) / (self.max_reading - self.min_reading)).clamp(0.0, 1.0)
    }

    pub fn shutter_us(&self, reading: f64) -> u32 {
        let span = self.fraction(reading) * f64::from(self.shutter_span_us);
        self.min_shutter_us.saturating_add(span.round() as u32)
    }
}

/// Compensation proportional to the deviation from the baseline
#[derive(Debug, Clone, PartialEq)]
pub struct CompensationPolicy {
    span: f64,
    scale: CompensationScale,
}

impl CompensationPolicy {
    pub fn new(config: &ExposureConfig) -> Self {
        Self {
            span: config.compensation_span,
            scale: config.compensation_scale,
        }
    }

    /// Deviation from the baseline in spans, clamped to [-1, 1]
    pub fn delta(&self, reading: f64, baseline: f64) -> f64 {
        ((reading - baseline) / self.span).clamp(-1.0, 1.0)
    }

    pub fn compensation(&self, reading: f64, baseline: f64) -> i32 {
        let delta = self.delta(reading, baseline);
        match self.scale {
            CompensationScale::Symmetric => (delta * 25.0).round() as i32,
            CompensationScale::Offset => (delta * 50.0).round() as i32 - 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Policy {
    ShutterSpeed(ShutterSpeedPolicy),
    Compensation(CompensationPolicy),
}

/// Owns the exposure policy and the baseline it may depend on
#[derive(Debug, Clone)]
pub struct ExposureController {
    policy: Policy,
    baseline: Baseline,
    last_stable: Option<f64>,
    current: Option<ExposureSetting>,
}

impl ExposureController {
    pub fn new(config: &ExposureConfig) -> Self {
        let policy = match config.policy {
            ExposurePolicyKind::ShutterSpeed => Policy::ShutterSpeed(ShutterSpeedPolicy::new(config)),
            ExposurePolicyKind::Compensation => Policy::Compensation(CompensationPolicy::new(config)),
        };

        Self {
            policy,
            baseline: Baseline::Uninitialized,
            last_stable: None,
            current: None,
        }
    }

    /// Map a stable reading to the camera parameter
    pub fn update(&mut self, stable: f64) -> ExposureSetting {
        self.last_stable = Some(stable);

        let setting = match &self.policy {
            Policy::ShutterSpeed(policy) => ExposureSetting::ShutterSpeed {
                micros: policy.shutter_us(stable),
            },
            Policy::Compensation(policy) => {
                let baseline = match self.baseline {
                    Baseline::Value(value) => value,
                    Baseline::Uninitialized => {
                        info!("Photocell baseline initialized to {:.4}", stable);
                        self.baseline = Baseline::Value(stable);
                        stable
                    }
                };
                ExposureSetting::Compensation {
                    value: policy.compensation(stable, baseline),
                }
            }
        };

        if self.current != Some(setting) {
            debug!("Exposure changed to {} (reading {:.3})", setting, stable);
        }
        self.current = Some(setting);
        setting
    }

    /// Whether the active policy measures against a baseline
    ///
    /// Only the compensation policy does; recalibrating under the shutter speed
    /// policy has no effect on the settings produced.
    pub fn uses_baseline(&self) -> bool {
        matches!(self.policy, Policy::Compensation(_))
    }

    /// Re-anchor the baseline on the latest stable reading
    pub fn recalibrate(&mut self) -> Baseline {
        self.baseline = match self.last_stable {
            Some(stable) => Baseline::Value(stable),
            None => Baseline::Uninitialized,
        };
        info!("Photocell baseline recalibrated: {:?}", self.baseline);
        self.baseline
    }

    pub fn baseline(&self) -> Baseline {
        self.baseline
    }

    /// Most recent setting, if any reading has been mapped yet
    pub fn current(&self) -> Option<ExposureSetting> {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shutter_config() -> ExposureConfig {
        ExposureConfig::default()
    }

    fn compensation_config(scale: CompensationScale) -> ExposureConfig {
        ExposureConfig {
            policy: ExposurePolicyKind::Compensation,
            compensation_scale: scale,
            ..ExposureConfig::default()
        }
    }

    #[test]
    fn test_shutter_speed_clamps_range() {
        let policy = ShutterSpeedPolicy::new(&shutter_config());

        assert_eq!(policy.shutter_us(5.0), 2000);
        assert_eq!(policy.shutter_us(20.0), 2000);
        assert_eq!(policy.shutter_us(300.0), 1_252_000);
        assert_eq!(policy.shutter_us(10_000.0), 1_252_000);
    }

    #[test]
    fn test_shutter_speed_midpoint() {
        let policy = ShutterSpeedPolicy::new(&shutter_config());
        assert!((policy.fraction(160.0) - 0.5).abs() < 1e-12);
        assert_eq!(policy.shutter_us(160.0), 627_000);
    }

    #[test]
    fn test_shutter_controller_ignores_baseline() {
        let mut controller = ExposureController::new(&shutter_config());
        assert_eq!(
            controller.update(160.0),
            ExposureSetting::ShutterSpeed { micros: 627_000 }
        );
        assert_eq!(controller.baseline(), Baseline::Uninitialized);
    }

    #[test]
    fn test_baseline_self_initializes() {
        let mut controller = ExposureController::new(&compensation_config(CompensationScale::Symmetric));
        assert_eq!(controller.baseline(), Baseline::Uninitialized);

        let setting = controller.update(0.015);
        assert_eq!(setting, ExposureSetting::Compensation { value: 0 });
        assert_eq!(controller.baseline(), Baseline::Value(0.015));
    }

    #[test]
    fn test_compensation_symmetric_scale() {
        let config = ExposureConfig {
            compensation_span: 0.25,
            ..compensation_config(CompensationScale::Symmetric)
        };
        let mut controller = ExposureController::new(&config);
        controller.update(1.0);

        // Half a span darker
        assert_eq!(
            controller.update(1.125),
            ExposureSetting::Compensation { value: 13 }
        );
        // Beyond the span saturates
        assert_eq!(
            controller.update(5.0),
            ExposureSetting::Compensation { value: 25 }
        );
        assert_eq!(
            controller.update(0.0),
            ExposureSetting::Compensation { value: -25 }
        );
    }

    #[test]
    fn test_compensation_offset_scale() {
        let policy = CompensationPolicy::new(&compensation_config(CompensationScale::Offset));
        assert_eq!(policy.compensation(0.1, 0.1), -25);
        assert_eq!(policy.compensation(1.0, 0.1), 25);
        assert_eq!(policy.compensation(0.0, 0.1), -75);
    }

    #[test]
    fn test_recalibrate_uses_latest_reading() {
        let mut controller = ExposureController::new(&compensation_config(CompensationScale::Symmetric));
        controller.update(0.010);
        controller.update(0.030);

        assert_eq!(controller.recalibrate(), Baseline::Value(0.030));
        assert_eq!(
            controller.update(0.030),
            ExposureSetting::Compensation { value: 0 }
        );
    }

    #[test]
    fn test_recalibrate_without_readings_resets() {
        let mut controller = ExposureController::new(&compensation_config(CompensationScale::Symmetric));
        assert_eq!(controller.recalibrate(), Baseline::Uninitialized);
        controller.update(0.2);
        assert_eq!(controller.baseline(), Baseline::Value(0.2));
    }

    #[test]
    fn test_only_compensation_uses_baseline() {
        assert!(!ExposureController::new(&shutter_config()).uses_baseline());
        assert!(
            ExposureController::new(&compensation_config(CompensationScale::Offset)).uses_baseline()
        );
    }

    #[test]
    fn test_setting_labels() {
        assert_eq!(ExposureSetting::ShutterSpeed { micros: 627_000 }.to_string(), "627 ms");
        assert_eq!(ExposureSetting::ShutterSpeed { micros: 2_600 }.to_string(), "3 ms");
        assert_eq!(ExposureSetting::Compensation { value: 7 }.to_string(), "+7");
        assert_eq!(ExposureSetting::Compensation { value: -3 }.to_string(), "-3");
        assert_eq!(ExposureSetting::Compensation { value: 0 }.to_string(), "±0");
    }
}
