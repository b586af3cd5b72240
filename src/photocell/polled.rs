use super::PhotocellSampler;
use crate::config::{PhotocellConfig, ReadingUnit};
use crate::error::SensorError;
use crate::gpio::DischargeLine;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Discharging { until: Instant },
    Sensing { started: Instant },
}

/// Times the RC recharge from the control loop itself
///
/// Each call advances the duty cycle by at most one step: discharge for the settle
/// time, release the line and start the clock, then report `now - start` on the first
/// call that sees the line high. The next discharge starts immediately.
pub struct PolledDischarge {
    line: Box<dyn DischargeLine>,
    settle: Duration,
    stall_timeout: Duration,
    unit: ReadingUnit,
    phase: Phase,
}

impl PolledDischarge {
    pub fn new(line: Box<dyn DischargeLine>, config: &PhotocellConfig) -> Self {
        Self {
            line,
            settle: Duration::from_millis(config.settle_ms),
            stall_timeout: Duration::from_millis(config.stall_timeout_ms),
            unit: config.reading_unit,
            phase: Phase::Idle,
        }
    }

    fn start_discharge(&mut self, now: Instant) -> Result<(), SensorError> {
        self.line.drive_low()?;
        self.phase = Phase::Discharging {
            until: now + self.settle,
        };
        Ok(())
    }

    /// Whether a recharge is currently being timed
    pub fn is_sensing(&self) -> bool {
        matches!(self.phase, Phase::Sensing { .. })
    }
}

impl PhotocellSampler for PolledDischarge {
    fn poll(&mut self, now: Instant) -> Result<Option<f64>, SensorError> {
        match self.phase {
            Phase::Idle => {
                self.start_discharge(now)?;
                Ok(None)
            }
            Phase::Discharging { until } => {
                if now >= until {
                    self.line.release()?;
                    self.phase = Phase::Sensing { started: now };
                    trace!("Photocell released, timing recharge");
                }
                Ok(None)
            }
            Phase::Sensing { started } => {
                let elapsed = now.saturating_duration_since(started);

                if self.line.is_high()? {
                    let raw = self.unit.from_duration(elapsed);
                    debug!("Photocell raw reading: {:.3}", raw);
                    self.start_discharge(now)?;
                    return Ok(Some(raw));
                }

                if elapsed > self.stall_timeout {
                    warn!(
                        "Photocell on GPIO {} did not rise within {:?}, restarting cycle",
                        self.line.pin(),
                        self.stall_timeout
                    );
                    self.start_discharge(now)?;
                    return Err(SensorError::Stalled {
                        pin: self.line.pin(),
                        waited: elapsed,
                    });
                }

                Ok(None)
            }
        }
    }
}
