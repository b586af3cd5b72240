use crate::config::TriggerConfig;
use crate::error::SensorError;
use crate::gpio::InputLine;
use std::time::{Duration, Instant};
use tracing::trace;

/// A level change on the shutter input, already translated to pressed/released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEdge {
    pub pressed: bool,
    pub timestamp: Instant,
}

/// Polls the shutter line and reports level changes
///
/// Changes closer than the bounce time to the previous reported edge are held back
/// until the bounce window has passed, mirroring the hardware bounce suppression
/// of the button input.
pub struct TriggerInput {
    line: Box<dyn InputLine>,
    active_low: bool,
    bounce: Duration,
    last_level: Option<bool>,
    last_edge_at: Option<Instant>,
}

impl TriggerInput {
    pub fn new(line: Box<dyn InputLine>, config: &TriggerConfig) -> Self {
        Self {
            line,
            active_low: config.active_low,
            bounce: Duration::from_millis(config.bounce_ms),
            last_level: None,
            last_edge_at: None,
        }
    }

    /// Sample the line once; returns an edge when the level changed
    pub fn poll(&mut self, now: Instant) -> Result<Option<TriggerEdge>, SensorError> {
        let level = self.line.is_high()?;

        let previous = match self.last_level {
            Some(previous) => previous,
            None => {
                self.last_level = Some(level);
                return Ok(None);
            }
        };

        if level == previous {
            return Ok(None);
        }

        if let Some(last) = self.last_edge_at {
            if now.saturating_duration_since(last) < self.bounce {
                trace!("Trigger edge inside bounce window, holding back");
                return Ok(None);
            }
        }

        self.last_level = Some(level);
        self.last_edge_at = Some(now);

        Ok(Some(TriggerEdge {
            pressed: level != self.active_low,
            timestamp: now,
        }))
    }

    pub fn pin(&self) -> u32 {
        self.line.pin()
    }
}
