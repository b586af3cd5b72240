use super::Bitmap;
use crate::config::OverlayConfig;
use std::time::{Duration, Instant};
use tracing::trace;

/// Hard rate limit on status overlay replacement
///
/// The display stack degrades when its overlay buffers are swapped at a high rate, so a
/// candidate is only applied once `min_interval` has passed since the last applied one.
/// Rejected candidates are dropped; the displayed bitmap stays as it was.
#[derive(Debug, Clone)]
pub struct OverlayThrottler {
    min_interval: Duration,
    last_applied_at: Option<Instant>,
    displayed: Option<Bitmap>,
}

impl OverlayThrottler {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_applied_at: None,
            displayed: None,
        }
    }

    pub fn from_config(config: &OverlayConfig) -> Self {
        Self::new(Duration::from_millis(config.min_interval_ms))
    }

    /// Whether a candidate submitted at `now` would be applied
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_applied_at {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.min_interval,
        }
    }

    /// Apply `bitmap` if the interval has elapsed; returns true when applied
    pub fn try_update(&mut self, bitmap: Bitmap, now: Instant) -> bool {
        if !self.is_due(now) {
            trace!("Status overlay update throttled");
            return false;
        }

        self.displayed = Some(bitmap);
        self.last_applied_at = Some(now);
        true
    }

    /// Currently displayed status bitmap
    pub fn displayed(&self) -> Option<&Bitmap> {
        self.displayed.as_ref()
    }

    pub fn last_applied_at(&self) -> Option<Instant> {
        self.last_applied_at
    }
}
