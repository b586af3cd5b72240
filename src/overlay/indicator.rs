use std::time::{Duration, Instant};

/// Timing for the short-lived focus/recalibration indicator
///
/// Showing the indicator never waits; the loop asks on later ticks whether the
/// flash has run its course and clears the slot then.
#[derive(Debug, Clone)]
pub struct IndicatorFlash {
    duration: Duration,
    shown_at: Option<Instant>,
}

impl IndicatorFlash {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            shown_at: None,
        }
    }

    /// Start (or restart) the flash at `now`
    pub fn start(&mut self, now: Instant) {
        self.shown_at = Some(now);
    }

    pub fn is_visible(&self) -> bool {
        self.shown_at.is_some()
    }

    /// Returns true exactly once, on the first call at or after the flash expiry
    pub fn take_expired(&mut self, now: Instant) -> bool {
        match self.shown_at {
            Some(shown_at) if now.saturating_duration_since(shown_at) >= self.duration => {
                self.shown_at = None;
                true
            }
            _ => false,
        }
    }
}
