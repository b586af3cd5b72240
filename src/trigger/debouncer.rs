use crate::config::{LongPressAction, TriggerConfig};
use std::time::{Duration, Instant};
use tracing::debug;

/// What a completed press on the shutter button asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Capture a photo now
    ShortPress,
    /// Recalibrate the photocell baseline now
    LongPress,
}

/// Turns pressed/released edges into press outcomes
///
/// An outcome is produced on release only. Releases that come too soon after the
/// previous completed trigger are treated as contact chatter and dropped.
#[derive(Debug)]
pub struct TriggerDebouncer {
    pressed: bool,
    press_started_at: Option<Instant>,
    last_completed_at: Option<Instant>,
    min_spacing: Duration,
    long_press: Duration,
    long_press_action: LongPressAction,
}

impl TriggerDebouncer {
    pub fn new(config: &TriggerConfig) -> Self {
        Self {
            pressed: false,
            press_started_at: None,
            last_completed_at: None,
            min_spacing: Duration::from_millis(config.debounce_ms),
            long_press: Duration::from_millis(config.long_press_ms),
            long_press_action: config.long_press_action,
        }
    }

    /// Feed one edge; returns the outcome of a completed press, if any
    pub fn on_edge(&mut self, pressed: bool, now: Instant) -> Option<TriggerOutcome> {
        let outcome = match (self.pressed, pressed) {
            (false, true) => {
                self.press_started_at = Some(now);
                None
            }
            (true, false) => self.complete_press(now),
            // Same level as before
            _ => None,
        };

        self.pressed = pressed;
        outcome
    }

    fn complete_press(&mut self, now: Instant) -> Option<TriggerOutcome> {
        if let Some(last) = self.last_completed_at {
            if now.saturating_duration_since(last) <= self.min_spacing {
                debug!("Trigger release debounced");
                return None;
            }
        }

        let held = self
            .press_started_at
            .map(|started| now.saturating_duration_since(started))
            .unwrap_or_default();

        let outcome = if held >= self.long_press
            && self.long_press_action == LongPressAction::Recalibrate
        {
            TriggerOutcome::LongPress
        } else {
            TriggerOutcome::ShortPress
        };

        self.last_completed_at = Some(now);
        debug!("Trigger released after {:?}: {:?}", held, outcome);
        Some(outcome)
    }

    /// Whether the button is currently held
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}
