use std::time::SystemTime;

/// Overlay activity counters, reported at shutdown
#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub status_applied: u64,
    pub status_throttled: u64,
    pub indicator_flashes: u64,
    pub surface_errors: u64,
    pub last_applied_time: Option<SystemTime>,
}

impl OverlayStats {
    pub fn record_status_applied(&mut self) {
        self.status_applied += 1;
        self.last_applied_time = Some(SystemTime::now());
    }

    pub fn record_status_throttled(&mut self) {
        self.status_throttled += 1;
    }

    pub fn record_indicator_flash(&mut self) {
        self.indicator_flashes += 1;
    }

    pub fn record_surface_error(&mut self) {
        self.surface_errors += 1;
    }

    /// Share of submitted status candidates that were applied
    pub fn apply_rate(&self) -> f64 {
        let submitted = self.status_applied + self.status_throttled;
        if submitted == 0 {
            0.0
        } else {
            self.status_applied as f64 / submitted as f64
        }
    }
}
