//! Preview overlays: the static frame, the throttled status readout and the
//! transient focus/recalibration indicator.

mod bitmap;
mod indicator;
mod render;
mod stats;
#[cfg(test)]
mod tests;
mod throttle;

pub use bitmap::Bitmap;
pub use indicator::IndicatorFlash;
pub use render::{StatusContent, StatusRenderer};
pub use stats::OverlayStats;
pub use throttle::OverlayThrottler;
