//! Ambient light sensing with a photoresistor/RC network on a single GPIO line.
//!
//! A sampler times how long the capacitor takes to recharge after being
//! discharged (longer means darker) and yields one raw reading per cycle.
//! A filter smooths the noisy raw readings into a stable value.

mod filter;
mod polled;
mod threaded;

pub use filter::{median_filter, MeanFilter, MedianFilter, PhotocellFilter};
pub use polled::PolledDischarge;
pub use threaded::ThreadedCounting;

use crate::config::{FilterKind, PhotocellConfig, SamplerKind};
use crate::error::SensorError;
use crate::gpio::DischargeLine;
use std::time::Instant;
use tracing::info;

/// Produces raw light-timing readings, one per discharge cycle
pub trait PhotocellSampler: Send {
    /// Advance the duty cycle without blocking
    ///
    /// Returns `Ok(Some(raw))` when a cycle completed on this call. A stalled cycle is
    /// reported once as `SensorError::Stalled` and restarted automatically.
    fn poll(&mut self, now: Instant) -> Result<Option<f64>, SensorError>;

    /// Stop any background work; the sampler yields nothing afterwards
    fn shutdown(&mut self) {}
}

/// Build the configured sampling strategy around the photocell line
pub fn build_sampler(
    config: &PhotocellConfig,
    line: Box<dyn DischargeLine>,
) -> Result<Box<dyn PhotocellSampler>, SensorError> {
    info!(
        "Photocell on GPIO {} using {:?} sampling",
        line.pin(),
        config.sampler
    );

    Ok(match config.sampler {
        SamplerKind::Polled => Box::new(PolledDischarge::new(line, config)),
        SamplerKind::Threaded => Box::new(ThreadedCounting::spawn(line, config)?),
    })
}

/// Build the configured smoothing strategy
pub fn build_filter(config: &PhotocellConfig) -> Box<dyn PhotocellFilter> {
    match config.filter {
        FilterKind::Median => Box::new(MedianFilter::new(
            config.median_history,
            config.median_window,
            config.median_min_samples,
        )),
        FilterKind::Mean => Box::new(MeanFilter::new(config.mean_window)),
    }
}
