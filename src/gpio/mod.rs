//! Digital lines used by the shutter trigger and the photocell.
//!
//! The trigger only ever reads its line. The photocell line is switched between
//! output-low (discharging the RC network) and input (timing the recharge).

mod mock;
mod rpi;

pub use mock::{MockLine, ScriptedLine};
pub use rpi::{RpiDischargeLine, RpiInputLine};

use crate::error::SensorError;

/// A digital line that can be sampled
pub trait InputLine: Send {
    /// BCM pin number, for diagnostics
    fn pin(&self) -> u32;

    /// Sample the current level
    fn is_high(&mut self) -> Result<bool, SensorError>;
}

/// A bidirectional line that can discharge an RC network and then sense it
pub trait DischargeLine: InputLine {
    /// Switch to output mode and drive the line low
    fn drive_low(&mut self) -> Result<(), SensorError>;

    /// Switch back to input mode so the line floats with the RC network
    fn release(&mut self) -> Result<(), SensorError>;
}
