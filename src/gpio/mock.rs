use super::{DischargeLine, InputLine};
use crate::error::SensorError;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct MockLineState {
    level: bool,
    driven_low: bool,
    discharges: u32,
    fail_reads: bool,
}

/// Mock line for running without real hardware
///
/// Clones share state, so a test can keep one handle and move the other into
/// the component under test.
#[derive(Debug, Clone)]
pub struct MockLine {
    pin: u32,
    state: Arc<Mutex<MockLineState>>,
}

impl MockLine {
    /// Create a new mock line at the given idle level
    pub fn new(pin: u32, level: bool) -> Self {
        Self {
            pin,
            state: Arc::new(Mutex::new(MockLineState {
                level,
                ..Default::default()
            })),
        }
    }

    /// Set the level the line reports while it is not driven
    pub fn set_level(&self, level: bool) {
        self.state.lock().level = level;
    }

    /// Whether the line is currently driven low as an output
    pub fn is_driven_low(&self) -> bool {
        self.state.lock().driven_low
    }

    /// Number of discharge cycles started on this line
    pub fn discharge_count(&self) -> u32 {
        self.state.lock().discharges
    }

    /// Make every read fail until cleared
    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }
}

impl InputLine for MockLine {
    fn pin(&self) -> u32 {
        self.pin
    }

    fn is_high(&mut self) -> Result<bool, SensorError> {
        let state = self.state.lock();
        if state.fail_reads {
            return Err(SensorError::Gpio {
                pin: self.pin,
                details: "mock read failure".to_string(),
            });
        }
        Ok(!state.driven_low && state.level)
    }
}

impl DischargeLine for MockLine {
    fn drive_low(&mut self) -> Result<(), SensorError> {
        let mut state = self.state.lock();
        state.driven_low = true;
        state.discharges += 1;
        Ok(())
    }

    fn release(&mut self) -> Result<(), SensorError> {
        self.state.lock().driven_low = false;
        Ok(())
    }
}

/// Discharge line that rises after a scripted number of low reads per cycle
///
/// Cycle `n` reports low for `low_reads[n]` reads after release and high afterwards.
/// Once the script runs out the last entry repeats; `None` keeps the line low forever.
#[derive(Debug, Clone)]
pub struct ScriptedLine {
    pin: u32,
    low_reads: Vec<Option<u32>>,
    cycle: Arc<Mutex<(usize, u32)>>,
}

impl ScriptedLine {
    pub fn new(pin: u32, low_reads: Vec<Option<u32>>) -> Self {
        Self {
            pin,
            low_reads,
            cycle: Arc::new(Mutex::new((0, 0))),
        }
    }

    /// Number of completed or in-progress discharge cycles
    pub fn cycles(&self) -> usize {
        self.cycle.lock().0
    }

    fn low_reads_for(&self, cycle: usize) -> Option<u32> {
        match self.low_reads.get(cycle.saturating_sub(1)) {
            Some(reads) => *reads,
            None => self.low_reads.last().copied().flatten(),
        }
    }
}

impl InputLine for ScriptedLine {
    fn pin(&self) -> u32 {
        self.pin
    }

    fn is_high(&mut self) -> Result<bool, SensorError> {
        let (cycle, reads) = {
            let mut guard = self.cycle.lock();
            guard.1 += 1;
            *guard
        };

        Ok(match self.low_reads_for(cycle) {
            Some(limit) => reads > limit,
            None => false,
        })
    }
}

impl DischargeLine for ScriptedLine {
    fn drive_low(&mut self) -> Result<(), SensorError> {
        let mut guard = self.cycle.lock();
        guard.0 += 1;
        guard.1 = 0;
        Ok(())
    }

    fn release(&mut self) -> Result<(), SensorError> {
        Ok(())
    }
}
