use super::PhotocellSampler;
use crate::config::PhotocellConfig;
use crate::error::SensorError;
use crate::gpio::DischargeLine;
use crossbeam::channel::{self, Receiver, SendTimeoutError, Sender, TryRecvError, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const TERMINAL_SEND_RETRY: Duration = Duration::from_millis(100);

/// Messages from the counting worker to the control loop
#[derive(Debug, Clone, PartialEq, Eq)]
enum SenseToken {
    /// The line was observed low this many more times
    Low(u32),
    /// The line went high; the cycle is complete
    Complete,
    /// The line stayed low past the stall timeout; the cycle was restarted
    Stalled(Duration),
    /// The line could not be read; the cycle was restarted
    Fault(String),
}

/// Counts polling iterations on a dedicated worker thread
///
/// The worker discharges the line, then counts how many reads it takes before the
/// line rises, streaming counts through a bounded queue. When the queue is full the
/// worker folds further counts into its next token instead of blocking, so no count
/// is lost and the counting rate is unaffected. Cycle terminators use a blocking send.
pub struct ThreadedCounting {
    pin: u32,
    receiver: Receiver<SenseToken>,
    count: u64,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ThreadedCounting {
    /// Start the counting worker for `line`
    pub fn spawn(line: Box<dyn DischargeLine>, config: &PhotocellConfig) -> Result<Self, SensorError> {
        let pin = line.pin();
        let (sender, receiver) = channel::bounded(config.queue_capacity.max(1));
        let stop = Arc::new(AtomicBool::new(false));
        let settle = Duration::from_millis(config.settle_ms);
        let stall_timeout = Duration::from_millis(config.stall_timeout_ms);

        let worker_stop = Arc::clone(&stop);
        let worker = thread::Builder::new()
            .name(format!("photocell-gpio{}", pin))
            .spawn(move || count_discharge_cycles(line, sender, worker_stop, settle, stall_timeout))
            .map_err(|e| SensorError::WorkerSpawn {
                details: e.to_string(),
            })?;

        info!("Photocell counting worker started for GPIO {}", pin);

        Ok(Self {
            pin,
            receiver,
            count: 0,
            stop,
            worker: Some(worker),
        })
    }

    /// Tokens currently waiting in the queue
    pub fn queued(&self) -> usize {
        self.receiver.len()
    }
}

impl PhotocellSampler for ThreadedCounting {
    fn poll(&mut self, _now: Instant) -> Result<Option<f64>, SensorError> {
        loop {
            match self.receiver.try_recv() {
                Ok(SenseToken::Low(n)) => self.count += u64::from(n),
                Ok(SenseToken::Complete) => {
                    let raw = self.count as f64;
                    self.count = 0;
                    debug!("Photocell raw count: {}", raw);
                    return Ok(Some(raw));
                }
                Ok(SenseToken::Stalled(waited)) => {
                    self.count = 0;
                    return Err(SensorError::Stalled {
                        pin: self.pin,
                        waited,
                    });
                }
                Ok(SenseToken::Fault(details)) => {
                    self.count = 0;
                    return Err(SensorError::Gpio {
                        pin: self.pin,
                        details,
                    });
                }
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => return Err(SensorError::WorkerDisconnected),
            }
        }
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Photocell counting worker panicked");
            } else {
                debug!("Photocell counting worker joined");
            }
        }
    }
}

impl Drop for ThreadedCounting {
    fn drop(&mut self) {
        // The worker notices the flag (or the dropped receiver) and exits on its own
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// Worker loop: one discharge/observe cycle after another until stopped
fn count_discharge_cycles(
    mut line: Box<dyn DischargeLine>,
    sender: Sender<SenseToken>,
    stop: Arc<AtomicBool>,
    settle: Duration,
    stall_timeout: Duration,
) {
    while !stop.load(Ordering::Relaxed) {
        let terminal = match observe_cycle(line.as_mut(), &sender, &stop, settle, stall_timeout) {
            Ok(Some(token)) => token,
            Ok(None) => break,
            Err(e) => {
                thread::sleep(settle);
                SenseToken::Fault(e.to_string())
            }
        };

        if !send_terminal(&sender, terminal, &stop) {
            break;
        }
    }

    let _ = line.release();
    debug!("Photocell counting worker for GPIO {} exiting", line.pin());
}

/// Run one cycle; returns the terminating token, or `None` when the worker should exit
fn observe_cycle(
    line: &mut dyn DischargeLine,
    sender: &Sender<SenseToken>,
    stop: &AtomicBool,
    settle: Duration,
    stall_timeout: Duration,
) -> Result<Option<SenseToken>, SensorError> {
    line.drive_low()?;
    thread::sleep(settle);
    line.release()?;

    let started = Instant::now();
    let mut pending: u32 = 0;

    loop {
        if stop.load(Ordering::Relaxed) {
            return Ok(None);
        }

        if line.is_high()? {
            break;
        }

        pending = pending.saturating_add(1);
        match sender.try_send(SenseToken::Low(pending)) {
            Ok(()) => pending = 0,
            Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => return Ok(None),
        }

        let waited = started.elapsed();
        if waited > stall_timeout {
            return Ok(Some(SenseToken::Stalled(waited)));
        }
    }

    if pending > 0 && !send_terminal(sender, SenseToken::Low(pending), stop) {
        return Ok(None);
    }

    Ok(Some(SenseToken::Complete))
}

/// Blocking send that still gives up once the worker is asked to stop
fn send_terminal(sender: &Sender<SenseToken>, token: SenseToken, stop: &AtomicBool) -> bool {
    let mut token = token;
    loop {
        match sender.send_timeout(token, TERMINAL_SEND_RETRY) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(returned)) => {
                if stop.load(Ordering::Relaxed) {
                    return false;
                }
                token = returned;
            }
            Err(SendTimeoutError::Disconnected(_)) => return false,
        }
    }
}
