use crate::exposure::ExposureSetting;
use crate::trigger::TriggerOutcome;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Why the control loop stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    Signal(String),
    UserRequest,
    Error(String),
}

/// Shared stop request for the control loop
///
/// The first reason recorded wins; later requests only cancel.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    token: CancellationToken,
    reason: Arc<Mutex<Option<ShutdownReason>>>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, reason: ShutdownReason) {
        {
            let mut current = self.reason.lock();
            if current.is_none() {
                *current = Some(reason);
            }
        }
        self.token.cancel();
    }

    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<ShutdownReason> {
        self.reason.lock().clone()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// What happened during one control tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub outcome: Option<TriggerOutcome>,
    pub captured: Option<PathBuf>,
    pub raw_reading: Option<f64>,
    pub exposure: Option<ExposureSetting>,
    pub status_applied: bool,
}
