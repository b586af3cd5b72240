use super::{ShutdownHandle, ShutdownReason};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::time::Duration;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Stops the control loop on any key press in the controlling terminal
pub struct KeyboardInputHandler {
    shutdown: ShutdownHandle,
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    pub fn new(shutdown: ShutdownHandle) -> Self {
        Self {
            shutdown,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for key presses
    pub fn start(&self) {
        info!("Press any key to stop");

        let shutdown = self.shutdown.clone();
        let cancellation_token = self.cancellation_token.clone();

        task::spawn_blocking(move || {
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            loop {
                if cancellation_token.is_cancelled() || shutdown.is_requested() {
                    debug!("Keyboard input handler stopping");
                    break;
                }

                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        if let Ok(Event::Key(key_event)) = event::read() {
                            if key_event.kind == KeyEventKind::Press {
                                info!("Key {:?} pressed, requesting shutdown", key_event.code);
                                shutdown.request(ShutdownReason::UserRequest);
                                break;
                            }
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            }
            debug!("Keyboard input handler task exited");
        });
    }

    /// Stop listening and restore the terminal
    pub async fn stop(&self) {
        self.cancellation_token.cancel();

        // Give the task a moment to leave raw mode itself
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = disable_raw_mode();
    }
}
