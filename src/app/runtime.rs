use super::keyboard_input::KeyboardInputHandler;
use super::{ShutdownHandle, ShutdownReason, ShuttercamApp};
use crate::error::Result;
use std::io::IsTerminal;
use std::time::Instant;
use tokio::signal;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

impl ShuttercamApp {
    /// Run the control loop until a shutdown request or a capture failure
    ///
    /// Returns the process exit code for a graceful stop.
    pub async fn run(&mut self) -> Result<i32> {
        info!(
            "Shuttercam running, tick every {:?}",
            self.config.tick_interval()
        );

        setup_signal_handlers(self.shutdown.clone());

        let keyboard = if self.config.system.keyboard_exit && std::io::stdin().is_terminal() {
            let handler = KeyboardInputHandler::new(self.shutdown.clone());
            handler.start();
            Some(handler)
        } else {
            None
        };

        self.start().await;

        let token = self.shutdown.token();
        let mut ticker = interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let result = loop {
            tokio::select! {
                _ = token.cancelled() => break Ok(()),
                _ = ticker.tick() => {}
            }

            if token.is_cancelled() {
                break Ok(());
            }

            if let Err(e) = self.tick(Instant::now()).await {
                error!("Control loop stopped: {}", e);
                self.shutdown.request(ShutdownReason::Error(e.to_string()));
                break Err(e);
            }
        };

        if let Some(keyboard) = keyboard {
            keyboard.stop().await;
        }

        info!("Shutdown initiated: {:?}", self.shutdown.reason());
        self.stop().await;

        let stats = &self.stats;
        info!(
            "Session summary: {} photos, {} status overlays applied ({:.0}% of submissions), {} recalibrations, {} display errors",
            self.captures,
            stats.status_applied,
            stats.apply_rate() * 100.0,
            stats.indicator_flashes,
            stats.surface_errors
        );

        result.map(|_| 0)
    }
}

/// Cancel the loop on SIGINT or SIGTERM
fn setup_signal_handlers(shutdown: ShutdownHandle) {
    #[cfg(unix)]
    {
        let shutdown_sigterm = shutdown.clone();
        tokio::spawn(async move {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    if sigterm.recv().await.is_some() {
                        info!("Received SIGTERM signal");
                        shutdown_sigterm.request(ShutdownReason::Signal("SIGTERM".to_string()));
                    }
                }
                Err(e) => warn!("Failed to register SIGTERM handler: {}", e),
            }
        });
    }

    tokio::spawn(async move {
        if let Ok(()) = signal::ctrl_c().await {
            info!("Received SIGINT signal (Ctrl+C)");
            shutdown.request(ShutdownReason::Signal("SIGINT".to_string()));
        }
    });
}
