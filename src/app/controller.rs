use super::types::{ShutdownHandle, TickReport};
use crate::camera::Camera;
use crate::config::ShuttercamConfig;
use crate::display::{OverlaySlot, OverlaySurface};
use crate::error::{Result, SensorError};
use crate::exposure::ExposureController;
use crate::gpio::{DischargeLine, InputLine};
use crate::overlay::{
    Bitmap, IndicatorFlash, OverlayStats, OverlayThrottler, StatusContent, StatusRenderer,
};
use crate::photocell::{build_filter, build_sampler, PhotocellFilter, PhotocellSampler};
use crate::storage::{format_free_space, free_space, PhotoIndexAllocator};
use crate::trigger::{TriggerDebouncer, TriggerInput, TriggerOutcome};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Label shown before the first exposure is known
const INITIAL_EXPOSURE_LABEL: &str = "±0";

/// Collaborators the control loop drives
pub struct Hardware {
    pub trigger_line: Box<dyn InputLine>,
    pub photocell_line: Box<dyn DischargeLine>,
    pub camera: Box<dyn Camera>,
    pub surface: Box<dyn OverlaySurface>,
}

/// Owns every piece of control-loop state; one `tick` per display refresh
pub struct ShuttercamApp {
    pub(super) config: ShuttercamConfig,
    trigger_input: TriggerInput,
    debouncer: TriggerDebouncer,
    sampler: Box<dyn PhotocellSampler>,
    filter: Box<dyn PhotocellFilter>,
    exposure: ExposureController,
    throttler: OverlayThrottler,
    indicator: IndicatorFlash,
    review: IndicatorFlash,
    renderer: StatusRenderer,
    surface: Box<dyn OverlaySurface>,
    camera: Box<dyn Camera>,
    allocator: PhotoIndexAllocator,
    photo_dir: PathBuf,
    pub(super) stats: OverlayStats,
    pub(super) captures: u64,
    pub(super) shutdown: ShutdownHandle,
}

impl ShuttercamApp {
    pub fn new(config: ShuttercamConfig, hardware: Hardware) -> Result<Self> {
        let Hardware {
            trigger_line,
            photocell_line,
            camera,
            surface,
        } = hardware;

        info!(
            "Trigger on GPIO {}, photocell on GPIO {}",
            trigger_line.pin(),
            photocell_line.pin()
        );

        let sampler = build_sampler(&config.photocell, photocell_line)?;
        let renderer =
            StatusRenderer::load_or_fallback(&config.overlay, config.camera.preview_resolution);

        Ok(Self {
            trigger_input: TriggerInput::new(trigger_line, &config.trigger),
            debouncer: TriggerDebouncer::new(&config.trigger),
            sampler,
            filter: build_filter(&config.photocell),
            exposure: ExposureController::new(&config.exposure),
            throttler: OverlayThrottler::from_config(&config.overlay),
            indicator: IndicatorFlash::new(Duration::from_millis(config.overlay.indicator_flash_ms)),
            review: IndicatorFlash::new(Duration::from_millis(config.overlay.review_ms)),
            renderer,
            surface,
            camera,
            allocator: PhotoIndexAllocator::new(&config.storage),
            photo_dir: PathBuf::from(&config.storage.photo_dir),
            stats: OverlayStats::default(),
            captures: 0,
            shutdown: ShutdownHandle::new(),
            config,
        })
    }

    /// Handle for stopping the loop from signal handlers or input tasks
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn exposure(&self) -> &ExposureController {
        &self.exposure
    }

    pub fn overlay_stats(&self) -> &OverlayStats {
        &self.stats
    }

    /// Put the static frame up and start the live preview; called once before the first tick
    pub async fn start(&mut self) {
        let frame = self.renderer.frame();
        self.show(OverlaySlot::Frame, &frame);

        if let Err(e) = self.camera.start_preview().await {
            warn!("Live preview unavailable: {}", e);
        }
    }

    /// One pass of the control loop
    ///
    /// Only capture failures are returned as errors; sensor and display problems
    /// are logged and the tick carries on.
    pub async fn tick(&mut self, now: Instant) -> Result<TickReport> {
        let mut report = TickReport::default();

        match self.trigger_input.poll(now) {
            Ok(Some(edge)) => {
                trace!("Trigger edge: pressed={}", edge.pressed);
                report.outcome = self.debouncer.on_edge(edge.pressed, edge.timestamp);
            }
            Ok(None) => {}
            Err(e) => warn!("Trigger read failed: {}", e),
        }

        match report.outcome {
            Some(TriggerOutcome::ShortPress) => {
                report.captured = Some(self.capture(now).await?);
            }
            Some(TriggerOutcome::LongPress) => self.recalibrate(now),
            None => {}
        }

        if let Some(frame) = self.camera.take_preview_frame() {
            self.show(OverlaySlot::Preview, &frame);
        }

        if self.indicator.take_expired(now) {
            self.clear(OverlaySlot::Indicator);
        }
        if self.review.take_expired(now) {
            self.clear(OverlaySlot::Review);
        }

        match self.sampler.poll(now) {
            Ok(Some(raw)) => {
                report.raw_reading = Some(raw);
                if let Some(stable) = self.filter.update(raw) {
                    let setting = self.exposure.update(stable);
                    self.camera.set_exposure(setting);
                    report.exposure = Some(setting);
                }
            }
            Ok(None) => {}
            Err(SensorError::WorkerDisconnected) => return Err(SensorError::WorkerDisconnected.into()),
            Err(e) => warn!("Photocell sampling failed: {}", e),
        }

        report.status_applied = self.refresh_status(now);
        Ok(report)
    }

    async fn capture(&mut self, now: Instant) -> Result<PathBuf> {
        let started = Instant::now();
        let path = self.allocator.next_photo_path(&self.photo_dir).await?;
        info!("Capturing photo to {}", path.display());

        let photo = self.camera.capture(&path).await?;
        self.captures += 1;

        // The review runs from the end of the capture, not the tick that started it
        let elapsed = started.elapsed();
        let finished = now + elapsed;
        debug!("Capture took {:?}", elapsed);

        if let Some(review) = photo.review.as_ref() {
            if self.config.overlay.review_ms > 0 {
                self.show(OverlaySlot::Review, review);
                self.review.start(finished);
            }
        }

        Ok(photo.path)
    }

    fn recalibrate(&mut self, now: Instant) {
        if !self.exposure.uses_baseline() {
            debug!("Long press ignored, exposure policy has no baseline");
            return;
        }

        let baseline = self.exposure.recalibrate();
        info!("Recalibration requested, baseline now {:?}", baseline);

        let indicator = self.renderer.indicator();
        self.show(OverlaySlot::Indicator, &indicator);
        self.indicator.start(now);
        self.stats.record_indicator_flash();
    }

    /// Submit a fresh status overlay through the throttle
    fn refresh_status(&mut self, now: Instant) -> bool {
        if !self.throttler.is_due(now) {
            self.stats.record_status_throttled();
            return false;
        }

        let content = StatusContent {
            exposure: self
                .exposure
                .current()
                .map(|setting| setting.to_string())
                .unwrap_or_else(|| INITIAL_EXPOSURE_LABEL.to_string()),
            free_space: match free_space(&self.photo_dir) {
                Ok(bytes) => format_free_space(bytes),
                Err(e) => {
                    debug!("Free space unavailable: {}", e);
                    "-- MB".to_string()
                }
            },
        };

        let bitmap = match self.renderer.status(&content) {
            Ok(bitmap) => bitmap,
            Err(e) => {
                warn!("Failed to render status overlay: {}", e);
                self.stats.record_surface_error();
                return false;
            }
        };

        if !self.throttler.try_update(bitmap, now) {
            self.stats.record_status_throttled();
            return false;
        }

        self.stats.record_status_applied();
        if let Some(displayed) = self.throttler.displayed().cloned() {
            self.show(OverlaySlot::Status, &displayed);
        }
        debug!("Status overlay updated: {} / {}", content.exposure, content.free_space);
        true
    }

    fn show(&mut self, slot: OverlaySlot, bitmap: &Bitmap) {
        if let Err(e) = self.surface.show(slot, bitmap) {
            warn!("Failed to show {:?} overlay: {}", slot, e);
            self.stats.record_surface_error();
        }
    }

    fn clear(&mut self, slot: OverlaySlot) {
        if let Err(e) = self.surface.clear(slot) {
            warn!("Failed to clear {:?} overlay: {}", slot, e);
            self.stats.record_surface_error();
        }
    }

    /// Stop the sampler and preview, then take the overlays down
    pub(super) async fn stop(&mut self) {
        self.sampler.shutdown();
        self.camera.stop_preview().await;
        for slot in OverlaySlot::ALL {
            self.clear(slot);
        }
    }
}
