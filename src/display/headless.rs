use super::{OverlaySlot, OverlaySurface};
use crate::error::DisplayError;
use crate::overlay::Bitmap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

/// Entries kept in the show/clear history
const HISTORY_LIMIT: usize = 4096;

/// What a headless surface has been asked to do
#[derive(Debug, Default)]
pub struct SurfaceLog {
    /// Layers currently shown
    pub layers: BTreeMap<OverlaySlot, Bitmap>,
    /// Recent shows/clears in order, oldest dropped first; `true` for show
    pub history: Vec<(OverlaySlot, bool)>,
}

impl SurfaceLog {
    fn record(&mut self, slot: OverlaySlot, shown: bool) {
        if self.history.len() >= HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.history.push((slot, shown));
    }

    pub fn shows(&self, slot: OverlaySlot) -> usize {
        self.history
            .iter()
            .filter(|(s, shown)| *s == slot && *shown)
            .count()
    }

    pub fn clears(&self, slot: OverlaySlot) -> usize {
        self.history
            .iter()
            .filter(|(s, shown)| *s == slot && !*shown)
            .count()
    }
}

/// Surface for running without a display
///
/// Keeps the layers in memory. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    log: Arc<Mutex<SurfaceLog>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of everything shown so far
    pub fn log(&self) -> Arc<Mutex<SurfaceLog>> {
        Arc::clone(&self.log)
    }
}

impl OverlaySurface for HeadlessSurface {
    fn show(&mut self, slot: OverlaySlot, bitmap: &Bitmap) -> Result<(), DisplayError> {
        trace!("Headless overlay show {:?}", slot);
        let mut log = self.log.lock();
        log.layers.insert(slot, bitmap.clone());
        log.record(slot, true);
        Ok(())
    }

    fn clear(&mut self, slot: OverlaySlot) -> Result<(), DisplayError> {
        trace!("Headless overlay clear {:?}", slot);
        let mut log = self.log.lock();
        log.layers.remove(&slot);
        log.record(slot, false);
        Ok(())
    }
}
