//! Output side of the overlays: where the preview and rendered layers end up.

mod converter;
mod framebuffer;
mod headless;

pub use converter::DisplayConverter;
pub use framebuffer::FramebufferSurface;
pub use headless::{HeadlessSurface, SurfaceLog};

use crate::error::DisplayError;
use crate::overlay::Bitmap;

/// Overlay layers, bottom to top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OverlaySlot {
    /// Live camera feed underneath everything else
    Preview,
    /// Static focus ring and bottom bar
    Frame,
    /// Throttled exposure/free-space readout
    Status,
    /// Transient recalibration indicator, never throttled
    Indicator,
    /// Just-captured photo, shown briefly over everything else
    Review,
}

impl OverlaySlot {
    pub const ALL: [OverlaySlot; 5] = [
        OverlaySlot::Preview,
        OverlaySlot::Frame,
        OverlaySlot::Status,
        OverlaySlot::Indicator,
        OverlaySlot::Review,
    ];
}

/// A display that layers overlay bitmaps above the preview
pub trait OverlaySurface: Send {
    /// Replace the contents of `slot`
    fn show(&mut self, slot: OverlaySlot, bitmap: &Bitmap) -> Result<(), DisplayError>;

    /// Remove whatever `slot` holds
    fn clear(&mut self, slot: OverlaySlot) -> Result<(), DisplayError>;
}
