use super::Bitmap;
use crate::config::OverlayConfig;
use crate::error::DisplayError;
use tracing::{debug, warn};

const TEXT_MARGIN: u32 = 10;
const BAR_HEIGHT: u32 = 60;
const RING_RADIUS: i64 = 50;

const TEXT_COLOR: [u8; 4] = [255, 255, 255, 255];
const FRAME_RING_COLOR: [u8; 4] = [255, 255, 255, 50];
const FRAME_BAR_COLOR: [u8; 4] = [0, 0, 0, 100];
const INDICATOR_COLOR: [u8; 4] = [255, 255, 255, 255];

/// Text shown in the status overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusContent {
    /// Bottom-left: current exposure
    pub exposure: String,
    /// Bottom-right: free space in the photo directory
    pub free_space: String,
}

/// Draws overlay bitmaps at the preview resolution
pub struct StatusRenderer {
    width: u32,
    height: u32,
    font_size: f32,
    #[cfg(feature = "imaging")]
    font: Option<rusttype::Font<'static>>,
}

impl StatusRenderer {
    /// Renderer with the configured font
    #[cfg(feature = "imaging")]
    pub fn load(config: &OverlayConfig, size: (u32, u32)) -> Result<Self, DisplayError> {
        let font_data = std::fs::read(&config.font_path).map_err(|e| DisplayError::Font {
            details: format!("Failed to read font file '{}': {}", config.font_path, e),
        })?;

        let font = rusttype::Font::try_from_vec(font_data).ok_or_else(|| DisplayError::Font {
            details: format!("Failed to parse font file '{}'", config.font_path),
        })?;

        debug!(
            "Loaded overlay font {} at {}px",
            config.font_path, config.font_size
        );

        Ok(Self {
            width: size.0,
            height: size.1,
            font_size: config.font_size,
            font: Some(font),
        })
    }

    #[cfg(not(feature = "imaging"))]
    pub fn load(config: &OverlayConfig, size: (u32, u32)) -> Result<Self, DisplayError> {
        warn!("Built without imaging support, status text disabled");
        Ok(Self::without_text(config, size))
    }

    /// Renderer that draws the frame and indicator but no text
    pub fn without_text(config: &OverlayConfig, size: (u32, u32)) -> Self {
        Self {
            width: size.0,
            height: size.1,
            font_size: config.font_size,
            #[cfg(feature = "imaging")]
            font: None,
        }
    }

    /// Load the configured font, falling back to a text-less renderer
    pub fn load_or_fallback(config: &OverlayConfig, size: (u32, u32)) -> Self {
        match Self::load(config, size) {
            Ok(renderer) => renderer,
            Err(e) => {
                warn!("{}, status text disabled", e);
                Self::without_text(config, size)
            }
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Static frame: faint focus ring at the center and a translucent bottom bar
    pub fn frame(&self) -> Bitmap {
        let mut bitmap = Bitmap::new(self.width, self.height);
        bitmap.draw_ring(
            i64::from(self.width / 2),
            i64::from(self.height / 2),
            RING_RADIUS,
            1,
            FRAME_RING_COLOR,
        );
        bitmap.fill_rect(
            0,
            self.height.saturating_sub(BAR_HEIGHT),
            self.width,
            BAR_HEIGHT,
            FRAME_BAR_COLOR,
        );
        bitmap
    }

    /// Emphasized focus ring flashed on recalibration
    pub fn indicator(&self) -> Bitmap {
        let mut bitmap = Bitmap::new(self.width, self.height);
        bitmap.draw_ring(
            i64::from(self.width / 2),
            i64::from(self.height / 2),
            RING_RADIUS,
            4,
            INDICATOR_COLOR,
        );
        bitmap
    }

    /// Status readout: exposure bottom-left, free space bottom-right
    pub fn status(&self, content: &StatusContent) -> Result<Bitmap, DisplayError> {
        let bitmap = Bitmap::new(self.width, self.height);
        self.draw_labels(bitmap, content)
    }

    #[cfg(feature = "imaging")]
    fn draw_labels(&self, bitmap: Bitmap, content: &StatusContent) -> Result<Bitmap, DisplayError> {
        use image::{Rgba, RgbaImage};
        use imageproc::drawing::{draw_text_mut, text_size};
        use rusttype::Scale;

        let Some(font) = self.font.as_ref() else {
            return Ok(bitmap);
        };

        let mut img = RgbaImage::from_raw(self.width, self.height, bitmap.into_pixels())
            .ok_or_else(|| DisplayError::FormatConversion {
                details: "Overlay buffer does not match its dimensions".to_string(),
            })?;

        let scale = Scale::uniform(self.font_size);
        let color = Rgba(TEXT_COLOR);
        let margin = TEXT_MARGIN as i32;
        let height = self.height as i32;
        let width = self.width as i32;

        let (_, exposure_h) = text_size(scale, font, &content.exposure);
        draw_text_mut(
            &mut img,
            color,
            margin,
            height - exposure_h - margin,
            scale,
            font,
            &content.exposure,
        );

        let (space_w, space_h) = text_size(scale, font, &content.free_space);
        draw_text_mut(
            &mut img,
            color,
            width - space_w - margin,
            height - space_h - margin,
            scale,
            font,
            &content.free_space,
        );

        Bitmap::from_rgba(self.width, self.height, img.into_raw())
    }

    #[cfg(not(feature = "imaging"))]
    fn draw_labels(&self, bitmap: Bitmap, _content: &StatusContent) -> Result<Bitmap, DisplayError> {
        Ok(bitmap)
    }
}
