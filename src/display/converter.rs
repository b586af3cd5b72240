use crate::error::DisplayError;
use crate::overlay::Bitmap;

/// Display format conversion utilities
pub struct DisplayConverter;

impl DisplayConverter {
    /// Alpha-blend RGBA layers over an opaque black background into RGB24
    pub fn composite_rgb24(layers: &[&Bitmap], width: u32, height: u32) -> Result<Vec<u8>, DisplayError> {
        let mut rgb24 = vec![0u8; (width * height * 3) as usize];

        for layer in layers {
            if layer.width() != width || layer.height() != height {
                return Err(DisplayError::FormatConversion {
                    details: format!(
                        "Layer is {}x{}, surface is {}x{}",
                        layer.width(),
                        layer.height(),
                        width,
                        height
                    ),
                });
            }

            for (dst, src) in rgb24.chunks_exact_mut(3).zip(layer.pixels().chunks_exact(4)) {
                let alpha = u16::from(src[3]);
                if alpha == 0 {
                    continue;
                }
                for c in 0..3 {
                    let blended = (u16::from(src[c]) * alpha + u16::from(dst[c]) * (255 - alpha)) / 255;
                    dst[c] = blended as u8;
                }
            }
        }

        Ok(rgb24)
    }

    /// Convert RGB24 to little-endian RGB565
    pub fn rgb24_to_rgb565(rgb24_data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, DisplayError> {
        let expected_size = (width * height * 3) as usize;
        if rgb24_data.len() != expected_size {
            return Err(DisplayError::FormatConversion {
                details: format!(
                    "Invalid RGB24 data size: expected {}, got {}",
                    expected_size,
                    rgb24_data.len()
                ),
            });
        }

        let mut rgb565_data = Vec::with_capacity((width * height * 2) as usize);

        for chunk in rgb24_data.chunks_exact(3) {
            let r = chunk[0] >> 3;
            let g = chunk[1] >> 2;
            let b = chunk[2] >> 3;

            let rgb565 = ((r as u16) << 11) | ((g as u16) << 5) | (b as u16);

            rgb565_data.push((rgb565 & 0xFF) as u8);
            rgb565_data.push((rgb565 >> 8) as u8);
        }

        Ok(rgb565_data)
    }
}
