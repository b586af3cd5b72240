use crate::error::DisplayError;

/// RGBA8 image used for overlay layers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Fully transparent bitmap
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        }
    }

    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, DisplayError> {
        let expected = (width * height * 4) as usize;
        if pixels.len() != expected {
            return Err(DisplayError::FormatConversion {
                details: format!(
                    "Invalid RGBA data size: expected {}, got {}",
                    expected,
                    pixels.len()
                ),
            });
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Pixel at (x, y); out-of-bounds reads are transparent
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let i = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.pixels[i..i + 4].copy_from_slice(&color);
    }

    /// Fill a rectangle, clipped to the bitmap
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: [u8; 4]) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        for py in y..y_end {
            for px in x..x_end {
                self.put_pixel(px, py, color);
            }
        }
    }

    /// Circle outline centered at (cx, cy), `thickness` pixels wide inside `radius`
    pub fn draw_ring(&mut self, cx: i64, cy: i64, radius: i64, thickness: i64, color: [u8; 4]) {
        let outer = radius * radius;
        let inner_radius = (radius - thickness.max(1)).max(0);
        let inner = inner_radius * inner_radius;

        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let d2 = dx * dx + dy * dy;
                if d2 > inner && d2 <= outer {
                    let (px, py) = (cx + dx, cy + dy);
                    if px >= 0 && py >= 0 {
                        self.put_pixel(px as u32, py as u32, color);
                    }
                }
            }
        }
    }

    /// Whether every pixel is fully transparent
    pub fn is_blank(&self) -> bool {
        self.pixels.chunks_exact(4).all(|p| p[3] == 0)
    }
}
