//! Decoded image types

use image::DynamicImage;

/// Resolution a bitmap reports when its file carries no density metadata.
pub const DEFAULT_DPI: f32 = 96.0;

/// Horizontal and vertical resolution in dots per inch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub horizontal: f32,
    pub vertical: f32,
}

impl Resolution {
    pub fn new(horizontal: f32, vertical: f32) -> Self {
        Self { horizontal, vertical }
    }

    /// Builds a resolution from pixels-per-metre values, as stored by PNG and BMP.
    pub fn from_pixels_per_meter(horizontal: f64, vertical: f64) -> Self {
        Self {
            horizontal: (horizontal * INCHES_PER_METER) as f32,
            vertical: (vertical * INCHES_PER_METER) as f32,
        }
    }

    pub fn pixels_per_meter(&self) -> (f64, f64) {
        (
            f64::from(self.horizontal) / INCHES_PER_METER,
            f64::from(self.vertical) / INCHES_PER_METER,
        )
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(DEFAULT_DPI, DEFAULT_DPI)
    }
}

const INCHES_PER_METER: f64 = 0.0254;

/// In-memory bitmap produced by decoding a source file
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub resolution: Resolution,
}

impl DecodedImage {
    pub fn new(image: DynamicImage, resolution: Resolution) -> Self {
        Self { image, resolution }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
