use std::io::Write;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::decode::types::DecodedImage;

/// Encodes lossless WebP. The container written here has no resolution
/// field, so the source DPI is dropped.
#[cfg(feature = "webp")]
pub(crate) fn write_webp_lossless(image: &DecodedImage, output: &mut dyn Write) -> Result<()> {
    use image::codecs::webp::WebPEncoder;
    use image::ExtendedColorType;
    use tracing::debug;

    let (width, height) = (image.width(), image.height());
    debug!("Encoding lossless WebP image: {}x{}", width, height);

    let encoder = WebPEncoder::new_lossless(output);
    let result = if image.image.color().has_alpha() {
        let rgba = image.image.to_rgba8();
        encoder.encode(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
    } else {
        let rgb = image.image.to_rgb8();
        encoder.encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
    };
    result.map_err(|e| ConversionError::EncodeError(e.to_string()))
}

#[cfg(not(feature = "webp"))]
pub(crate) fn write_webp_lossless(_image: &DecodedImage, _output: &mut dyn Write) -> Result<()> {
    Err(ConversionError::EncodeError(
        "WebP support is not available in this build".to_string(),
    ))
}
