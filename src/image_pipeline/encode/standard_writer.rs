//! Image writer that dispatches on the registry codec of the target format.
//!
//! Generic formats are encoded with the `image` crate, except where a lower
//! level encoder is needed to write density metadata (PNG `pHYs`, TIFF tags).
//! BMP density is patched into the info header after encoding.

use std::borrow::Cow;
use std::io::{Cursor, Write};

use image::codecs::jpeg::{JpegEncoder, PixelDensity, PixelDensityUnit};
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::decode::resolution::{
    BMP_INFO_HEADER_MIN, BMP_X_PELS_OFFSET, BMP_Y_PELS_OFFSET,
};
use crate::image_pipeline::decode::types::{DecodedImage, Resolution};
use crate::image_pipeline::encode::types::ConversionConfig;
use crate::image_pipeline::encode::writer::ImageWriter;
use crate::image_pipeline::encode::{tiff_encoder, webp_encoder};
use crate::image_pipeline::registry::{self, Codec, ExportFormat, SpecializedCodec};

pub struct StandardImageWriter;

impl ImageWriter for StandardImageWriter {
    fn write_image(
        &self,
        image: &DecodedImage,
        format: ExportFormat,
        output: &mut dyn Write,
        config: &ConversionConfig,
    ) -> Result<()> {
        let entry = registry::entry(format);
        if !entry.available {
            return Err(ConversionError::EncodeError(format!(
                "{} support is not available in this build",
                format
            )));
        }

        match entry.codec {
            Codec::Specialized(SpecializedCodec::WebpLossless) => {
                webp_encoder::write_webp_lossless(image, output)
            }
            Codec::Generic(image_format) => write_generic(image, image_format, output, config),
        }
    }
}

fn write_generic(
    image: &DecodedImage,
    format: ImageFormat,
    output: &mut dyn Write,
    config: &ConversionConfig,
) -> Result<()> {
    debug!(
        ?format,
        horizontal_dpi = image.resolution.horizontal,
        vertical_dpi = image.resolution.vertical,
        "Encoding with generic codec"
    );

    match format {
        ImageFormat::Png => write_png(image, output),
        ImageFormat::Jpeg => write_jpeg(image, output, config.jpeg_quality),
        ImageFormat::Tiff => tiff_encoder::write_tiff(image, output, config),
        ImageFormat::Bmp => write_bmp(image, output),
        // GIF and ICO have no resolution field; both encoders want RGBA.
        other => {
            let rgba = DynamicImage::ImageRgba8(image.image.to_rgba8());
            let buffer = encode_in_memory(&rgba, other)?;
            write_all(output, &buffer)
        }
    }
}

fn encode_in_memory(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), format)
        .map_err(|e| ConversionError::EncodeError(e.to_string()))?;
    Ok(buffer)
}

fn write_all(output: &mut dyn Write, buffer: &[u8]) -> Result<()> {
    output
        .write_all(buffer)
        .map_err(|e| ConversionError::EncodeError(e.to_string()))
}

fn png_error(e: png::EncodingError) -> ConversionError {
    ConversionError::EncodeError(e.to_string())
}

fn be_bytes(samples: &[u16]) -> Vec<u8> {
    samples.iter().flat_map(|sample| sample.to_be_bytes()).collect()
}

fn write_png(image: &DecodedImage, output: &mut dyn Write) -> Result<()> {
    use png::{BitDepth, ColorType};

    let (color, depth, data): (ColorType, BitDepth, Cow<'_, [u8]>) = match &image.image {
        DynamicImage::ImageLuma8(buf) => (ColorType::Grayscale, BitDepth::Eight, Cow::Borrowed(buf.as_raw().as_slice())),
        DynamicImage::ImageLumaA8(buf) => (ColorType::GrayscaleAlpha, BitDepth::Eight, Cow::Borrowed(buf.as_raw().as_slice())),
        DynamicImage::ImageRgb8(buf) => (ColorType::Rgb, BitDepth::Eight, Cow::Borrowed(buf.as_raw().as_slice())),
        DynamicImage::ImageRgba8(buf) => (ColorType::Rgba, BitDepth::Eight, Cow::Borrowed(buf.as_raw().as_slice())),
        DynamicImage::ImageLuma16(buf) => (ColorType::Grayscale, BitDepth::Sixteen, Cow::Owned(be_bytes(buf.as_raw()))),
        DynamicImage::ImageLumaA16(buf) => (ColorType::GrayscaleAlpha, BitDepth::Sixteen, Cow::Owned(be_bytes(buf.as_raw()))),
        DynamicImage::ImageRgb16(buf) => (ColorType::Rgb, BitDepth::Sixteen, Cow::Owned(be_bytes(buf.as_raw()))),
        DynamicImage::ImageRgba16(buf) => (ColorType::Rgba, BitDepth::Sixteen, Cow::Owned(be_bytes(buf.as_raw()))),
        other => (ColorType::Rgba, BitDepth::Eight, Cow::Owned(other.to_rgba8().into_raw())),
    };

    let (x_ppm, y_ppm) = image.resolution.pixels_per_meter();
    let mut encoder = png::Encoder::new(output, image.width(), image.height());
    encoder.set_color(color);
    encoder.set_depth(depth);
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: x_ppm.round() as u32,
        yppu: y_ppm.round() as u32,
        unit: png::Unit::Meter,
    }));

    let mut writer = encoder.write_header().map_err(png_error)?;
    writer.write_image_data(&data).map_err(png_error)?;
    writer.finish().map_err(png_error)
}

fn jfif_density(dpi: f32) -> u16 {
    dpi.round().clamp(1.0, f32::from(u16::MAX)) as u16
}

fn write_jpeg(image: &DecodedImage, output: &mut dyn Write, quality: u8) -> Result<()> {
    let mut encoder = JpegEncoder::new_with_quality(output, quality);
    encoder.set_pixel_density(PixelDensity {
        density: (
            jfif_density(image.resolution.horizontal),
            jfif_density(image.resolution.vertical),
        ),
        unit: PixelDensityUnit::Inches,
    });

    // JPEG has no alpha channel; anything but plain grey goes out as RGB.
    let result = match &image.image {
        DynamicImage::ImageLuma8(buf) => encoder.encode_image(buf),
        other => encoder.encode_image(&other.to_rgb8()),
    };
    result.map_err(|e| ConversionError::EncodeError(e.to_string()))
}

/// Overwrites `biXPelsPerMeter`/`biYPelsPerMeter` of an encoded BMP.
fn set_bmp_resolution(buffer: &mut [u8], resolution: Resolution) {
    let Some(header_size) = buffer.get(14..18).and_then(|b| b.try_into().ok()).map(u32::from_le_bytes) else {
        return;
    };
    if header_size < BMP_INFO_HEADER_MIN || buffer.len() < BMP_Y_PELS_OFFSET + 4 {
        return;
    }

    let (x_ppm, y_ppm) = resolution.pixels_per_meter();
    buffer[BMP_X_PELS_OFFSET..BMP_X_PELS_OFFSET + 4].copy_from_slice(&(x_ppm.round() as i32).to_le_bytes());
    buffer[BMP_Y_PELS_OFFSET..BMP_Y_PELS_OFFSET + 4].copy_from_slice(&(y_ppm.round() as i32).to_le_bytes());
}

fn write_bmp(image: &DecodedImage, output: &mut dyn Write) -> Result<()> {
    let prepared: Cow<'_, DynamicImage> = match &image.image {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => Cow::Borrowed(&image.image),
        other if other.color().has_alpha() => Cow::Owned(DynamicImage::ImageRgba8(other.to_rgba8())),
        other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
    };

    let mut buffer = encode_in_memory(&prepared, ImageFormat::Bmp)?;
    set_bmp_resolution(&mut buffer, image.resolution);
    write_all(output, &buffer)
}
