use std::io::{Cursor, Seek, Write};

use image::DynamicImage;
use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{Rational, TiffEncoder, TiffValue};
use tiff::tags::ResolutionUnit;
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::decode::types::{DecodedImage, Resolution};
use crate::image_pipeline::encode::types::{ConversionConfig, TiffCompression};

/// Denominator for resolution rationals; keeps two decimal places of DPI.
const RESOLUTION_DENOMINATOR: u32 = 100;

fn encode_error(e: tiff::TiffError) -> ConversionError {
    ConversionError::EncodeError(e.to_string())
}

fn to_rational(dpi: f32) -> Rational {
    Rational {
        n: (f64::from(dpi) * f64::from(RESOLUTION_DENOMINATOR)).round() as u32,
        d: RESOLUTION_DENOMINATOR,
    }
}

fn write_page<W: Write + Seek, C: ColorType>(
    encoder: &mut TiffEncoder<W>,
    width: u32,
    height: u32,
    data: &[C::Inner],
    resolution: Resolution,
) -> Result<()>
where
    [C::Inner]: TiffValue,
{
    let mut page = encoder.new_image::<C>(width, height).map_err(encode_error)?;
    page.resolution_unit(ResolutionUnit::Inch);
    page.x_resolution(to_rational(resolution.horizontal));
    page.y_resolution(to_rational(resolution.vertical));
    page.write_data(data).map_err(encode_error)
}

/// Encodes `image` as a single-page TIFF, writing its resolution tags.
pub(crate) fn write_tiff(
    image: &DecodedImage,
    output: &mut dyn Write,
    config: &ConversionConfig,
) -> Result<()> {
    let (width, height) = (image.width(), image.height());
    debug!("Encoding TIFF image: {}x{}", width, height);

    let mut buffer = Vec::new();

    {
        let compression = match config.tiff_compression {
            TiffCompression::None => tiff::encoder::Compression::Uncompressed,
            TiffCompression::Lzw => tiff::encoder::Compression::Lzw,
            TiffCompression::DeflateFast => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Balanced),
            TiffCompression::DeflateBest => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Best),
        };

        let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer))
            .map_err(encode_error)?
            .with_compression(compression);

        if let Some(predictor_val) = config.predictor {
            let predictor = match predictor_val {
                2 => tiff::tags::Predictor::Horizontal,
                _ => tiff::tags::Predictor::None,
            };
            encoder = encoder.with_predictor(predictor);
        }

        let resolution = image.resolution;
        match &image.image {
            DynamicImage::ImageLuma8(buf) => {
                write_page::<_, colortype::Gray8>(&mut encoder, width, height, buf.as_raw(), resolution)?
            }
            DynamicImage::ImageRgb8(buf) => {
                write_page::<_, colortype::RGB8>(&mut encoder, width, height, buf.as_raw(), resolution)?
            }
            DynamicImage::ImageRgba8(buf) => {
                write_page::<_, colortype::RGBA8>(&mut encoder, width, height, buf.as_raw(), resolution)?
            }
            DynamicImage::ImageLuma16(buf) => {
                write_page::<_, colortype::Gray16>(&mut encoder, width, height, buf.as_raw(), resolution)?
            }
            DynamicImage::ImageRgb16(buf) => {
                write_page::<_, colortype::RGB16>(&mut encoder, width, height, buf.as_raw(), resolution)?
            }
            DynamicImage::ImageRgba16(buf) => {
                write_page::<_, colortype::RGBA16>(&mut encoder, width, height, buf.as_raw(), resolution)?
            }
            other => {
                // Grey+alpha and float layouts have no baseline TIFF equivalent.
                let rgba = other.to_rgba8();
                write_page::<_, colortype::RGBA8>(&mut encoder, width, height, rgba.as_raw(), resolution)?
            }
        }
    }

    output
        .write_all(&buffer)
        .map_err(|e| ConversionError::EncodeError(e.to_string()))?;

    debug!("TIFF encoding complete");
    Ok(())
}
