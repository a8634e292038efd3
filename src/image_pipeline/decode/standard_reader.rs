//! Image reader backed by the `image` crate.
//!
//! Files whose extension names a specialized codec (WebP) go through that
//! codec's decoder directly; everything else uses the generic decoder, which
//! guesses the format from the content and falls back to the extension.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::decode::reader::ImageReader;
use crate::image_pipeline::decode::resolution;
use crate::image_pipeline::decode::types::{DecodedImage, Resolution};
use crate::image_pipeline::registry::{self, SpecializedCodec};

pub struct StandardImageReader;

impl StandardImageReader {
    fn read_generic(&self, path: &Path, data: &[u8]) -> Result<DecodedImage> {
        let mut reader = image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ConversionError::DecodeError(format!("cannot detect image format: {}", e)))?;

        if reader.format().is_none() {
            if let Ok(format) = ImageFormat::from_path(path) {
                reader.set_format(format);
            }
        }
        let format = reader.format().ok_or_else(|| {
            ConversionError::DecodeError(format!("unrecognized image format: {}", path.display()))
        })?;

        let image = reader
            .decode()
            .map_err(|e| ConversionError::DecodeError(e.to_string()))?;
        let resolution = resolution::probe(format, data).unwrap_or_default();

        debug!(
            ?format,
            width = image.width(),
            height = image.height(),
            "Decoded image"
        );
        Ok(DecodedImage::new(image, resolution))
    }

    fn read_specialized(&self, codec: SpecializedCodec, data: &[u8]) -> Result<DecodedImage> {
        let image = match codec {
            SpecializedCodec::WebpLossless => decode_webp(data)?,
        };

        debug!(
            ?codec,
            width = image.width(),
            height = image.height(),
            "Decoded image"
        );
        // The specialized containers carry no resolution we can read.
        Ok(DecodedImage::new(image, Resolution::default()))
    }
}

impl ImageReader for StandardImageReader {
    fn read_image(&self, path: &Path, data: &[u8]) -> Result<DecodedImage> {
        debug!("Decoding {}, {} bytes", path.display(), data.len());

        let specialized = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(registry::specialized_decoder_for_extension);

        match specialized {
            Some(codec) => self.read_specialized(codec, data),
            None => self.read_generic(path, data),
        }
    }
}

#[cfg(feature = "webp")]
fn decode_webp(data: &[u8]) -> Result<DynamicImage> {
    use image::codecs::webp::WebPDecoder;

    let decoder = WebPDecoder::new(Cursor::new(data))
        .map_err(|e| ConversionError::DecodeError(e.to_string()))?;
    DynamicImage::from_decoder(decoder).map_err(|e| ConversionError::DecodeError(e.to_string()))
}

#[cfg(not(feature = "webp"))]
fn decode_webp(_data: &[u8]) -> Result<DynamicImage> {
    Err(ConversionError::DecodeError(
        "WebP support is not available in this build".to_string(),
    ))
}
