use std::io::Write;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::decode::types::DecodedImage;
use crate::image_pipeline::encode::types::ConversionConfig;
use crate::image_pipeline::registry::ExportFormat;

pub trait ImageWriter {
    fn write_image(
        &self,
        image: &DecodedImage,
        format: ExportFormat,
        output: &mut dyn Write,
        config: &ConversionConfig,
    ) -> Result<()>;
}
