use std::path::Path;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::decode::types::DecodedImage;

pub trait ImageReader {
    /// Decodes `data`, the full contents of the file at `path`.
    fn read_image(&self, path: &Path, data: &[u8]) -> Result<DecodedImage>;
}
