//! Image encoding module
//!
//! Writes a `DecodedImage` in a target export format, carrying its resolution
//! metadata into every format that can store one.

mod writer;
mod standard_writer;
mod tiff_encoder;
mod webp_encoder;
pub mod types;

pub use writer::ImageWriter;
pub use standard_writer::StandardImageWriter;
pub use types::{ConversionConfig, ConversionConfigBuilder, TiffCompression};
