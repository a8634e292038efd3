//! Image decoding module
//!
//! Turns source file bytes into a `DecodedImage`, either through the generic
//! `image` decoder or a specialized decoder chosen by file extension.

mod reader;
mod standard_reader;
pub mod resolution;
pub mod types;

pub use reader::ImageReader;
pub use standard_reader::StandardImageReader;
pub use types::{DecodedImage, Resolution};
