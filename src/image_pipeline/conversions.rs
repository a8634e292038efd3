//! Pipeline conversions module
//!
//! Orchestrates one source file to one destination file: path derivation,
//! overwrite guard, decode, encode and reporting.

mod convert_file;


pub use convert_file::{destination_path, is_same_path, ConversionPipeline};
