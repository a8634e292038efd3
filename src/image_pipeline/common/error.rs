use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single file conversion.
///
/// The `Display` output of each variant is the exact line reported to the
/// log sink.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Cannot overwrite existing file.")]
    OverwriteCollision(PathBuf),

    #[error("Read failed: {0}")]
    DecodeError(String),

    #[error("Read failed: invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(u32, u32),

    #[error("Write failed: {0}")]
    EncodeError(String),
}

pub type Result<T> = std::result::Result<T, ConversionError>;
