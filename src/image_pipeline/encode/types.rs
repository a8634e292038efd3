//! Conversion configuration types

use std::fmt;
use std::str::FromStr;

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression (default)
    Lzw,
    /// Deflate compression - fast level
    DeflateFast,
    /// Deflate compression - balanced
    DeflateBalanced,
    /// Deflate compression - best compression (slower)
    DeflateBest,
}

impl fmt::Display for TiffCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TiffCompression::None => "none",
            TiffCompression::Lzw => "lzw",
            TiffCompression::DeflateFast => "deflate-fast",
            TiffCompression::DeflateBalanced => "deflate",
            TiffCompression::DeflateBest => "deflate-best",
        };
        f.write_str(name)
    }
}

impl FromStr for TiffCompression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(TiffCompression::None),
            "lzw" => Ok(TiffCompression::Lzw),
            "deflate-fast" => Ok(TiffCompression::DeflateFast),
            "deflate" | "deflate-balanced" => Ok(TiffCompression::DeflateBalanced),
            "deflate-best" => Ok(TiffCompression::DeflateBest),
            other => Err(format!(
                "unknown TIFF compression '{}' (expected none, lzw, deflate-fast, deflate, deflate-best)",
                other
            )),
        }
    }
}

/// Default JPEG quality, matching the usual platform encoder default.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Configuration for image conversion
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Compression method for TIFF output
    pub tiff_compression: TiffCompression,
    /// Predictor value for TIFF compression (2 for horizontal differencing)
    pub predictor: Option<u16>,
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
    /// Whether to validate image dimensions before encoding
    pub validate_dimensions: bool,
    /// Largest width or height accepted when validation is on; `None` only
    /// rejects zero-sized images
    pub max_dimension: Option<u32>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            tiff_compression: TiffCompression::Lzw,
            predictor: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            validate_dimensions: true,
            max_dimension: None,
        }
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::default()
    }
}

/// Builder for ConversionConfig
#[derive(Default)]
pub struct ConversionConfigBuilder {
    tiff_compression: Option<TiffCompression>,
    predictor: Option<Option<u16>>,
    jpeg_quality: Option<u8>,
    validate_dimensions: Option<bool>,
    max_dimension: Option<Option<u32>>,
}

impl ConversionConfigBuilder {
    pub fn tiff_compression(mut self, compression: TiffCompression) -> Self {
        self.tiff_compression = Some(compression);
        self
    }

    pub fn predictor(mut self, predictor: Option<u16>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    /// Clamped to 1-100.
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = Some(quality.clamp(1, 100));
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn max_dimension(mut self, max: Option<u32>) -> Self {
        self.max_dimension = Some(max);
        self
    }

    pub fn build(self) -> ConversionConfig {
        let default = ConversionConfig::default();
        ConversionConfig {
            tiff_compression: self.tiff_compression.unwrap_or(default.tiff_compression),
            predictor: self.predictor.unwrap_or(default.predictor),
            jpeg_quality: self.jpeg_quality.unwrap_or(default.jpeg_quality),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            max_dimension: self.max_dimension.unwrap_or(default.max_dimension),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ConversionConfig::builder()
            .tiff_compression(TiffCompression::DeflateBest)
            .predictor(Some(2))
            .jpeg_quality(0)
            .validate_dimensions(false)
            .max_dimension(Some(10000))
            .build();

        assert_eq!(config.tiff_compression, TiffCompression::DeflateBest);
        assert_eq!(config.predictor, Some(2));
        assert_eq!(config.jpeg_quality, 1);
        assert!(!config.validate_dimensions);
        assert_eq!(config.max_dimension, Some(10000));
    }

    #[test]
    fn test_builder_defaults() {
        let config = ConversionConfig::builder().build();
        assert_eq!(config.tiff_compression, TiffCompression::Lzw);
        assert_eq!(config.jpeg_quality, DEFAULT_JPEG_QUALITY);
        assert!(config.validate_dimensions);
        assert_eq!(config.max_dimension, None);
        assert_eq!(config.predictor, None);
    }

    #[test]
    fn test_parse_tiff_compression() {
        assert_eq!("LZW".parse::<TiffCompression>(), Ok(TiffCompression::Lzw));
        assert_eq!("deflate".parse::<TiffCompression>(), Ok(TiffCompression::DeflateBalanced));
        assert!("zip".parse::<TiffCompression>().is_err());
    }
}
