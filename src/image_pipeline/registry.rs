//! Export format registry
//!
//! Static table mapping every export format to the extension it is written
//! with and the codec that encodes it. The table is built at compile time and
//! never mutated, so lookups are total and safe from any thread.

use std::fmt;
use std::str::FromStr;

use image::ImageFormat;
use thiserror::Error;

/// Target encodings a file can be converted to.
///
/// Only raster formats with a real encoder are listed. Emf, Wmf and Exif are
/// not offered: there is no encoder for them, and writing PNG bytes under
/// those names would mislabel the output. Selection lists built from
/// [`ExportFormat::available`] therefore hold at most seven entries, not the
/// ten a GDI+-style format list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Bmp,
    Gif,
    Icon,
    Jpeg,
    Png,
    Tiff,
    Webp,
}

/// Codecs that the generic `image` encode/decode path does not cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecializedCodec {
    /// Lossless WebP, the maximum-quality setting of the encoder.
    WebpLossless,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Generic(ImageFormat),
    Specialized(SpecializedCodec),
}

#[derive(Debug, Clone, Copy)]
pub struct FormatEntry {
    pub format: ExportFormat,
    /// Lower-case output extension without the leading dot
    pub extension: &'static str,
    pub codec: Codec,
    /// False when the crate was built without the codec for this format
    pub available: bool,
}

// Indexed by `ExportFormat as usize`; order must follow the enum.
static REGISTRY: [FormatEntry; 7] = [
    FormatEntry {
        format: ExportFormat::Bmp,
        extension: "bmp",
        codec: Codec::Generic(ImageFormat::Bmp),
        available: true,
    },
    FormatEntry {
        format: ExportFormat::Gif,
        extension: "gif",
        codec: Codec::Generic(ImageFormat::Gif),
        available: true,
    },
    FormatEntry {
        format: ExportFormat::Icon,
        extension: "icon",
        codec: Codec::Generic(ImageFormat::Ico),
        available: true,
    },
    FormatEntry {
        format: ExportFormat::Jpeg,
        extension: "jpg",
        codec: Codec::Generic(ImageFormat::Jpeg),
        available: true,
    },
    FormatEntry {
        format: ExportFormat::Png,
        extension: "png",
        codec: Codec::Generic(ImageFormat::Png),
        available: true,
    },
    FormatEntry {
        format: ExportFormat::Tiff,
        extension: "tiff",
        codec: Codec::Generic(ImageFormat::Tiff),
        available: true,
    },
    FormatEntry {
        format: ExportFormat::Webp,
        extension: "webp",
        codec: Codec::Specialized(SpecializedCodec::WebpLossless),
        available: cfg!(feature = "webp"),
    },
];

impl ExportFormat {
    pub const ALL: [ExportFormat; 7] = [
        ExportFormat::Bmp,
        ExportFormat::Gif,
        ExportFormat::Icon,
        ExportFormat::Jpeg,
        ExportFormat::Png,
        ExportFormat::Tiff,
        ExportFormat::Webp,
    ];

    /// Formats this build can actually encode, in display order.
    pub fn available() -> impl Iterator<Item = ExportFormat> {
        Self::ALL.into_iter().filter(|format| format.is_available())
    }

    pub fn is_available(self) -> bool {
        entry(self).available
    }

    pub fn name(self) -> &'static str {
        match self {
            ExportFormat::Bmp => "Bmp",
            ExportFormat::Gif => "Gif",
            ExportFormat::Icon => "Icon",
            ExportFormat::Jpeg => "Jpeg",
            ExportFormat::Png => "Png",
            ExportFormat::Tiff => "Tiff",
            ExportFormat::Webp => "Webp",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported export format: {0}")]
pub struct UnknownFormatError(pub String);

impl FromStr for ExportFormat {
    type Err = UnknownFormatError;

    /// Accepts the display name or the output extension, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('.');
        REGISTRY
            .iter()
            .filter(|entry| entry.available)
            .find(|entry| {
                entry.format.name().eq_ignore_ascii_case(wanted)
                    || entry.extension.eq_ignore_ascii_case(wanted)
            })
            .map(|entry| entry.format)
            .ok_or_else(|| UnknownFormatError(s.to_string()))
    }
}

pub fn entry(format: ExportFormat) -> &'static FormatEntry {
    &REGISTRY[format as usize]
}

pub fn extension_for(format: ExportFormat) -> &'static str {
    entry(format).extension
}

pub fn requires_specialized_encoder(format: ExportFormat) -> bool {
    matches!(entry(format).codec, Codec::Specialized(_))
}

/// `None` only for formats that go through a specialized encoder.
pub fn generic_codec_for(format: ExportFormat) -> Option<ImageFormat> {
    match entry(format).codec {
        Codec::Generic(image_format) => Some(image_format),
        Codec::Specialized(_) => None,
    }
}

/// Specialized decoder to use for a source file extension (without dot).
pub fn specialized_decoder_for_extension(extension: &str) -> Option<SpecializedCodec> {
    REGISTRY
        .iter()
        .filter(|entry| entry.available)
        .find(|entry| entry.extension.eq_ignore_ascii_case(extension))
        .and_then(|entry| match entry.codec {
            Codec::Specialized(codec) => Some(codec),
            Codec::Generic(_) => None,
        })
}
