//! Image conversion pipeline module
//!
//! Converts raster image files between formats: a static format registry,
//! decode and encode stages behind reader/writer traits, and the per-file
//! conversion orchestration that reports through a log sink.

pub mod common;
pub mod conversions;
pub mod decode;
pub mod encode;
pub mod registry;
pub mod sink;

pub use common::{
    ConversionError,
    Result,
};

pub use registry::{
    ExportFormat,
    UnknownFormatError,
};

pub use decode::{
    DecodedImage,
    ImageReader,
    Resolution,
    StandardImageReader,
};

pub use encode::{
    ConversionConfig,
    ConversionConfigBuilder,
    ImageWriter,
    StandardImageWriter,
    TiffCompression,
};

pub use conversions::{
    destination_path,
    is_same_path,
    ConversionPipeline,
};

pub use sink::{
    LogSink,
    MemoryLogSink,
    TimestampedLogSink,
    TracingLogSink,
};
