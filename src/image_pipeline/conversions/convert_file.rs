use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::image_pipeline::{
    common::error::{ConversionError, Result},
    decode::{DecodedImage, ImageReader, StandardImageReader},
    encode::{ConversionConfig, ImageWriter, StandardImageWriter},
    registry::{self, ExportFormat},
    sink::LogSink,
};

/// Same directory and stem as `source`, with the export format's extension.
///
/// The stem is everything before the last `.` of the file name, so a name
/// like `.png` has an empty stem and maps to `.gif`, `.png` and so on.
pub fn destination_path(source: &Path, format: ExportFormat) -> PathBuf {
    let extension = registry::extension_for(format);
    match source.file_name() {
        // `Path::extension` treats a leading dot as part of the stem
        Some(name) if source.extension().is_none() && name.as_encoded_bytes().starts_with(b".") => {
            source.with_file_name(format!(".{}", extension))
        }
        _ => source.with_extension(extension),
    }
}

/// Case-insensitive comparison of the path strings; filesystem identity
/// (links, `..`) is not resolved.
pub fn is_same_path(a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}

/// Converts files one at a time, reporting each outcome to a log sink.
pub struct ConversionPipeline<R: ImageReader, W: ImageWriter> {
    reader: R,
    writer: W,
    config: ConversionConfig,
    sink: Arc<dyn LogSink>,
}

impl ConversionPipeline<StandardImageReader, StandardImageWriter> {
    pub fn new(config: ConversionConfig, sink: Arc<dyn LogSink>) -> Self {
        Self {
            reader: StandardImageReader,
            writer: StandardImageWriter,
            config,
            sink,
        }
    }
}

impl<R: ImageReader, W: ImageWriter> ConversionPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: ConversionConfig, sink: Arc<dyn LogSink>) -> Self {
        Self {
            reader,
            writer,
            config,
            sink,
        }
    }

    /// Converts `source` to `format` next to it.
    ///
    /// Never fails: every outcome, including errors, is reported to the log
    /// sink so a batch can move on to the next file.
    #[instrument(skip(self, source), fields(path = %source.as_ref().display()))]
    pub fn convert_file<P: AsRef<Path>>(&self, source: P, format: ExportFormat) {
        let source = source.as_ref();
        self.sink.add_log_lines(&[format!("Reading: {}", source.display()).as_str()]);

        match self.try_convert(source, format) {
            Ok(destination) => info!(destination = %destination.display(), "Conversion complete"),
            Err(e) => {
                warn!(error = %e, "Conversion aborted");
                self.sink.add_log_line(&e.to_string());
            }
        }
    }

    /// Converts each source in order; a failed file does not stop the rest.
    pub fn convert_files<I, P>(&self, sources: I, format: ExportFormat)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for source in sources {
            self.convert_file(source, format);
        }
    }

    fn try_convert(&self, source: &Path, format: ExportFormat) -> Result<PathBuf> {
        let destination = destination_path(source, format);
        if is_same_path(source, &destination) {
            return Err(ConversionError::OverwriteCollision(destination));
        }

        let decoded = {
            let _span = tracing::info_span!("decode").entered();
            self.decode(source)?
        };

        {
            let _span = tracing::info_span!("validate_dimensions",
                width = decoded.width(),
                height = decoded.height()
            ).entered();
            self.validate_dimensions(decoded.width(), decoded.height())?;
        }

        self.sink.add_log_lines(&[format!("Writing: {}", destination.display()).as_str()]);

        let result = {
            let _span = tracing::info_span!("encode", ?format).entered();
            self.encode(&decoded, format, &destination)
        };
        drop(decoded);
        debug!("Released decoded image");

        result.map(|()| destination)
    }

    fn decode(&self, source: &Path) -> Result<DecodedImage> {
        let data = std::fs::read(source).map_err(|e| {
            ConversionError::DecodeError(format!("{}: {}", source.display(), e))
        })?;
        self.reader.read_image(source, &data)
    }

    fn validate_dimensions(&self, width: u32, height: u32) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if width == 0 || height == 0 {
            return Err(ConversionError::InvalidDimensions(width, height));
        }

        if let Some(max) = self.config.max_dimension {
            if width > max || height > max {
                warn!("Image dimensions {}x{} exceed maximum {}", width, height, max);
                return Err(ConversionError::InvalidDimensions(width, height));
            }
        }

        Ok(())
    }

    /// Encodes fully in memory before touching the destination, so a failed
    /// encode leaves no file behind.
    fn encode(&self, image: &DecodedImage, format: ExportFormat, destination: &Path) -> Result<()> {
        let mut buffer = Vec::new();
        self.writer.write_image(image, format, &mut buffer, &self.config)?;

        std::fs::write(destination, &buffer).map_err(|e| {
            ConversionError::EncodeError(format!("{}: {}", destination.display(), e))
        })?;

        debug!("Wrote {} bytes", buffer.len());
        Ok(())
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ConversionConfig) {
        self.config = config;
    }
}
