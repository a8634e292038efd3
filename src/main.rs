use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use imgconv::image_pipeline::encode::types::DEFAULT_JPEG_QUALITY;
use imgconv::image_pipeline::registry;
use imgconv::image_pipeline::{
    ConversionConfig, ConversionPipeline, ExportFormat, TiffCompression, TimestampedLogSink,
};
use imgconv::logger::{self, info};

/// Convert raster image files to another format, next to the originals.
#[derive(Parser, Debug)]
#[command(name = "imgconv", version, about)]
struct Cli {
    /// Output format: Bmp, Gif, Icon, Jpeg, Png, Tiff or Webp
    #[arg(short, long, default_value = "Png")]
    format: ExportFormat,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// TIFF compression: none, lzw, deflate-fast, deflate, deflate-best
    #[arg(long, default_value = "lzw")]
    tiff_compression: TiffCompression,

    /// TIFF predictor (2 = horizontal differencing)
    #[arg(long)]
    tiff_predictor: Option<u16>,

    /// Print the supported output formats and exit
    #[arg(long)]
    list_formats: bool,

    /// Emit debug diagnostics on stderr (default level is info)
    #[arg(short, long)]
    verbose: bool,

    /// Source image files
    #[arg(required_unless_present = "list_formats")]
    files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(if cli.verbose { "debug" } else { "info" });

    if cli.list_formats {
        for format in ExportFormat::available() {
            println!("{:<6} .{}", format, registry::extension_for(format));
        }
        return Ok(());
    }

    let config = ConversionConfig::builder()
        .jpeg_quality(cli.jpeg_quality)
        .tiff_compression(cli.tiff_compression)
        .predictor(cli.tiff_predictor)
        .build();
    let sink = Arc::new(TimestampedLogSink::new(io::stdout()));
    let pipeline = ConversionPipeline::new(config, sink);

    info!(format = %cli.format, files = cli.files.len(), "Starting conversion");
    pipeline.convert_files(&cli.files, cli.format);

    Ok(())
}
