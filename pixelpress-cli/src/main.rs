use std::io::Cursor;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use image::{DynamicImage, GenericImageView, ImageFormat};

use pixelpress_core::{BackEnd, Heuristic, Image, PipelineDriver};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Compressor {
    #[value(name = "filtered_zlib")]
    FilteredZlib,
    #[value(name = "filtered_zstd")]
    FilteredZstd,
    #[value(name = "filtered_lz_arithmetic")]
    FilteredLzArithmetic,
    #[value(name = "arithmetic0")]
    Arithmetic0,
    #[value(name = "arithmetic1")]
    Arithmetic1,
    #[value(name = "arithmetic2")]
    Arithmetic2,
    #[value(name = "arithmetic3")]
    Arithmetic3,
    #[value(name = "arithmetic4")]
    Arithmetic4,
}

impl Compressor {
    fn back_end(self) -> BackEnd {
        match self {
            Compressor::FilteredZlib => BackEnd::Deflate,
            Compressor::FilteredZstd => BackEnd::Zstd,
            Compressor::FilteredLzArithmetic => BackEnd::LzArithmetic,
            Compressor::Arithmetic0 => BackEnd::Arithmetic(0),
            Compressor::Arithmetic1 => BackEnd::Arithmetic(1),
            Compressor::Arithmetic2 => BackEnd::Arithmetic(2),
            Compressor::Arithmetic3 => BackEnd::Arithmetic(3),
            Compressor::Arithmetic4 => BackEnd::Arithmetic(4),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HeuristicArg {
    Sum,
    Diffsum,
}

impl From<HeuristicArg> for Heuristic {
    fn from(value: HeuristicArg) -> Self {
        match value {
            HeuristicArg::Sum => Heuristic::AbsoluteSum,
            HeuristicArg::Diffsum => Heuristic::SignedDiffSum,
        }
    }
}

/// Measure a pixelpress-core compression back-end against the size of
/// the same image stored as PNG.
#[derive(Parser)]
#[command(name = "compare")]
struct Cli {
    /// Input image file (any format the `image` crate can decode)
    #[arg(long)]
    filename: PathBuf,

    /// Entropy back-end to measure
    #[arg(long, value_enum)]
    compressor: Compressor,

    /// Encode the filter-type stream separately from the residual stream
    #[arg(long)]
    separate: bool,

    /// Print per-channel byte counts in addition to the summary
    #[arg(long)]
    verbose: bool,

    /// Filter selection heuristic
    #[arg(long, value_enum, default_value = "sum")]
    heuristic: HeuristicArg,
}

/// Channel-major split of an interleaved pixel buffer, e.g. `RGBRGB...`
/// becomes `[R...], [G...], [B...]`.
fn split_channels(width: u32, height: u32, channel_count: usize, interleaved: &[u8]) -> Vec<Vec<u8>> {
    let pixel_count = (width as usize) * (height as usize);
    let mut channels = vec![Vec::with_capacity(pixel_count); channel_count];
    for pixel in interleaved.chunks(channel_count) {
        for (c, channel) in channels.iter_mut().enumerate() {
            channel.push(pixel[c]);
        }
    }
    channels
}

fn load_image(path: &PathBuf) -> Result<(Image, DynamicImage)> {
    let dynamic = image::open(path).with_context(|| format!("failed to read {}", path.display()))?;
    let (width, height) = dynamic.dimensions();

    let (channel_count, interleaved) = if dynamic.color().has_alpha() {
        (4, dynamic.to_rgba8().into_raw())
    } else {
        (3, dynamic.to_rgb8().into_raw())
    };

    let channels = split_channels(width, height, channel_count, &interleaved);
    let image = Image::new(width, height, channels).context("decoded image has an invalid shape")?;

    Ok((image, dynamic))
}

fn png_baseline_size(dynamic: &DynamicImage) -> Result<usize> {
    let mut bytes = Vec::new();
    dynamic
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .context("failed to re-encode image as PNG for the baseline comparison")?;
    Ok(bytes.len())
}

fn main() -> Result<()> {
    env_logger_init();
    let cli = Cli::parse();

    let (image, dynamic) = load_image(&cli.filename)?;
    log::info!(
        "loaded {} ({}x{}, {} channels)",
        cli.filename.display(),
        image.width(),
        image.height(),
        image.channel_count()
    );

    let driver = PipelineDriver::new(image.width(), image.height())
        .with_prepend_filter_type(cli.separate)
        .with_heuristic(cli.heuristic.into())
        .with_back_end(cli.compressor.back_end());

    let encoded = driver.encode_image(&image).context("encode failed")?;
    let compressed_bytes = encoded.len().div_ceil(8);

    let png_bytes = png_baseline_size(&dynamic)?;
    let ratio = png_bytes as f64 / compressed_bytes as f64;

    if cli.verbose {
        println!("Filename:     {}", cli.filename.display());
        println!("Compressor:   {:?}", cli.compressor);
        println!("Separate:     {}", cli.separate);
        println!("Heuristic:    {:?}", cli.heuristic);
        println!("Dimensions:   {}x{}", image.width(), image.height());
        println!("Channels:     {}", image.channel_count());
    }

    println!("PNG baseline: {png_bytes} bytes");
    println!("Compressed:   {compressed_bytes} bytes");
    println!("Ratio:        {ratio:.3}x");

    let decoded = driver.decode_image(&encoded).context("round-trip decode failed")?;
    if decoded != image {
        bail!("round-trip mismatch: decoded image does not match the original");
    }

    Ok(())
}

fn env_logger_init() {
    let _ = env_logger::try_init();
}
