use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "tilemerge",
    version,
    about = "Assemble a tiled source image into a single PNG or JPEG"
)]
struct Cli {
    /// Source container (e.g. an HEIF file).
    src: PathBuf,

    /// Destination image; the extension picks the format (.png, .jpg, .jpeg).
    dst: PathBuf,

    /// Path to the ffmpeg binary used to decode tile bitstreams.
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Path to the heif2hevc binary used for metadata and tile extraction.
    #[arg(long, default_value = "heif2hevc")]
    heif2hevc: PathBuf,

    /// PNG compression effort.
    #[arg(long, value_enum, default_value_t = PngLevel::Default)]
    png_compression: PngLevel,

    /// JPEG quality (0 worst, 100 best).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100), default_value_t = 90)]
    jpeg_quality: u8,

    /// Worker pool size for tile decoding.
    #[arg(long, default_value_t = 1)]
    threads: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PngLevel {
    Default,
    None,
    Fastest,
    Smallest,
}

impl From<PngLevel> for tilemerge::PngCompression {
    fn from(level: PngLevel) -> Self {
        match level {
            PngLevel::Default => Self::Default,
            PngLevel::None => Self::None,
            PngLevel::Fastest => Self::Fastest,
            PngLevel::Smallest => Self::Smallest,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let tool = tilemerge::HeifTileTool::new(&cli.heif2hevc, &cli.src, &cli.dst);
    let decoder = tilemerge::FfmpegTileDecoder::new(&cli.ffmpeg, "hevc");
    let opts = tilemerge::PipelineOptions {
        compose: tilemerge::ComposeOptions {
            threads: cli.threads,
        },
        encode: tilemerge::EncodeOptions {
            png_compression: cli.png_compression.into(),
            jpeg_quality: cli.jpeg_quality,
        },
    };

    tilemerge::convert(&tool, &tool, &decoder, &cli.dst, &opts).with_context(|| {
        format!(
            "convert '{}' -> '{}'",
            cli.src.display(),
            cli.dst.display()
        )
    })?;

    eprintln!("wrote {}", cli.dst.display());
    Ok(())
}
