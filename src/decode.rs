use std::{
    io::Write as _,
    path::PathBuf,
    process::{Command, Stdio},
};

use crate::{
    canvas::Canvas,
    error::{TilemergeError, TilemergeResult},
};

/// An opaque handle to one tile's encoded bytes, in row-major grid order.
#[derive(Clone, Debug)]
pub enum TileSource {
    Bytes(Vec<u8>),
    File(PathBuf),
}

/// Decodes one tile's encoded byte stream into a bitmap.
///
/// From the scheduler's point of view this is a pure bytes-to-bitmap
/// function; whether it runs in-process or shells out to an external decoder
/// is an implementation detail. `Sync` because the worker pool shares one
/// decoder across threads.
pub trait TileDecoder: Sync {
    fn decode_tile(&self, source: &TileSource) -> TilemergeResult<Canvas>;
}

/// In-process decoder for tiles in any container the `image` crate
/// recognizes (PNG, JPEG, ...).
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageTileDecoder;

impl TileDecoder for ImageTileDecoder {
    fn decode_tile(&self, source: &TileSource) -> TilemergeResult<Canvas> {
        match source {
            TileSource::Bytes(bytes) => decode_rgba(bytes),
            TileSource::File(path) => {
                let bytes = std::fs::read(path)
                    .map_err(|e| TilemergeError::io(format!("read tile '{}'", path.display()), e))?;
                decode_rgba(&bytes)
            }
        }
    }
}

/// Decoder that pipes each tile through the system `ffmpeg` binary
/// (`-f <format_hint> -i <tile> -f image2pipe -vcodec png -`) and decodes
/// the PNG it emits. Used for raw bitstreams such as the HEVC tiles an HEIF
/// extractor produces.
#[derive(Clone, Debug)]
pub struct FfmpegTileDecoder {
    binary: PathBuf,
    format_hint: String,
}

impl FfmpegTileDecoder {
    pub fn new(binary: impl Into<PathBuf>, format_hint: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            format_hint: format_hint.into(),
        }
    }

    /// Decoder for raw HEVC tile bitstreams via `ffmpeg` on `PATH`.
    pub fn hevc() -> Self {
        Self::new("ffmpeg", "hevc")
    }
}

impl TileDecoder for FfmpegTileDecoder {
    fn decode_tile(&self, source: &TileSource) -> TilemergeResult<Canvas> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["-hide_banner", "-f", &self.format_hint, "-i"]);

        let output = match source {
            TileSource::File(path) => {
                cmd.arg(path)
                    .args(["-f", "image2pipe", "-vcodec", "png", "-"]);
                cmd.output()
                    .map_err(|e| TilemergeError::decode(format!("failed to run ffmpeg: {e}")))?
            }
            TileSource::Bytes(bytes) => {
                cmd.args(["pipe:0", "-f", "image2pipe", "-vcodec", "png", "-"]);
                cmd.stdin(Stdio::piped())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());
                let mut child = cmd
                    .spawn()
                    .map_err(|e| TilemergeError::decode(format!("failed to spawn ffmpeg: {e}")))?;
                if let Some(stdin) = child.stdin.as_mut() {
                    stdin.write_all(bytes).map_err(|e| {
                        TilemergeError::decode(format!("failed to write tile to ffmpeg stdin: {e}"))
                    })?;
                }
                drop(child.stdin.take());
                child
                    .wait_with_output()
                    .map_err(|e| TilemergeError::decode(format!("failed to wait for ffmpeg: {e}")))?
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TilemergeError::decode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        decode_rgba(&output.stdout)
    }
}

fn decode_rgba(bytes: &[u8]) -> TilemergeResult<Canvas> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| TilemergeError::decode(format!("decode tile bitmap: {e}")))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Canvas::from_rgba8(width, height, rgba.into_raw())
        .ok_or_else(|| TilemergeError::decode("decoded tile buffer has inconsistent size"))
}
