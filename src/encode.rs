use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use crate::{
    canvas::Canvas,
    error::{TilemergeError, TilemergeResult},
};

/// Output format, selected by the destination's file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    /// Recognizes `.png`, `.jpg` and `.jpeg` (case-insensitive). Anything
    /// else is an [`TilemergeError::UnsupportedFormat`].
    pub fn from_path(path: &Path) -> TilemergeResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            _ => Err(TilemergeError::unsupported_format(format!(
                "'{}' (expected .png, .jpg or .jpeg)",
                path.display()
            ))),
        }
    }
}

/// PNG compression effort.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PngCompression {
    #[default]
    Default,
    None,
    Fastest,
    Smallest,
}

impl PngCompression {
    fn to_png(self) -> png::Compression {
        match self {
            Self::Default => png::Compression::Balanced,
            Self::None => png::Compression::NoCompression,
            Self::Fastest => png::Compression::Fastest,
            Self::Smallest => png::Compression::High,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct EncodeOptions {
    pub png_compression: PngCompression,
    /// JPEG quality, 0 (worst) to 100 (best).
    pub jpeg_quality: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            png_compression: PngCompression::default(),
            jpeg_quality: 90,
        }
    }
}

impl EncodeOptions {
    pub fn validate(&self) -> TilemergeResult<()> {
        if self.jpeg_quality > 100 {
            return Err(TilemergeError::validation(
                "jpeg quality must be in 0..=100",
            ));
        }
        Ok(())
    }
}

/// Serializes `canvas` to `writer` in the given format.
pub fn encode_to_writer<W: Write>(
    canvas: &Canvas,
    format: OutputFormat,
    opts: &EncodeOptions,
    writer: &mut W,
) -> TilemergeResult<()> {
    opts.validate()?;

    match format {
        OutputFormat::Png => {
            let mut enc = png::Encoder::new(writer, canvas.width, canvas.height);
            enc.set_color(png::ColorType::Rgba);
            enc.set_depth(png::BitDepth::Eight);
            enc.set_compression(opts.png_compression.to_png());
            let mut png_writer = enc
                .write_header()
                .map_err(|e| map_encode_error("write png header", e.into()))?;
            png_writer
                .write_image_data(&canvas.data)
                .map_err(|e| map_encode_error("write png image data", e.into()))?;
            png_writer
                .finish()
                .map_err(|e| map_encode_error("finish png stream", e.into()))?;
        }
        OutputFormat::Jpeg => {
            // JPEG carries no alpha channel; drop it, as the reference
            // encoder does.
            let mut rgb = Vec::with_capacity(canvas.data.len() / 4 * 3);
            for px in canvas.data.chunks_exact(4) {
                rgb.extend_from_slice(&px[..3]);
            }
            let enc = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, opts.jpeg_quality);
            image::ImageEncoder::write_image(
                enc,
                &rgb,
                canvas.width,
                canvas.height,
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| map_encode_error("encode jpeg", e.into()))?;
        }
    }

    Ok(())
}

/// Encoder failures rooted in the destination stream surface as
/// [`TilemergeError::Io`] with the underlying cause; everything else (bad
/// parameters, format-level failures) stays a generic error.
fn map_encode_error(context: &str, err: anyhow::Error) -> TilemergeError {
    if let Some(io) = err.chain().find_map(|c| c.downcast_ref::<std::io::Error>()) {
        return TilemergeError::io(context, std::io::Error::new(io.kind(), io.to_string()));
    }
    TilemergeError::Other(err.context(context.to_string()))
}

/// Serializes `canvas` to `path`, picking the format from the extension.
///
/// The format is resolved before the destination is opened, so an
/// unrecognized extension leaves no file behind. A partial file from a
/// failed write is not cleaned up.
pub fn encode_to_path(canvas: &Canvas, path: &Path, opts: &EncodeOptions) -> TilemergeResult<()> {
    let format = OutputFormat::from_path(path)?;

    let file = File::create(path)
        .map_err(|e| TilemergeError::io(format!("create '{}'", path.display()), e))?;
    let mut writer = BufWriter::new(file);
    encode_to_writer(canvas, format, opts, &mut writer)?;
    writer
        .flush()
        .map_err(|e| TilemergeError::io(format!("write '{}'", path.display()), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn gradient(width: u32, height: u32) -> Canvas {
        let mut c = Canvas::new(width, height);
        for y in 0..height {
            for x in 0..width {
                c.put_pixel(x, y, [(x * 37) as u8, (y * 73) as u8, (x + y) as u8, 255]);
            }
        }
        c
    }

    #[test]
    fn format_is_picked_from_extension_case_insensitively() {
        assert_eq!(
            OutputFormat::from_path(Path::new("a/b/out.png")).unwrap(),
            OutputFormat::Png
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("out.JPG")).unwrap(),
            OutputFormat::Jpeg
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("out.jpeg")).unwrap(),
            OutputFormat::Jpeg
        );
        assert!(matches!(
            OutputFormat::from_path(Path::new("out.bmp")),
            Err(TilemergeError::UnsupportedFormat(_))
        ));
        assert!(OutputFormat::from_path(Path::new("out")).is_err());
    }

    #[test]
    fn png_round_trips_pixel_identical_at_every_level() {
        let canvas = gradient(9, 5);
        for level in [
            PngCompression::Default,
            PngCompression::None,
            PngCompression::Fastest,
            PngCompression::Smallest,
        ] {
            let opts = EncodeOptions {
                png_compression: level,
                ..EncodeOptions::default()
            };
            let mut buf = Vec::new();
            encode_to_writer(&canvas, OutputFormat::Png, &opts, &mut buf).unwrap();

            let decoded = image::load_from_memory(&buf).unwrap().to_rgba8();
            assert_eq!(decoded.dimensions(), (9, 5));
            assert_eq!(decoded.into_raw(), canvas.data, "level {level:?}");
        }
    }

    #[test]
    fn jpeg_encodes_with_expected_dimensions() {
        let canvas = gradient(8, 6);
        let mut buf = Vec::new();
        encode_to_writer(
            &canvas,
            OutputFormat::Jpeg,
            &EncodeOptions::default(),
            &mut buf,
        )
        .unwrap();

        let decoded = image::load_from_memory(&buf).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn unsupported_extension_creates_no_file() {
        let dir = PathBuf::from("target").join("encode_unsupported");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.bmp");
        let _ = std::fs::remove_file(&path);

        let err =
            encode_to_path(&gradient(2, 2), &path, &EncodeOptions::default()).unwrap_err();
        assert!(matches!(err, TilemergeError::UnsupportedFormat(_)));
        assert!(!path.exists());
    }

    #[test]
    fn unwritable_destination_is_an_io_error() {
        let path = PathBuf::from("target")
            .join("no-such-dir")
            .join("out.png");
        let err =
            encode_to_path(&gradient(2, 2), &path, &EncodeOptions::default()).unwrap_err();
        assert!(matches!(err, TilemergeError::Io { .. }));
    }

    /// Accepts at most `limit` bytes, then fails like a full disk.
    struct ShortWriter {
        limit: usize,
        written: usize,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.written + buf.len() > self.limit {
                return Err(std::io::Error::other("disk full"));
            }
            self.written += buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn mid_stream_png_write_failure_is_an_io_error() {
        let mut writer = ShortWriter {
            limit: 8,
            written: 0,
        };
        let err = encode_to_writer(
            &gradient(16, 16),
            OutputFormat::Png,
            &EncodeOptions::default(),
            &mut writer,
        )
        .unwrap_err();
        assert!(matches!(err, TilemergeError::Io { .. }), "got: {err}");
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn mid_stream_jpeg_write_failure_is_an_io_error() {
        let mut writer = ShortWriter {
            limit: 8,
            written: 0,
        };
        let err = encode_to_writer(
            &gradient(16, 16),
            OutputFormat::Jpeg,
            &EncodeOptions::default(),
            &mut writer,
        )
        .unwrap_err();
        assert!(matches!(err, TilemergeError::Io { .. }), "got: {err}");
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn out_of_range_jpeg_quality_is_rejected() {
        let opts = EncodeOptions {
            jpeg_quality: 101,
            ..EncodeOptions::default()
        };
        let mut buf = Vec::new();
        let err =
            encode_to_writer(&gradient(2, 2), OutputFormat::Jpeg, &opts, &mut buf).unwrap_err();
        assert!(matches!(err, TilemergeError::Validation(_)));
    }
}
