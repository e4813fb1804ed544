#![forbid(unsafe_code)]

pub mod canvas;
pub mod compose;
pub mod decode;
pub mod encode;
pub mod error;
pub mod extract;
pub mod grid;
pub mod pipeline;
pub mod rotate;

pub use canvas::Canvas;
pub use compose::{ComposeOptions, TileJob, compose_tiles, layout_jobs};
pub use decode::{FfmpegTileDecoder, ImageTileDecoder, TileDecoder, TileSource};
pub use encode::{
    EncodeOptions, OutputFormat, PngCompression, encode_to_path, encode_to_writer,
};
pub use error::{TilemergeError, TilemergeResult};
pub use extract::{ExtractedTiles, HeifTileTool, MetadataSource, TileExtractor};
pub use grid::{GridInfo, parse_grid_info};
pub use pipeline::{PipelineOptions, convert};
pub use rotate::rotate;
