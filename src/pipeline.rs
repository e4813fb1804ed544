use std::path::Path;

use crate::{
    compose::{ComposeOptions, compose_tiles},
    decode::TileDecoder,
    encode::{EncodeOptions, OutputFormat, encode_to_path},
    error::TilemergeResult,
    extract::{MetadataSource, TileExtractor},
    rotate::rotate,
};

#[derive(Clone, Debug, Default)]
pub struct PipelineOptions {
    pub compose: ComposeOptions,
    pub encode: EncodeOptions,
}

/// Runs the whole pipeline: resolve metadata, extract tiles, composite them
/// onto the canvas, rotate, and encode to `dst`.
///
/// Every step is attempt-once. Metadata, extraction and encode failures
/// abort immediately; per-tile decode failures are deferred until all tiles
/// have been attempted and then surface here as the composite error.
/// Extracted temp files are cleaned up in all cases.
#[tracing::instrument(skip(metadata, extractor, decoder, opts))]
pub fn convert(
    metadata: &dyn MetadataSource,
    extractor: &dyn TileExtractor,
    decoder: &dyn TileDecoder,
    dst: &Path,
    opts: &PipelineOptions,
) -> TilemergeResult<()> {
    // An unrecognized destination extension fails before any work happens
    // and before any file is created.
    OutputFormat::from_path(dst)?;

    let info = metadata.resolve()?;
    let tiles = extractor.extract()?;
    let canvas = compose_tiles(&info, tiles.sources(), decoder, &opts.compose)?;
    drop(tiles);

    let canvas = rotate(canvas, info.rotation as f64);
    encode_to_path(&canvas, dst, &opts.encode)
}
