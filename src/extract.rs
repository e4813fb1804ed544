//! Collaborator boundary for metadata resolution and tile extraction.
//!
//! The core never parses a container itself; it asks a [`MetadataSource`]
//! for the grid description and a [`TileExtractor`] for the ordered tile
//! bitstreams. [`HeifTileTool`] satisfies both by shelling out to an
//! external `heif2hevc`-style tool; tests and other backends can implement
//! the traits directly.

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use crate::{
    decode::TileSource,
    error::{TilemergeError, TilemergeResult},
    grid::{GridInfo, parse_grid_info},
};

pub trait MetadataSource {
    fn resolve(&self) -> TilemergeResult<GridInfo>;
}

/// Produces the ordered (row-major) list of per-tile sources.
pub trait TileExtractor {
    fn extract(&self) -> TilemergeResult<ExtractedTiles>;
}

/// Tile sources together with their on-disk lifecycle: files registered for
/// cleanup are removed when this is dropped, whether or not the rest of the
/// pipeline succeeded.
pub struct ExtractedTiles {
    sources: Vec<TileSource>,
    cleanup: Vec<PathBuf>,
}

impl ExtractedTiles {
    /// Tile files owned by this value; they are deleted on drop.
    pub fn from_files(paths: Vec<PathBuf>) -> Self {
        Self {
            sources: paths.iter().cloned().map(TileSource::File).collect(),
            cleanup: paths,
        }
    }

    /// In-memory tile buffers; nothing to clean up.
    pub fn from_bytes(buffers: Vec<Vec<u8>>) -> Self {
        Self {
            sources: buffers.into_iter().map(TileSource::Bytes).collect(),
            cleanup: Vec::new(),
        }
    }

    pub fn sources(&self) -> &[TileSource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Drop for ExtractedTiles {
    fn drop(&mut self) {
        for path in &self.cleanup {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Subprocess wrapper around an HEIF container tool.
///
/// `<binary> -info <source>` dumps line-oriented `name=value` metadata on
/// stdout; `<binary> <source> <prefix>` writes one raw tile bitstream per
/// file named after `<prefix>`, in row-major order.
#[derive(Clone, Debug)]
pub struct HeifTileTool {
    binary: PathBuf,
    source: PathBuf,
    scratch_prefix: PathBuf,
}

impl HeifTileTool {
    /// `dst` is the final output path; extracted tiles are staged next to it
    /// under `<dst>.<pid>.tmp*` so concurrent runs do not collide.
    pub fn new(binary: impl Into<PathBuf>, source: impl Into<PathBuf>, dst: &Path) -> Self {
        let scratch_prefix =
            PathBuf::from(format!("{}.{}.tmp", dst.display(), std::process::id()));
        Self {
            binary: binary.into(),
            source: source.into(),
            scratch_prefix,
        }
    }
}

impl MetadataSource for HeifTileTool {
    fn resolve(&self) -> TilemergeResult<GridInfo> {
        let output = Command::new(&self.binary)
            .arg("-info")
            .arg(&self.source)
            .output()
            .map_err(|e| {
                TilemergeError::external_tool(format!(
                    "failed to run '{} -info': {e}",
                    self.binary.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TilemergeError::external_tool(format!(
                "'{} -info' exited with status {}: {}",
                self.binary.display(),
                output.status,
                stderr.trim()
            )));
        }

        let info = parse_grid_info(&String::from_utf8_lossy(&output.stdout));
        tracing::debug!(?info, "resolved grid metadata");
        Ok(info)
    }
}

impl TileExtractor for HeifTileTool {
    fn extract(&self) -> TilemergeResult<ExtractedTiles> {
        let output = Command::new(&self.binary)
            .arg(&self.source)
            .arg(&self.scratch_prefix)
            .output()
            .map_err(|e| {
                TilemergeError::external_tool(format!(
                    "failed to run '{}': {e}",
                    self.binary.display()
                ))
            })?;

        // Adopt whatever the tool produced, even on failure, so partial
        // output is cleaned up when the guard drops.
        let tiles = ExtractedTiles::from_files(collect_prefixed_files(&self.scratch_prefix));

        if !output.status.success() {
            let mut diag = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                if !diag.is_empty() {
                    diag.push('\n');
                }
                diag.push_str(stderr.trim());
            }
            return Err(TilemergeError::external_tool(format!(
                "'{}' exited with status {}: {diag}",
                self.binary.display(),
                output.status
            )));
        }

        tracing::debug!(tiles = tiles.len(), "extracted tile bitstreams");
        Ok(tiles)
    }
}

/// Files whose name starts with `prefix`'s file name, in row-major order.
/// Sorting by (length, name) keeps numeric suffixes in numeric order
/// (`...-9` before `...-10`).
fn collect_prefixed_files(prefix: &Path) -> Vec<PathBuf> {
    let Some(stem) = prefix.file_name().and_then(|n| n.to_str()) else {
        return Vec::new();
    };
    let parent = match prefix.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut found: Vec<(String, PathBuf)> = Vec::new();
    if let Ok(entries) = std::fs::read_dir(parent) {
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with(stem) {
                found.push((name.to_string(), entry.path()));
            }
        }
    }

    found.sort_by(|a, b| (a.0.len(), &a.0).cmp(&(b.0.len(), &b.0)));
    found.into_iter().map(|(_, path)| path).collect()
}
