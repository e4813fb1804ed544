use crate::error::{TilemergeError, TilemergeResult};

/// Structured layout metadata for a tiled image: overall dimensions, the
/// rotation to apply after assembly, and the tile grid shape.
///
/// Produced once by [`parse_grid_info`] (or any other
/// [`MetadataSource`](crate::extract::MetadataSource)) and read-only after
/// that.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridInfo {
    pub width: u32,
    pub height: u32,
    /// Counter-clockwise rotation in degrees applied to the assembled image.
    pub rotation: i64,
    pub tiles: u32,
    pub rows: u32,
    pub cols: u32,
}

impl GridInfo {
    /// Checks the fields composition actually depends on. Missing metadata
    /// leaves them at zero, which would otherwise surface as a zero-sized
    /// canvas or a division by zero in job layout.
    pub fn validate(&self) -> TilemergeResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TilemergeError::validation(
                "grid width/height must be non-zero",
            ));
        }
        if self.rows == 0 || self.cols == 0 {
            return Err(TilemergeError::validation("grid rows/cols must be >= 1"));
        }
        Ok(())
    }
}

/// Parses the line-oriented `name=value` dump produced by the metadata tool.
///
/// Only lines whose value parses as a base-10 integer are considered;
/// everything else (unknown names, malformed values, free-form text) is
/// skipped, so fields missing from the dump keep their zero default. Field
/// extraction is order-independent.
///
/// Single-tile images are never split: `tiles=1` forces `rows` and `cols`
/// to 1 regardless of what the tool reported.
pub fn parse_grid_info(text: &str) -> GridInfo {
    let mut info = GridInfo::default();

    for line in text.lines() {
        let Some((name, value)) = line.split_once('=') else {
            continue;
        };
        let Ok(value) = value.trim().parse::<i64>() else {
            continue;
        };

        let clamped = value.clamp(0, i64::from(u32::MAX)) as u32;
        match name {
            "width" => info.width = clamped,
            "height" => info.height = clamped,
            "rotation" => info.rotation = value,
            "tiles" => info.tiles = clamped,
            "rows" => info.rows = clamped,
            "cols" => info.cols = clamped,
            _ => {}
        }
    }

    if info.tiles == 1 {
        info.rows = 1;
        info.cols = 1;
    }

    info
}
