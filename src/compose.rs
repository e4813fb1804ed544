use std::sync::{
    atomic::{AtomicUsize, Ordering},
    mpsc,
};

use crate::{
    canvas::Canvas,
    decode::{TileDecoder, TileSource},
    error::{TilemergeError, TilemergeResult},
    grid::GridInfo,
};

/// One unit of work for the pool: decode the tile at `index` and place it
/// at grid cell `(col, row)`. Position is fixed by the tile's position in
/// the source list, row-major.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileJob {
    pub index: usize,
    pub col: u32,
    pub row: u32,
}

pub fn layout_jobs(cols: u32, count: usize) -> Vec<TileJob> {
    (0..count)
        .map(|i| TileJob {
            index: i,
            col: i as u32 % cols,
            row: i as u32 / cols,
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct ComposeOptions {
    /// Worker pool size. Clamped to at least 1; 1 means sequential decode.
    pub threads: usize,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self { threads: 1 }
    }
}

struct TileMsg {
    job: TileJob,
    result: TilemergeResult<Canvas>,
}

/// Decodes every tile and composites each into its grid cell of a fresh
/// canvas.
///
/// The job queue is fully populated up front and never grows, so workers
/// terminate naturally once it drains. Workers only decode; the calling
/// thread owns the canvas for the whole assembly and performs the blits as
/// results arrive, which keeps the destination exclusively owned while the
/// disjoint-rectangle placement still guarantees tiles never overwrite each
/// other. Each destination rectangle is sized by the decoded tile's own
/// bounds.
///
/// A failed decode does not stop the remaining jobs; every tile is decoded
/// exactly once regardless. After the full join, the failure with the lowest
/// job index is returned, so the reported error does not depend on worker
/// scheduling. The partially filled canvas is discarded in that case.
#[tracing::instrument(skip(sources, decoder), fields(tiles = sources.len()))]
pub fn compose_tiles(
    grid: &GridInfo,
    sources: &[TileSource],
    decoder: &dyn TileDecoder,
    opts: &ComposeOptions,
) -> TilemergeResult<Canvas> {
    grid.validate()?;

    let jobs = layout_jobs(grid.cols, sources.len());
    let mut canvas = Canvas::new(grid.width, grid.height);
    if jobs.is_empty() {
        return Ok(canvas);
    }

    let threads = opts.threads.max(1).min(jobs.len());
    let cursor = AtomicUsize::new(0);
    let mut failures: Vec<(usize, TilemergeError)> = Vec::new();

    std::thread::scope(|scope| {
        let (tx, rx) = mpsc::channel::<TileMsg>();

        for _ in 0..threads {
            let tx = tx.clone();
            let cursor = &cursor;
            let jobs = &jobs;
            scope.spawn(move || {
                loop {
                    let i = cursor.fetch_add(1, Ordering::Relaxed);
                    let Some(job) = jobs.get(i).copied() else {
                        break;
                    };
                    let result = decoder.decode_tile(&sources[job.index]);
                    if tx.send(TileMsg { job, result }).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        for msg in rx {
            match msg.result {
                Ok(tile) => {
                    let x = msg.job.col.saturating_mul(tile.width);
                    let y = msg.job.row.saturating_mul(tile.height);
                    canvas.blit(&tile, x, y);
                }
                Err(err) => {
                    tracing::warn!(job = msg.job.index, error = %err, "tile decode failed");
                    failures.push((msg.job.index, err));
                }
            }
        }
    });

    failures.sort_by_key(|(index, _)| *index);
    if let Some((_, err)) = failures.into_iter().next() {
        return Err(err);
    }

    Ok(canvas)
}
