use linbin_common::Result;
use rayon::prelude::*;

use crate::binner::{BinReport, BinTally, LinearBinner};

/// Upper bound on partial grids held at once; each one is `m` cells.
pub const MAX_CHUNKS: usize = 256;

/// Grows `chunk_size` so `n` samples split into at most [`MAX_CHUNKS`] chunks.
pub fn effective_chunk_size(n: usize, chunk_size: usize) -> usize {
    chunk_size.max(n.div_ceil(MAX_CHUNKS)).max(1)
}

impl LinearBinner {
    /// Bins fixed-size chunks on the rayon pool, then sums the partial grids in chunk order.
    /// The result depends on `chunk_size` and `samples.len()` but not on the number of threads.
    /// Small chunk sizes are raised by [`effective_chunk_size`], so working memory stays at
    /// most `MAX_CHUNKS * m` cells.
    pub fn bin_parallel(&self, samples: &[f64], chunk_size: usize) -> Result<BinReport> {
        let m = self.grid().m();
        let chunk_size = effective_chunk_size(samples.len(), chunk_size);
        let partials: Vec<Result<(Vec<f64>, BinTally)>> = samples
            .par_chunks(chunk_size)
            .enumerate()
            .map(|(i, chunk)| {
                let mut grid = vec![0.0; m];
                let tally = self.accumulate_at(chunk, i * chunk_size, &mut grid)?;
                Ok((grid, tally))
            })
            .collect();

        let mut gcounts = vec![0.0; m];
        let mut tally = BinTally::default();
        for partial in partials {
            // chunk order: the first error is the lowest-indexed one
            let (grid, t) = partial?;
            for (acc, v) in gcounts.iter_mut().zip(&grid) {
                *acc += v;
            }
            tally.merge(&t);
        }
        Ok(self.finish(samples.len(), gcounts, tally))
    }
}
