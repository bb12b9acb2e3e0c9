use linbin_common::{BinningConfig, LinbinError, NonFinitePolicy, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::grid::GridSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinOptions {
    pub truncate: bool,
    pub non_finite: NonFinitePolicy,
    pub parallel_threshold: usize,
    pub chunk_size: usize,
}

impl From<&BinningConfig> for BinOptions {
    fn from(cfg: &BinningConfig) -> Self {
        Self {
            truncate: cfg.truncate,
            non_finite: cfg.non_finite,
            parallel_threshold: cfg.parallel_threshold,
            chunk_size: cfg.chunk_size,
        }
    }
}

impl Default for BinOptions {
    fn default() -> Self {
        Self::from(&BinningConfig::default())
    }
}

/// Where each sample went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BinTally {
    pub binned: usize,
    pub clipped: usize,
    pub discarded: usize,
    pub skipped_non_finite: usize,
    pub propagated_nan: usize,
}

impl BinTally {
    /// Samples that added unit mass to the grid.
    pub fn contributing(&self) -> usize {
        self.binned + self.clipped
    }

    pub fn merge(&mut self, other: &BinTally) {
        self.binned += other.binned;
        self.clipped += other.clipped;
        self.discarded += other.discarded;
        self.skipped_non_finite += other.skipped_non_finite;
        self.propagated_nan += other.propagated_nan;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BinWarning {
    EmptyInput,
    NonFiniteSkipped { count: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinReport {
    pub grid: GridSpec,
    pub gcounts: Vec<f64>,
    pub tally: BinTally,
    pub warnings: Vec<BinWarning>,
}

impl BinReport {
    pub fn total_mass(&self) -> f64 {
        self.gcounts.iter().sum()
    }

    pub fn points(&self) -> Vec<f64> {
        self.grid.points()
    }
}

#[derive(Debug, Clone)]
pub struct LinearBinner {
    grid: GridSpec,
    options: BinOptions,
}

impl LinearBinner {
    pub fn new(grid: GridSpec, options: BinOptions) -> Self {
        Self { grid, options }
    }

    pub fn from_config(grid: GridSpec, cfg: &BinningConfig) -> Self {
        Self::new(grid, BinOptions::from(cfg))
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn options(&self) -> &BinOptions {
        &self.options
    }

    pub fn bin(&self, samples: &[f64]) -> Result<BinReport> {
        let mut gcounts = vec![0.0; self.grid.m()];
        let tally = self.accumulate_at(samples, 0, &mut gcounts)?;
        Ok(self.finish(samples.len(), gcounts, tally))
    }

    /// Sequential below `parallel_threshold` samples, chunked parallel at or above it.
    pub fn bin_auto(&self, samples: &[f64]) -> Result<BinReport> {
        if samples.len() >= self.options.parallel_threshold {
            self.bin_parallel(samples, self.options.chunk_size)
        } else {
            self.bin(samples)
        }
    }

    /// Adds into `gcounts` without zeroing it first. Only the first `m` cells are touched.
    pub fn accumulate(&self, samples: &[f64], gcounts: &mut [f64]) -> Result<BinTally> {
        let m = self.grid.m();
        if gcounts.len() < m {
            return Err(LinbinError::Other(format!(
                "output grid holds {} cells, need {m}",
                gcounts.len()
            )));
        }
        self.accumulate_at(samples, 0, &mut gcounts[..m])
    }

    /// `offset` is the index of `samples[0]` in the caller's full sequence.
    pub(crate) fn accumulate_at(
        &self,
        samples: &[f64],
        offset: usize,
        gcounts: &mut [f64],
    ) -> Result<BinTally> {
        if self.options.non_finite == NonFinitePolicy::Reject {
            // nothing may be written before a rejection
            if let Some((i, &value)) = samples.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(LinbinError::NonFiniteSample { index: offset + i, value });
            }
        }
        let delta = self.grid.delta();
        let mut tally = BinTally::default();
        for &x in samples {
            if x.is_nan() {
                match self.options.non_finite {
                    NonFinitePolicy::Propagate => tally.propagated_nan += 1,
                    _ => tally.skipped_non_finite += 1,
                }
                continue;
            }
            if x.is_infinite() && self.options.non_finite == NonFinitePolicy::Skip {
                tally.skipped_non_finite += 1;
                continue;
            }
            self.place(x, delta, gcounts, &mut tally);
        }
        if tally.propagated_nan > 0 {
            gcounts.iter_mut().for_each(|c| *c = f64::NAN);
        }
        Ok(tally)
    }

    fn place(&self, x: f64, delta: f64, gcounts: &mut [f64], tally: &mut BinTally) {
        let (a, b, m) = (self.grid.a(), self.grid.b(), self.grid.m());
        let last = m - 1;
        // range is decided on x itself so rounding in pos cannot move a sample across a bound
        if x < a || x > b {
            if self.options.truncate {
                tally.discarded += 1;
            } else {
                gcounts[if x < a { 0 } else { last }] += 1.0;
                tally.clipped += 1;
            }
            return;
        }
        tally.binned += 1;
        if x == b {
            gcounts[last] += 1.0;
            return;
        }
        let pos = (x - a) / delta;
        let li = (pos.floor() as usize).min(last - 1);
        let rem = (pos - li as f64).clamp(0.0, 1.0);
        gcounts[li] += 1.0 - rem;
        gcounts[li + 1] += rem;
    }

    pub(crate) fn finish(&self, n: usize, gcounts: Vec<f64>, tally: BinTally) -> BinReport {
        let mut warnings = Vec::new();
        if n == 0 {
            warn!("no samples supplied; grid is all zeros");
            warnings.push(BinWarning::EmptyInput);
        }
        if tally.skipped_non_finite > 0 {
            warn!(count = tally.skipped_non_finite, "skipped non-finite samples");
            warnings.push(BinWarning::NonFiniteSkipped { count: tally.skipped_non_finite });
        }
        debug!(
            n,
            m = self.grid.m(),
            binned = tally.binned,
            clipped = tally.clipped,
            discarded = tally.discarded,
            "binned samples"
        );
        BinReport { grid: self.grid, gcounts, tally, warnings }
    }
}

/// Linear binning with default handling of non-finite samples.
pub fn bin(samples: &[f64], a: f64, b: f64, m: usize, truncate: bool) -> Result<Vec<f64>> {
    let grid = GridSpec::new(a, b, m)?;
    let options = BinOptions { truncate, ..BinOptions::default() };
    Ok(LinearBinner::new(grid, options).bin(samples)?.gcounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use linbin_common::GridError;

    fn close(got: &[f64], want: &[f64]) {
        assert_eq!(got.len(), want.len());
        for (g, w) in got.iter().zip(want) {
            assert!((g - w).abs() < 1e-12, "got {got:?}, want {want:?}");
        }
    }

    fn binner(a: f64, b: f64, m: usize, truncate: bool, non_finite: NonFinitePolicy) -> LinearBinner {
        let opts = BinOptions { truncate, non_finite, ..BinOptions::default() };
        LinearBinner::new(GridSpec::new(a, b, m).unwrap(), opts)
    }

    #[test] fn on_grid_points() { close(&bin(&[0.0, 5.0, 10.0], 0.0, 10.0, 3, true).unwrap(), &[1.0, 1.0, 1.0]); }
    #[test] fn halfway_split() { close(&bin(&[2.5], 0.0, 10.0, 3, true).unwrap(), &[0.5, 0.5, 0.0]); }
    #[test] fn truncated_outside() { close(&bin(&[-5.0, 15.0], 0.0, 10.0, 2, true).unwrap(), &[0.0, 0.0]); }
    #[test] fn clipped_outside() { close(&bin(&[-5.0, 15.0], 0.0, 10.0, 2, false).unwrap(), &[1.0, 1.0]); }
    #[test] fn empty_input() { close(&bin(&[], 0.0, 1.0, 4, true).unwrap(), &[0.0; 4]); }

    #[test]
    fn uneven_split() {
        // delta = 0.25, x = 0.3 sits 20% of the way from point 1 to point 2
        close(&bin(&[0.3], 0.0, 1.0, 5, true).unwrap(), &[0.0, 0.8, 0.2, 0.0, 0.0]);
    }

    #[test]
    fn bounds_land_whole() {
        // 0.1 * 3 != 0.3 in binary, the upper bound must still land in one cell
        let g = bin(&[0.1, 0.3], 0.1, 0.3, 3, true).unwrap();
        assert_eq!(g[0], 1.0);
        assert_eq!(g[2], 1.0);
        assert_eq!(g[1], 0.0);
    }

    #[test]
    fn invalid_grid_fails_fast() {
        assert!(matches!(bin(&[1.0], 0.0, 10.0, 1, true), Err(LinbinError::InvalidGrid(_))));
        assert!(matches!(bin(&[1.0], 10.0, 0.0, 3, true), Err(LinbinError::InvalidGrid(_))));
    }

    #[test]
    fn unusable_spacing_is_an_invalid_grid() {
        let err = bin(&[0.0], -f64::MAX, f64::MAX, 3, true).unwrap_err();
        assert!(matches!(err, LinbinError::InvalidGrid(GridError::DegenerateSpacing { .. })));
        let err = bin(&[0.0], 0.0, 5e-324, 3, true).unwrap_err();
        assert!(matches!(err, LinbinError::InvalidGrid(GridError::DegenerateSpacing { .. })));
    }

    #[test]
    fn widest_usable_range_splits_correctly() {
        close(&bin(&[0.0], -f64::MAX / 2.0, f64::MAX / 2.0, 3, true).unwrap(), &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn subnormal_spacing_stays_finite() {
        let grid = GridSpec::new(0.0, 1e-320, 3).unwrap();
        let mid = grid.delta();
        let r = LinearBinner::new(grid, BinOptions::default()).bin(&[0.0, mid, 1e-320]).unwrap();
        assert_eq!(r.gcounts, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn tally_counts_each_fate() {
        let r = binner(0.0, 1.0, 3, true, NonFinitePolicy::Skip)
            .bin(&[0.5, -1.0, 2.0, f64::NAN, f64::INFINITY])
            .unwrap();
        assert_eq!(r.tally.binned, 1);
        assert_eq!(r.tally.discarded, 2);
        assert_eq!(r.tally.skipped_non_finite, 2);
        assert_eq!(r.warnings, vec![BinWarning::NonFiniteSkipped { count: 2 }]);
        assert!((r.total_mass() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_input_warns() {
        let r = binner(0.0, 1.0, 3, true, NonFinitePolicy::Skip).bin(&[]).unwrap();
        assert_eq!(r.warnings, vec![BinWarning::EmptyInput]);
        assert_eq!(r.gcounts, vec![0.0; 3]);
    }

    #[test]
    fn propagate_nan_poisons_grid() {
        let r = binner(0.0, 1.0, 3, true, NonFinitePolicy::Propagate).bin(&[0.5, f64::NAN]).unwrap();
        assert_eq!(r.tally.propagated_nan, 1);
        assert!(r.gcounts.iter().all(|c| c.is_nan()));
    }

    #[test]
    fn propagate_infinities_are_out_of_range() {
        let r = binner(0.0, 1.0, 3, false, NonFinitePolicy::Propagate)
            .bin(&[f64::NEG_INFINITY, f64::INFINITY])
            .unwrap();
        close(&r.gcounts, &[1.0, 0.0, 1.0]);
        assert_eq!(r.tally.clipped, 2);
    }

    #[test]
    fn reject_reports_index() {
        let err = binner(0.0, 1.0, 3, true, NonFinitePolicy::Reject)
            .bin(&[0.1, 0.2, f64::INFINITY])
            .unwrap_err();
        assert!(matches!(err, LinbinError::NonFiniteSample { index: 2, .. }));
    }

    #[test]
    fn reject_leaves_buffer_untouched() {
        let mut buf = vec![0.0; 3];
        let b = binner(0.0, 1.0, 3, true, NonFinitePolicy::Reject);
        assert!(b.accumulate(&[0.5, f64::NAN], &mut buf).is_err());
        assert_eq!(buf, vec![0.0; 3]);
    }

    #[test]
    fn accumulate_adds_to_existing_counts() {
        let mut buf = vec![1.0, 1.0, 1.0, 7.0];
        let b = binner(0.0, 2.0, 3, true, NonFinitePolicy::Skip);
        b.accumulate(&[1.0], &mut buf).unwrap();
        close(&buf, &[1.0, 2.0, 1.0, 7.0]);
    }

    #[test]
    fn accumulate_rejects_short_buffer() {
        let mut buf = vec![0.0; 2];
        let b = binner(0.0, 2.0, 3, true, NonFinitePolicy::Skip);
        assert!(b.accumulate(&[1.0], &mut buf).is_err());
    }

    #[test]
    fn mass_and_non_negativity() {
        let samples: Vec<f64> = (0..1000).map(|i| ((i * 7919) % 1000) as f64 / 37.0 - 5.0).collect();
        for truncate in [true, false] {
            let r = binner(0.0, 20.0, 17, truncate, NonFinitePolicy::Skip).bin(&samples).unwrap();
            assert!(r.gcounts.iter().all(|&c| c >= 0.0));
            let inside = samples.iter().filter(|&&x| (0.0..=20.0).contains(&x)).count();
            let want = if truncate { inside } else { samples.len() };
            assert_eq!(r.tally.contributing(), want);
            assert!((r.total_mass() - want as f64).abs() < 1e-9);
        }
    }
}
