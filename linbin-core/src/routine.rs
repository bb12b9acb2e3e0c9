use linbin_common::{LinbinError, Result};

use crate::binner::{BinOptions, LinearBinner};
use crate::grid::GridSpec;

pub(crate) const SYMBOL: &str = "linbin";

fn invalid(position: usize, message: String) -> LinbinError {
    LinbinError::InvalidArgument { symbol: SYMBOL.into(), position, message }
}

/// Fixed-arity binning call: `(x, n, a, b, m, trun, gcounts)`.
///
/// Bins the first `n` values of `x` onto `m` points over `[a, b]` and adds
/// the weights into `gcounts[..m]`, which the caller is expected to zero.
/// Any nonzero `trun` discards out-of-range samples; zero clips them onto
/// the end points. The grid is validated before anything is written.
pub fn linbin(
    x: &[f64],
    n: i32,
    a: f64,
    b: f64,
    m: i32,
    trun: i32,
    gcounts: &mut [f64],
) -> Result<()> {
    let grid = GridSpec::from_raw(a, b, i64::from(m))?;
    let n = usize::try_from(n)
        .map_err(|_| invalid(1, format!("sample count must be non-negative, got {n}")))?;
    if n > x.len() {
        return Err(invalid(0, format!("{n} samples requested but only {} supplied", x.len())));
    }
    if gcounts.len() < grid.m() {
        return Err(invalid(
            6,
            format!("output grid holds {} cells, need {}", gcounts.len(), grid.m()),
        ));
    }
    let options = BinOptions { truncate: trun != 0, ..BinOptions::default() };
    LinearBinner::new(grid, options).accumulate(&x[..n], gcounts)?;
    Ok(())
}
