//! C ABI surface for hosts that call the binning routine by symbol name.
//!
//! Every argument is passed by pointer, Fortran style, so the exported
//! `linbin_` can be registered in the same slot the legacy subroutine used.

use std::panic::{self, AssertUnwindSafe};

use linbin_common::LinbinError;
use tracing::warn;

use crate::routine::linbin;

pub const LINBIN_OK: i32 = 0;
pub const LINBIN_INVALID_GRID: i32 = 1;
pub const LINBIN_INVALID_ARGUMENT: i32 = 2;

/// # Safety
///
/// Every pointer must be non-null and valid for reads; `x` must point to at
/// least `*n` doubles and `gcounts` to at least `*m` writable doubles that do
/// not overlap `x`. Null pointers and negative sizes are reported through the
/// return code rather than dereferenced.
#[no_mangle]
pub unsafe extern "C" fn linbin_(
    x: *const f64,
    n: *const i32,
    a: *const f64,
    b: *const f64,
    m: *const i32,
    trun: *const i32,
    gcounts: *mut f64,
) -> i32 {
    if n.is_null() || a.is_null() || b.is_null() || m.is_null() || trun.is_null() || gcounts.is_null() {
        return LINBIN_INVALID_ARGUMENT;
    }
    let (n, a, b, m, trun) = (*n, *a, *b, *m, *trun);
    if m < 2 {
        return LINBIN_INVALID_GRID;
    }
    if n < 0 || (x.is_null() && n > 0) {
        return LINBIN_INVALID_ARGUMENT;
    }
    let samples: &[f64] = if n == 0 { &[] } else { std::slice::from_raw_parts(x, n as usize) };
    let out = std::slice::from_raw_parts_mut(gcounts, m as usize);

    let result = panic::catch_unwind(AssertUnwindSafe(|| linbin(samples, n, a, b, m, trun, out)));
    match result {
        Ok(Ok(())) => LINBIN_OK,
        Ok(Err(LinbinError::InvalidGrid(e))) => {
            warn!(error = %e, "linbin_ rejected grid");
            LINBIN_INVALID_GRID
        }
        Ok(Err(e)) => {
            warn!(error = %e, "linbin_ failed");
            LINBIN_INVALID_ARGUMENT
        }
        Err(_) => LINBIN_INVALID_ARGUMENT,
    }
}
