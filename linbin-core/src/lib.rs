pub mod binner;
pub mod export;
pub mod ffi;
pub mod grid;
pub mod input;
pub mod parallel;
pub mod registry;
pub mod routine;

pub use binner::{bin, BinOptions, BinReport, BinTally, BinWarning, LinearBinner};
pub use export::{export_csv, export_json, print_summary, render_csv, render_text, report_json};
pub use grid::GridSpec;
pub use input::{parse_samples, read_samples};
pub use linbin_common::{GridError, LinbinError, NonFinitePolicy, Result};
pub use registry::{
    fortran_symbol, registry, ArgKind, CallingConvention, RoutineArg, RoutineRegistry, RoutineSpec,
};
pub use routine::linbin;
