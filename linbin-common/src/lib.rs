pub mod config;
pub use config::{BinningConfig, Config, LoggingConfig, NonFinitePolicy, OutputConfig, OutputFormat};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("grid needs at least 2 points, got {m}")]
    TooFewPoints { m: i64 },
    #[error("upper bound {b} must be greater than lower bound {a}")]
    EmptyRange { a: f64, b: f64 },
    #[error("grid bounds must be finite, got [{a}, {b}]")]
    NonFiniteBound { a: f64, b: f64 },
    #[error("[{a}, {b}] with {m} points has no usable spacing")]
    DegenerateSpacing { a: f64, b: f64, m: usize },
}

#[derive(Error, Debug)]
pub enum LinbinError {
    #[error("invalid grid: {0}")]
    InvalidGrid(#[from] GridError),
    #[error("non-finite sample at index {index}: {value}")]
    NonFiniteSample { index: usize, value: f64 },
    #[error("invalid sample on line {line}: {token:?}")]
    InvalidSample { line: usize, token: String },
    #[error("routine not registered: {0}")]
    RoutineNotRegistered(String),
    #[error("invalid argument count for {symbol}: expected {expected}, got {got}")]
    InvalidArgumentCount { symbol: String, expected: usize, got: usize },
    #[error("invalid argument {position} for {symbol}: {message}")]
    InvalidArgument { symbol: String, position: usize, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LinbinError>;
