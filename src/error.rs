//! Error types for the grid calculation pipeline
//!
//! Every core failure is detected before any partial result is produced:
//! the pipeline either returns a complete grid or one of these errors.

use thiserror::Error;

use crate::types::CandleValidationError;

/// Errors raised by the grid calculation pipeline
#[derive(Debug, Error)]
pub enum GridError {
    #[error("horizon must be 7, 30 or 180 days, got {0}")]
    InvalidHorizon(u32),

    #[error("grid type must be Arithmetic or Geometric, got {0:?}")]
    InvalidGridType(String),

    #[error("grid direction must be Neutral, Long or Short, got {0:?}")]
    InvalidDirectionMode(String),

    #[error("insufficient data: {required} candles required, {available} available")]
    InsufficientData { required: usize, available: usize },

    #[error("degenerate grid: derived {grid_num} levels, at least 2 required")]
    DegenerateGrid { grid_num: usize },

    #[error("too many grid levels: derived {grid_num}, at most {max} allowed")]
    TooManyLevels { grid_num: usize, max: usize },

    #[error("grid lower bound ({lower}) must be positive")]
    NonPositiveBound { lower: f64 },

    #[error("grid upper bound ({upper}) must be above lower bound ({lower})")]
    InvertedBounds { upper: f64, lower: f64 },

    #[error("volatility estimate ({atr}) must be positive and finite")]
    NonPositiveVolatility { atr: f64 },

    #[error("invalid capital: {0}")]
    InvalidCapital(String),

    #[error("current price ({0}) must be positive")]
    InvalidPrice(f64),

    #[error(transparent)]
    DataSource(#[from] DataSourceError),
}

/// Failures from market data collaborators (HTTP or local files)
///
/// These are surfaced to the caller unchanged; nothing in the pipeline
/// retries or masks them.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid candle data: {0}")]
    InvalidCandles(#[from] CandleValidationError),
}

pub type GridResult<T> = Result<T, GridError>;
