//! Volatility estimation (Average True Range)

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GridError, GridResult};
use crate::indicators;
use crate::{CandleSeries, Horizon};

/// Default ATR window in samples
pub const ATR_WINDOW: usize = 14;

/// Result of the volatility estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityEstimate {
    /// Most recent ATR value
    pub atr: f64,
    /// Trailing ATR values retained for the horizon, oldest first
    pub trailing: Vec<f64>,
}

/// Estimate volatility as the latest rolling ATR over `window` samples
///
/// Needs `window + 1` candles: the first one only provides the previous
/// close for the second. At most `horizon.days()` trailing values are kept.
pub fn estimate_volatility(
    candles: &CandleSeries,
    horizon: Horizon,
    window: usize,
) -> GridResult<VolatilityEstimate> {
    let required = window + 1;
    if window == 0 || candles.len() < required {
        return Err(GridError::InsufficientData {
            required,
            available: candles.len(),
        });
    }

    let atr_values = indicators::atr(candles.as_slice(), window);
    let keep = atr_values.len().min(horizon.days());
    let trailing = atr_values[atr_values.len() - keep..].to_vec();

    let atr = match trailing.last() {
        Some(&v) => v,
        None => {
            return Err(GridError::InsufficientData {
                required,
                available: candles.len(),
            })
        }
    };

    debug!(
        atr,
        samples = candles.len(),
        retained = trailing.len(),
        "Estimated volatility"
    );

    Ok(VolatilityEstimate { atr, trailing })
}
