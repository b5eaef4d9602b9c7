//! Technical indicators
//!
//! Rolling-window statistics used by the volatility and band estimators.
//! Every rolling function returns one value per full window, so the output
//! length is `len - window + 1` (empty when the input is shorter than the
//! window or the window is zero).

use itertools::Itertools;
use statrs::statistics::Statistics;

use crate::Candle;

/// Rolling arithmetic mean
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || values.len() < window {
        return Vec::new();
    }

    values
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

/// Rolling sample standard deviation (Bessel's correction, `n - 1` divisor)
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || values.len() < window {
        return Vec::new();
    }

    values.windows(window).map(|w| w.iter().std_dev()).collect()
}

/// True range of `current` against the previous candle's close
pub fn true_range_between(previous: &Candle, current: &Candle) -> f64 {
    let hl = current.high - current.low;
    let hc = current.high - previous.close;
    let cl = previous.close - current.low;
    hl.max(hc).max(cl)
}

/// True range for every candle that has a predecessor
///
/// The first candle has no previous close and produces no value, so the
/// output has `len - 1` entries.
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    candles
        .iter()
        .tuple_windows()
        .map(|(previous, current)| true_range_between(previous, current))
        .collect()
}

/// Average True Range: rolling mean of true range
pub fn atr(candles: &[Candle], window: usize) -> Vec<f64> {
    rolling_mean(&true_range(candles), window)
}
