//! Price band estimation (Bollinger envelope of closing prices)

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GridError, GridResult};
use crate::indicators::{rolling_mean, rolling_std};
use crate::{CandleSeries, Horizon};

/// Default band window in samples
pub const BAND_WINDOW: usize = 20;

/// Default band width in standard deviations
pub const BAND_MULTIPLIER: f64 = 2.0;

/// Grid bounds derived from the band, plus the statistics behind them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    /// ceil(mean + k·std) of the latest window
    pub upper: f64,
    /// floor(mean - k·std) of the latest window
    pub lower: f64,
    pub mean: f64,
    pub std_dev: f64,
    /// Trailing rolling means retained for the horizon, oldest first
    pub trailing_mean: Vec<f64>,
    /// Trailing rolling standard deviations, aligned with `trailing_mean`
    pub trailing_std: Vec<f64>,
}

impl Band {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Estimate the trading range from the closes of `candles`
pub fn estimate_band(
    candles: &CandleSeries,
    horizon: Horizon,
    window: usize,
    multiplier: f64,
) -> GridResult<Band> {
    if window == 0 || candles.len() < window {
        return Err(GridError::InsufficientData {
            required: window,
            available: candles.len(),
        });
    }

    let closes = candles.closes();
    let means = rolling_mean(&closes, window);
    let stds = rolling_std(&closes, window);

    let keep = means.len().min(horizon.days());
    let trailing_mean = means[means.len() - keep..].to_vec();
    let trailing_std = stds[stds.len() - keep..].to_vec();

    let (mean, std_dev) = match (trailing_mean.last(), trailing_std.last()) {
        (Some(&m), Some(&s)) => (m, s),
        _ => {
            return Err(GridError::InsufficientData {
                required: window,
                available: candles.len(),
            })
        }
    };

    let upper = (mean + multiplier * std_dev).ceil();
    let lower = (mean - multiplier * std_dev).floor();

    debug!(
        upper,
        lower,
        mean,
        std_dev,
        "Estimated band"
    );

    Ok(Band {
        upper,
        lower,
        mean,
        std_dev,
        trailing_mean,
        trailing_std,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Candle;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn daily(closes: &[f64]) -> CandleSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Candle::new(start + Duration::days(i as i64), c, c + 1.0, c - 1.0, c, 1.0).unwrap()
            })
            .collect();
        CandleSeries::new(candles).unwrap()
    }

    #[test]
    fn test_insufficient_data() {
        let err = estimate_band(&daily(&[100.0; 19]), Horizon::Week, BAND_WINDOW, BAND_MULTIPLIER)
            .unwrap_err();
        assert!(matches!(
            err,
            GridError::InsufficientData {
                required: 20,
                available: 19
            }
        ));
    }

    #[test]
    fn test_constant_closes_collapse_band() {
        let band =
            estimate_band(&daily(&[100.0; 21]), Horizon::Week, BAND_WINDOW, BAND_MULTIPLIER).unwrap();
        assert_eq!(band.std_dev, 0.0);
        assert_eq!(band.upper, 100.0);
        assert_eq!(band.lower, 100.0);
        assert_eq!(band.width(), 0.0);
    }

    #[test]
    fn test_bounds_are_rounded_outwards() {
        // Alternating closes: mean 100.5, sample std sqrt(20 * 0.25 / 19)
        let closes: Vec<f64> = (0..27).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect();
        let band = estimate_band(&daily(&closes), Horizon::Week, BAND_WINDOW, BAND_MULTIPLIER).unwrap();

        let std = (20.0_f64 * 0.25 / 19.0).sqrt();
        assert_relative_eq!(band.std_dev, std, epsilon = 1e-9);
        assert_relative_eq!(band.mean, 100.5, epsilon = 1e-9);
        assert_eq!(band.upper, (100.5 + 2.0 * std).ceil());
        assert_eq!(band.lower, (100.5 - 2.0 * std).floor());
        assert_eq!(band.upper.fract(), 0.0);
        assert!(band.upper >= band.lower + 1.0);
        assert_eq!(band.trailing_mean.len(), 7);
        assert_eq!(band.trailing_std.len(), 7);
    }
}
