//! Grid calculation pipeline
//!
//! Composes the five stages:
//!
//! 1. volatility (ATR) and 2. band estimation, independent of each other
//!    and evaluated in parallel,
//! 3. level count from band width and ATR,
//! 4. ladder generation,
//! 5. per-level sizing and direction.
//!
//! Every check happens before a [`GridPlan`] is built; callers get either a
//! complete plan or an error.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::band::{estimate_band, Band};
use crate::config::PipelineParams;
use crate::data::{MarketDataProvider, PriceTicker, BAND_INTERVAL};
use crate::error::{GridError, GridResult};
use crate::ladder::generate_ladder;
use crate::levels::assign_levels;
use crate::sizing::grid_count;
use crate::volatility::{estimate_volatility, VolatilityEstimate};
use crate::{Capital, CandleSeries, Grid, GridDirectionMode, GridType, Horizon, Symbol};

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridRequest {
    pub pair: Symbol,
    pub horizon: Horizon,
    pub direction: GridDirectionMode,
    pub grid_type: GridType,
    pub capital: Capital,
}

/// Market inputs consumed by [`GridCalculator::compute`]
#[derive(Debug, Clone, Copy)]
pub struct MarketSnapshot<'a> {
    /// Candles at the horizon's volatility interval
    pub volatility_candles: &'a CandleSeries,
    /// Daily candles for the band
    pub band_candles: &'a CandleSeries,
    pub current_price: f64,
}

/// Computed grid plus the intermediate values behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPlan {
    pub pair: Symbol,
    pub horizon: Horizon,
    pub grid_type: GridType,
    pub direction: GridDirectionMode,
    pub current_price: f64,
    pub total_capital: f64,
    pub volatility: VolatilityEstimate,
    pub band: Band,
    pub grid_num: usize,
    pub grid: Grid,
}

/// Stateless grid calculator; holds only the pipeline constants
#[derive(Debug, Clone, Copy, Default)]
pub struct GridCalculator {
    params: PipelineParams,
}

impl GridCalculator {
    pub fn new(params: PipelineParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Number of daily candles the band estimator needs for `horizon`
    pub fn band_limit(&self, horizon: Horizon) -> u32 {
        (self.params.band_window + horizon.days()) as u32
    }

    /// Run both estimators over the supplied candles
    pub fn estimate(
        &self,
        volatility_candles: &CandleSeries,
        band_candles: &CandleSeries,
        horizon: Horizon,
    ) -> GridResult<(VolatilityEstimate, Band)> {
        let params = self.params;
        let (volatility, band) = rayon::join(
            || estimate_volatility(volatility_candles, horizon, params.atr_window),
            || {
                estimate_band(
                    band_candles,
                    horizon,
                    params.band_window,
                    params.band_multiplier,
                )
            },
        );
        Ok((volatility?, band?))
    }

    /// Compute the grid from already-fetched market data
    pub fn compute(&self, request: &GridRequest, market: MarketSnapshot<'_>) -> GridResult<GridPlan> {
        request.capital.validate()?;
        if !market.current_price.is_finite() || market.current_price <= 0.0 {
            return Err(GridError::InvalidPrice(market.current_price));
        }

        let (volatility, band) = self.estimate(
            market.volatility_candles,
            market.band_candles,
            request.horizon,
        )?;

        if band.lower <= 0.0 {
            return Err(GridError::NonPositiveBound { lower: band.lower });
        }

        let grid_num = grid_count(band.upper, band.lower, volatility.atr, self.params.buffer_factor)?;
        debug!(grid_num, "Derived grid level count");

        let ladder = generate_ladder(band.upper, band.lower, grid_num, request.grid_type)?;

        let total_capital = request.capital.aum();
        let grid = assign_levels(&ladder, market.current_price, total_capital, request.direction)?;

        info!(
            pair = %request.pair,
            horizon = %request.horizon,
            upper = band.upper,
            lower = band.lower,
            atr = volatility.atr,
            grid_num,
            "Computed grid"
        );

        Ok(GridPlan {
            pair: request.pair.clone(),
            horizon: request.horizon,
            grid_type: request.grid_type,
            direction: request.direction,
            current_price: market.current_price,
            total_capital,
            volatility,
            band,
            grid_num,
            grid,
        })
    }

    /// Fetch market data through the collaborators, then compute
    pub fn run<P>(&self, provider: &P, request: &GridRequest) -> GridResult<GridPlan>
    where
        P: MarketDataProvider + PriceTicker + ?Sized,
    {
        request.capital.validate()?;

        let horizon = request.horizon;
        let volatility_candles = provider.fetch_candles(
            &request.pair,
            horizon.volatility_interval(),
            horizon.volatility_limit(),
        )?;
        let band_candles =
            provider.fetch_candles(&request.pair, BAND_INTERVAL, self.band_limit(horizon))?;
        let current_price = provider.fetch_current_price(&request.pair)?;

        debug!(
            pair = %request.pair,
            volatility_candles = volatility_candles.len(),
            band_candles = band_candles.len(),
            current_price,
            "Fetched market data"
        );

        self.compute(
            request,
            MarketSnapshot {
                volatility_candles: &volatility_candles,
                band_candles: &band_candles,
                current_price,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Candle, Direction};
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn flat_series(count: usize, step: Duration, price: f64, range: f64) -> CandleSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let candles = (0..count)
            .map(|i| {
                Candle::new(
                    start + step * i as i32,
                    price,
                    price + range / 2.0,
                    price - range / 2.0,
                    price,
                    1.0,
                )
                .unwrap()
            })
            .collect();
        CandleSeries::new(candles).unwrap()
    }

    fn oscillating_daily(count: usize) -> CandleSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let candles = (0..count)
            .map(|i| {
                let close = if i % 2 == 0 { 95.0 } else { 105.0 };
                Candle::new(start + Duration::days(i as i64), close, 106.0, 94.0, close, 1.0)
                    .unwrap()
            })
            .collect();
        CandleSeries::new(candles).unwrap()
    }

    fn request(direction: GridDirectionMode, grid_type: GridType) -> GridRequest {
        GridRequest {
            pair: Symbol::new("BTCUSDT"),
            horizon: Horizon::Week,
            direction,
            grid_type,
            capital: Capital::new(1000.0, 2).unwrap(),
        }
    }

    #[test]
    fn test_compute_end_to_end() {
        let vol = flat_series(168, Duration::minutes(30), 100.0, 2.0);
        let band = oscillating_daily(27);

        let plan = GridCalculator::default()
            .compute(
                &request(GridDirectionMode::Neutral, GridType::Arithmetic),
                MarketSnapshot {
                    volatility_candles: &vol,
                    band_candles: &band,
                    current_price: 100.5,
                },
            )
            .unwrap();

        // mean 100, sample std sqrt(20 * 25 / 19) = 5.13 -> band [89, 111]
        assert_eq!(plan.band.upper, 111.0);
        assert_eq!(plan.band.lower, 89.0);
        assert_relative_eq!(plan.volatility.atr, 2.0);
        // trunc(1.2 * 22 / 2) = 13
        assert_eq!(plan.grid_num, 13);
        assert_eq!(plan.grid.len(), 13);
        assert_eq!(plan.grid.levels()[0].price, 111.0);
        assert_eq!(plan.grid.levels()[12].price, 89.0);
        assert_relative_eq!(plan.grid.total_notional(), 2000.0, epsilon = 1e-9);
        assert_eq!(plan.grid.count(Direction::Short), 6);
        assert_eq!(plan.grid.count(Direction::Long), 7);
    }

    #[test]
    fn test_constant_prices_are_degenerate() {
        let vol = flat_series(168, Duration::minutes(30), 100.0, 0.0);
        let band = flat_series(21, Duration::days(1), 100.0, 0.0);

        let err = GridCalculator::default()
            .compute(
                &request(GridDirectionMode::Neutral, GridType::Arithmetic),
                MarketSnapshot {
                    volatility_candles: &vol,
                    band_candles: &band,
                    current_price: 100.0,
                },
            )
            .unwrap_err();
        assert!(matches!(err, GridError::DegenerateGrid { grid_num: 0 }));
    }

    #[test]
    fn test_overridden_params() {
        let vol = flat_series(40, Duration::minutes(30), 100.0, 2.0);
        let band = oscillating_daily(27);
        let calculator = GridCalculator::new(PipelineParams {
            buffer_factor: 2.0,
            ..PipelineParams::default()
        });

        let plan = calculator
            .compute(
                &request(GridDirectionMode::Long, GridType::Geometric),
                MarketSnapshot {
                    volatility_candles: &vol,
                    band_candles: &band,
                    current_price: 100.0,
                },
            )
            .unwrap();

        // trunc(2.0 * 22 / 2) = 22
        assert_eq!(plan.grid_num, 22);
        assert!(plan.grid.iter().all(|l| l.direction == Direction::Long));
        assert_eq!(calculator.band_limit(Horizon::Month), 50);
    }

    #[test]
    fn test_near_zero_volatility_is_rejected() {
        let vol = flat_series(168, Duration::minutes(30), 100.0, 1e-12);
        let band = oscillating_daily(27);

        let err = GridCalculator::default()
            .compute(
                &request(GridDirectionMode::Neutral, GridType::Arithmetic),
                MarketSnapshot {
                    volatility_candles: &vol,
                    band_candles: &band,
                    current_price: 100.0,
                },
            )
            .unwrap_err();
        assert!(matches!(err, GridError::TooManyLevels { .. }));
    }

    #[test]
    fn test_rejects_invalid_price_before_estimating() {
        let empty = CandleSeries::default();
        let err = GridCalculator::default()
            .compute(
                &request(GridDirectionMode::Neutral, GridType::Arithmetic),
                MarketSnapshot {
                    volatility_candles: &empty,
                    band_candles: &empty,
                    current_price: -1.0,
                },
            )
            .unwrap_err();
        assert!(matches!(err, GridError::InvalidPrice(_)));
    }
}
