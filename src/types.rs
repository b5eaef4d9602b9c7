//! Core data types used across the grid calculator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::GridError;

/// Validation errors for candle data
#[derive(Debug, Error)]
pub enum CandleValidationError {
    #[error("high ({high}) must be >= low ({low})")]
    HighLessThanLow { high: f64, low: f64 },

    #[error("volume ({0}) must be >= 0")]
    NegativeVolume(f64),

    #[error("open ({open}) must be between low ({low}) and high ({high})")]
    OpenOutOfRange { open: f64, low: f64, high: f64 },

    #[error("close ({close}) must be between low ({low}) and high ({high})")]
    CloseOutOfRange { close: f64, low: f64, high: f64 },

    #[error("prices must be positive: open={open}, high={high}, low={low}, close={close}")]
    NonPositivePrice {
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },

    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("candle at {current} does not follow {previous}")]
    NonIncreasingTime {
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
}

/// Kline sample: OHLCV plus the taker-flow columns exchanges report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub quote_asset_volume: f64,
    #[serde(default)]
    pub trade_count: u64,
    #[serde(default)]
    pub taker_base_volume: f64,
    #[serde(default)]
    pub taker_quote_volume: f64,
}

impl Candle {
    /// Create a new OHLCV candle with validation. Flow columns start at zero.
    pub fn new(
        open_time: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, CandleValidationError> {
        let candle = Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
            quote_asset_volume: 0.0,
            trade_count: 0,
            taker_base_volume: 0.0,
            taker_quote_volume: 0.0,
        };
        candle.validate()?;
        Ok(candle)
    }

    /// Validate the candle data
    pub fn validate(&self) -> Result<(), CandleValidationError> {
        // NaN slips through every comparison below
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
            ("quote_asset_volume", self.quote_asset_volume),
            ("taker_base_volume", self.taker_base_volume),
            ("taker_quote_volume", self.taker_quote_volume),
        ] {
            if !value.is_finite() {
                return Err(CandleValidationError::NonFinite { field, value });
            }
        }

        if self.open <= 0.0 || self.high <= 0.0 || self.low <= 0.0 || self.close <= 0.0 {
            return Err(CandleValidationError::NonPositivePrice {
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }

        if self.high < self.low {
            return Err(CandleValidationError::HighLessThanLow {
                high: self.high,
                low: self.low,
            });
        }

        for volume in [
            self.volume,
            self.quote_asset_volume,
            self.taker_base_volume,
            self.taker_quote_volume,
        ] {
            if volume < 0.0 {
                return Err(CandleValidationError::NegativeVolume(volume));
            }
        }

        if self.open < self.low || self.open > self.high {
            return Err(CandleValidationError::OpenOutOfRange {
                open: self.open,
                low: self.low,
                high: self.high,
            });
        }

        if self.close < self.low || self.close > self.high {
            return Err(CandleValidationError::CloseOutOfRange {
                close: self.close,
                low: self.low,
                high: self.high,
            });
        }

        Ok(())
    }

    /// Check if the candle is valid without returning detailed error
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Chronologically ordered candles, strictly increasing by `open_time`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Build a series, validating every candle and the time ordering
    pub fn new(candles: Vec<Candle>) -> Result<Self, CandleValidationError> {
        for candle in &candles {
            candle.validate()?;
        }
        for pair in candles.windows(2) {
            if pair[1].open_time <= pair[0].open_time {
                return Err(CandleValidationError::NonIncreasingTime {
                    previous: pair[0].open_time,
                    current: pair[1].open_time,
                });
            }
        }
        Ok(Self { candles })
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Closing prices in series order
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// The trailing `n` candles (or the whole series if shorter)
    pub fn tail(&self, n: usize) -> CandleSeries {
        let start = self.candles.len().saturating_sub(n);
        CandleSeries {
            candles: self.candles[start..].to_vec(),
        }
    }
}

impl AsRef<[Candle]> for CandleSeries {
    fn as_ref(&self) -> &[Candle] {
        &self.candles
    }
}

/// Trading pair symbol using Arc<str> for cheap cloning
///
/// Symbols are cloned into every plan and request; Arc<str> keeps that O(1).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(#[serde(with = "arc_str_serde")] std::sync::Arc<str>);

/// Custom serde for Arc<str>
mod arc_str_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::sync::Arc;

    pub fn serialize<S>(value: &Arc<str>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Arc<str>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Arc::from(s.as_str()))
    }
}

impl Symbol {
    /// Symbols are normalized to upper case ("btcusdt" -> "BTCUSDT")
    pub fn new(s: impl AsRef<str>) -> Self {
        Symbol(std::sync::Arc::from(s.as_ref().trim().to_uppercase().as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Look-back horizon in days
///
/// Gates how many trailing ATR/band values are retained and which sampling
/// interval the volatility candles are fetched at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Horizon {
    Week,
    Month,
    HalfYear,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::Week, Horizon::Month, Horizon::HalfYear];

    pub fn days(self) -> usize {
        match self {
            Horizon::Week => 7,
            Horizon::Month => 30,
            Horizon::HalfYear => 180,
        }
    }

    /// Kline interval used for volatility candles
    pub fn volatility_interval(self) -> &'static str {
        match self {
            Horizon::Week => "30m",
            Horizon::Month => "1h",
            Horizon::HalfYear => "2h",
        }
    }

    /// Number of volatility candles to request
    pub fn volatility_limit(self) -> u32 {
        match self {
            Horizon::Week => 168,
            Horizon::Month => 360,
            Horizon::HalfYear => 1080,
        }
    }
}

impl TryFrom<u32> for Horizon {
    type Error = GridError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            7 => Ok(Horizon::Week),
            30 => Ok(Horizon::Month),
            180 => Ok(Horizon::HalfYear),
            other => Err(GridError::InvalidHorizon(other)),
        }
    }
}

impl From<Horizon> for u32 {
    fn from(horizon: Horizon) -> Self {
        horizon.days() as u32
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.days())
    }
}

/// Ladder spacing law
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridType {
    Arithmetic,
    Geometric,
}

impl FromStr for GridType {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arithmetic" => Ok(GridType::Arithmetic),
            "geometric" => Ok(GridType::Geometric),
            _ => Err(GridError::InvalidGridType(s.to_string())),
        }
    }
}

impl fmt::Display for GridType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridType::Arithmetic => write!(f, "Arithmetic"),
            GridType::Geometric => write!(f, "Geometric"),
        }
    }
}

/// Per-level direction policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridDirectionMode {
    /// Levels above market sell, levels at or below buy
    Neutral,
    Long,
    Short,
}

impl FromStr for GridDirectionMode {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neutral" => Ok(GridDirectionMode::Neutral),
            "long" => Ok(GridDirectionMode::Long),
            "short" => Ok(GridDirectionMode::Short),
            _ => Err(GridError::InvalidDirectionMode(s.to_string())),
        }
    }
}

impl fmt::Display for GridDirectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridDirectionMode::Neutral => write!(f, "Neutral"),
            GridDirectionMode::Long => write!(f, "Long"),
            GridDirectionMode::Short => write!(f, "Short"),
        }
    }
}

/// Direction of a single grid level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "Long"),
            Direction::Short => write!(f, "Short"),
        }
    }
}

/// Capital committed to the grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capital {
    pub amount: f64,
    pub leverage: u32,
}

impl Capital {
    pub fn new(amount: f64, leverage: u32) -> Result<Self, GridError> {
        let capital = Self { amount, leverage };
        capital.validate()?;
        Ok(capital)
    }

    pub fn validate(&self) -> Result<(), GridError> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(GridError::InvalidCapital(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        if self.leverage < 1 {
            return Err(GridError::InvalidCapital(format!(
                "leverage must be at least 1, got {}",
                self.leverage
            )));
        }
        Ok(())
    }

    /// Assets under management: amount × leverage
    pub fn aum(&self) -> f64 {
        self.amount * self.leverage as f64
    }
}

/// One price level of the grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLevel {
    pub price: f64,
    pub lot: f64,
    pub direction: Direction,
}

impl GridLevel {
    /// Capital consumed by this level
    pub fn notional(&self) -> f64 {
        self.lot * self.price
    }
}

/// Ordered grid levels, descending by price
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    levels: Vec<GridLevel>,
}

impl Grid {
    pub fn new(levels: Vec<GridLevel>) -> Self {
        Self { levels }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[GridLevel] {
        &self.levels
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GridLevel> {
        self.levels.iter()
    }

    /// Sum of lot × price over all levels
    pub fn total_notional(&self) -> f64 {
        self.levels.iter().map(GridLevel::notional).sum()
    }

    /// Number of levels with the given direction
    pub fn count(&self, direction: Direction) -> usize {
        self.levels.iter().filter(|l| l.direction == direction).count()
    }
}

impl<'a> IntoIterator for &'a Grid {
    type Item = &'a GridLevel;
    type IntoIter = std::slice::Iter<'a, GridLevel>;

    fn into_iter(self) -> Self::IntoIter {
        self.levels.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(i: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(i)
    }

    #[test]
    fn test_candle_validation() {
        assert!(Candle::new(t(0), 100.0, 105.0, 95.0, 101.0, 10.0).is_ok());

        let err = Candle::new(t(0), 100.0, 95.0, 105.0, 100.0, 10.0).unwrap_err();
        assert!(matches!(err, CandleValidationError::HighLessThanLow { .. }));

        let err = Candle::new(t(0), 100.0, 105.0, 95.0, 110.0, 10.0).unwrap_err();
        assert!(matches!(err, CandleValidationError::CloseOutOfRange { .. }));

        let err = Candle::new(t(0), 0.0, 105.0, 95.0, 100.0, 10.0).unwrap_err();
        assert!(matches!(err, CandleValidationError::NonPositivePrice { .. }));

        let err = Candle::new(t(0), 100.0, 105.0, 95.0, 100.0, -1.0).unwrap_err();
        assert!(matches!(err, CandleValidationError::NegativeVolume(_)));
    }

    #[test]
    fn test_candle_rejects_non_finite_fields() {
        let err = Candle::new(t(0), 100.0, 105.0, 95.0, f64::NAN, 10.0).unwrap_err();
        assert!(matches!(
            err,
            CandleValidationError::NonFinite { field: "close", .. }
        ));

        let err = Candle::new(t(0), 100.0, f64::INFINITY, 95.0, 100.0, 10.0).unwrap_err();
        assert!(matches!(
            err,
            CandleValidationError::NonFinite { field: "high", .. }
        ));

        let err = Candle::new(t(0), 100.0, 105.0, 95.0, 100.0, f64::NAN).unwrap_err();
        assert!(matches!(
            err,
            CandleValidationError::NonFinite { field: "volume", .. }
        ));
    }

    #[test]
    fn test_series_requires_increasing_time() {
        let a = Candle::new(t(1), 100.0, 101.0, 99.0, 100.0, 1.0).unwrap();
        let b = Candle::new(t(1), 100.0, 101.0, 99.0, 100.0, 1.0).unwrap();
        let err = CandleSeries::new(vec![a.clone(), b]).unwrap_err();
        assert!(matches!(err, CandleValidationError::NonIncreasingTime { .. }));

        let c = Candle::new(t(2), 100.0, 101.0, 99.0, 100.0, 1.0).unwrap();
        let series = CandleSeries::new(vec![a, c]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.tail(1).len(), 1);
        assert_eq!(series.tail(5).len(), 2);
    }

    #[test]
    fn test_horizon_parsing() {
        assert_eq!(Horizon::try_from(7).unwrap(), Horizon::Week);
        assert_eq!(Horizon::try_from(30).unwrap(), Horizon::Month);
        assert_eq!(Horizon::try_from(180).unwrap(), Horizon::HalfYear);
        assert!(matches!(
            Horizon::try_from(14),
            Err(GridError::InvalidHorizon(14))
        ));

        assert_eq!(Horizon::Week.volatility_interval(), "30m");
        assert_eq!(Horizon::Month.volatility_limit(), 360);
        assert_eq!(Horizon::HalfYear.volatility_interval(), "2h");
    }

    #[test]
    fn test_horizon_serde() {
        let json = serde_json::to_string(&Horizon::Month).unwrap();
        assert_eq!(json, "30");
        let parsed: Horizon = serde_json::from_str("180").unwrap();
        assert_eq!(parsed, Horizon::HalfYear);
        assert!(serde_json::from_str::<Horizon>("90").is_err());
    }

    #[test]
    fn test_grid_type_and_direction_parsing() {
        assert_eq!("Arithmetic".parse::<GridType>().unwrap(), GridType::Arithmetic);
        assert_eq!("geometric".parse::<GridType>().unwrap(), GridType::Geometric);
        assert!(matches!(
            "Fibonacci".parse::<GridType>(),
            Err(GridError::InvalidGridType(_))
        ));

        assert_eq!(
            "SHORT".parse::<GridDirectionMode>().unwrap(),
            GridDirectionMode::Short
        );
        assert!(matches!(
            "sideways".parse::<GridDirectionMode>(),
            Err(GridError::InvalidDirectionMode(_))
        ));
    }

    #[test]
    fn test_capital() {
        let capital = Capital::new(1000.0, 5).unwrap();
        assert_eq!(capital.aum(), 5000.0);
        assert!(Capital::new(0.0, 1).is_err());
        assert!(Capital::new(f64::NAN, 1).is_err());
        assert!(Capital::new(100.0, 0).is_err());
    }

    #[test]
    fn test_symbol_normalization() {
        assert_eq!(Symbol::new(" btcusdt ").as_str(), "BTCUSDT");
    }
}
