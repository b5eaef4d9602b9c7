//! Market data collaborators
//!
//! The pipeline never fetches data itself; it consumes these traits. Two
//! implementations ship with the crate: [`crate::binance::BinanceClient`] for
//! live data and [`CsvMarketData`] for offline files.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::DataSourceError;
use crate::{Candle, CandleSeries, Symbol};

/// Interval of the candles the band estimator consumes
pub const BAND_INTERVAL: &str = "1d";

/// CSV header written by [`save_csv`]
pub const CSV_HEADER: [&str; 10] = [
    "open_time",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "quote_asset_volume",
    "trade_count",
    "taker_base_volume",
    "taker_quote_volume",
];

/// Source of historical candles
pub trait MarketDataProvider {
    /// Fetch the most recent `limit` candles of `pair` at `interval`, oldest first
    fn fetch_candles(
        &self,
        pair: &Symbol,
        interval: &str,
        limit: u32,
    ) -> Result<CandleSeries, DataSourceError>;
}

/// Source of the latest traded price
pub trait PriceTicker {
    fn fetch_current_price(&self, pair: &Symbol) -> Result<f64, DataSourceError>;
}

/// Full market data collaborator: candles and ticker, shareable across threads
pub trait MarketData: MarketDataProvider + PriceTicker + Send + Sync {}

impl<T: MarketDataProvider + PriceTicker + Send + Sync> MarketData for T {}

/// File name used for a pair/interval: `BTCUSDT_1h.csv`
pub fn candle_file_name(pair: &Symbol, interval: &str) -> String {
    format!("{}_{}.csv", pair.as_str(), interval)
}

fn parse_open_time(raw: &str) -> Result<DateTime<Utc>, DataSourceError> {
    let raw = raw.trim();
    if let Ok(dt) = raw.parse::<DateTime<Utc>>() {
        return Ok(dt);
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc));
    }
    // epoch milliseconds, as exchanges report them
    raw.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| DataSourceError::Parse(format!("invalid open_time: {}", raw)))
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    idx: usize,
    row: usize,
) -> Result<T, DataSourceError> {
    let name = CSV_HEADER[idx];
    let raw = record
        .get(idx)
        .ok_or_else(|| DataSourceError::Parse(format!("row {}: missing {} column", row, name)))?;
    raw.trim()
        .parse()
        .map_err(|_| DataSourceError::Parse(format!("row {}: invalid {}: {}", row, name, raw)))
}

fn parse_optional<T: std::str::FromStr + Default>(
    record: &csv::StringRecord,
    idx: usize,
    row: usize,
) -> Result<T, DataSourceError> {
    if record.get(idx).map_or(true, |v| v.trim().is_empty()) {
        return Ok(T::default());
    }
    parse_field(record, idx, row)
}

/// Load candles from a CSV file
///
/// The first six columns (open_time through volume) are required; the flow
/// columns default to zero when absent.
pub fn load_csv(path: impl AsRef<Path>) -> Result<CandleSeries, DataSourceError> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let mut candles = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        let row = row_idx + 1;

        let open_time = parse_open_time(record.get(0).ok_or_else(|| {
            DataSourceError::Parse(format!("row {}: missing open_time column", row))
        })?)?;

        candles.push(Candle {
            open_time,
            open: parse_field(&record, 1, row)?,
            high: parse_field(&record, 2, row)?,
            low: parse_field(&record, 3, row)?,
            close: parse_field(&record, 4, row)?,
            volume: parse_field(&record, 5, row)?,
            quote_asset_volume: parse_optional(&record, 6, row)?,
            trade_count: parse_optional(&record, 7, row)?,
            taker_base_volume: parse_optional(&record, 8, row)?,
            taker_quote_volume: parse_optional(&record, 9, row)?,
        });
    }

    debug!("Loaded {} candles from {}", candles.len(), path.as_ref().display());

    Ok(CandleSeries::new(candles)?)
}

/// Save candles to a CSV file readable by [`load_csv`]
pub fn save_csv(candles: &CandleSeries, path: impl AsRef<Path>) -> Result<(), DataSourceError> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    writer.write_record(CSV_HEADER)?;

    for c in candles.as_slice() {
        writer.write_record([
            c.open_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            c.open.to_string(),
            c.high.to_string(),
            c.low.to_string(),
            c.close.to_string(),
            c.volume.to_string(),
            c.quote_asset_volume.to_string(),
            c.trade_count.to_string(),
            c.taker_base_volume.to_string(),
            c.taker_quote_volume.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Offline market data read from `{PAIR}_{interval}.csv` files
///
/// The current price is the last close of the pair's daily file.
#[derive(Debug, Clone)]
pub struct CsvMarketData {
    data_dir: PathBuf,
}

impl CsvMarketData {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, pair: &Symbol, interval: &str) -> PathBuf {
        self.data_dir.join(candle_file_name(pair, interval))
    }
}

impl MarketDataProvider for CsvMarketData {
    fn fetch_candles(
        &self,
        pair: &Symbol,
        interval: &str,
        limit: u32,
    ) -> Result<CandleSeries, DataSourceError> {
        let path = self.path_for(pair, interval);
        let series = load_csv(&path)?;

        info!(
            "Loaded {} {} candles for {} from {}",
            series.len().min(limit as usize),
            interval,
            pair,
            path.display()
        );

        Ok(series.tail(limit as usize))
    }
}

impl PriceTicker for CsvMarketData {
    fn fetch_current_price(&self, pair: &Symbol) -> Result<f64, DataSourceError> {
        let path = self.path_for(pair, BAND_INTERVAL);
        let series = load_csv(&path)?;
        series
            .last()
            .map(|c| c.close)
            .ok_or_else(|| DataSourceError::Parse(format!("{} has no candles", path.display())))
    }
}
