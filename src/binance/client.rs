//! Binance API client for klines and ticker prices
//!
//! Blocking HTTP; the calculator fetches a handful of series per run and
//! never needs an async runtime. Failures are returned as-is, never retried.
//!
//! # Example
//! ```no_run
//! use grid_calculator::binance::BinanceClient;
//! use grid_calculator::data::MarketDataProvider;
//! use grid_calculator::Symbol;
//!
//! fn main() -> anyhow::Result<()> {
//!     let client = BinanceClient::new()?;
//!     let klines = client.fetch_candles(&Symbol::new("BTCUSDT"), "1h", 100)?;
//!     println!("Fetched {} klines", klines.len());
//!     Ok(())
//! }
//! ```

use reqwest::blocking::Client;
use std::time::Duration as StdDuration;
use tracing::debug;

use super::types::{is_valid_interval, BinanceKline, TickerPrice};
use crate::config::ExchangeConfig;
use crate::data::{MarketDataProvider, PriceTicker};
use crate::error::DataSourceError;
use crate::{CandleSeries, Symbol};

/// Base URL for Binance API
pub const BINANCE_API_BASE: &str = "https://api.binance.com/api/v3";

/// Maximum klines per request (Binance limit)
pub const MAX_KLINES_PER_REQUEST: u32 = 1000;

/// Delay between paged kline requests (ms)
const RATE_LIMIT_DELAY_MS: u64 = 100;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Binance API client
#[derive(Debug, Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
}

impl BinanceClient {
    /// Create a client against the public Binance endpoint
    pub fn new() -> Result<Self, DataSourceError> {
        Self::with_base_url(BINANCE_API_BASE, StdDuration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client from the `exchange` config section
    pub fn from_config(config: &ExchangeConfig) -> Result<Self, DataSourceError> {
        Self::with_base_url(&config.base_url, StdDuration::from_secs(config.timeout_secs))
    }

    pub fn with_base_url(base_url: &str, timeout: StdDuration) -> Result<Self, DataSourceError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(BinanceClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str, params: &[(&str, String)]) -> Result<String, DataSourceError> {
        let url = format!("{}/{}", self.base_url, path);

        let response = self.client.get(&url).query(params).send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(DataSourceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    /// Fetch raw klines from `GET /klines`
    ///
    /// `limit` is capped at [`MAX_KLINES_PER_REQUEST`]. With `end_time` set,
    /// only klines opening at or before it are returned. Rows that do not
    /// parse fail the whole request.
    pub fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        end_time: Option<i64>,
        limit: u32,
    ) -> Result<Vec<BinanceKline>, DataSourceError> {
        if !is_valid_interval(interval) {
            return Err(DataSourceError::Parse(format!(
                "unsupported kline interval: {}",
                interval
            )));
        }

        let limit = limit.min(MAX_KLINES_PER_REQUEST);

        debug!(
            "Fetching klines: symbol={}, interval={}, end_time={:?}, limit={}",
            symbol, interval, end_time, limit
        );

        let mut params = vec![
            ("symbol", symbol.to_string()),
            ("interval", interval.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(end) = end_time {
            params.push(("endTime", end.to_string()));
        }

        let body = self.get("klines", &params)?;
        parse_klines(&body)
    }

    /// Fetch the most recent `count` klines, paging backwards when `count`
    /// exceeds [`MAX_KLINES_PER_REQUEST`]
    ///
    /// Returned oldest first, deduplicated by open time. Fewer than `count`
    /// klines come back when the pair has less history.
    pub fn get_recent_klines(
        &self,
        symbol: &str,
        interval: &str,
        count: u32,
    ) -> Result<Vec<BinanceKline>, DataSourceError> {
        let mut all_klines: Vec<BinanceKline> = Vec::with_capacity(count as usize);
        let mut end_time = None;

        while (all_klines.len() as u32) < count {
            let remaining = count - all_klines.len() as u32;
            let batch = self.get_klines(symbol, interval, end_time, remaining)?;
            let Some(first) = batch.first() else {
                break;
            };

            end_time = Some(first.open_time - 1);
            let exhausted = (batch.len() as u32) < remaining.min(MAX_KLINES_PER_REQUEST);
            all_klines.extend(batch);

            if exhausted {
                break;
            }
            if (all_klines.len() as u32) < count {
                std::thread::sleep(StdDuration::from_millis(RATE_LIMIT_DELAY_MS));
            }
        }

        all_klines.sort_by_key(|k| k.open_time);
        all_klines.dedup_by_key(|k| k.open_time);

        debug!(
            "Fetched {} {} klines for {}",
            all_klines.len(),
            interval,
            symbol
        );

        Ok(all_klines)
    }

    /// Fetch the latest price from `GET /ticker/price`
    pub fn get_ticker_price(&self, symbol: &str) -> Result<f64, DataSourceError> {
        let body = self.get("ticker/price", &[("symbol", symbol.to_string())])?;
        let ticker: TickerPrice = serde_json::from_str(&body)
            .map_err(|e| DataSourceError::Parse(format!("ticker response: {}", e)))?;
        ticker.price()
    }
}

/// Parse a `/klines` response body
pub fn parse_klines(body: &str) -> Result<Vec<BinanceKline>, DataSourceError> {
    let raw_data: Vec<Vec<serde_json::Value>> = serde_json::from_str(body)
        .map_err(|e| DataSourceError::Parse(format!("klines response: {}", e)))?;

    raw_data
        .iter()
        .enumerate()
        .map(|(i, row)| {
            BinanceKline::from_raw(row)
                .ok_or_else(|| DataSourceError::Parse(format!("malformed kline row {}", i)))
        })
        .collect()
}

impl MarketDataProvider for BinanceClient {
    fn fetch_candles(
        &self,
        pair: &Symbol,
        interval: &str,
        limit: u32,
    ) -> Result<CandleSeries, DataSourceError> {
        let candles = self
            .get_recent_klines(pair.as_str(), interval, limit)?
            .into_iter()
            .map(BinanceKline::into_candle)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CandleSeries::new(candles)?)
    }
}

impl PriceTicker for BinanceClient {
    fn fetch_current_price(&self, pair: &Symbol) -> Result<f64, DataSourceError> {
        self.get_ticker_price(pair.as_str())
    }
}
