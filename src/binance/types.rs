//! Binance API types for klines (candlestick) and ticker data

use chrono::DateTime;
use serde::Deserialize;

use crate::error::DataSourceError;
use crate::Candle;

/// Binance kline/candlestick data
/// API returns an array: [open_time, open, high, low, close, volume, close_time,
///                        quote_volume, trades, taker_buy_base, taker_buy_quote, ignore]
#[derive(Debug, Clone)]
pub struct BinanceKline {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: i64,
    pub quote_volume: f64,
    pub trades: u64,
    pub taker_buy_base: f64,
    pub taker_buy_quote: f64,
}

impl BinanceKline {
    /// Parse from raw JSON array returned by Binance API
    pub fn from_raw(raw: &[serde_json::Value]) -> Option<Self> {
        if raw.len() < 11 {
            return None;
        }

        Some(BinanceKline {
            open_time: raw[0].as_i64()?,
            open: raw[1].as_str()?.parse().ok()?,
            high: raw[2].as_str()?.parse().ok()?,
            low: raw[3].as_str()?.parse().ok()?,
            close: raw[4].as_str()?.parse().ok()?,
            volume: raw[5].as_str()?.parse().ok()?,
            close_time: raw[6].as_i64()?,
            quote_volume: raw[7].as_str()?.parse().ok()?,
            trades: raw[8].as_u64()?,
            taker_buy_base: raw[9].as_str()?.parse().ok()?,
            taker_buy_quote: raw[10].as_str()?.parse().ok()?,
        })
    }

    /// Convert into a validated candle
    pub fn into_candle(self) -> Result<Candle, DataSourceError> {
        let open_time = DateTime::from_timestamp_millis(self.open_time).ok_or_else(|| {
            DataSourceError::Parse(format!("invalid kline open_time: {}", self.open_time))
        })?;

        let candle = Candle {
            open_time,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            quote_asset_volume: self.quote_volume,
            trade_count: self.trades,
            taker_base_volume: self.taker_buy_base,
            taker_quote_volume: self.taker_buy_quote,
        };
        candle.validate()?;
        Ok(candle)
    }
}

/// Response of `GET /ticker/price`
#[derive(Debug, Clone, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: String,
}

impl TickerPrice {
    pub fn price(&self) -> Result<f64, DataSourceError> {
        self.price
            .parse()
            .map_err(|_| DataSourceError::Parse(format!("invalid ticker price: {}", self.price)))
    }
}

/// Valid Binance intervals
pub const BINANCE_INTERVALS: &[&str] = &[
    "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w", "1M",
];

/// Check if interval is valid for Binance
pub fn is_valid_interval(interval: &str) -> bool {
    BINANCE_INTERVALS.contains(&interval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_row() -> Vec<serde_json::Value> {
        json!([
            1704067200000_i64,
            "42283.58",
            "42554.57",
            "42261.02",
            "42475.23",
            "1271.68108",
            1704070799999_i64,
            "53957248.97",
            47134,
            "682.57581",
            "28957416.82",
            "0"
        ])
        .as_array()
        .unwrap()
        .clone()
    }

    #[test]
    fn test_kline_from_raw() {
        let kline = BinanceKline::from_raw(&raw_row()).unwrap();
        assert_eq!(kline.open_time, 1704067200000);
        assert_eq!(kline.close, 42475.23);
        assert_eq!(kline.trades, 47134);

        let candle = kline.into_candle().unwrap();
        assert_eq!(candle.open_time.timestamp_millis(), 1704067200000);
        assert_eq!(candle.quote_asset_volume, 53957248.97);
        assert_eq!(candle.taker_quote_volume, 28957416.82);
    }

    #[test]
    fn test_kline_rejects_short_or_malformed_rows() {
        let row = raw_row();
        assert!(BinanceKline::from_raw(&row[..6]).is_none());

        let mut bad = row.clone();
        bad[4] = json!("not-a-number");
        assert!(BinanceKline::from_raw(&bad).is_none());
    }

    #[test]
    fn test_ticker_price() {
        let ticker: TickerPrice =
            serde_json::from_str(r#"{"symbol":"BTCUSDT","price":"64123.45000000"}"#).unwrap();
        assert_eq!(ticker.symbol, "BTCUSDT");
        assert_eq!(ticker.price().unwrap(), 64123.45);
    }

    #[test]
    fn test_valid_intervals() {
        assert!(is_valid_interval("30m"));
        assert!(is_valid_interval("2h"));
        assert!(is_valid_interval("1d"));
        assert!(!is_valid_interval("2d"));
    }
}
