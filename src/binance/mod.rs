//! Binance API client for klines and ticker prices
//! No API key needed for public market data endpoints.

mod client;
mod types;

pub use client::{parse_klines, BinanceClient, BINANCE_API_BASE, MAX_KLINES_PER_REQUEST};
pub use types::*;
