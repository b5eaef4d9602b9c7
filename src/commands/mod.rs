//! Subcommand implementations

pub mod calculate;
pub mod volatility;

use anyhow::{Context, Result};
use grid_calculator::binance::BinanceClient;
use grid_calculator::data::{CsvMarketData, MarketData};
use grid_calculator::{Config, Symbol};
use std::path::Path;
use tracing::info;

/// Offline CSV data when `data_dir` is given, Binance otherwise
pub fn market_data(config: &Config, data_dir: Option<&Path>) -> Result<Box<dyn MarketData>> {
    match data_dir {
        Some(dir) => {
            if !dir.is_dir() {
                anyhow::bail!("Data directory not found: {}", dir.display());
            }
            info!("Using offline data from {}", dir.display());
            Ok(Box::new(CsvMarketData::new(dir)))
        }
        None => {
            info!("Using Binance market data at {}", config.exchange.base_url);
            let client =
                BinanceClient::from_config(&config.exchange).context("Failed to create HTTP client")?;
            Ok(Box::new(client))
        }
    }
}

/// Parse a comma-separated pair list, rejecting pairs the config does not allow
pub fn parse_pairs(pairs: &str, config: &Config) -> Result<Vec<Symbol>> {
    let symbols: Vec<Symbol> = pairs
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Symbol::new)
        .collect();

    if symbols.is_empty() {
        anyhow::bail!("No trading pair given");
    }

    for symbol in &symbols {
        if !config.trading.allows(symbol) {
            anyhow::bail!(
                "Pair {} is not enabled; allowed pairs: {}",
                symbol,
                config.trading.symbols.join(", ")
            );
        }
    }

    Ok(symbols)
}
