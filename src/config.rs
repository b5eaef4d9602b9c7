//! Configuration management
//!
//! Handles loading and parsing of the JSON configuration file. Every section
//! has defaults, so running without a config file is the common case.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::band::{BAND_MULTIPLIER, BAND_WINDOW};
use crate::binance::BINANCE_API_BASE;
use crate::sizing::GRID_BUFFER_FACTOR;
use crate::volatility::ATR_WINDOW;
use crate::Symbol;

/// Environment variable overriding `exchange.base_url`
pub const BASE_URL_ENV: &str = "BINANCE_API_URL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineParams,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub trading: TradingConfig,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;
        let mut config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise start from defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let mut config = Config::default();
                config.apply_env();
                config.validate()?;
                Ok(config)
            }
        }
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.exchange.base_url = url;
            }
        }
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        let p = &self.pipeline;
        if p.atr_window == 0 {
            anyhow::bail!("pipeline.atr_window must be at least 1");
        }
        if p.band_window < 2 {
            anyhow::bail!("pipeline.band_window must be at least 2 (sample standard deviation)");
        }
        if !p.band_multiplier.is_finite() || p.band_multiplier <= 0.0 {
            anyhow::bail!("pipeline.band_multiplier must be positive");
        }
        if !p.buffer_factor.is_finite() || p.buffer_factor <= 0.0 {
            anyhow::bail!("pipeline.buffer_factor must be positive");
        }
        if self.exchange.timeout_secs == 0 {
            anyhow::bail!("exchange.timeout_secs must be at least 1");
        }
        if self.trading.max_amount <= 0.0 {
            anyhow::bail!("trading.max_amount must be positive");
        }
        if self.trading.max_leverage == 0 {
            anyhow::bail!("trading.max_leverage must be at least 1");
        }
        Ok(())
    }
}

/// Window sizes and multipliers owned by the calculation pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineParams {
    /// ATR rolling window (samples)
    #[serde(default = "default_atr_window")]
    pub atr_window: usize,

    /// Band rolling window (samples)
    #[serde(default = "default_band_window")]
    pub band_window: usize,

    /// Band width in standard deviations
    #[serde(default = "default_band_multiplier")]
    pub band_multiplier: f64,

    /// Headroom applied when deriving the level count (1.2 = 20%)
    #[serde(default = "default_buffer_factor")]
    pub buffer_factor: f64,
}

fn default_atr_window() -> usize {
    ATR_WINDOW
}

fn default_band_window() -> usize {
    BAND_WINDOW
}

fn default_band_multiplier() -> f64 {
    BAND_MULTIPLIER
}

fn default_buffer_factor() -> f64 {
    GRID_BUFFER_FACTOR
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            atr_window: ATR_WINDOW,
            band_window: BAND_WINDOW,
            band_multiplier: BAND_MULTIPLIER,
            buffer_factor: GRID_BUFFER_FACTOR,
        }
    }
}

/// Exchange configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    BINANCE_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        ExchangeConfig {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Limits applied to user input before it reaches the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Pairs the calculator accepts; empty accepts any pair
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    #[serde(default = "default_max_amount")]
    pub max_amount: f64,
    #[serde(default = "default_max_leverage")]
    pub max_leverage: u32,
}

fn default_symbols() -> Vec<String> {
    ["BTCUSDT", "ETHUSDT", "BNBUSDT", "ZECUSDT", "XRPUSDT"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_amount() -> f64 {
    1_000_000.0
}

fn default_max_leverage() -> u32 {
    100
}

impl Default for TradingConfig {
    fn default() -> Self {
        TradingConfig {
            symbols: default_symbols(),
            max_amount: default_max_amount(),
            max_leverage: default_max_leverage(),
        }
    }
}

impl TradingConfig {
    pub fn symbols(&self) -> Vec<Symbol> {
        self.symbols.iter().map(Symbol::new).collect()
    }

    /// Whether `pair` may be used with this configuration
    pub fn allows(&self, pair: &Symbol) -> bool {
        self.symbols.is_empty() || self.symbols().contains(pair)
    }
}
