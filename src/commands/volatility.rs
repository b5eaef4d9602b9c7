//! Volatility command implementation
//!
//! Prints the trailing ATR and band series that feed the grid, without
//! sizing a grid.

use anyhow::{Context, Result};
use clap::Args;
use grid_calculator::data::BAND_INTERVAL;
use grid_calculator::{Config, GridCalculator, Horizon};
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct VolatilityArgs {
    /// Trading pair. E.g., "BTCUSDT"
    #[arg(short, long, default_value = "BTCUSDT")]
    pub pair: String,

    /// Look-back horizon in days (7, 30 or 180)
    #[arg(short, long, default_value = "30")]
    pub days: u32,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Read candles from {PAIR}_{interval}.csv files in this directory instead of Binance
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

pub fn run(args: VolatilityArgs) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    let horizon = Horizon::try_from(args.days)?;
    let pairs = super::parse_pairs(&args.pair, &config)?;
    let provider = super::market_data(&config, args.data_dir.as_deref())?;
    let calculator = GridCalculator::new(config.pipeline);

    for pair in pairs {
        info!("Fetching {} data for {}", horizon, pair);

        let volatility_candles = provider
            .fetch_candles(
                &pair,
                horizon.volatility_interval(),
                horizon.volatility_limit(),
            )
            .with_context(|| format!("Failed to fetch volatility candles for {}", pair))?;
        let band_candles = provider
            .fetch_candles(&pair, BAND_INTERVAL, calculator.band_limit(horizon))
            .with_context(|| format!("Failed to fetch daily candles for {}", pair))?;

        let (volatility, band) = calculator.estimate(&volatility_candles, &band_candles, horizon)?;

        println!("\n{}", "=".repeat(60));
        println!(
            "VOLATILITY {} ({}, {} x {})",
            pair,
            horizon,
            horizon.volatility_limit(),
            horizon.volatility_interval()
        );
        println!("{}", "=".repeat(60));
        println!("  ATR window:   {}", calculator.params().atr_window);
        println!("  Latest ATR:   {:.6}", volatility.atr);
        println!("  Trailing ATR:");
        for (i, value) in volatility.trailing.iter().enumerate() {
            println!("    {:>4}  {:.6}", i, value);
        }
        println!("{}", "-".repeat(60));
        println!(
            "  Band:         {} - {} (window {}, k {})",
            band.lower,
            band.upper,
            calculator.params().band_window,
            calculator.params().band_multiplier
        );
        println!("  Trailing mean / std:");
        for (i, (mean, std)) in band.trailing_mean.iter().zip(&band.trailing_std).enumerate() {
            println!("    {:>4}  {:>14.4}  {:>12.4}", i, mean, std);
        }
        println!("{}", "=".repeat(60));
    }

    Ok(())
}
