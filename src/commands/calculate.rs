//! Calculate command implementation

use anyhow::{Context, Result};
use clap::Args;
use grid_calculator::report::{self, OutputFormat};
use grid_calculator::{
    Capital, Config, GridCalculator, GridDirectionMode, GridPlan, GridRequest, GridType, Horizon,
    Symbol,
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Args, Debug)]
pub struct CalculateArgs {
    /// Trading pair(s), comma-separated. E.g., "BTCUSDT,ETHUSDT"
    #[arg(short, long, default_value = "BTCUSDT")]
    pub pair: String,

    /// Look-back horizon in days (7, 30 or 180)
    #[arg(short, long, default_value = "30")]
    pub days: u32,

    /// Grid direction (Neutral, Long or Short)
    #[arg(long, default_value = "Neutral")]
    pub direction: String,

    /// Capital amount
    #[arg(short, long, default_value = "1000")]
    pub amount: f64,

    /// Leverage multiplier
    #[arg(short, long, default_value = "1")]
    pub leverage: u32,

    /// Ladder spacing (Arithmetic or Geometric)
    #[arg(short, long, default_value = "Arithmetic")]
    pub grid_type: String,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Read candles from {PAIR}_{interval}.csv files in this directory instead of Binance
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Export grid levels to CSV (one file per pair when several are given)
    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// `grid.csv` -> `grid_BTCUSDT.csv` when several pairs share one export path
fn export_path(base: &Path, pair: &Symbol, multiple: bool) -> PathBuf {
    if !multiple {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "grid".to_string());
    let ext = base
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "csv".to_string());
    base.with_file_name(format!("{}_{}.{}", stem, pair, ext))
}

fn check_limits(args: &CalculateArgs, config: &Config) -> Result<()> {
    if args.amount > config.trading.max_amount {
        anyhow::bail!(
            "Amount {} exceeds the configured maximum {}",
            args.amount,
            config.trading.max_amount
        );
    }
    if args.leverage > config.trading.max_leverage {
        anyhow::bail!(
            "Leverage {} exceeds the configured maximum {}",
            args.leverage,
            config.trading.max_leverage
        );
    }
    Ok(())
}

pub fn run(args: CalculateArgs) -> Result<()> {
    info!("Starting grid calculation");

    let config = Config::load(args.config.as_deref())?;
    if let Some(path) = &args.config {
        info!("Loaded configuration from: {}", path.display());
    }

    // Input validation: every invalid value stops here
    let horizon = Horizon::try_from(args.days)?;
    let direction: GridDirectionMode = args.direction.parse()?;
    let grid_type: GridType = args.grid_type.parse()?;
    check_limits(&args, &config)?;
    let capital = Capital::new(args.amount, args.leverage)?;
    let pairs = super::parse_pairs(&args.pair, &config)?;

    let provider = super::market_data(&config, args.data_dir.as_deref())?;
    let calculator = GridCalculator::new(config.pipeline);

    info!(
        "Calculating {} pair(s): horizon={}, direction={}, grid_type={}, aum={:.2}",
        pairs.len(),
        horizon,
        direction,
        grid_type,
        capital.aum()
    );

    let results: Vec<(Symbol, Result<GridPlan>)> = pairs
        .par_iter()
        .map(|pair| {
            let request = GridRequest {
                pair: pair.clone(),
                horizon,
                direction,
                grid_type,
                capital,
            };
            let plan = calculator
                .run(provider.as_ref(), &request)
                .with_context(|| format!("Grid calculation failed for {}", pair));
            (pair.clone(), plan)
        })
        .collect();

    let multiple = results.len() > 1;
    let mut plans = Vec::new();
    let mut failures = 0;

    for (pair, result) in results {
        match result {
            Ok(plan) => {
                if let Some(base) = &args.export {
                    let path = export_path(base, &pair, multiple);
                    report::export_csv(&plan, &path)
                        .with_context(|| format!("Failed to export grid to {}", path.display()))?;
                    info!("Exported {} levels to {}", plan.grid.len(), path.display());
                }
                plans.push(plan);
            }
            Err(e) => {
                error!("{:#}", e);
                failures += 1;
            }
        }
    }

    match args.format {
        OutputFormat::Table => {
            for plan in &plans {
                println!("{}", report::render_table(plan));
            }
        }
        OutputFormat::Json => {
            let json = if multiple {
                serde_json::to_string_pretty(&plans)?
            } else {
                match plans.first() {
                    Some(plan) => report::to_json(plan)?,
                    None => "null".to_string(),
                }
            };
            println!("{}", json);
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} pair(s) failed", failures, failures + plans.len());
    }

    Ok(())
}
