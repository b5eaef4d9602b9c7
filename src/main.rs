//! Grid calculator - main entry point
//!
//! This binary provides two subcommands:
//! - calculate: Compute grid levels for one or more pairs
//! - volatility: Inspect the ATR and band series behind a grid

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

use commands::calculate::CalculateArgs;
use commands::volatility::VolatilityArgs;

#[derive(Parser, Debug)]
#[command(name = "grid-calculator")]
#[command(about = "Grid trading parameter calculator (ATR + Bollinger band)", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Do not write a log file
    #[arg(long, global = true)]
    no_log_file: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Calculate grid levels, lots and directions
    Calculate(CalculateArgs),

    /// Show the trailing ATR and band values for a pair
    Volatility(VolatilityArgs),
}

fn setup_logging(verbose: bool, command_name: &str, log_file: bool) -> Result<()> {
    // Set log level - filter out noisy external crates
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn",
        level
    );
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    // Console layer on stderr so table/JSON output on stdout stays clean
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    if !log_file {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();
        return Ok(());
    }

    std::fs::create_dir_all("logs")?;

    // Log file naming pattern: {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);
    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    // File layer - same format but without ANSI colors
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Log file: {}", log_path.display());

    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let command_name = match &cli.command {
        Commands::Calculate(_) => "calculate",
        Commands::Volatility(_) => "volatility",
    };

    setup_logging(cli.verbose, command_name, !cli.no_log_file)?;

    match cli.command {
        Commands::Calculate(args) => commands::calculate::run(args),
        Commands::Volatility(args) => commands::volatility::run(args),
    }
}
