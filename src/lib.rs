//! Grid Calculator
//!
//! Derives grid trading parameters for a trading pair: an ATR volatility
//! estimate, a Bollinger band trading range, the number of grid levels, the
//! price ladder, and the lot and direction of every level, sized against the
//! user's capital and leverage.
//!
//! ## Example
//! ```no_run
//! use grid_calculator::binance::BinanceClient;
//! use grid_calculator::pipeline::{GridCalculator, GridRequest};
//! use grid_calculator::{Capital, GridDirectionMode, GridType, Horizon, Symbol};
//!
//! fn main() -> anyhow::Result<()> {
//!     let client = BinanceClient::new()?;
//!     let request = GridRequest {
//!         pair: Symbol::new("BTCUSDT"),
//!         horizon: Horizon::Month,
//!         direction: GridDirectionMode::Neutral,
//!         grid_type: GridType::Arithmetic,
//!         capital: Capital::new(1000.0, 3)?,
//!     };
//!     let plan = GridCalculator::default().run(&client, &request)?;
//!     println!("{} levels", plan.grid_num);
//!     Ok(())
//! }
//! ```

pub mod band;
pub mod binance;
pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod ladder;
pub mod levels;
pub mod pipeline;
pub mod report;
pub mod sizing;
pub mod types;
pub mod volatility;

pub use config::Config;
pub use error::{DataSourceError, GridError, GridResult};
pub use pipeline::{GridCalculator, GridPlan, GridRequest};
pub use types::*;
