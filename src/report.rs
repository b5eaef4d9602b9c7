//! Result presentation
//!
//! Renders a [`GridPlan`] as a text table, JSON, or CSV. Rendering never
//! changes the plan.

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::Path;

use crate::pipeline::GridPlan;
use crate::Direction;

/// Output format for the calculate command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// One CSV row per grid level
#[derive(Debug, Serialize)]
struct GridRow {
    level: usize,
    price: f64,
    lot: f64,
    direction: Direction,
}

impl fmt::Display for GridPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);

        writeln!(f, "{}", rule)?;
        writeln!(
            f,
            "GRID {} | {} | {} | {}",
            self.pair, self.horizon, self.grid_type, self.direction
        )?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "  Current price:  {}", self.current_price)?;
        writeln!(f, "  Total capital:  {:.2}", self.total_capital)?;
        writeln!(f, "  ATR:            {:.6}", self.volatility.atr)?;
        writeln!(
            f,
            "  Band:           {} - {} (mean {:.4}, std {:.4})",
            self.band.lower, self.band.upper, self.band.mean, self.band.std_dev
        )?;
        writeln!(f, "  Grid Num:       {}", self.grid_num)?;
        writeln!(
            f,
            "  Directions:     {} short / {} long",
            self.grid.count(Direction::Short),
            self.grid.count(Direction::Long)
        )?;
        writeln!(f, "{}", "-".repeat(60))?;
        writeln!(f, "{:>5}  {:>16}  {:>18}  {:>9}", "#", "price", "lot", "direction")?;

        for (i, level) in self.grid.iter().enumerate() {
            writeln!(
                f,
                "{:>5}  {:>16.4}  {:>18.8}  {:>9}",
                i,
                level.price,
                level.lot,
                level.direction.to_string()
            )?;
        }
        writeln!(f, "{}", rule)
    }
}

/// Human-readable summary followed by one line per level
pub fn render_table(plan: &GridPlan) -> String {
    plan.to_string()
}

/// Pretty-printed JSON of the whole plan
pub fn to_json(plan: &GridPlan) -> serde_json::Result<String> {
    serde_json::to_string_pretty(plan)
}

/// Write the grid levels as CSV (`level,price,lot,direction`)
pub fn write_grid_csv<W: io::Write>(plan: &GridPlan, writer: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for (level, l) in plan.grid.iter().enumerate() {
        writer.serialize(GridRow {
            level,
            price: l.price,
            lot: l.lot,
            direction: l.direction,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Export the grid levels to a CSV file
pub fn export_csv(plan: &GridPlan, path: impl AsRef<Path>) -> csv::Result<()> {
    let file = std::fs::File::create(path.as_ref())?;
    write_grid_csv(plan, file)
}
