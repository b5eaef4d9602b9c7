//! Level sizing and direction assignment
//!
//! Each level receives an equal notional share of the total capital, so the
//! lot at price `p` is `total_capital / grid_num / p`.

use crate::error::{GridError, GridResult};
use crate::{Direction, Grid, GridDirectionMode, GridLevel};

/// Direction of a level at `price` under `mode`
///
/// Neutral straddles the market: levels strictly above `current_price` sell,
/// everything else buys.
pub fn level_direction(mode: GridDirectionMode, price: f64, current_price: f64) -> Direction {
    match mode {
        GridDirectionMode::Neutral => {
            if price > current_price {
                Direction::Short
            } else {
                Direction::Long
            }
        }
        GridDirectionMode::Long => Direction::Long,
        GridDirectionMode::Short => Direction::Short,
    }
}

/// Size every ladder price and attach its direction, preserving ladder order
pub fn assign_levels(
    ladder: &[f64],
    current_price: f64,
    total_capital: f64,
    mode: GridDirectionMode,
) -> GridResult<Grid> {
    if ladder.is_empty() {
        return Err(GridError::DegenerateGrid { grid_num: 0 });
    }
    if !current_price.is_finite() || current_price <= 0.0 {
        return Err(GridError::InvalidPrice(current_price));
    }
    if !total_capital.is_finite() || total_capital <= 0.0 {
        return Err(GridError::InvalidCapital(format!(
            "total capital must be positive, got {}",
            total_capital
        )));
    }
    if let Some(&bad) = ladder.iter().find(|&&p| p.is_nan() || p <= 0.0) {
        return Err(GridError::NonPositiveBound { lower: bad });
    }

    let notional = total_capital / ladder.len() as f64;

    let levels = ladder
        .iter()
        .map(|&price| GridLevel {
            price,
            lot: notional / price,
            direction: level_direction(mode, price, current_price),
        })
        .collect();

    Ok(Grid::new(levels))
}
