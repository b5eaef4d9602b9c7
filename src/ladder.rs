//! Ladder generation
//!
//! Produces `grid_num` prices from the upper bound down to the lower bound,
//! endpoints inclusive. Endpoints are pinned to the exact bounds so that
//! floating-point drift never moves the outermost levels.

use crate::error::{GridError, GridResult};
use crate::sizing::MIN_GRID_LEVELS;
use crate::GridType;

/// Descending price ladder for the given spacing law
pub fn generate_ladder(
    upper: f64,
    lower: f64,
    grid_num: usize,
    grid_type: GridType,
) -> GridResult<Vec<f64>> {
    if grid_num < MIN_GRID_LEVELS {
        return Err(GridError::DegenerateGrid { grid_num });
    }
    if upper <= lower {
        return Err(GridError::InvertedBounds { upper, lower });
    }

    match grid_type {
        GridType::Arithmetic => Ok(arithmetic(upper, lower, grid_num)),
        GridType::Geometric => geometric(upper, lower, grid_num),
    }
}

/// Evenly spaced on a linear scale
fn arithmetic(upper: f64, lower: f64, grid_num: usize) -> Vec<f64> {
    let steps = (grid_num - 1) as f64;
    let step = (lower - upper) / steps;

    let mut ladder: Vec<f64> = (0..grid_num).map(|i| upper + step * i as f64).collect();
    ladder[grid_num - 1] = lower;
    ladder
}

/// Evenly spaced on a logarithmic scale
fn geometric(upper: f64, lower: f64, grid_num: usize) -> GridResult<Vec<f64>> {
    if lower <= 0.0 {
        return Err(GridError::NonPositiveBound { lower });
    }

    let steps = (grid_num - 1) as f64;
    let log_upper = upper.ln();
    let log_step = (lower.ln() - log_upper) / steps;

    let mut ladder: Vec<f64> = (0..grid_num)
        .map(|i| (log_upper + log_step * i as f64).exp())
        .collect();
    ladder[0] = upper;
    ladder[grid_num - 1] = lower;
    Ok(ladder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_arithmetic_reference_case() {
        let ladder = generate_ladder(120.0, 80.0, 9, GridType::Arithmetic).unwrap();
        assert_eq!(ladder.len(), 9);

        let expected = [120.0, 115.0, 110.0, 105.0, 100.0, 95.0, 90.0, 85.0, 80.0];
        for (got, want) in ladder.iter().zip(expected.iter()) {
            assert_relative_eq!(*got, *want, epsilon = 1e-9);
        }
        assert_eq!(ladder[0], 120.0);
        assert_eq!(ladder[8], 80.0);
    }

    #[test]
    fn test_geometric_has_constant_ratio() {
        let ladder = generate_ladder(160.0, 10.0, 5, GridType::Geometric).unwrap();
        assert_eq!(ladder.len(), 5);
        assert_eq!(ladder[0], 160.0);
        assert_eq!(ladder[4], 10.0);

        for (i, want) in [160.0, 80.0, 40.0, 20.0, 10.0].iter().enumerate() {
            assert_relative_eq!(ladder[i], *want, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_strictly_descending() {
        for grid_type in [GridType::Arithmetic, GridType::Geometric] {
            let ladder = generate_ladder(50_000.0, 42_000.0, 37, grid_type).unwrap();
            assert_eq!(ladder.len(), 37);
            assert!(ladder.windows(2).all(|w| w[0] > w[1]));
        }
    }

    #[test]
    fn test_geometric_rejects_non_positive_lower() {
        for lower in [0.0, -5.0] {
            assert!(matches!(
                generate_ladder(10.0, lower, 4, GridType::Geometric),
                Err(GridError::NonPositiveBound { .. })
            ));
        }
        // linear spacing is still defined
        assert!(generate_ladder(10.0, 0.0, 4, GridType::Arithmetic).is_ok());
    }

    #[test]
    fn test_rejects_degenerate_inputs() {
        assert!(matches!(
            generate_ladder(120.0, 80.0, 1, GridType::Arithmetic),
            Err(GridError::DegenerateGrid { grid_num: 1 })
        ));
        assert!(matches!(
            generate_ladder(80.0, 120.0, 5, GridType::Arithmetic),
            Err(GridError::InvertedBounds { .. })
        ));
    }
}
