//! Grid level count derivation

use crate::error::{GridError, GridResult};

/// Default headroom applied to band width / ATR (20%)
pub const GRID_BUFFER_FACTOR: f64 = 1.2;

/// Minimum number of levels a ladder needs
pub const MIN_GRID_LEVELS: usize = 2;

/// Maximum number of levels a ladder may have
pub const MAX_GRID_LEVELS: usize = 10_000;

/// Number of grid levels: `trunc(buffer × (upper - lower) / atr)`
///
/// A collapsed band (upper == lower) is degenerate regardless of the ATR,
/// so it is rejected before dividing. Counts above [`MAX_GRID_LEVELS`] fail
/// before any ladder is allocated.
pub fn grid_count(upper: f64, lower: f64, atr: f64, buffer: f64) -> GridResult<usize> {
    if upper < lower {
        return Err(GridError::InvertedBounds { upper, lower });
    }

    let width = upper - lower;
    if width == 0.0 {
        return Err(GridError::DegenerateGrid { grid_num: 0 });
    }

    if !atr.is_finite() || atr <= 0.0 {
        return Err(GridError::NonPositiveVolatility { atr });
    }

    let raw = buffer * width / atr;
    if !raw.is_finite() {
        return Err(GridError::NonPositiveVolatility { atr });
    }

    if raw.trunc() > MAX_GRID_LEVELS as f64 {
        return Err(GridError::TooManyLevels {
            grid_num: raw.trunc() as usize,
            max: MAX_GRID_LEVELS,
        });
    }

    let grid_num = raw.trunc().max(0.0) as usize;
    if grid_num < MIN_GRID_LEVELS {
        return Err(GridError::DegenerateGrid { grid_num });
    }

    Ok(grid_num)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_case() {
        assert_eq!(grid_count(120.0, 80.0, 5.0, GRID_BUFFER_FACTOR).unwrap(), 9);
    }

    #[test]
    fn test_truncates_toward_zero() {
        // 1.2 * 10 / 2.9 = 4.14, 1.2 * 10 / 7 = 1.71
        assert_eq!(grid_count(110.0, 100.0, 2.9, GRID_BUFFER_FACTOR).unwrap(), 4);
        assert!(matches!(
            grid_count(110.0, 100.0, 7.0, GRID_BUFFER_FACTOR),
            Err(GridError::DegenerateGrid { grid_num: 1 })
        ));
    }

    #[test]
    fn test_collapsed_band_is_degenerate() {
        assert!(matches!(
            grid_count(100.0, 100.0, 0.0, GRID_BUFFER_FACTOR),
            Err(GridError::DegenerateGrid { grid_num: 0 })
        ));
        assert!(matches!(
            grid_count(100.0, 100.0, 3.0, GRID_BUFFER_FACTOR),
            Err(GridError::DegenerateGrid { grid_num: 0 })
        ));
    }

    #[test]
    fn test_large_atr_is_degenerate() {
        assert!(matches!(
            grid_count(101.0, 100.0, 50.0, GRID_BUFFER_FACTOR),
            Err(GridError::DegenerateGrid { grid_num: 0 })
        ));
    }

    #[test]
    fn test_tiny_atr_exceeds_level_ceiling() {
        assert!(matches!(
            grid_count(111.0, 89.0, 1e-12, GRID_BUFFER_FACTOR),
            Err(GridError::TooManyLevels {
                max: MAX_GRID_LEVELS,
                ..
            })
        ));
        assert_eq!(grid_count(10_000.0, 0.0, 1.0, 1.0).unwrap(), MAX_GRID_LEVELS);
        assert!(matches!(
            grid_count(10_001.0, 0.0, 1.0, 1.0),
            Err(GridError::TooManyLevels {
                grid_num: 10_001,
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(matches!(
            grid_count(80.0, 120.0, 5.0, GRID_BUFFER_FACTOR),
            Err(GridError::InvertedBounds { .. })
        ));
        assert!(matches!(
            grid_count(120.0, 80.0, 0.0, GRID_BUFFER_FACTOR),
            Err(GridError::NonPositiveVolatility { .. })
        ));
        assert!(matches!(
            grid_count(120.0, 80.0, f64::NAN, GRID_BUFFER_FACTOR),
            Err(GridError::NonPositiveVolatility { .. })
        ));
    }
}
