//! Snap-to-grid quantization in user coordinates.

use crate::options::{GridOptions, SNAP_THRESHOLD_PX};

/// Upper bound on the doublings done by [`SnapGrid::calculate`].
const MAX_DOUBLINGS: u32 = 64;

/// Snap grid state.
///
/// `grid_x`/`grid_y` are the configured base divisors. `size_x`/`size_y` are
/// the effective divisors derived from the current zoom: user values snap to
/// multiples of `1 / size`.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapGrid {
    pub enabled: bool,
    pub grid_x: f64,
    pub grid_y: f64,
    pub size_x: f64,
    pub size_y: f64,
    pub threshold_px: f64,
}

impl Default for SnapGrid {
    fn default() -> Self {
        Self {
            enabled: false,
            grid_x: 1.0,
            grid_y: 1.0,
            size_x: 1.0,
            size_y: 1.0,
            threshold_px: SNAP_THRESHOLD_PX,
        }
    }
}

impl SnapGrid {
    /// Snap grid configured from the grid options.
    pub fn from_options(options: &GridOptions) -> Self {
        Self {
            enabled: options.snap_to_grid,
            grid_x: options.grid_x,
            grid_y: options.grid_y,
            size_x: options.grid_x,
            size_y: options.grid_y,
            threshold_px: options.snap_threshold_px,
        }
    }

    /// Recompute the effective divisors for the given pixel scales.
    ///
    /// `scale_x`/`scale_y` are pixels per user unit (unit times zoom). The
    /// divisor doubles until one snap cell is at most `threshold_px` wide on
    /// screen.
    pub fn calculate(&mut self, scale_x: f64, scale_y: f64) {
        self.size_x = Self::divisor(self.grid_x, scale_x, self.threshold_px);
        self.size_y = Self::divisor(self.grid_y, scale_y, self.threshold_px);
    }

    fn divisor(base: f64, scale: f64, threshold: f64) -> f64 {
        if !base.is_finite() || base == 0.0 || !scale.is_finite() {
            return base;
        }
        let mut size = base;
        let mut cell = scale / base;
        let mut doublings = 0;
        while cell.abs() > threshold && doublings < MAX_DOUBLINGS {
            size *= 2.0;
            cell /= 2.0;
            doublings += 1;
        }
        size
    }

    /// Snap a single value to the nearest multiple of `1 / size`.
    pub fn snap_value(value: f64, size: f64) -> f64 {
        if size == 0.0 || !size.is_finite() {
            return value;
        }
        (value * size).round() / size
    }

    /// Snap a user position. Returns the input unchanged when disabled.
    pub fn snap(&self, x: f64, y: f64) -> (f64, f64) {
        if !self.enabled {
            return (x, y);
        }
        (
            Self::snap_value(x, self.size_x),
            Self::snap_value(y, self.size_y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_is_identity() {
        let grid = SnapGrid::default();
        assert_eq!(grid.snap(0.37, -1.21), (0.37, -1.21));
    }

    #[test]
    fn test_snap_to_unit_grid() {
        let grid = SnapGrid {
            enabled: true,
            ..Default::default()
        };
        assert_eq!(grid.snap(0.4, 1.6), (0.0, 2.0));
        assert_eq!(grid.snap(-2.4, -0.6), (-2.0, -1.0));
    }

    #[test]
    fn test_calculate_doubles_until_below_threshold() {
        let mut grid = SnapGrid::default();
        // 50px per unit: one cell is 50px, halved once to 25px.
        grid.calculate(50.0, 50.0);
        assert_eq!(grid.size_x, 2.0);
        // 200px per unit: 200 -> 100 -> 50 -> 25.
        grid.calculate(200.0, 20.0);
        assert_eq!(grid.size_x, 8.0);
        assert_eq!(grid.size_y, 1.0);
    }

    #[test]
    fn test_calculate_handles_degenerate_scale() {
        let mut grid = SnapGrid::default();
        grid.calculate(f64::INFINITY, f64::NAN);
        assert_eq!(grid.size_x, 1.0);
        assert_eq!(grid.size_y, 1.0);
    }

    #[test]
    fn test_snap_is_idempotent() {
        let grid = SnapGrid {
            enabled: true,
            size_x: 4.0,
            size_y: 8.0,
            ..Default::default()
        };
        let (x, y) = grid.snap(1.13, -7.77);
        assert_eq!(grid.snap(x, y), (x, y));
    }
}
