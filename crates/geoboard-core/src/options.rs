//! Board configuration.

use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::error::BoardResult;

/// Default pixels per user unit.
pub const DEFAULT_UNIT: f64 = 50.0;
/// Default multiplicative zoom step.
pub const DEFAULT_ZOOM_FACTOR: f64 = 1.25;
/// Screen-space cell size the snap grid must stay under.
pub const SNAP_THRESHOLD_PX: f64 = 25.0;

/// Zoom settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomOptions {
    pub factor_x: f64,
    pub factor_y: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for ZoomOptions {
    fn default() -> Self {
        Self {
            factor_x: DEFAULT_ZOOM_FACTOR,
            factor_y: DEFAULT_ZOOM_FACTOR,
            min: 0.0001,
            max: 10000.0,
        }
    }
}

/// Grid and snapping settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    pub has_grid: bool,
    /// Base divisor of the snap grid along x.
    pub grid_x: f64,
    /// Base divisor of the snap grid along y.
    pub grid_y: f64,
    pub snap_to_grid: bool,
    pub snap_threshold_px: f64,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            has_grid: false,
            grid_x: 1.0,
            grid_y: 1.0,
            snap_to_grid: false,
            snap_threshold_px: SNAP_THRESHOLD_PX,
        }
    }
}

/// Placement of the coordinate readout shown while dragging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfoboxOptions {
    pub distance_x: f64,
    pub distance_y: f64,
}

impl Default for InfoboxOptions {
    fn default() -> Self {
        Self {
            distance_x: 20.0,
            distance_y: 20.0,
        }
    }
}

/// Options a board is created with.
///
/// Every field has a default, so partial JSON documents are accepted:
///
/// ```
/// use geoboard_core::BoardOptions;
///
/// let options = BoardOptions::from_json(r#"{ "unit_x": 20.0 }"#).unwrap();
/// assert_eq!(options.unit_x, 20.0);
/// assert_eq!(options.unit_y, 50.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardOptions {
    pub unit_x: f64,
    pub unit_y: f64,
    /// Screen position of the user origin.
    pub origin: Point,
    /// `[x_left, y_top, x_right, y_bottom]` applied after construction.
    pub bounding_box: Option<[f64; 4]>,
    pub keep_aspect_ratio: bool,
    /// Hit-test tolerance in pixels.
    pub precision: f64,
    /// Use reduced updates while dragging.
    pub reduced_update: bool,
    /// Write drag positions directly instead of through element transforms.
    pub legacy_compatibility: bool,
    /// Let lines, circles and curves be drag targets when no point is hit.
    pub drag_non_points: bool,
    pub zoom: ZoomOptions,
    pub grid: GridOptions,
    pub infobox: InfoboxOptions,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self {
            unit_x: DEFAULT_UNIT,
            unit_y: DEFAULT_UNIT,
            origin: Point::new(150.0, 150.0),
            bounding_box: None,
            keep_aspect_ratio: false,
            precision: 4.0,
            reduced_update: false,
            legacy_compatibility: false,
            drag_non_points: false,
            zoom: ZoomOptions::default(),
            grid: GridOptions::default(),
            infobox: InfoboxOptions::default(),
        }
    }
}

impl BoardOptions {
    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> BoardResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize options to pretty JSON.
    pub fn to_json(&self) -> BoardResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = BoardOptions::default();
        assert_eq!(options.unit_x, 50.0);
        assert_eq!(options.zoom.factor_x, 1.25);
        assert_eq!(options.grid.grid_x, 1.0);
        assert_eq!(options.grid.snap_threshold_px, 25.0);
        assert!(!options.reduced_update);
    }

    #[test]
    fn test_partial_json() {
        let options =
            BoardOptions::from_json(r#"{ "grid": { "snap_to_grid": true }, "reduced_update": true }"#)
                .unwrap();
        assert!(options.grid.snap_to_grid);
        assert_eq!(options.grid.grid_y, 1.0);
        assert!(options.reduced_update);
        assert_eq!(options.origin, Point::new(150.0, 150.0));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut options = BoardOptions::default();
        options.bounding_box = Some([-5.0, 5.0, 5.0, -5.0]);
        options.keep_aspect_ratio = true;
        let json = options.to_json().unwrap();
        let restored = BoardOptions::from_json(&json).unwrap();
        assert_eq!(restored, options);
    }

    #[test]
    fn test_invalid_json() {
        let result = BoardOptions::from_json("{ not json");
        assert!(matches!(result, Err(crate::BoardError::Options(_))));
    }
}
