//! User/screen coordinate mapping.
//!
//! User coordinates are the construction's own frame with y pointing up.
//! Screen coordinates are pixels inside the drawing surface with y pointing
//! down. Both are homogeneous `[w, x, y]` vectors; `w == 0` denotes a
//! direction and is carried through the maps unchanged.

use kurbo::{Affine, Point, Size};
use serde::{Deserialize, Serialize};

use crate::options::BoardOptions;
use crate::snap::SnapGrid;

/// Maps between user and screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateSystem {
    /// Screen position of user (0, 0).
    pub origin: Point,
    /// Pixels per user unit along x, before zoom.
    pub unit_x: f64,
    /// Pixels per user unit along y, before zoom.
    pub unit_y: f64,
    pub zoom_x: f64,
    pub zoom_y: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Size of the drawing surface in pixels.
    pub canvas: Size,
    pub snap: SnapGrid,
}

impl Default for CoordinateSystem {
    fn default() -> Self {
        Self::new(&BoardOptions::default(), Size::new(500.0, 500.0))
    }
}

impl CoordinateSystem {
    /// Create a coordinate system from board options and a canvas size.
    pub fn new(options: &BoardOptions, canvas: Size) -> Self {
        let mut cs = Self {
            origin: options.origin,
            unit_x: options.unit_x,
            unit_y: options.unit_y,
            zoom_x: 1.0,
            zoom_y: 1.0,
            min_zoom: options.zoom.min,
            max_zoom: options.zoom.max,
            canvas,
            snap: SnapGrid::from_options(&options.grid),
        };
        cs.calculate_snap_sizes();
        cs
    }

    /// Effective pixels per user unit along x.
    pub fn scale_x(&self) -> f64 {
        self.unit_x * self.zoom_x
    }

    /// Effective pixels per user unit along y.
    pub fn scale_y(&self) -> f64 {
        self.unit_y * self.zoom_y
    }

    /// Map a homogeneous user vector to screen coordinates.
    pub fn to_screen(&self, usr: [f64; 3]) -> [f64; 3] {
        let [w, x, y] = usr;
        [
            w,
            w * self.origin.x + x * self.scale_x(),
            w * self.origin.y - y * self.scale_y(),
        ]
    }

    /// Map a homogeneous screen vector to user coordinates.
    pub fn to_user(&self, scr: [f64; 3]) -> [f64; 3] {
        let [w, sx, sy] = scr;
        [
            w,
            (sx - w * self.origin.x) / self.scale_x(),
            (w * self.origin.y - sy) / self.scale_y(),
        ]
    }

    /// Screen position of a user point.
    pub fn user_to_screen(&self, p: Point) -> Point {
        let [_, x, y] = self.to_screen([1.0, p.x, p.y]);
        Point::new(x, y)
    }

    /// User position of a screen point.
    pub fn screen_to_user(&self, p: Point) -> Point {
        let [_, x, y] = self.to_user([1.0, p.x, p.y]);
        Point::new(x, y)
    }

    /// The user to screen map as an affine transform, for renderers.
    pub fn transform(&self) -> Affine {
        Affine::new([
            self.scale_x(),
            0.0,
            0.0,
            -self.scale_y(),
            self.origin.x,
            self.origin.y,
        ])
    }

    /// Quantize a user vector to the snap grid when snapping is enabled.
    pub fn snap(&self, usr: [f64; 3]) -> [f64; 3] {
        let [w, x, y] = usr;
        if w == 0.0 {
            return usr;
        }
        let (sx, sy) = self.snap.snap(x / w, y / w);
        [1.0, sx, sy]
    }

    /// Recompute the effective snap divisors for the current zoom.
    pub fn calculate_snap_sizes(&mut self) {
        let (sx, sy) = (self.scale_x(), self.scale_y());
        self.snap.calculate(sx, sy);
    }

    /// Derive units and origin from a user viewport
    /// `[x_left, y_top, x_right, y_bottom]`.
    ///
    /// Zoom is reset to 1. Degenerate boxes are not checked.
    pub fn set_bounding_box(&mut self, bbox: [f64; 4], keep_aspect_ratio: bool) {
        let [x1, y1, x2, y2] = bbox;
        let mut unit_x = self.canvas.width / (x2 - x1);
        let mut unit_y = self.canvas.height / (y1 - y2);
        if keep_aspect_ratio {
            if unit_x.abs() < unit_y.abs() {
                unit_y = unit_x.abs() * unit_y.signum();
            } else {
                unit_x = unit_y.abs() * unit_x.signum();
            }
        }
        self.unit_x = unit_x;
        self.unit_y = unit_y;
        self.zoom_x = 1.0;
        self.zoom_y = 1.0;
        self.origin = Point::new(-unit_x * x1, unit_y * y1);
        self.calculate_snap_sizes();
    }

    /// The visible user viewport as `[x_left, y_top, x_right, y_bottom]`.
    pub fn bounding_box(&self) -> [f64; 4] {
        let ul = self.screen_to_user(Point::ZERO);
        let lr = self.screen_to_user(Point::new(self.canvas.width, self.canvas.height));
        [ul.x, ul.y, lr.x, lr.y]
    }

    /// Multiply the zoom by the given factors, keeping `anchor` fixed on
    /// screen. Returns `false` if clamping left the zoom unchanged.
    pub fn zoom_by(&mut self, factor_x: f64, factor_y: f64, anchor: Point) -> bool {
        let new_x = (self.zoom_x * factor_x).clamp(self.min_zoom, self.max_zoom);
        let new_y = (self.zoom_y * factor_y).clamp(self.min_zoom, self.max_zoom);
        if (new_x - self.zoom_x).abs() < f64::EPSILON && (new_y - self.zoom_y).abs() < f64::EPSILON
        {
            return false;
        }
        let user_anchor = self.screen_to_user(anchor);
        self.zoom_x = new_x;
        self.zoom_y = new_y;
        self.origin = Point::new(
            anchor.x - user_anchor.x * self.scale_x(),
            anchor.y + user_anchor.y * self.scale_y(),
        );
        self.calculate_snap_sizes();
        true
    }

    /// Reset zoom to 1, keeping `anchor` fixed on screen.
    pub fn reset_zoom(&mut self, anchor: Point) {
        let user_anchor = self.screen_to_user(anchor);
        self.zoom_x = 1.0;
        self.zoom_y = 1.0;
        self.origin = Point::new(
            anchor.x - user_anchor.x * self.scale_x(),
            anchor.y + user_anchor.y * self.scale_y(),
        );
        self.calculate_snap_sizes();
    }

    /// Center of the canvas in screen coordinates.
    pub fn canvas_center(&self) -> Point {
        Point::new(self.canvas.width / 2.0, self.canvas.height / 2.0)
    }
}

/// A position kept in both user and screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub usr: [f64; 3],
    pub scr: [f64; 3],
}

impl Coords {
    /// Coordinates of the user point `(x, y)`.
    pub fn from_user(cs: &CoordinateSystem, x: f64, y: f64) -> Self {
        Self::from_homogeneous(cs, [1.0, x, y])
    }

    /// A user position whose screen vector is filled in by the first
    /// [`Coords::refresh`].
    pub fn unprojected(x: f64, y: f64) -> Self {
        Self {
            usr: [1.0, x, y],
            scr: [1.0, 0.0, 0.0],
        }
    }

    /// Coordinates of a homogeneous user vector.
    pub fn from_homogeneous(cs: &CoordinateSystem, usr: [f64; 3]) -> Self {
        Self {
            usr,
            scr: cs.to_screen(usr),
        }
    }

    /// Coordinates of the screen point `(sx, sy)`.
    pub fn from_screen(cs: &CoordinateSystem, sx: f64, sy: f64) -> Self {
        let scr = [1.0, sx, sy];
        Self {
            usr: cs.to_user(scr),
            scr,
        }
    }

    /// Move to the user point `(x, y)`.
    pub fn set_user(&mut self, cs: &CoordinateSystem, x: f64, y: f64) {
        *self = Self::from_user(cs, x, y);
    }

    /// Move to the screen point `(sx, sy)`.
    pub fn set_screen(&mut self, cs: &CoordinateSystem, sx: f64, sy: f64) {
        *self = Self::from_screen(cs, sx, sy);
    }

    /// Recompute the screen vector after the coordinate system changed.
    pub fn refresh(&mut self, cs: &CoordinateSystem) {
        self.scr = cs.to_screen(self.usr);
    }

    /// Whether this is a finite position rather than a direction.
    pub fn is_finite(&self) -> bool {
        self.usr[0] != 0.0 && self.usr.iter().all(|v| v.is_finite())
    }

    /// User position, dehomogenized.
    pub fn user_point(&self) -> Point {
        let [w, x, y] = self.usr;
        if w == 0.0 || w == 1.0 {
            Point::new(x, y)
        } else {
            Point::new(x / w, y / w)
        }
    }

    /// Screen position, dehomogenized.
    pub fn screen_point(&self) -> Point {
        let [w, x, y] = self.scr;
        if w == 0.0 || w == 1.0 {
            Point::new(x, y)
        } else {
            Point::new(x / w, y / w)
        }
    }

    /// Euclidean distance in user coordinates.
    pub fn user_distance(&self, other: &Coords) -> f64 {
        self.user_point().distance(other.user_point())
    }

    /// Euclidean distance in screen coordinates.
    pub fn screen_distance(&self, other: &Coords) -> f64 {
        self.screen_point().distance(other.screen_point())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn system() -> CoordinateSystem {
        CoordinateSystem::new(&BoardOptions::default(), Size::new(500.0, 500.0))
    }

    #[test]
    fn test_origin_maps_to_offset() {
        let cs = system();
        let p = cs.user_to_screen(Point::ZERO);
        assert_eq!(p, Point::new(150.0, 150.0));
    }

    #[test]
    fn test_screen_y_is_inverted() {
        let cs = system();
        let p = cs.user_to_screen(Point::new(1.0, 1.0));
        assert!((p.x - 200.0).abs() < EPS);
        assert!((p.y - 100.0).abs() < EPS);
    }

    #[test]
    fn test_roundtrip_with_zoom() {
        let mut cs = system();
        cs.zoom_x = 1.7;
        cs.zoom_y = 0.3;
        cs.origin = Point::new(-12.5, 380.0);
        let usr = [1.0, 3.25, -8.5];
        let back = cs.to_user(cs.to_screen(usr));
        for (a, b) in usr.iter().zip(back.iter()) {
            assert!((a - b).abs() < EPS);
        }
    }

    #[test]
    fn test_direction_vectors_keep_zero_weight() {
        let cs = system();
        let scr = cs.to_screen([0.0, 1.0, 1.0]);
        assert_eq!(scr[0], 0.0);
        assert!((scr[1] - 50.0).abs() < EPS);
        assert!((scr[2] + 50.0).abs() < EPS);
    }

    #[test]
    fn test_transform_matches_to_screen() {
        let mut cs = system();
        cs.zoom_x = 2.0;
        let p = Point::new(-1.5, 4.0);
        let a = cs.transform() * p;
        let b = cs.user_to_screen(p);
        assert!((a.x - b.x).abs() < EPS);
        assert!((a.y - b.y).abs() < EPS);
    }

    #[test]
    fn test_bounding_box_keep_aspect() {
        let mut cs = CoordinateSystem::new(&BoardOptions::default(), Size::new(500.0, 250.0));
        cs.set_bounding_box([-5.0, 5.0, 5.0, -5.0], true);
        assert_eq!(cs.unit_x, 25.0);
        assert_eq!(cs.unit_y, 25.0);
        assert_eq!(cs.origin, Point::new(125.0, 125.0));
    }

    #[test]
    fn test_bounding_box_roundtrip() {
        let mut cs = CoordinateSystem::new(&BoardOptions::default(), Size::new(400.0, 300.0));
        cs.set_bounding_box([-2.0, 3.0, 6.0, -3.0], false);
        let bbox = cs.bounding_box();
        let expected = [-2.0, 3.0, 6.0, -3.0];
        for (a, b) in bbox.iter().zip(expected.iter()) {
            assert!((a - b).abs() < EPS);
        }
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut cs = system();
        let anchor = Point::new(300.0, 40.0);
        let before = cs.screen_to_user(anchor);
        assert!(cs.zoom_by(1.25, 1.25, anchor));
        let after = cs.screen_to_user(anchor);
        assert!((before.x - after.x).abs() < EPS);
        assert!((before.y - after.y).abs() < EPS);
        assert!((cs.zoom_x - 1.25).abs() < EPS);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut cs = system();
        cs.max_zoom = 1.0;
        assert!(!cs.zoom_by(2.0, 2.0, Point::ZERO));
        assert_eq!(cs.zoom_x, 1.0);
    }

    #[test]
    fn test_zoom_recomputes_snap_sizes() {
        let mut cs = system();
        assert_eq!(cs.snap.size_x, 2.0);
        cs.zoom_by(4.0, 4.0, Point::ZERO);
        // 200px per unit.
        assert_eq!(cs.snap.size_x, 8.0);
    }

    #[test]
    fn test_coords_refresh_follows_system() {
        let mut cs = system();
        let mut c = Coords::from_user(&cs, 1.0, 2.0);
        cs.origin = Point::new(0.0, 0.0);
        c.refresh(&cs);
        assert_eq!(c.screen_point(), Point::new(50.0, -100.0));
        assert_eq!(c.user_point(), Point::new(1.0, 2.0));
    }

    #[test]
    fn test_coords_from_screen() {
        let cs = system();
        let c = Coords::from_screen(&cs, 200.0, 100.0);
        assert!((c.user_point().x - 1.0).abs() < EPS);
        assert!((c.user_point().y - 1.0).abs() < EPS);
    }
}
