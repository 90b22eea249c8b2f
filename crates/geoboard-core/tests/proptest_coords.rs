//! Property-based tests for the user/screen mapping and snap-to-grid.
//!
//! 1. User -> screen -> user is the identity within float tolerance.
//! 2. Directions (w == 0) ignore the origin.
//! 3. Snapping is idempotent.
//! 4. Snapping moves a value by at most half a cell.
//! 5. Zooming about an anchor keeps the anchor fixed.

use geoboard_core::{BoardOptions, CoordinateSystem, SnapGrid};
use kurbo::{Point, Size};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn cs_strategy() -> impl Strategy<Value = CoordinateSystem> {
    (
        -1000.0f64..1000.0,
        -1000.0f64..1000.0,
        1.0f64..200.0,
        1.0f64..200.0,
        0.01f64..100.0,
        0.01f64..100.0,
    )
        .prop_map(|(ox, oy, ux, uy, zx, zy)| {
            let options = BoardOptions {
                origin: Point::new(ox, oy),
                unit_x: ux,
                unit_y: uy,
                ..Default::default()
            };
            let mut cs = CoordinateSystem::new(&options, Size::new(800.0, 600.0));
            cs.zoom_x = zx;
            cs.zoom_y = zy;
            cs
        })
}

fn coord_strategy() -> impl Strategy<Value = f64> {
    -1.0e4f64..1.0e4
}

/// Powers of two keep the snap arithmetic exact.
fn snap_size_strategy() -> impl Strategy<Value = f64> {
    (0i32..8).prop_map(|e| 2f64.powi(e))
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * (1.0 + a.abs().max(b.abs()))
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Round trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn user_screen_round_trip(cs in cs_strategy(), x in coord_strategy(), y in coord_strategy()) {
        let back = cs.to_user(cs.to_screen([1.0, x, y]));
        prop_assert_eq!(back[0], 1.0);
        prop_assert!(close(back[1], x), "x: {} became {}", x, back[1]);
        prop_assert!(close(back[2], y), "y: {} became {}", y, back[2]);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Directions
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn directions_ignore_origin(cs in cs_strategy(), x in coord_strategy(), y in coord_strategy()) {
        let scr = cs.to_screen([0.0, x, y]);
        prop_assert_eq!(scr[0], 0.0);
        prop_assert!(close(scr[1], x * cs.scale_x()));
        prop_assert!(close(scr[2], -y * cs.scale_y()));
        let back = cs.to_user(scr);
        prop_assert!(close(back[1], x) && close(back[2], y));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Snap idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn snap_idempotent(v in coord_strategy(), size in snap_size_strategy()) {
        let once = SnapGrid::snap_value(v, size);
        prop_assert_eq!(SnapGrid::snap_value(once, size), once);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Snap distance
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn snap_moves_at_most_half_a_cell(v in coord_strategy(), size in snap_size_strategy()) {
        let snapped = SnapGrid::snap_value(v, size);
        prop_assert!((snapped - v).abs() <= 0.5 / size + 1e-9);
    }

    #[test]
    fn disabled_grid_is_identity(x in coord_strategy(), y in coord_strategy()) {
        let grid = SnapGrid::default();
        prop_assert_eq!(grid.snap(x, y), (x, y));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Zoom anchor
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn zoom_keeps_anchor(
        mut cs in cs_strategy(),
        ax in 0.0f64..800.0,
        ay in 0.0f64..600.0,
        factor in 0.5f64..2.0,
    ) {
        cs.min_zoom = 1e-6;
        cs.max_zoom = 1e6;
        let anchor = Point::new(ax, ay);
        let before = cs.screen_to_user(anchor);
        cs.zoom_by(factor, factor, anchor);
        let after = cs.user_to_screen(before);
        prop_assert!(close(after.x, ax) && close(after.y, ay), "{:?} moved to {:?}", anchor, after);
    }
}
