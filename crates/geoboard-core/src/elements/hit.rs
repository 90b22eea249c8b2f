//! Screen-space hit testing.

use kurbo::{Point, Vec2};

use super::{Element, Geometry};
use crate::algebra;
use crate::coords::{CoordinateSystem, Coords};

/// Approximate glyph advance used for text hit boxes.
const TEXT_CHAR_WIDTH: f64 = 8.0;
const TEXT_HEIGHT: f64 = 16.0;

impl Element {
    /// Whether the element occupies the screen position `p` within
    /// `tolerance` pixels.
    pub fn has_point(&self, cs: &CoordinateSystem, p: Point, tolerance: f64) -> bool {
        match &self.geometry {
            Geometry::Point(g) => g.coords.screen_point().distance(p) <= self.style.size + tolerance,
            Geometry::Glider(g) => g.coords.screen_point().distance(p) <= self.style.size + tolerance,
            Geometry::Line(g) => {
                let a = g.start.screen_point();
                let b = g.end.screen_point();
                let foot =
                    algebra::project_point_to_line_span(p, a, b, g.straight_first, g.straight_last);
                foot.distance(p) <= tolerance + self.style.stroke_width / 2.0
            }
            Geometry::Circle(g) => {
                let radii = Vec2::new(g.radius * cs.scale_x().abs(), g.radius * cs.scale_y().abs());
                rim_distance(g.center.screen_point(), radii, p)
                    <= tolerance + self.style.stroke_width / 2.0
            }
            Geometry::Curve(g) => {
                let points: Vec<Point> = g.points.iter().map(Coords::screen_point).collect();
                algebra::point_to_polyline_dist(p, &points) <= tolerance + self.style.stroke_width / 2.0
            }
            Geometry::Polygon(g) => {
                let points: Vec<Point> = g.vertices.iter().map(Coords::screen_point).collect();
                algebra::polygon_contains(p, &points)
            }
            Geometry::Text(g) => {
                let anchor = g.coords.screen_point();
                let width = g.content.chars().count() as f64 * TEXT_CHAR_WIDTH;
                p.x >= anchor.x - tolerance
                    && p.x <= anchor.x + width + tolerance
                    && p.y <= anchor.y + tolerance
                    && p.y >= anchor.y - TEXT_HEIGHT - tolerance
            }
        }
    }
}

/// Distance from `p` to the rim of the axis-aligned ellipse around
/// `center`, measured along the ray from the center.
fn rim_distance(center: Point, radii: Vec2, p: Point) -> f64 {
    let d = p - center;
    if radii.x <= 0.0 || radii.y <= 0.0 {
        return d.hypot();
    }
    let scaled = Vec2::new(d.x / radii.x, d.y / radii.y).hypot();
    if scaled == 0.0 {
        return radii.x.min(radii.y);
    }
    d.hypot() * (1.0 - 1.0 / scaled).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::RadiusSource;

    fn refreshed(mut element: Element, cs: &CoordinateSystem) -> Element {
        element.geometry.refresh(cs);
        element
    }

    #[test]
    fn test_point_hit() {
        let cs = CoordinateSystem::default();
        let p = refreshed(Element::point(1.0, 1.0), &cs);
        assert!(p.has_point(&cs, Point::new(202.0, 101.0), 4.0));
        assert!(!p.has_point(&cs, Point::new(220.0, 100.0), 4.0));
    }

    #[test]
    fn test_segment_vs_line_hit() {
        let cs = CoordinateSystem::default();
        let mut seg = Element::segment("a", "b");
        if let Geometry::Line(g) = &mut seg.geometry {
            g.start = Coords::from_user(&cs, 0.0, 0.0);
            g.end = Coords::from_user(&cs, 1.0, 0.0);
        }
        // (150,150) to (200,150) on screen.
        assert!(seg.has_point(&cs, Point::new(175.0, 152.0), 2.0));
        assert!(!seg.has_point(&cs, Point::new(260.0, 150.0), 2.0));
        if let Geometry::Line(g) = &mut seg.geometry {
            g.straight_last = true;
        }
        assert!(seg.has_point(&cs, Point::new(260.0, 150.0), 2.0));
    }

    #[test]
    fn test_circle_rim_hit() {
        let cs = CoordinateSystem::default();
        let mut circle = Element::circle("c", RadiusSource::Fixed(1.0));
        if let Geometry::Circle(g) = &mut circle.geometry {
            g.center = Coords::from_user(&cs, 0.0, 0.0);
        }
        assert!(circle.has_point(&cs, Point::new(200.0, 150.0), 2.0));
        assert!(!circle.has_point(&cs, Point::new(150.0, 150.0), 2.0));
    }

    #[test]
    fn test_circle_rim_hit_under_non_uniform_zoom() {
        let mut cs = CoordinateSystem::default();
        cs.zoom_y = 2.0;
        let mut circle = Element::circle("c", RadiusSource::Fixed(1.0));
        if let Geometry::Circle(g) = &mut circle.geometry {
            g.center = Coords::from_user(&cs, 0.0, 0.0);
        }
        let center = Coords::from_user(&cs, 0.0, 0.0).screen_point();
        // 50px wide, 100px tall on screen.
        assert!(circle.has_point(&cs, center + Vec2::new(50.0, 0.0), 2.0));
        assert!(circle.has_point(&cs, center + Vec2::new(0.0, -100.0), 2.0));
        assert!(!circle.has_point(&cs, center + Vec2::new(0.0, -50.0), 2.0));
        assert!(!circle.has_point(&cs, center, 2.0));
    }

    #[test]
    fn test_text_box_hit() {
        let cs = CoordinateSystem::default();
        let text = refreshed(Element::text(0.0, 0.0, "abcd"), &cs);
        assert!(text.has_point(&cs, Point::new(170.0, 145.0), 0.0));
        assert!(!text.has_point(&cs, Point::new(170.0, 160.0), 0.0));
    }
}
