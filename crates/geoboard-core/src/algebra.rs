//! Projection and distance helpers in the plane.

use kurbo::{Point, Vec2};

/// Orthogonal projection of `p` onto the infinite line through `a` and `b`.
///
/// Returns `a` when the line is degenerate.
pub fn project_point_to_line(p: Point, a: Point, b: Point) -> Point {
    let dir = b - a;
    let len_sq = dir.hypot2();
    if len_sq < f64::EPSILON {
        return a;
    }
    let t = (p - a).dot(dir) / len_sq;
    a + dir * t
}

/// Projection of `p` onto the segment or ray from `a` to `b`.
///
/// `straight_first` extends past `a`, `straight_last` extends past `b`.
pub fn project_point_to_line_span(
    p: Point,
    a: Point,
    b: Point,
    straight_first: bool,
    straight_last: bool,
) -> Point {
    let dir = b - a;
    let len_sq = dir.hypot2();
    if len_sq < f64::EPSILON {
        return a;
    }
    let mut t = (p - a).dot(dir) / len_sq;
    if !straight_first {
        t = t.max(0.0);
    }
    if !straight_last {
        t = t.min(1.0);
    }
    a + dir * t
}

/// Nearest point to `p` on the circle. The center maps to the rightmost
/// point of the rim.
pub fn project_point_to_circle(p: Point, center: Point, radius: f64) -> Point {
    let v = p - center;
    let len = v.hypot();
    if len < f64::EPSILON {
        return center + Vec2::new(radius, 0.0);
    }
    center + v * (radius / len)
}

/// Nearest point to `p` on a polyline, or `None` for an empty one.
pub fn project_point_to_polyline(p: Point, points: &[Point]) -> Option<Point> {
    match points {
        [] => None,
        [only] => Some(*only),
        _ => points
            .windows(2)
            .map(|w| project_point_to_line_span(p, w[0], w[1], false, false))
            .min_by(|a, b| a.distance(p).total_cmp(&b.distance(p))),
    }
}

/// Distance from `p` to the segment `ab`.
pub fn point_to_segment_dist(p: Point, a: Point, b: Point) -> f64 {
    project_point_to_line_span(p, a, b, false, false).distance(p)
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(p: Point, points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| point_to_segment_dist(p, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Reflection of `p` across the line through `a` and `b`.
pub fn reflect_point(p: Point, a: Point, b: Point) -> Point {
    let foot = project_point_to_line(p, a, b);
    foot + (foot - p)
}

/// Midpoint of two points.
pub fn midpoint(a: Point, b: Point) -> Point {
    a.midpoint(b)
}

/// Even-odd containment test for a closed polygon.
pub fn polygon_contains(p: Point, vertices: &[Point]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (vi, vj) = (vertices[i], vertices[j]);
        if (vi.y > p.y) != (vj.y > p.y) && p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: Point, b: Point) -> bool {
        a.distance(b) < EPS
    }

    #[test]
    fn test_project_to_line() {
        let p = project_point_to_line(Point::new(3.0, 4.0), Point::ZERO, Point::new(1.0, 0.0));
        assert!(close(p, Point::new(3.0, 0.0)));
    }

    #[test]
    fn test_project_to_segment_clamps() {
        let a = Point::ZERO;
        let b = Point::new(1.0, 0.0);
        let p = project_point_to_line_span(Point::new(3.0, 4.0), a, b, false, false);
        assert!(close(p, b));
        let p = project_point_to_line_span(Point::new(-3.0, 4.0), a, b, true, false);
        assert!(close(p, Point::new(-3.0, 0.0)));
    }

    #[test]
    fn test_project_to_circle() {
        let p = project_point_to_circle(Point::new(0.0, 10.0), Point::ZERO, 2.0);
        assert!(close(p, Point::new(0.0, 2.0)));
        let p = project_point_to_circle(Point::ZERO, Point::ZERO, 2.0);
        assert!(close(p, Point::new(2.0, 0.0)));
    }

    #[test]
    fn test_project_to_polyline() {
        let line = [Point::ZERO, Point::new(2.0, 0.0), Point::new(2.0, 2.0)];
        let p = project_point_to_polyline(Point::new(3.0, 1.0), &line).unwrap();
        assert!(close(p, Point::new(2.0, 1.0)));
        assert!(project_point_to_polyline(Point::ZERO, &[]).is_none());
    }

    #[test]
    fn test_reflection() {
        let r = reflect_point(Point::new(1.0, 1.0), Point::ZERO, Point::new(1.0, 0.0));
        assert!(close(r, Point::new(1.0, -1.0)));
    }

    #[test]
    fn test_segment_distance() {
        let d = point_to_segment_dist(Point::new(0.5, 2.0), Point::ZERO, Point::new(1.0, 0.0));
        assert!((d - 2.0).abs() < EPS);
        let d = point_to_polyline_dist(Point::new(5.0, 0.0), &[Point::ZERO, Point::new(1.0, 0.0)]);
        assert!((d - 4.0).abs() < EPS);
    }

    #[test]
    fn test_polygon_contains() {
        let square = [
            Point::ZERO,
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ];
        assert!(polygon_contains(Point::new(2.0, 2.0), &square));
        assert!(!polygon_contains(Point::new(5.0, 2.0), &square));
        assert!(!polygon_contains(Point::ZERO, &square[..2]));
    }
}
