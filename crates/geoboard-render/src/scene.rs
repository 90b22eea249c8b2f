//! In-memory scene kept by the SVG renderer.

use std::collections::HashMap;

use geoboard_core::{
    Coords, CoordinateSystem, Element, ElementId, ElementKind, ElementStyle, Geometry, InfoBox,
    Rgba,
};
use kurbo::{BezPath, Point, Rect, Size, Vec2};

use crate::error::{RenderError, RenderResult};

/// Grid lines are skipped past this many per axis.
const MAX_GRID_LINES: usize = 400;
const GRID_COLOR: Rgba = Rgba::new(0xc0, 0xc0, 0xc0, 255);

/// Drawable shape of one node, in screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeShape {
    Dot { center: Point, radius: f64 },
    Ellipse { center: Point, radii: Vec2 },
    /// Open or closed path; `closed` paths are filled.
    Path { path: BezPath, closed: bool },
    Label { anchor: Point, content: String },
}

impl NodeShape {
    /// Shape of an element clipped to `viewport`.
    pub fn from_element(element: &Element, viewport: Rect) -> Self {
        match &element.geometry {
            Geometry::Point(_) | Geometry::Glider(_) => NodeShape::Dot {
                center: element.screen_position().unwrap_or_default(),
                radius: element.style.size,
            },
            Geometry::Line(g) => {
                let mut path = BezPath::new();
                if let Some((a, b)) = clip_line(
                    g.start.screen_point(),
                    g.end.screen_point(),
                    g.straight_first,
                    g.straight_last,
                    viewport,
                ) {
                    path.move_to(a);
                    path.line_to(b);
                }
                NodeShape::Path {
                    path,
                    closed: false,
                }
            }
            Geometry::Circle(g) => NodeShape::Ellipse {
                center: g.center.screen_point(),
                radii: g.screen_radius,
            },
            Geometry::Curve(g) => NodeShape::Path {
                path: polyline(&g.points, false),
                closed: false,
            },
            Geometry::Polygon(g) => NodeShape::Path {
                path: polyline(&g.vertices, true),
                closed: true,
            },
            Geometry::Text(g) => NodeShape::Label {
                anchor: g.coords.screen_point(),
                content: g.content.clone(),
            },
        }
    }
}

/// Path through finite points. Non-finite points break the path.
fn polyline(points: &[Coords], close: bool) -> BezPath {
    let mut path = BezPath::new();
    let mut pen_down = false;
    for coords in points {
        if !coords.is_finite() {
            pen_down = false;
            continue;
        }
        let p = coords.screen_point();
        if pen_down {
            path.line_to(p);
        } else {
            path.move_to(p);
            pen_down = true;
        }
    }
    if close && !path.elements().is_empty() {
        path.close_path();
    }
    path
}

/// Clip the line through `a` and `b` to `rect`.
///
/// The segment is extended past `a` when `straight_first` is set and past
/// `b` when `straight_last` is set. Returns `None` when nothing is visible.
pub fn clip_line(
    a: Point,
    b: Point,
    straight_first: bool,
    straight_last: bool,
    rect: Rect,
) -> Option<(Point, Point)> {
    let d = b - a;
    let mut t0 = if straight_first { f64::NEG_INFINITY } else { 0.0 };
    let mut t1 = if straight_last { f64::INFINITY } else { 1.0 };
    let bounds = [
        (-d.x, a.x - rect.x0),
        (d.x, rect.x1 - a.x),
        (-d.y, a.y - rect.y0),
        (d.y, rect.y1 - a.y),
    ];
    for (p, q) in bounds {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    if !t0.is_finite() || !t1.is_finite() {
        return None;
    }
    Some((a + d * t0, a + d * t1))
}

/// One drawn element.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: ElementId,
    pub kind: ElementKind,
    pub shape: NodeShape,
    pub style: ElementStyle,
    pub visible: bool,
    pub highlighted: bool,
}

impl SceneNode {
    /// Stroke color, with the highlight color while highlighted.
    pub fn stroke(&self) -> Rgba {
        if self.highlighted {
            self.style.highlight_stroke_color
        } else {
            self.style.stroke_color
        }
    }

    /// Fill color, with the highlight fill while highlighted.
    pub fn fill(&self) -> Rgba {
        if self.highlighted {
            self.style.highlight_fill_color
        } else {
            self.style.fill_color
        }
    }
}

/// Nodes in draw order plus grid and infobox overlays.
#[derive(Debug, Clone)]
pub struct Scene {
    size: Size,
    order: Vec<ElementId>,
    nodes: HashMap<ElementId, SceneNode>,
    grid: Option<BezPath>,
    infobox: InfoBox,
    batch_depth: u32,
    redraws: u64,
}

impl Scene {
    /// An empty scene for a canvas of `size`.
    pub fn new(size: Size) -> Self {
        Self {
            size,
            order: Vec::new(),
            nodes: HashMap::new(),
            grid: None,
            infobox: InfoBox::default(),
            batch_depth: 0,
            redraws: 0,
        }
    }

    /// Canvas size in pixels.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Resize the canvas. Nodes are clipped to the new viewport from the
    /// next draw on.
    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    /// Canvas rectangle used for clipping.
    pub fn viewport(&self) -> Rect {
        self.size.to_rect()
    }

    /// Node drawn for element `id`.
    pub fn node(&self, id: &str) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Mutable access to the node drawn for element `id`.
    pub fn node_mut(&mut self, id: &str) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    /// Nodes in the order they were first drawn.
    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the scene has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert a node or replace the shape and style of an existing one.
    pub fn upsert(&mut self, node: SceneNode) {
        match self.nodes.get_mut(&node.id) {
            Some(existing) => {
                existing.shape = node.shape;
                existing.style = node.style;
                existing.visible = node.visible;
            }
            None => {
                self.order.push(node.id.clone());
                self.nodes.insert(node.id.clone(), node);
            }
        }
    }

    /// Remove the node of element `id`. Returns `false` if there was none.
    pub fn remove(&mut self, id: &str) -> bool {
        if self.nodes.remove(id).is_none() {
            return false;
        }
        self.order.retain(|n| n != id);
        true
    }

    /// Grid path, if the grid is shown.
    pub fn grid(&self) -> Option<&BezPath> {
        self.grid.as_ref()
    }

    /// Rebuild the grid from the visible user viewport.
    pub fn set_grid(&mut self, cs: &CoordinateSystem) {
        let [x_left, y_top, x_right, y_bottom] = cs.bounding_box();
        let step_x = 1.0 / cs.snap.grid_x;
        let step_y = 1.0 / cs.snap.grid_y;
        let mut path = BezPath::new();
        if step_x.is_finite() && step_x > 0.0 {
            let first = (x_left.min(x_right) / step_x).ceil() as i64;
            let last = (x_left.max(x_right) / step_x).floor() as i64;
            if ((last - first).max(0) as usize) < MAX_GRID_LINES {
                for i in first..=last {
                    let x = cs.user_to_screen(Point::new(i as f64 * step_x, 0.0)).x;
                    path.move_to((x, 0.0));
                    path.line_to((x, self.size.height));
                }
            }
        }
        if step_y.is_finite() && step_y > 0.0 {
            let first = (y_bottom.min(y_top) / step_y).ceil() as i64;
            let last = (y_bottom.max(y_top) / step_y).floor() as i64;
            if ((last - first).max(0) as usize) < MAX_GRID_LINES {
                for i in first..=last {
                    let y = cs.user_to_screen(Point::new(0.0, i as f64 * step_y)).y;
                    path.move_to((0.0, y));
                    path.line_to((self.size.width, y));
                }
            }
        }
        self.grid = Some(path);
    }

    /// Remove the grid.
    pub fn clear_grid(&mut self) {
        self.grid = None;
    }

    /// The coordinate box.
    pub fn infobox(&self) -> &InfoBox {
        &self.infobox
    }

    pub(crate) fn infobox_mut(&mut self) -> &mut InfoBox {
        &mut self.infobox
    }

    pub(crate) fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    pub(crate) fn end_batch(&mut self) {
        self.batch_depth = self.batch_depth.saturating_sub(1);
        if self.batch_depth == 0 {
            self.redraws += 1;
        }
    }

    /// Completed update batches.
    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    /// Export the scene as an SVG document.
    pub fn to_svg(&self) -> RenderResult<String> {
        let mut out = String::new();
        self.write_svg(&mut out)?;
        Ok(out)
    }

    /// SVG markup of a single node, hidden or not.
    pub fn node_svg(&self, id: &str) -> RenderResult<String> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| RenderError::MissingNode(id.to_string()))?;
        let mut out = String::new();
        write_node(&mut out, node)?;
        Ok(out.trim().to_string())
    }

    /// Write the visible scene as an SVG document.
    pub fn write_svg<W: std::fmt::Write>(&self, out: &mut W) -> RenderResult<()> {
        let (w, h) = (self.size.width, self.size.height);
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        )?;
        if let Some(grid) = &self.grid {
            writeln!(
                out,
                r#"  <path class="grid" d="{}" fill="none" stroke="{}" stroke-width="1"/>"#,
                grid.to_svg(),
                paint(GRID_COLOR)
            )?;
        }
        for node in self.nodes().filter(|n| n.visible) {
            write_node(out, node)?;
        }
        if self.infobox.visible {
            writeln!(
                out,
                r#"  <text class="infobox" x="{}" y="{}">{}</text>"#,
                self.infobox.position.x,
                self.infobox.position.y,
                escape(&self.infobox.text)
            )?;
        }
        writeln!(out, "</svg>")?;
        Ok(())
    }
}

fn write_node<W: std::fmt::Write>(out: &mut W, node: &SceneNode) -> std::fmt::Result {
    let stroke = paint(node.stroke());
    let fill = paint(node.fill());
    let width = node.style.stroke_width;
    match &node.shape {
        NodeShape::Dot { center, radius } => writeln!(
            out,
            r#"  <circle id="{}" cx="{}" cy="{}" r="{}" fill="{}" stroke="{}" stroke-width="{}"/>"#,
            node.id, center.x, center.y, radius, fill, stroke, width
        ),
        NodeShape::Ellipse { center, radii } => writeln!(
            out,
            r#"  <ellipse id="{}" cx="{}" cy="{}" rx="{}" ry="{}" fill="{}" stroke="{}" stroke-width="{}"/>"#,
            node.id, center.x, center.y, radii.x, radii.y, fill, stroke, width
        ),
        NodeShape::Path { path, closed } => {
            let fill = if *closed { fill } else { "none".to_string() };
            writeln!(
                out,
                r#"  <path id="{}" d="{}" fill="{}" stroke="{}" stroke-width="{}"/>"#,
                node.id,
                path.to_svg(),
                fill,
                stroke,
                width
            )
        }
        NodeShape::Label { anchor, content } => writeln!(
            out,
            r#"  <text id="{}" x="{}" y="{}" fill="{}">{}</text>"#,
            node.id,
            anchor.x,
            anchor.y,
            stroke,
            escape(content)
        ),
    }
}

fn paint(color: Rgba) -> String {
    if color.is_transparent() {
        "none".to_string()
    } else {
        color.to_string()
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: Rect = Rect::new(0.0, 0.0, 100.0, 100.0);

    #[test]
    fn test_clip_segment_inside() {
        let a = Point::new(10.0, 10.0);
        let b = Point::new(20.0, 30.0);
        assert_eq!(clip_line(a, b, false, false, VIEW), Some((a, b)));
    }

    #[test]
    fn test_clip_straight_line_spans_viewport() {
        let (a, b) = clip_line(
            Point::new(40.0, 50.0),
            Point::new(60.0, 50.0),
            true,
            true,
            VIEW,
        )
        .unwrap();
        assert_eq!(a, Point::new(0.0, 50.0));
        assert_eq!(b, Point::new(100.0, 50.0));
    }

    #[test]
    fn test_clip_ray() {
        let (a, b) = clip_line(
            Point::new(50.0, 50.0),
            Point::new(60.0, 60.0),
            false,
            true,
            VIEW,
        )
        .unwrap();
        assert_eq!(a, Point::new(50.0, 50.0));
        assert_eq!(b, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_clip_outside() {
        let a = Point::new(150.0, 10.0);
        let b = Point::new(160.0, 30.0);
        assert_eq!(clip_line(a, b, false, false, VIEW), None);
        let p = Point::new(50.0, 50.0);
        assert_eq!(clip_line(p, p, true, true, VIEW), None);
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_polyline_breaks_on_non_finite() {
        let points = [
            Coords::unprojected(0.0, 0.0),
            Coords {
                usr: [1.0, f64::NAN, 0.0],
                scr: [1.0, f64::NAN, 0.0],
            },
            Coords::unprojected(1.0, 1.0),
        ];
        let path = polyline(&points, false);
        let moves = path
            .elements()
            .iter()
            .filter(|e| matches!(e, kurbo::PathEl::MoveTo(_)))
            .count();
        assert_eq!(moves, 2);
    }
}
