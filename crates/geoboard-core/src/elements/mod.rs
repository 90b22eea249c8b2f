//! Geometric elements.

mod group;
mod hit;
mod recompute;
mod style;

pub use group::Group;
pub use recompute::{FnRecompute, Midpoint, Recompute, Reflection, UpdateContext, UpdateRoutine};
pub use style::{Attributes, ElementStyle, Rgba};

use std::collections::{HashSet, VecDeque};

use kurbo::{Affine, Point, Vec2};

use crate::algebra;
use crate::coords::{CoordinateSystem, Coords};

/// Unique identifier for elements.
pub type ElementId = String;

/// The kind of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Point,
    Glider,
    Line,
    Circle,
    Curve,
    Polygon,
    Text,
}

impl ElementKind {
    /// Prefix used in synthesized ids.
    pub fn id_prefix(self) -> &'static str {
        match self {
            ElementKind::Point | ElementKind::Glider => "P",
            ElementKind::Line => "L",
            ElementKind::Circle => "C",
            ElementKind::Curve => "G",
            ElementKind::Polygon => "Py",
            ElementKind::Text => "T",
        }
    }

    /// Plain points and gliders.
    pub fn is_point_like(self) -> bool {
        matches!(self, ElementKind::Point | ElementKind::Glider)
    }

    /// Lower-case kind name.
    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Point => "point",
            ElementKind::Glider => "glider",
            ElementKind::Line => "line",
            ElementKind::Circle => "circle",
            ElementKind::Curve => "curve",
            ElementKind::Polygon => "polygon",
            ElementKind::Text => "text",
        }
    }

    /// Decoration wrapped around generated display names.
    pub(crate) fn name_decoration(self) -> (&'static str, &'static str) {
        match self {
            ElementKind::Point | ElementKind::Glider | ElementKind::Line => ("", ""),
            ElementKind::Polygon => ("P_{", "}"),
            ElementKind::Circle => ("k_{", "}"),
            ElementKind::Curve | ElementKind::Text => ("s_{", "}"),
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A free point: an initial position moved by its own transform.
#[derive(Debug, Clone, PartialEq)]
pub struct PointGeometry {
    pub coords: Coords,
    pub initial: Point,
    pub transform: Affine,
}

impl PointGeometry {
    /// A free point at the user position `(x, y)`.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            coords: Coords::unprojected(x, y),
            initial: Point::new(x, y),
            transform: Affine::IDENTITY,
        }
    }

    /// Current user position.
    pub fn position(&self) -> Point {
        self.transform * self.initial
    }
}

/// A point constrained to a host element.
#[derive(Debug, Clone, PartialEq)]
pub struct GliderGeometry {
    pub coords: Coords,
    pub host: ElementId,
    /// Set when the last update could not reach the host.
    pub host_lost: bool,
}

/// A line through two points, optionally clipped to a segment or ray.
#[derive(Debug, Clone, PartialEq)]
pub struct LineGeometry {
    pub point1: ElementId,
    pub point2: ElementId,
    pub start: Coords,
    pub end: Coords,
    pub straight_first: bool,
    pub straight_last: bool,
}

/// Where a circle takes its radius from.
#[derive(Debug, Clone, PartialEq)]
pub enum RadiusSource {
    /// Distance from the center to another point.
    Point(ElementId),
    Fixed(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircleGeometry {
    pub center_id: ElementId,
    pub radius_source: RadiusSource,
    pub center: Coords,
    /// Radius in user units.
    pub radius: f64,
    /// Radii in pixels along x and y.
    pub screen_radius: Vec2,
}

impl CircleGeometry {
    /// Recompute the screen center and pixel radii.
    pub fn refresh(&mut self, cs: &CoordinateSystem) {
        self.center.refresh(cs);
        self.sync_screen_radius(cs);
    }

    pub(crate) fn sync_screen_radius(&mut self, cs: &CoordinateSystem) {
        self.screen_radius = Vec2::new(
            self.radius * cs.scale_x().abs(),
            self.radius * cs.scale_y().abs(),
        );
    }
}

/// A curve sampled from data arrays and moved by its own transform.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveGeometry {
    pub data_x: Vec<f64>,
    pub data_y: Vec<f64>,
    pub transform: Affine,
    pub points: Vec<Coords>,
}

impl CurveGeometry {
    /// Resample the data arrays through the transform.
    pub fn refresh(&mut self, cs: &CoordinateSystem) {
        let transform = self.transform;
        self.points = self
            .data_x
            .iter()
            .zip(self.data_y.iter())
            .map(|(&x, &y)| {
                let p = transform * Point::new(x, y);
                Coords::from_user(cs, p.x, p.y)
            })
            .collect();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolygonGeometry {
    pub vertex_ids: Vec<ElementId>,
    pub vertices: Vec<Coords>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextGeometry {
    pub coords: Coords,
    pub content: String,
}

/// Kind-specific state of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(PointGeometry),
    Glider(GliderGeometry),
    Line(LineGeometry),
    Circle(CircleGeometry),
    Curve(CurveGeometry),
    Polygon(PolygonGeometry),
    Text(TextGeometry),
}

impl Geometry {
    /// Element kind this geometry belongs to.
    pub fn kind(&self) -> ElementKind {
        match self {
            Geometry::Point(_) => ElementKind::Point,
            Geometry::Glider(_) => ElementKind::Glider,
            Geometry::Line(_) => ElementKind::Line,
            Geometry::Circle(_) => ElementKind::Circle,
            Geometry::Curve(_) => ElementKind::Curve,
            Geometry::Polygon(_) => ElementKind::Polygon,
            Geometry::Text(_) => ElementKind::Text,
        }
    }

    /// Recompute every screen vector from its user vector.
    pub fn refresh(&mut self, cs: &CoordinateSystem) {
        match self {
            Geometry::Point(g) => {
                let p = g.position();
                g.coords = Coords::from_user(cs, p.x, p.y);
            }
            Geometry::Glider(g) => g.coords.refresh(cs),
            Geometry::Line(g) => {
                g.start.refresh(cs);
                g.end.refresh(cs);
            }
            Geometry::Circle(g) => g.refresh(cs),
            Geometry::Curve(g) => g.refresh(cs),
            Geometry::Polygon(g) => g.vertices.iter_mut().for_each(|v| v.refresh(cs)),
            Geometry::Text(g) => g.coords.refresh(cs),
        }
    }

    /// Position coordinates of point-like and text geometries.
    pub fn coords(&self) -> Option<&Coords> {
        match self {
            Geometry::Point(g) => Some(&g.coords),
            Geometry::Glider(g) => Some(&g.coords),
            Geometry::Text(g) => Some(&g.coords),
            _ => None,
        }
    }

    /// Ids this geometry reads from when updated by its default routine.
    pub fn default_inputs(&self) -> Vec<ElementId> {
        match self {
            Geometry::Glider(g) => vec![g.host.clone()],
            Geometry::Line(g) => vec![g.point1.clone(), g.point2.clone()],
            Geometry::Circle(g) => match &g.radius_source {
                RadiusSource::Point(id) => vec![g.center_id.clone(), id.clone()],
                RadiusSource::Fixed(_) => vec![g.center_id.clone()],
            },
            Geometry::Polygon(g) => g.vertex_ids.clone(),
            Geometry::Point(_) | Geometry::Curve(_) | Geometry::Text(_) => Vec::new(),
        }
    }
}

/// A geometric object on a board.
#[derive(Debug)]
pub struct Element {
    /// Assigned at registration.
    pub id: ElementId,
    pub name: String,
    pub geometry: Geometry,
    pub style: ElementStyle,
    /// Excluded from dragging.
    pub fixed: bool,
    pub needs_update: bool,
    /// When false the element is skipped by regular passes once rendered.
    pub needs_regular_update: bool,
    /// Set by the first renderer pass.
    pub rendered_once: bool,
    pub highlighted: bool,
    pub show_infobox: bool,
    pub(crate) routine: UpdateRoutine,
    pub(crate) children: HashSet<ElementId>,
    pub(crate) groups: Vec<String>,
    pub(crate) animation: VecDeque<Point>,
}

impl Element {
    /// An element with the default style for its kind and no name.
    pub fn new(geometry: Geometry) -> Self {
        let style = if geometry.kind().is_point_like() {
            ElementStyle::point()
        } else {
            ElementStyle::default()
        };
        Self {
            id: ElementId::new(),
            name: String::new(),
            geometry,
            style,
            fixed: false,
            needs_update: true,
            needs_regular_update: true,
            rendered_once: false,
            highlighted: false,
            show_infobox: true,
            routine: UpdateRoutine::Default,
            children: HashSet::new(),
            groups: Vec::new(),
            animation: VecDeque::new(),
        }
    }

    /// A free point.
    pub fn point(x: f64, y: f64) -> Self {
        Self::new(Geometry::Point(PointGeometry::new(x, y)))
    }

    /// A point that stays on `host`, starting near `(x, y)`.
    pub fn glider(host: impl Into<ElementId>, x: f64, y: f64) -> Self {
        Self::new(Geometry::Glider(GliderGeometry {
            coords: Coords::unprojected(x, y),
            host: host.into(),
            host_lost: false,
        }))
    }

    /// An infinite line through two points.
    pub fn line(point1: impl Into<ElementId>, point2: impl Into<ElementId>) -> Self {
        Self::new(Geometry::Line(LineGeometry {
            point1: point1.into(),
            point2: point2.into(),
            start: Coords::unprojected(0.0, 0.0),
            end: Coords::unprojected(0.0, 0.0),
            straight_first: true,
            straight_last: true,
        }))
    }

    /// A line clipped to its two defining points.
    pub fn segment(point1: impl Into<ElementId>, point2: impl Into<ElementId>) -> Self {
        let mut element = Self::line(point1, point2);
        if let Geometry::Line(g) = &mut element.geometry {
            g.straight_first = false;
            g.straight_last = false;
        }
        element
    }

    /// A circle around `center` with a fixed radius or one through a point.
    pub fn circle(center: impl Into<ElementId>, radius: RadiusSource) -> Self {
        let radius_value = match radius {
            RadiusSource::Fixed(r) => r,
            RadiusSource::Point(_) => 0.0,
        };
        Self::new(Geometry::Circle(CircleGeometry {
            center_id: center.into(),
            radius_source: radius,
            center: Coords::unprojected(0.0, 0.0),
            radius: radius_value,
            screen_radius: Vec2::ZERO,
        }))
    }

    /// A curve through the data points `(data_x[i], data_y[i])`.
    pub fn curve(data_x: Vec<f64>, data_y: Vec<f64>) -> Self {
        Self::new(Geometry::Curve(CurveGeometry {
            data_x,
            data_y,
            transform: Affine::IDENTITY,
            points: Vec::new(),
        }))
    }

    /// A closed polygon over point ids.
    pub fn polygon(vertex_ids: Vec<ElementId>) -> Self {
        Self::new(Geometry::Polygon(PolygonGeometry {
            vertex_ids,
            vertices: Vec::new(),
        }))
    }

    /// A text label anchored at the user position `(x, y)`.
    pub fn text(x: f64, y: f64, content: impl Into<String>) -> Self {
        Self::new(Geometry::Text(TextGeometry {
            coords: Coords::unprojected(x, y),
            content: content.into(),
        }))
    }

    /// Replace the default update routine with a custom strategy.
    pub fn with_routine(mut self, routine: impl Recompute + 'static) -> Self {
        self.routine = UpdateRoutine::Custom(Box::new(routine));
        self
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Kind of the element.
    pub fn kind(&self) -> ElementKind {
        self.geometry.kind()
    }

    /// Whether the element is shown.
    pub fn visible(&self) -> bool {
        self.style.visible
    }

    /// Whether a custom recompute strategy replaces the default update.
    pub fn has_custom_routine(&self) -> bool {
        matches!(self.routine, UpdateRoutine::Custom(_))
    }

    /// Elements recomputed after this one.
    pub fn children(&self) -> impl Iterator<Item = &ElementId> {
        self.children.iter()
    }

    /// Whether `id` is recorded as a dependent of this element.
    pub fn has_child(&self, id: &str) -> bool {
        self.children.contains(id)
    }

    /// Groups this element belongs to.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Ids this element reads when it is updated.
    pub fn inputs(&self) -> Vec<ElementId> {
        match &self.routine {
            UpdateRoutine::Default => self.geometry.default_inputs(),
            UpdateRoutine::Custom(r) => r.inputs(),
        }
    }

    /// User position of point-like and text elements.
    pub fn position(&self) -> Option<Point> {
        self.geometry.coords().map(Coords::user_point)
    }

    /// Screen position of point-like and text elements.
    pub fn screen_position(&self) -> Option<Point> {
        self.geometry.coords().map(Coords::screen_point)
    }

    /// Whether an animation path is queued.
    pub fn is_animated(&self) -> bool {
        !self.animation.is_empty()
    }

    /// Move to a user position, discarding the element's transform.
    ///
    /// Only point-like and text elements have a single position; other
    /// kinds are left unchanged and `false` is returned.
    pub fn set_position(&mut self, cs: &CoordinateSystem, p: Point) -> bool {
        match &mut self.geometry {
            Geometry::Point(g) => {
                g.initial = p;
                g.transform = Affine::IDENTITY;
                g.coords = Coords::from_user(cs, p.x, p.y);
            }
            Geometry::Glider(g) => g.coords = Coords::from_user(cs, p.x, p.y),
            Geometry::Text(g) => g.coords = Coords::from_user(cs, p.x, p.y),
            _ => return false,
        }
        true
    }

    /// Translate by `delta` through the element's own transform.
    ///
    /// Lines, circles and polygons have no transform of their own; callers
    /// move their defining points instead.
    pub fn translate(&mut self, cs: &CoordinateSystem, delta: Vec2) -> bool {
        match &mut self.geometry {
            Geometry::Point(g) => {
                g.transform = Affine::translate(delta) * g.transform;
                let p = g.position();
                g.coords = Coords::from_user(cs, p.x, p.y);
            }
            Geometry::Curve(g) => {
                g.transform = Affine::translate(delta) * g.transform;
                g.refresh(cs);
            }
            Geometry::Glider(g) => {
                let p = g.coords.user_point() + delta;
                g.coords = Coords::from_user(cs, p.x, p.y);
            }
            Geometry::Text(g) => {
                let p = g.coords.user_point() + delta;
                g.coords = Coords::from_user(cs, p.x, p.y);
            }
            _ => return false,
        }
        true
    }

    /// Nearest user position on this element, used to place gliders.
    pub fn project(&self, p: Point) -> Option<Point> {
        match &self.geometry {
            Geometry::Point(_) | Geometry::Glider(_) => self.position(),
            Geometry::Line(g) => Some(algebra::project_point_to_line_span(
                p,
                g.start.user_point(),
                g.end.user_point(),
                g.straight_first,
                g.straight_last,
            )),
            Geometry::Circle(g) => Some(algebra::project_point_to_circle(
                p,
                g.center.user_point(),
                g.radius,
            )),
            Geometry::Curve(g) => {
                let points: Vec<Point> = g.points.iter().map(Coords::user_point).collect();
                algebra::project_point_to_polyline(p, &points)
            }
            Geometry::Polygon(g) => {
                let mut points: Vec<Point> = g.vertices.iter().map(Coords::user_point).collect();
                if let Some(first) = points.first().copied() {
                    points.push(first);
                }
                algebra::project_point_to_polyline(p, &points)
            }
            Geometry::Text(_) => None,
        }
    }

    /// Apply attributes that map onto element state. `id` is ignored here.
    pub fn apply_attributes(&mut self, attrs: &Attributes) {
        attrs.apply_style(&mut self.style);
        if let Some(name) = &attrs.name {
            self.name = name.clone();
        }
        if let Some(fixed) = attrs.fixed {
            self.fixed = fixed;
        }
        if let Some(v) = attrs.needs_regular_update {
            self.needs_regular_update = v;
        }
        if let Some(v) = attrs.show_infobox {
            self.show_infobox = v;
        }
        if let Geometry::Line(g) = &mut self.geometry {
            if let Some(v) = attrs.straight_first {
                g.straight_first = v;
            }
            if let Some(v) = attrs.straight_last {
                g.straight_last = v;
            }
        }
    }
}
