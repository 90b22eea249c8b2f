//! Update routines: the per-kind default and custom recompute strategies.

use std::fmt;

use kurbo::{Affine, Point};

use super::{Element, ElementId, Geometry, PointGeometry, RadiusSource};
use crate::algebra;
use crate::coords::{CoordinateSystem, Coords};
use crate::registry::ElementRegistry;

/// What an update routine may read while recomputing one element.
pub struct UpdateContext<'a> {
    pub(crate) registry: &'a ElementRegistry,
    pub cs: &'a CoordinateSystem,
    /// Id of the element being recomputed.
    pub target: &'a str,
}

impl<'a> UpdateContext<'a> {
    pub(crate) fn new(registry: &'a ElementRegistry, cs: &'a CoordinateSystem, target: &'a str) -> Self {
        Self {
            registry,
            cs,
            target,
        }
    }

    /// A parent of the target.
    ///
    /// Only elements that list the target as a child are visible. An input
    /// whose dependency was never registered reads as missing.
    pub fn input(&self, id: &str) -> Option<&'a Element> {
        self.registry
            .get(id)
            .filter(|parent| parent.has_child(self.target))
    }

    /// Coordinates of a recorded parent.
    pub fn input_coords(&self, id: &str) -> Option<Coords> {
        self.input(id).and_then(|e| e.geometry.coords().copied())
    }

    /// User position of a recorded parent.
    pub fn input_point(&self, id: &str) -> Option<Point> {
        self.input_coords(id).map(|c| c.user_point())
    }
}

/// A recompute strategy attached to one element.
pub trait Recompute {
    /// Elements read by [`Recompute::recompute`].
    fn inputs(&self) -> Vec<ElementId>;

    /// New geometry for the target, or `None` to keep the current one.
    fn recompute(&self, ctx: &UpdateContext<'_>, current: &Geometry) -> Option<Geometry>;

    fn describe(&self) -> &str {
        "custom"
    }
}

/// How an element is recomputed on each pass.
#[derive(Default)]
pub enum UpdateRoutine {
    /// The routine of the element's kind.
    #[default]
    Default,
    Custom(Box<dyn Recompute>),
}

impl fmt::Debug for UpdateRoutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateRoutine::Default => f.write_str("Default"),
            UpdateRoutine::Custom(r) => write!(f, "Custom({})", r.describe()),
        }
    }
}

impl UpdateRoutine {
    pub(crate) fn run(&self, ctx: &UpdateContext<'_>, current: &Geometry) -> Geometry {
        match self {
            UpdateRoutine::Default => default_update(ctx, current),
            UpdateRoutine::Custom(r) => r.recompute(ctx, current).unwrap_or_else(|| {
                let mut geometry = current.clone();
                geometry.refresh(ctx.cs);
                geometry
            }),
        }
    }
}

/// Geometry of a free point at `p`.
pub(crate) fn point_at(cs: &CoordinateSystem, p: Point) -> Geometry {
    Geometry::Point(PointGeometry {
        coords: Coords::from_user(cs, p.x, p.y),
        initial: p,
        transform: Affine::IDENTITY,
    })
}

fn default_update(ctx: &UpdateContext<'_>, current: &Geometry) -> Geometry {
    let cs = ctx.cs;
    let mut next = current.clone();
    match &mut next {
        Geometry::Point(_) | Geometry::Curve(_) | Geometry::Text(_) => {}
        Geometry::Glider(g) => {
            let p = g.coords.user_point();
            match ctx.input(&g.host).and_then(|host| host.project(p)) {
                Some(q) => {
                    g.coords = Coords::from_user(cs, q.x, q.y);
                    g.host_lost = false;
                }
                None => {
                    g.coords.refresh(cs);
                    g.host_lost = true;
                }
            }
        }
        Geometry::Line(g) => {
            match (ctx.input_coords(&g.point1), ctx.input_coords(&g.point2)) {
                (Some(a), Some(b)) => {
                    g.start = Coords::from_homogeneous(cs, a.usr);
                    g.end = Coords::from_homogeneous(cs, b.usr);
                }
                _ => {
                    g.start.refresh(cs);
                    g.end.refresh(cs);
                }
            }
        }
        Geometry::Circle(g) => {
            if let Some(center) = ctx.input_coords(&g.center_id) {
                g.center = Coords::from_homogeneous(cs, center.usr);
            } else {
                g.center.refresh(cs);
            }
            match &g.radius_source {
                RadiusSource::Fixed(r) => g.radius = *r,
                RadiusSource::Point(id) => {
                    if let Some(p) = ctx.input_point(id) {
                        g.radius = g.center.user_point().distance(p);
                    }
                }
            }
            g.sync_screen_radius(cs);
        }
        Geometry::Polygon(g) => {
            let vertices: Option<Vec<Coords>> = g
                .vertex_ids
                .iter()
                .map(|id| ctx.input_coords(id).map(|c| Coords::from_homogeneous(cs, c.usr)))
                .collect();
            match vertices {
                Some(v) => g.vertices = v,
                None => g.vertices.iter_mut().for_each(|v| v.refresh(cs)),
            }
        }
    }
    if matches!(next, Geometry::Point(_) | Geometry::Curve(_) | Geometry::Text(_)) {
        next.refresh(cs);
    }
    next
}

/// The midpoint of two points.
#[derive(Debug, Clone)]
pub struct Midpoint {
    pub a: ElementId,
    pub b: ElementId,
}

impl Midpoint {
    /// Midpoint of the points `a` and `b`.
    pub fn new(a: impl Into<ElementId>, b: impl Into<ElementId>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }
}

impl Recompute for Midpoint {
    fn inputs(&self) -> Vec<ElementId> {
        vec![self.a.clone(), self.b.clone()]
    }

    fn recompute(&self, ctx: &UpdateContext<'_>, _current: &Geometry) -> Option<Geometry> {
        let a = ctx.input_point(&self.a)?;
        let b = ctx.input_point(&self.b)?;
        Some(point_at(ctx.cs, algebra::midpoint(a, b)))
    }

    fn describe(&self) -> &str {
        "midpoint"
    }
}

/// The mirror image of a point across a line.
#[derive(Debug, Clone)]
pub struct Reflection {
    pub point: ElementId,
    pub line: ElementId,
}

impl Reflection {
    /// Mirror image of `point` in `line`.
    pub fn new(point: impl Into<ElementId>, line: impl Into<ElementId>) -> Self {
        Self {
            point: point.into(),
            line: line.into(),
        }
    }
}

impl Recompute for Reflection {
    fn inputs(&self) -> Vec<ElementId> {
        vec![self.point.clone(), self.line.clone()]
    }

    fn recompute(&self, ctx: &UpdateContext<'_>, _current: &Geometry) -> Option<Geometry> {
        let p = ctx.input_point(&self.point)?;
        let Geometry::Line(line) = &ctx.input(&self.line)?.geometry else {
            return None;
        };
        let r = algebra::reflect_point(p, line.start.user_point(), line.end.user_point());
        Some(point_at(ctx.cs, r))
    }

    fn describe(&self) -> &str {
        "reflection"
    }
}

/// A recompute strategy from a closure.
pub struct FnRecompute<F> {
    inputs: Vec<ElementId>,
    f: F,
}

impl<F> FnRecompute<F>
where
    F: Fn(&UpdateContext<'_>, &Geometry) -> Option<Geometry>,
{
    /// A strategy reading `inputs` through `f`.
    pub fn new(inputs: Vec<ElementId>, f: F) -> Self {
        Self { inputs, f }
    }
}

impl<F> Recompute for FnRecompute<F>
where
    F: Fn(&UpdateContext<'_>, &Geometry) -> Option<Geometry>,
{
    fn inputs(&self) -> Vec<ElementId> {
        self.inputs.clone()
    }

    fn recompute(&self, ctx: &UpdateContext<'_>, current: &Geometry) -> Option<Geometry> {
        (self.f)(ctx, current)
    }
}
