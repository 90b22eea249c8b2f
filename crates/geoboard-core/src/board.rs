//! The board: owns the elements, the coordinate system, the scheduler and
//! interaction state, hooks and dependent boards.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};

use crate::boards::{BoardHandle, release_board_id, reserve_board_id};
use crate::conditions::BoundCondition;
use crate::coords::CoordinateSystem;
use crate::elements::{
    Attributes, Element, ElementId, ElementKind, Geometry, Group, Midpoint, RadiusSource,
    Reflection,
};
use crate::error::{BoardError, BoardResult, Diagnostic};
use crate::graph::{self, DependencyGraph, OrderingViolation};
use crate::interaction::{InfoBox, InteractionState};
use crate::options::BoardOptions;
use crate::registry::{DependentToken, ElementRegistry, Registration};
use crate::renderer::Renderer;
use crate::scheduler::UpdateScheduler;

/// Element kinds accepted by [`Board::create_element`].
pub const ELEMENT_KINDS: &[&str] = &[
    "point",
    "glider",
    "line",
    "segment",
    "circle",
    "curve",
    "polygon",
    "text",
    "midpoint",
    "reflection",
];

/// Screen border kept around points by [`Board::zoom_all_points`].
const ZOOM_ALL_BORDER_PX: f64 = 50.0;
/// Fraction of the canvas moved by one pan step.
const PAN_STEP: f64 = 0.1;

type Hook = Box<dyn FnMut(&Board)>;

/// One parent argument of [`Board::create_element`].
///
/// Strings name an element by id or display name, except for text where
/// the string is the content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParentArg {
    Number(f64),
    Numbers(Vec<f64>),
    Ref(String),
}

impl From<f64> for ParentArg {
    fn from(v: f64) -> Self {
        ParentArg::Number(v)
    }
}

impl From<Vec<f64>> for ParentArg {
    fn from(v: Vec<f64>) -> Self {
        ParentArg::Numbers(v)
    }
}

impl From<&str> for ParentArg {
    fn from(v: &str) -> Self {
        ParentArg::Ref(v.to_string())
    }
}

impl From<String> for ParentArg {
    fn from(v: String) -> Self {
        ParentArg::Ref(v)
    }
}

/// An interactive geometry board.
pub struct Board {
    pub(crate) id: String,
    container: String,
    pub(crate) options: BoardOptions,
    pub(crate) cs: CoordinateSystem,
    pub(crate) registry: ElementRegistry,
    pub(crate) renderer: Box<dyn Renderer>,
    pub(crate) scheduler: UpdateScheduler,
    pub(crate) interaction: InteractionState,
    pub(crate) infobox: InfoBox,
    pub(crate) groups: Vec<Group>,
    group_sequence: u64,
    pub(crate) conditions: Vec<BoundCondition>,
    hooks: Vec<Option<Hook>>,
    pub(crate) dependents: Vec<Weak<RefCell<Board>>>,
    diagnostics: Vec<Diagnostic>,
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("id", &self.id)
            .field("container", &self.container)
            .field("elements", &self.registry.len())
            .field("mode", &self.interaction.mode)
            .finish_non_exhaustive()
    }
}

impl Drop for Board {
    fn drop(&mut self) {
        release_board_id(&self.id);
        log::debug!("Board {} dropped", self.id);
    }
}

impl Board {
    /// Create a board drawing into `container`.
    ///
    /// The board id is the container name, made unique against every live
    /// board on this thread. The id is released when the board is dropped.
    pub fn new(
        container: &str,
        canvas: Size,
        options: BoardOptions,
        mut renderer: Box<dyn Renderer>,
    ) -> BoardResult<Self> {
        if container.trim().is_empty() {
            return Err(BoardError::MissingContainer);
        }
        let id = reserve_board_id(container);
        let mut cs = CoordinateSystem::new(&options, canvas);
        if let Some(bbox) = options.bounding_box {
            cs.set_bounding_box(bbox, options.keep_aspect_ratio);
        }
        if options.grid.has_grid {
            renderer.draw_grid(&cs);
        }
        log::info!(
            "Board {} created in {} ({}x{})",
            id,
            container,
            canvas.width,
            canvas.height
        );
        Ok(Self {
            registry: ElementRegistry::new(id.clone()),
            id,
            container: container.to_string(),
            options,
            cs,
            renderer,
            scheduler: UpdateScheduler::default(),
            interaction: InteractionState::default(),
            infobox: InfoBox::default(),
            groups: Vec::new(),
            group_sequence: 0,
            conditions: Vec::new(),
            hooks: Vec::new(),
            dependents: Vec::new(),
            diagnostics: Vec::new(),
        })
    }

    /// Board id, unique among live boards.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the container the board draws into.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Options the board was created with, as changed since.
    pub fn options(&self) -> &BoardOptions {
        &self.options
    }

    /// The user/screen coordinate system.
    pub fn coords(&self) -> &CoordinateSystem {
        &self.cs
    }

    /// Elements in registration order.
    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    /// Read-only view of the dependency edges.
    pub fn graph(&self) -> DependencyGraph<'_> {
        DependencyGraph::new(&self.registry)
    }

    /// Look up an element by id or display name.
    pub fn element(&self, id_or_name: &str) -> Option<&Element> {
        let id = self.registry.resolve(id_or_name)?;
        self.registry.get(&id)
    }

    /// User position of a point-like or text element.
    pub fn position_of(&self, id_or_name: &str) -> Option<Point> {
        self.element(id_or_name).and_then(Element::position)
    }

    /// Dependency edges whose child was registered before its parent.
    pub fn ordering_violations(&self) -> Vec<OrderingViolation> {
        self.graph().ordering_violations()
    }

    /// Problems suppressed while removing elements.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drain the recorded diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub(crate) fn record_diagnostic(&mut self, diagnostic: Diagnostic) {
        log::warn!("Board {}: {}", self.id, diagnostic);
        self.diagnostics.push(diagnostic);
    }

    fn resolve(&self, id_or_name: &str) -> BoardResult<ElementId> {
        self.registry
            .resolve(id_or_name)
            .ok_or_else(|| BoardError::NotFound(id_or_name.to_string()))
    }

    // --- Registration ---

    /// Register an element and draw it. No dependencies are recorded and no
    /// update runs; use [`Board::add_child`] with the returned token.
    pub fn register(
        &mut self,
        mut element: Element,
        preferred_id: Option<&str>,
    ) -> BoardResult<Registration> {
        element.geometry.refresh(&self.cs);
        let registration = self.registry.register(element, preferred_id)?;
        if let Some(element) = self.registry.get(&registration.id) {
            self.renderer.draw_element(element);
            if !element.visible() {
                self.renderer.hide(element);
            }
            log::debug!(
                "Board {}: registered {} {} ({})",
                self.id,
                element.kind(),
                element.id,
                element.name
            );
        }
        Ok(registration)
    }

    fn register_kind(
        &mut self,
        element: Element,
        accepted: &[ElementKind],
        expected: &str,
    ) -> BoardResult<Registration> {
        if !accepted.contains(&element.kind()) {
            return Err(BoardError::KindMismatch {
                expected: expected.to_string(),
                actual: element.kind().to_string(),
            });
        }
        self.register(element, None)
    }

    /// Register a point or glider.
    pub fn add_point(&mut self, element: Element) -> BoardResult<Registration> {
        self.register_kind(element, &[ElementKind::Point, ElementKind::Glider], "point")
    }

    /// Register a line or segment.
    pub fn add_line(&mut self, element: Element) -> BoardResult<Registration> {
        self.register_kind(element, &[ElementKind::Line], "line")
    }

    /// Register a circle.
    pub fn add_circle(&mut self, element: Element) -> BoardResult<Registration> {
        self.register_kind(element, &[ElementKind::Circle], "circle")
    }

    /// Register a data curve.
    pub fn add_curve(&mut self, element: Element) -> BoardResult<Registration> {
        self.register_kind(element, &[ElementKind::Curve], "curve")
    }

    /// Register a polygon.
    pub fn add_polygon(&mut self, element: Element) -> BoardResult<Registration> {
        self.register_kind(element, &[ElementKind::Polygon], "polygon")
    }

    /// Register a text element.
    pub fn add_text(&mut self, element: Element) -> BoardResult<Registration> {
        self.register_kind(element, &[ElementKind::Text], "text")
    }

    /// Make the token's element a child of `parent`, so it is recomputed
    /// from `parent`'s state.
    pub fn add_child(&mut self, parent: &str, token: &DependentToken) -> BoardResult<()> {
        let parent_id = self.resolve(parent)?;
        if graph::link(&mut self.registry, &parent_id, token)? {
            log::warn!(
                "Board {}: {} is registered before its parent {} and will lag one update",
                self.id,
                token.element(),
                parent_id
            );
        }
        Ok(())
    }

    /// Build, register and wire an element from a kind name and parents.
    ///
    /// Returns `Ok(None)` when `parents` is empty. Parent strings are
    /// resolved as ids or names; coordinate pairs where a point is expected
    /// create a free point. Ends with one update.
    ///
    /// On error the board is left as it was: free points created for
    /// coordinate pairs are removed again.
    pub fn create_element(
        &mut self,
        kind: &str,
        parents: &[ParentArg],
        attributes: Attributes,
    ) -> BoardResult<Option<ElementId>> {
        let kind = kind.to_ascii_lowercase();
        if !ELEMENT_KINDS.contains(&kind.as_str()) {
            return Err(BoardError::UnknownElementKind(kind));
        }
        if parents.is_empty() {
            return Ok(None);
        }

        let mark = self.registry.len();
        let registration = match self.build_and_wire(&kind, parents, &attributes) {
            Ok(registration) => registration,
            Err(err) => {
                self.discard_since(mark);
                return Err(err);
            }
        };

        self.update(None);
        Ok(Some(registration.id))
    }

    fn build_and_wire(
        &mut self,
        kind: &str,
        parents: &[ParentArg],
        attributes: &Attributes,
    ) -> BoardResult<Registration> {
        let mut element = self.build_element(kind, parents)?;
        element.apply_attributes(attributes);
        let registration = self.register(element, attributes.id.as_deref())?;

        let inputs = self
            .registry
            .get(&registration.id)
            .map(Element::inputs)
            .unwrap_or_default();
        for input in inputs {
            self.add_child(&input, &registration.token)?;
        }
        Ok(registration)
    }

    /// Undo every registration after the first `mark` elements.
    fn discard_since(&mut self, mark: usize) {
        let ids: Vec<ElementId> = self.registry.ids().iter().skip(mark).cloned().collect();
        for id in ids.iter().rev() {
            graph::unlink_everywhere(&mut self.registry, id);
            if let Some(element) = self.registry.remove(id) {
                self.renderer.remove(&element);
            }
        }
        if !ids.is_empty() {
            log::debug!("Board {}: discarded {:?} after a failed creation", self.id, ids);
        }
    }

    fn build_element(&mut self, kind: &str, parents: &[ParentArg]) -> BoardResult<Element> {
        let element = match kind {
            "point" => {
                let [x, y] = coordinate_pair(parents)
                    .ok_or_else(|| BoardError::invalid_parents(kind, "expected two coordinates"))?;
                Element::point(x, y)
            }
            "glider" => {
                let Some((ParentArg::Ref(host), rest)) = parents.split_last() else {
                    return Err(BoardError::invalid_parents(kind, "last parent must be the host"));
                };
                let host = self.resolve_ref(host)?;
                let start = if rest.is_empty() {
                    Point::ZERO
                } else {
                    let [x, y] = coordinate_pair(rest).ok_or_else(|| {
                        BoardError::invalid_parents(kind, "expected two coordinates before the host")
                    })?;
                    Point::new(x, y)
                };
                let on_host = self
                    .registry
                    .get(&host)
                    .and_then(|h| h.project(start))
                    .unwrap_or(start);
                Element::glider(host, on_host.x, on_host.y)
            }
            "line" | "segment" => {
                let [a, b] = parents else {
                    return Err(BoardError::invalid_parents(kind, "expected two points"));
                };
                let a = self.point_parent(kind, a)?;
                let b = self.point_parent(kind, b)?;
                if kind == "line" {
                    Element::line(a, b)
                } else {
                    Element::segment(a, b)
                }
            }
            "circle" => {
                let [center, radius] = parents else {
                    return Err(BoardError::invalid_parents(kind, "expected center and radius"));
                };
                let center = self.point_parent(kind, center)?;
                let radius = match radius {
                    ParentArg::Number(r) => RadiusSource::Fixed(*r),
                    other => RadiusSource::Point(self.point_parent(kind, other)?),
                };
                Element::circle(center, radius)
            }
            "curve" => {
                let [ParentArg::Numbers(xs), ParentArg::Numbers(ys)] = parents else {
                    return Err(BoardError::invalid_parents(kind, "expected x and y data"));
                };
                if xs.len() != ys.len() {
                    return Err(BoardError::invalid_parents(kind, "data lengths differ"));
                }
                Element::curve(xs.clone(), ys.clone())
            }
            "polygon" => {
                if parents.len() < 3 {
                    return Err(BoardError::invalid_parents(kind, "expected at least three vertices"));
                }
                let vertices = parents
                    .iter()
                    .map(|p| self.point_parent(kind, p))
                    .collect::<BoardResult<Vec<_>>>()?;
                Element::polygon(vertices)
            }
            "text" => {
                let [ParentArg::Number(x), ParentArg::Number(y), ParentArg::Ref(content)] = parents
                else {
                    return Err(BoardError::invalid_parents(kind, "expected x, y and content"));
                };
                Element::text(*x, *y, content.clone())
            }
            "midpoint" => {
                let (a, b) = match parents {
                    [a, b] => (self.point_parent(kind, a)?, self.point_parent(kind, b)?),
                    [ParentArg::Ref(line)] => {
                        let id = self.resolve_ref(line)?;
                        match self.registry.get(&id).map(|e| &e.geometry) {
                            Some(Geometry::Line(g)) => (g.point1.clone(), g.point2.clone()),
                            _ => {
                                return Err(BoardError::invalid_parents(kind, "expected a line"));
                            }
                        }
                    }
                    _ => return Err(BoardError::invalid_parents(kind, "expected two points")),
                };
                let mut element = Element::point(0.0, 0.0).with_routine(Midpoint::new(a, b));
                element.fixed = true;
                element
            }
            "reflection" => {
                let [point, ParentArg::Ref(line)] = parents else {
                    return Err(BoardError::invalid_parents(kind, "expected a point and a line"));
                };
                let point = self.point_parent(kind, point)?;
                let line = self.resolve_ref(line)?;
                if self.registry.get(&line).map(Element::kind) != Some(ElementKind::Line) {
                    return Err(BoardError::invalid_parents(kind, "expected a line"));
                }
                let mut element = Element::point(0.0, 0.0).with_routine(Reflection::new(point, line));
                element.fixed = true;
                element
            }
            _ => return Err(BoardError::UnknownElementKind(kind.to_string())),
        };
        Ok(element)
    }

    fn resolve_ref(&self, reference: &str) -> BoardResult<ElementId> {
        self.registry
            .resolve(reference)
            .ok_or_else(|| BoardError::UnresolvedParent(reference.to_string()))
    }

    /// A point-like parent: a reference, or a coordinate pair that becomes a
    /// new free point.
    fn point_parent(&mut self, kind: &str, parent: &ParentArg) -> BoardResult<ElementId> {
        match parent {
            ParentArg::Ref(reference) => {
                let id = self.resolve_ref(reference)?;
                match self.registry.get(&id) {
                    Some(e) if e.kind().is_point_like() => Ok(id),
                    _ => Err(BoardError::invalid_parents(
                        kind,
                        format!("{} is not a point", reference),
                    )),
                }
            }
            ParentArg::Numbers(v) if v.len() == 2 => {
                Ok(self.register(Element::point(v[0], v[1]), None)?.id)
            }
            _ => Err(BoardError::invalid_parents(kind, "expected a point or a coordinate pair")),
        }
    }

    // --- Removal ---

    /// Remove an element and, recursively, everything that depends on it.
    ///
    /// Returns the removed ids, or `None` if nothing matches `id_or_name`.
    /// Inconsistent bookkeeping found on the way is recorded as diagnostics
    /// and does not stop the removal.
    pub fn remove_element(&mut self, id_or_name: &str) -> Option<Vec<ElementId>> {
        let id = self.registry.resolve(id_or_name)?;
        let mut visited = HashSet::new();
        let mut removed = Vec::new();
        self.remove_recursive(&id, &mut visited, &mut removed);
        log::debug!("Board {}: removed {:?}", self.id, removed);
        Some(removed)
    }

    fn remove_recursive(
        &mut self,
        id: &str,
        visited: &mut HashSet<ElementId>,
        removed: &mut Vec<ElementId>,
    ) {
        if !visited.insert(id.to_string()) {
            return;
        }
        let Some(element) = self.registry.get(id) else {
            return;
        };
        let mut children: Vec<ElementId> = element.children().cloned().collect();
        children.sort_by_key(|c| self.registry.position(c).unwrap_or(usize::MAX));
        for child in children {
            if self.registry.contains(&child) {
                self.remove_recursive(&child, visited, removed);
            } else if !visited.contains(&child) {
                self.record_diagnostic(Diagnostic::DanglingChild {
                    parent: id.to_string(),
                    child,
                });
            }
        }

        graph::unlink_everywhere(&mut self.registry, id);
        let Some(element) = self.registry.remove(id) else {
            return;
        };
        if !self.renderer.remove(&element) {
            self.record_diagnostic(Diagnostic::RendererMissingNode(id.to_string()));
        }
        for group_id in element.groups() {
            let found = self
                .groups
                .iter_mut()
                .find(|g| g.id == *group_id)
                .is_some_and(|g| g.remove(id));
            if !found {
                self.record_diagnostic(Diagnostic::DanglingGroupMember {
                    group: group_id.clone(),
                    member: id.to_string(),
                });
            }
        }
        self.conditions.retain(|c| c.element != id);
        self.forget_interaction_state(id);
        removed.push(id.to_string());
    }

    // --- Element mutation ---

    /// Move a point-like or text element, discarding its transform. Call
    /// [`Board::update`] afterwards to propagate.
    pub fn set_position(&mut self, id_or_name: &str, p: Point) -> BoardResult<()> {
        let id = self.resolve(id_or_name)?;
        let Some(element) = self.registry.get_mut(&id) else {
            return Err(BoardError::NotFound(id));
        };
        if element.set_position(&self.cs, p) {
            Ok(())
        } else {
            Err(BoardError::KindMismatch {
                expected: "point, glider or text".to_string(),
                actual: element.kind().to_string(),
            })
        }
    }

    /// Translate an element by a user-space delta. Points and curves compose
    /// the delta into their own transform; lines, circles and polygons move
    /// their free defining points.
    pub fn set_position_by_transform(&mut self, id_or_name: &str, delta: Vec2) -> BoardResult<()> {
        let id = self.resolve(id_or_name)?;
        let Some(element) = self.registry.get_mut(&id) else {
            return Err(BoardError::NotFound(id));
        };
        if element.translate(&self.cs, delta) {
            return Ok(());
        }
        let points = element.inputs();
        self.translate_free_points(&points, delta);
        Ok(())
    }

    /// Show or hide an element through the renderer.
    pub fn set_visible(&mut self, id_or_name: &str, visible: bool) -> BoardResult<()> {
        let id = self.resolve(id_or_name)?;
        if let Some(element) = self.registry.get_mut(&id) {
            element.style.visible = visible;
            if visible {
                self.renderer.show(element);
                self.renderer.update_element(element);
            } else {
                self.renderer.hide(element);
            }
        }
        Ok(())
    }

    /// Apply attributes to an existing element. `id` is ignored.
    pub fn set_attributes(&mut self, id_or_name: &str, attributes: &Attributes) -> BoardResult<()> {
        let id = self.resolve(id_or_name)?;
        if let Some(name) = &attributes.name {
            self.registry.rename(&id, name);
        }
        let Some(element) = self.registry.get_mut(&id) else {
            return Err(BoardError::NotFound(id));
        };
        let was_visible = element.visible();
        element.apply_attributes(attributes);
        match (was_visible, element.visible()) {
            (false, true) => self.renderer.show(element),
            (true, false) => self.renderer.hide(element),
            _ => {}
        }
        self.renderer.update_element(element);
        Ok(())
    }

    // --- Hooks and dependent boards ---

    /// Register a callback run now and after every update. Returns its id.
    pub fn add_hook<F>(&mut self, hook: F) -> usize
    where
        F: FnMut(&Board) + 'static,
    {
        let mut hook: Hook = Box::new(hook);
        hook(self);
        self.hooks.push(Some(hook));
        self.hooks.len() - 1
    }

    /// Disable a hook. Ids of other hooks are unaffected.
    pub fn remove_hook(&mut self, id: usize) -> bool {
        match self.hooks.get_mut(id) {
            Some(slot) => slot.take().is_some(),
            None => false,
        }
    }

    pub(crate) fn run_hooks(&mut self) {
        let mut hooks = std::mem::take(&mut self.hooks);
        for hook in hooks.iter_mut().flatten() {
            hook(self);
        }
        self.hooks = hooks;
    }

    /// Update `board` after every update of this board.
    pub fn add_dependent_board(&mut self, board: &BoardHandle) {
        self.dependents.push(Rc::downgrade(board));
        self.update(None);
    }

    /// Stop updating `board` after this one. Returns `false` if it was not
    /// registered.
    pub fn remove_dependent_board(&mut self, board: &BoardHandle) -> bool {
        let before = self.dependents.len();
        let target = Rc::downgrade(board);
        self.dependents.retain(|d| !d.ptr_eq(&target));
        self.dependents.len() != before
    }

    /// Number of dependent boards still alive.
    pub fn dependent_board_count(&self) -> usize {
        self.dependents.iter().filter(|d| d.strong_count() > 0).count()
    }

    // --- View ---

    fn refresh_all(&mut self) {
        let cs = &self.cs;
        for element in self.registry.iter_mut() {
            element.geometry.refresh(cs);
        }
    }

    fn redraw_grid(&mut self) {
        if self.options.grid.has_grid {
            self.renderer.remove_grid();
            self.renderer.draw_grid(&self.cs);
        }
    }

    /// Resync screen coordinates after a zoom change and redraw everything.
    pub fn apply_zoom(&mut self) {
        self.cs.calculate_snap_sizes();
        self.refresh_all();
        self.full_update();
        self.redraw_grid();
    }

    /// Zoom in by the configured factors about `anchor` (default: canvas
    /// center).
    pub fn zoom_in(&mut self, anchor: Option<Point>) {
        let anchor = anchor.unwrap_or_else(|| self.cs.canvas_center());
        let (fx, fy) = (self.options.zoom.factor_x, self.options.zoom.factor_y);
        self.cs.zoom_by(fx, fy, anchor);
        self.apply_zoom();
    }

    /// Zoom out by the configured factors, keeping `anchor` (or the canvas
    /// center) fixed on screen.
    pub fn zoom_out(&mut self, anchor: Option<Point>) {
        let anchor = anchor.unwrap_or_else(|| self.cs.canvas_center());
        let (fx, fy) = (self.options.zoom.factor_x, self.options.zoom.factor_y);
        self.cs.zoom_by(1.0 / fx, 1.0 / fy, anchor);
        self.apply_zoom();
    }

    /// Reset zoom to 1 about the canvas center.
    pub fn zoom100(&mut self) {
        let anchor = self.cs.canvas_center();
        self.cs.reset_zoom(anchor);
        self.apply_zoom();
    }

    /// Fit every visible point into the canvas with a border, keeping the
    /// aspect ratio and the user origin in view.
    pub fn zoom_all_points(&mut self) {
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64);
        for element in self.registry.iter() {
            if !element.kind().is_point_like() || !element.visible() {
                continue;
            }
            if let Some(p) = element.position() {
                min_x = min_x.min(p.x);
                max_x = max_x.max(p.x);
                min_y = min_y.min(p.y);
                max_y = max_y.max(p.y);
            }
        }
        let border_x = ZOOM_ALL_BORDER_PX / self.cs.unit_x;
        let border_y = ZOOM_ALL_BORDER_PX / self.cs.unit_y;
        let zoom_x = self.cs.canvas.width / ((max_x - min_x + 2.0 * border_x) * self.cs.unit_x);
        let zoom_y = self.cs.canvas.height / ((max_y - min_y + 2.0 * border_y) * self.cs.unit_y);
        let zoom = zoom_x.min(zoom_y).clamp(self.cs.min_zoom, self.cs.max_zoom);
        self.cs.zoom_x = zoom;
        self.cs.zoom_y = zoom;
        self.cs.origin = Point::new(
            -(min_x - border_x) * self.cs.scale_x(),
            (max_y + border_y) * self.cs.scale_y(),
        );
        self.apply_zoom();
    }

    /// Move the screen position of the user origin.
    pub fn move_origin(&mut self, origin: Point) {
        self.cs.origin = origin;
        self.refresh_all();
        self.full_update();
        self.redraw_grid();
    }

    fn pan(&mut self, dx: f64, dy: f64) {
        let origin = self.cs.origin + Vec2::new(dx, dy);
        self.move_origin(origin);
    }

    /// Move the view left by a tenth of the canvas.
    pub fn pan_left(&mut self) {
        self.pan(self.cs.canvas.width * PAN_STEP, 0.0);
    }

    /// Move the view right by a tenth of the canvas.
    pub fn pan_right(&mut self) {
        self.pan(-self.cs.canvas.width * PAN_STEP, 0.0);
    }

    /// Move the view up by a tenth of the canvas.
    pub fn pan_up(&mut self) {
        self.pan(0.0, self.cs.canvas.height * PAN_STEP);
    }

    /// Move the view down by a tenth of the canvas.
    pub fn pan_down(&mut self) {
        self.pan(0.0, -self.cs.canvas.height * PAN_STEP);
    }

    /// Show the user viewport `[x_left, y_top, x_right, y_bottom]`.
    pub fn set_bounding_box(&mut self, bbox: [f64; 4], keep_aspect_ratio: bool) {
        self.cs.set_bounding_box(bbox, keep_aspect_ratio);
        self.refresh_all();
        self.full_update();
        self.redraw_grid();
    }

    /// The visible user viewport `[x_left, y_top, x_right, y_bottom]`.
    pub fn bounding_box(&self) -> [f64; 4] {
        self.cs.bounding_box()
    }

    /// Resize the canvas and redraw everything. The origin stays put.
    pub fn resize_container(&mut self, width: f64, height: f64) {
        self.cs.canvas = Size::new(width, height);
        self.renderer.resize(self.cs.canvas);
        self.full_update();
        self.redraw_grid();
    }

    /// Draw or remove the background grid.
    pub fn set_grid(&mut self, show: bool) {
        self.options.grid.has_grid = show;
        if show {
            self.renderer.draw_grid(&self.cs);
        } else {
            self.renderer.remove_grid();
        }
    }

    /// Turn snapping of user coordinates on or off.
    pub fn set_snap_to_grid(&mut self, snap: bool) {
        self.options.grid.snap_to_grid = snap;
        self.cs.snap.enabled = snap;
    }

    // --- Queries ---

    /// Visible elements under a screen position, in registration order.
    pub fn elements_at(&self, position: Point) -> Vec<ElementId> {
        let tolerance = self.options.precision;
        self.registry
            .iter()
            .filter(|e| e.visible() && e.has_point(&self.cs, position, tolerance))
            .map(|e| e.id.clone())
            .collect()
    }

    /// User coordinates of a screen position, optionally snapped.
    pub fn user_coords_of(&self, position: Point, snap: bool) -> Point {
        let mut usr = self.cs.to_user([1.0, position.x, position.y]);
        if snap {
            let mut grid = self.cs.snap.clone();
            grid.enabled = true;
            let (x, y) = grid.snap(usr[1], usr[2]);
            usr = [1.0, x, y];
        }
        Point::new(usr[1], usr[2])
    }

    // --- Groups ---

    /// Group elements for coordinated dragging. Returns the group id.
    pub fn create_group(&mut self, name: &str, members: &[&str]) -> BoardResult<String> {
        let members = members
            .iter()
            .map(|m| self.resolve(m))
            .collect::<BoardResult<Vec<_>>>()?;
        let id = format!("{}Gr{}", self.id, self.group_sequence);
        self.group_sequence += 1;
        for member in &members {
            if let Some(element) = self.registry.get_mut(member) {
                element.groups.push(id.clone());
            }
        }
        self.groups.push(Group::new(id.clone(), name, members));
        Ok(id)
    }

    /// Look up a group by id or name.
    pub fn group(&self, id_or_name: &str) -> Option<&Group> {
        self.groups
            .iter()
            .find(|g| g.id == id_or_name)
            .or_else(|| self.groups.iter().find(|g| g.name == id_or_name))
    }

    /// Groups in creation order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    // --- Animation ---

    /// Queue user positions for an element to step through.
    pub fn move_along(&mut self, id_or_name: &str, path: Vec<Point>) -> BoardResult<()> {
        let id = self.resolve(id_or_name)?;
        let Some(element) = self.registry.get_mut(&id) else {
            return Err(BoardError::NotFound(id));
        };
        if element.position().is_none() {
            return Err(BoardError::KindMismatch {
                expected: "point, glider or text".to_string(),
                actual: element.kind().to_string(),
            });
        }
        element.animation = path.into();
        Ok(())
    }

    /// Advance every animation by one step and update. Returns whether any
    /// animation has steps left.
    pub fn animate(&mut self) -> bool {
        let ids: Vec<ElementId> = self
            .registry
            .iter()
            .filter(|e| e.is_animated())
            .map(|e| e.id.clone())
            .collect();
        if ids.is_empty() {
            return false;
        }
        let mut remaining = false;
        for id in &ids {
            let cs = &self.cs;
            if let Some(element) = self.registry.get_mut(id) {
                if let (Some(next), Some(current)) = (element.animation.pop_front(), element.position()) {
                    element.translate(cs, next - current);
                }
                remaining |= element.is_animated();
            }
        }
        self.update(None);
        remaining
    }
}

/// Two numbers given as `x, y` or `[x, y]`.
fn coordinate_pair(parents: &[ParentArg]) -> Option<[f64; 2]> {
    match parents {
        [ParentArg::Number(x), ParentArg::Number(y)] => Some([*x, *y]),
        [ParentArg::Numbers(v)] if v.len() == 2 => Some([v[0], v[1]]),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) fn test_board() -> (Board, crate::renderer::RenderLog) {
    let _ = env_logger::builder().is_test(true).try_init();
    let (renderer, log)= crate::renderer::RecordingRenderer::new();
    let board = Board::new(
        "board",
        Size::new(500.0, 500.0),
        BoardOptions::default(),
        Box::new(renderer),
    )
    .unwrap();
    (board, log)
}
