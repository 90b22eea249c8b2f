//! Pointer interaction: drag target selection, dragging, origin panning and
//! hover highlighting.

use std::collections::HashSet;

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::elements::{ElementId, ElementKind, Geometry, RadiusSource};
use crate::scheduler::UpdateQuality;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Whether any modifier key is held.
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    Scroll {
        position: Point,
        delta: Vec2,
    },
}

/// Interaction mode of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoardMode {
    #[default]
    None,
    Drag,
    /// An external construction tool owns the pointer.
    Construct,
    MoveOrigin,
}

/// Pointer state carried between events.
#[derive(Debug, Default)]
pub struct InteractionState {
    pub mode: BoardMode,
    pub drag_target: Option<ElementId>,
    /// Pointer position minus origin when panning started.
    drag_offset: Vec2,
    /// Snapped user position of the pointer at the previous drag step.
    last_drag_user: Point,
    button_down: bool,
    highlighted: HashSet<ElementId>,
    pub pointer: Point,
}

/// Transient coordinate readout shown next to a dragged or hovered point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoBox {
    pub visible: bool,
    /// Screen position of the readout.
    pub position: Point,
    pub text: String,
}

/// Format one coordinate for the readout, with more digits for smaller
/// magnitudes.
pub fn format_infobox_coordinate(v: f64) -> String {
    let a = v.abs();
    if a > 0.1 {
        format!("{:.2}", v)
    } else if a >= 0.01 {
        format!("{:.4}", v)
    } else if a >= 0.0001 {
        format!("{:.6}", v)
    } else {
        format!("{}", v)
    }
}

impl Board {
    /// Current interaction mode.
    pub fn mode(&self) -> BoardMode {
        self.interaction.mode
    }

    /// Enter or leave construction mode. Dragging is cancelled.
    pub fn set_mode(&mut self, mode: BoardMode) {
        self.interaction.mode = mode;
        if mode != BoardMode::Drag {
            self.interaction.drag_target = None;
        }
    }

    /// Element being dragged, if any.
    pub fn drag_target(&self) -> Option<&str> {
        self.interaction.drag_target.as_deref()
    }

    /// Coordinate box shown next to the dragged or hovered point.
    pub fn infobox(&self) -> &InfoBox {
        &self.infobox
    }

    /// Currently highlighted elements.
    pub fn highlighted(&self) -> impl Iterator<Item = &ElementId> {
        self.interaction.highlighted.iter()
    }

    /// Dispatch a pointer event. Only the left button starts drags.
    pub fn handle_pointer_event(&mut self, event: &PointerEvent, modifiers: Modifiers) {
        match event {
            PointerEvent::Down { position, button } => {
                if *button == MouseButton::Left {
                    self.pointer_down(*position, modifiers);
                }
            }
            PointerEvent::Up { position, .. } => self.pointer_up(*position),
            PointerEvent::Move { position } => self.pointer_move(*position),
            PointerEvent::Scroll { position, delta } => {
                if delta.y < 0.0 {
                    self.zoom_in(Some(*position));
                } else if delta.y > 0.0 {
                    self.zoom_out(Some(*position));
                }
            }
        }
    }

    /// Start panning (with a modifier) or pick a drag target.
    ///
    /// Returns whether a drag started.
    pub fn pointer_down(&mut self, position: Point, modifiers: Modifiers) -> bool {
        self.interaction.pointer = position;
        self.interaction.button_down = true;

        if modifiers.any() {
            self.interaction.mode = BoardMode::MoveOrigin;
            self.interaction.drag_offset = position - self.cs.origin;
            return false;
        }
        if self.interaction.mode == BoardMode::Construct {
            return false;
        }

        match self.find_drag_target(position) {
            Some(id) => {
                log::debug!("Board {}: dragging {}", self.id, id);
                self.interaction.mode = BoardMode::Drag;
                self.interaction.drag_target = Some(id);
                self.interaction.last_drag_user = self.snapped_user(position);
                true
            }
            None => {
                self.interaction.mode = BoardMode::None;
                false
            }
        }
    }

    /// The first hit point-like element, or else the last hit line, circle
    /// or curve when non-point dragging is enabled.
    fn find_drag_target(&self, position: Point) -> Option<ElementId> {
        let tolerance = self.options.precision;
        let mut target = None;
        for element in self.registry.iter() {
            if !element.visible()
                || element.fixed
                || !element.has_point(&self.cs, position, tolerance)
            {
                continue;
            }
            match &element.geometry {
                Geometry::Glider(g) if g.host_lost => {
                    log::warn!(
                        "Board {}: glider {} has lost host {}, not draggable",
                        self.id,
                        element.id,
                        g.host
                    );
                }
                Geometry::Point(_) | Geometry::Glider(_) => return Some(element.id.clone()),
                Geometry::Line(_) | Geometry::Circle(_) | Geometry::Curve(_)
                    if self.options.drag_non_points =>
                {
                    target = Some(element.id.clone());
                }
                _ => {}
            }
        }
        target
    }

    fn snapped_user(&self, position: Point) -> Point {
        let usr = self.cs.snap(self.cs.to_user([1.0, position.x, position.y]));
        Point::new(usr[1], usr[2])
    }

    /// Drag, move the origin or update hover highlights.
    pub fn pointer_move(&mut self, position: Point) {
        self.interaction.pointer = position;
        match self.interaction.mode {
            BoardMode::MoveOrigin => {
                let origin = position - self.interaction.drag_offset;
                self.move_origin(origin);
            }
            BoardMode::Drag => {
                self.scheduler.quality = UpdateQuality::Low;
                self.dehighlight_all(position);
                if let Some(id) = self.interaction.drag_target.clone() {
                    self.drag_to(&id, position);
                    self.update_infobox(&id);
                }
            }
            BoardMode::None | BoardMode::Construct => {
                self.dehighlight_all(position);
                if self.infobox.visible {
                    self.infobox.visible = false;
                    self.renderer.hide_infobox();
                }
                if !self.interaction.button_down {
                    self.highlight_hits(position);
                }
            }
        }
    }

    /// Finish a drag or origin move with one full update.
    pub fn pointer_up(&mut self, position: Point) {
        self.interaction.pointer = position;
        self.interaction.button_down = false;
        self.scheduler.quality = UpdateQuality::High;
        match self.interaction.mode {
            BoardMode::MoveOrigin => {
                let origin = self.cs.origin;
                self.move_origin(origin);
            }
            BoardMode::Drag => self.full_update(),
            BoardMode::None | BoardMode::Construct => {}
        }
        if self.interaction.mode != BoardMode::Construct {
            self.interaction.mode = BoardMode::None;
        }
        self.interaction.drag_target = None;
    }

    /// Move the drag target under the pointer and run a (possibly reduced)
    /// update.
    fn drag_to(&mut self, id: &str, position: Point) {
        let target = self.snapped_user(position);
        let delta = target - self.interaction.last_drag_user;
        self.interaction.last_drag_user = target;

        let Some(element) = self.registry.get(id) else {
            self.interaction.drag_target = None;
            self.interaction.mode = BoardMode::None;
            return;
        };
        let in_group = !element.groups().is_empty();
        let moved = match &element.geometry {
            Geometry::Point(g) => {
                // Snapping lands the point on the grid; otherwise it keeps
                // its offset from the pointer.
                let delta = if self.cs.snap.enabled {
                    target - g.position()
                } else {
                    delta
                };
                if self.options.legacy_compatibility || in_group {
                    self.write_position(id, target);
                } else if let Some(element) = self.registry.get_mut(id) {
                    element.translate(&self.cs, delta);
                }
                Some(delta)
            }
            Geometry::Glider(g) => {
                let host = g.host.clone();
                let before = g.coords.user_point();
                let raw = self.cs.screen_to_user(position);
                let projected = self
                    .registry
                    .get(&host)
                    .and_then(|h| h.project(raw))
                    .unwrap_or(before);
                self.write_position(id, projected);
                Some(projected - before)
            }
            Geometry::Line(g) => {
                let points = vec![g.point1.clone(), g.point2.clone()];
                self.translate_free_points(&points, delta);
                None
            }
            Geometry::Circle(g) => {
                let mut points = vec![g.center_id.clone()];
                if let RadiusSource::Point(p) = &g.radius_source {
                    points.push(p.clone());
                }
                self.translate_free_points(&points, delta);
                None
            }
            Geometry::Curve(_) => {
                if let Some(element) = self.registry.get_mut(id) {
                    element.translate(&self.cs, delta);
                }
                None
            }
            Geometry::Polygon(_) | Geometry::Text(_) => None,
        };
        if in_group {
            if let Some(delta) = moved {
                self.translate_groups_of(id, delta);
            }
        }
        self.update(Some(id));
    }

    fn write_position(&mut self, id: &str, p: Point) {
        if let Some(element) = self.registry.get_mut(id) {
            element.set_position(&self.cs, p);
        }
    }

    pub(crate) fn translate_free_points(&mut self, ids: &[ElementId], delta: Vec2) {
        for id in ids {
            if let Some(element) = self.registry.get_mut(id) {
                if element.kind() == ElementKind::Point && !element.fixed {
                    element.translate(&self.cs, delta);
                }
            }
        }
    }

    /// Apply a drag delta to the other members of every group `id` is in.
    fn translate_groups_of(&mut self, id: &str, delta: Vec2) {
        let Some(element) = self.registry.get(id) else {
            return;
        };
        let group_ids = element.groups().to_vec();
        for group_id in group_ids {
            let Some(group) = self.groups.iter().find(|g| g.id == group_id) else {
                continue;
            };
            let members: Vec<ElementId> =
                group.members.iter().filter(|m| *m != id).cloned().collect();
            for member in members {
                match self.registry.get_mut(&member) {
                    Some(element) => {
                        element.translate(&self.cs, delta);
                    }
                    None => self.record_diagnostic(crate::Diagnostic::DanglingGroupMember {
                        group: group_id.clone(),
                        member,
                    }),
                }
            }
        }
    }

    /// Show the coordinate readout for a point-like element.
    pub fn update_infobox(&mut self, id: &str) {
        let Some(element) = self.registry.get(id) else {
            return;
        };
        if !element.kind().is_point_like() || !element.show_infobox {
            return;
        }
        let (Some(p), Some(s)) = (element.position(), element.screen_position()) else {
            return;
        };
        self.infobox = InfoBox {
            visible: true,
            position: s + Vec2::new(
                self.options.infobox.distance_x,
                -self.options.infobox.distance_y,
            ),
            text: format!(
                "({}, {})",
                format_infobox_coordinate(p.x),
                format_infobox_coordinate(p.y)
            ),
        };
        self.renderer.update_infobox(&self.infobox);
        self.renderer.show_infobox();
    }

    /// Highlight every visible element under the pointer.
    fn highlight_hits(&mut self, position: Point) {
        let tolerance = self.options.precision;
        let hits: Vec<ElementId> = self
            .registry
            .iter()
            .filter(|e| e.visible() && e.has_point(&self.cs, position, tolerance))
            .map(|e| e.id.clone())
            .collect();
        for id in hits {
            if self.interaction.highlighted.insert(id.clone()) {
                if let Some(element) = self.registry.get_mut(&id) {
                    element.highlighted = true;
                    self.renderer.highlight(element);
                }
                self.update_infobox(&id);
            }
        }
    }

    /// Drop the highlight of elements no longer under the pointer or no
    /// longer visible.
    pub fn dehighlight_all(&mut self, position: Point) {
        let tolerance = self.options.precision;
        let stale: Vec<ElementId> = self
            .interaction
            .highlighted
            .iter()
            .filter(|id| {
                self.registry
                    .get(id.as_str())
                    .is_none_or(|e| !e.visible() || !e.has_point(&self.cs, position, tolerance))
            })
            .cloned()
            .collect();
        for id in stale {
            self.interaction.highlighted.remove(&id);
            if let Some(element) = self.registry.get_mut(&id) {
                element.highlighted = false;
                self.renderer.no_highlight(element);
            }
        }
    }

    pub(crate) fn forget_interaction_state(&mut self, id: &str) {
        self.interaction.highlighted.remove(id);
        if self.interaction.drag_target.as_deref() == Some(id) {
            self.interaction.drag_target = None;
            self.interaction.mode = BoardMode::None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::test_board;
    use crate::elements::{Attributes, Element, Midpoint};
    use crate::renderer::RenderCall;

    const EPS: f64 = 1e-9;

    fn left_down(position: Point) -> PointerEvent {
        PointerEvent::Down {
            position,
            button: MouseButton::Left,
        }
    }

    #[test]
    fn test_format_infobox_coordinate() {
        assert_eq!(format_infobox_coordinate(1.23456), "1.23");
        assert_eq!(format_infobox_coordinate(-3.0), "-3.00");
        assert_eq!(format_infobox_coordinate(0.05), "0.0500");
        assert_eq!(format_infobox_coordinate(0.001234), "0.001234");
        assert_eq!(format_infobox_coordinate(0.00001), "0.00001");
        assert_eq!(format_infobox_coordinate(0.0), "0");
    }

    #[test]
    fn test_drag_point_updates_dependents() {
        let (mut board, _log) = test_board();
        let p1 = board.add_point(Element::point(0.0, 0.0)).unwrap();
        let p2 = board.add_point(Element::point(2.0, 0.0)).unwrap();
        let m = board
            .add_point(Element::point(0.0, 0.0).with_routine(Midpoint::new(&p1.id, &p2.id)))
            .unwrap();
        board.add_child(&p1.id, &m.token).unwrap();
        board.add_child(&p2.id, &m.token).unwrap();
        board.update(None);

        // p1 sits at the origin, (150, 150) on screen.
        assert!(board.pointer_down(Point::new(150.0, 150.0), Modifiers::default()));
        assert_eq!(board.mode(), BoardMode::Drag);
        assert_eq!(board.drag_target(), Some(p1.id.as_str()));

        board.pointer_move(Point::new(250.0, 50.0));
        let p = board.position_of(&p1.id).unwrap();
        assert!((p.x - 2.0).abs() < EPS && (p.y - 2.0).abs() < EPS);
        let mid = board.position_of(&m.id).unwrap();
        assert!((mid.x - 2.0).abs() < EPS && (mid.y - 1.0).abs() < EPS);
        assert!(board.infobox().visible);
        assert_eq!(board.infobox().text, "(2.00, 2.00)");

        board.pointer_up(Point::new(250.0, 50.0));
        assert_eq!(board.mode(), BoardMode::None);
        assert_eq!(board.drag_target(), None);
        assert_eq!(board.quality(), UpdateQuality::High);
    }

    #[test]
    fn test_drag_keeps_point_transform() {
        let (mut board, _log) = test_board();
        let p = board.add_point(Element::point(0.0, 0.0)).unwrap();
        board.pointer_down(Point::new(150.0, 150.0), Modifiers::default());
        board.pointer_move(Point::new(200.0, 150.0));
        let Geometry::Point(g) = &board.element(&p.id).unwrap().geometry else {
            panic!("expected a point");
        };
        assert_eq!(g.initial, Point::ZERO);
        assert!((g.position().x - 1.0).abs() < EPS);
    }

    #[test]
    fn test_drag_keeps_grab_offset() {
        let (mut board, _log) = test_board();
        let p = board.add_point(Element::point(0.0, 0.0)).unwrap();
        // Grab 2px right of and 2px above the center.
        assert!(board.pointer_down(Point::new(152.0, 148.0), Modifiers::default()));
        board.pointer_move(Point::new(202.0, 148.0));
        let moved = board.position_of(&p.id).unwrap();
        assert!((moved.x - 1.0).abs() < EPS && moved.y.abs() < EPS);
        board.pointer_move(Point::new(202.0, 98.0));
        let moved = board.position_of(&p.id).unwrap();
        assert!((moved.x - 1.0).abs() < EPS && (moved.y - 1.0).abs() < EPS);
    }

    #[test]
    fn test_legacy_mode_writes_directly() {
        let (mut board, _log) = test_board();
        board.options.legacy_compatibility = true;
        let p = board.add_point(Element::point(0.0, 0.0)).unwrap();
        board.pointer_down(Point::new(150.0, 150.0), Modifiers::default());
        board.pointer_move(Point::new(200.0, 150.0));
        let Geometry::Point(g) = &board.element(&p.id).unwrap().geometry else {
            panic!("expected a point");
        };
        assert!((g.initial.x - 1.0).abs() < EPS);
        assert_eq!(g.transform, kurbo::Affine::IDENTITY);
    }

    #[test]
    fn test_points_preempt_lines() {
        let (mut board, _log) = test_board();
        board.options.drag_non_points = true;
        let a = board
            .create_element("point", &[0.0.into(), 0.0.into()], Attributes::default())
            .unwrap()
            .unwrap();
        let b = board
            .create_element("point", &[4.0.into(), 0.0.into()], Attributes::default())
            .unwrap()
            .unwrap();
        let line = board
            .create_element("line", &[a.as_str().into(), b.as_str().into()], Attributes::default())
            .unwrap()
            .unwrap();
        assert!(board.pointer_down(Point::new(150.0, 150.0), Modifiers::default()));
        assert_eq!(board.drag_target(), Some(a.as_str()));
        board.pointer_up(Point::new(150.0, 150.0));

        assert!(board.pointer_down(Point::new(250.0, 150.0), Modifiers::default()));
        assert_eq!(board.drag_target(), Some(line.as_str()));
        board.pointer_move(Point::new(250.0, 100.0));
        let pa = board.position_of(&a).unwrap();
        assert!((pa.y - 1.0).abs() < EPS);
    }

    #[test]
    fn test_no_target_stays_idle() {
        let (mut board, _log) = test_board();
        board.add_point(Element::point(0.0, 0.0)).unwrap();
        assert!(!board.pointer_down(Point::new(400.0, 400.0), Modifiers::default()));
        assert_eq!(board.mode(), BoardMode::None);
    }

    #[test]
    fn test_fixed_and_hidden_points_are_not_dragged() {
        let (mut board, _log) = test_board();
        let mut fixed = Element::point(0.0, 0.0);
        fixed.fixed = true;
        board.add_point(fixed).unwrap();
        let mut hidden = Element::point(0.0, 0.0);
        hidden.style.visible = false;
        board.add_point(hidden).unwrap();
        assert!(!board.pointer_down(Point::new(150.0, 150.0), Modifiers::default()));
    }

    #[test]
    fn test_construct_mode_ignores_down() {
        let (mut board, _log) = test_board();
        board.add_point(Element::point(0.0, 0.0)).unwrap();
        board.set_mode(BoardMode::Construct);
        assert!(!board.pointer_down(Point::new(150.0, 150.0), Modifiers::default()));
        assert_eq!(board.mode(), BoardMode::Construct);
    }

    #[test]
    fn test_modifier_pans_origin() {
        let (mut board, log) = test_board();
        board.set_grid(true);
        let modifiers = Modifiers {
            shift: true,
            ..Default::default()
        };
        board.handle_pointer_event(&left_down(Point::new(160.0, 170.0)), modifiers);
        assert_eq!(board.mode(), BoardMode::MoveOrigin);
        log.borrow_mut().clear();
        board.pointer_move(Point::new(260.0, 120.0));
        assert_eq!(board.coords().origin, Point::new(250.0, 100.0));
        assert!(log.borrow().contains(&RenderCall::DrawGrid));
        board.pointer_up(Point::new(260.0, 120.0));
        assert_eq!(board.mode(), BoardMode::None);
    }

    #[test]
    fn test_glider_drag_projects_onto_circle() {
        let (mut board, _log) = test_board();
        let c = board
            .create_element("point", &[0.0.into(), 0.0.into()], Attributes::default())
            .unwrap()
            .unwrap();
        let circle = board
            .create_element("circle", &[c.as_str().into(), 1.0.into()], Attributes::default())
            .unwrap()
            .unwrap();
        let g = board
            .create_element(
                "glider",
                &[1.0.into(), 0.0.into(), circle.as_str().into()],
                Attributes::default(),
            )
            .unwrap()
            .unwrap();
        // The glider sits at (1, 0), (200, 150) on screen.
        assert!(board.pointer_down(Point::new(200.0, 150.0), Modifiers::default()));
        assert_eq!(board.drag_target(), Some(g.as_str()));
        board.pointer_move(Point::new(150.0, 50.0));
        let p = board.position_of(&g).unwrap();
        assert!((p.x - 0.0).abs() < EPS && (p.y - 1.0).abs() < EPS);
    }

    #[test]
    fn test_hover_highlight_and_dehighlight() {
        let (mut board, log) = test_board();
        let p = board.add_point(Element::point(0.0, 0.0)).unwrap();
        log.borrow_mut().clear();
        board.pointer_move(Point::new(151.0, 150.0));
        assert!(board.element(&p.id).unwrap().highlighted);
        assert!(log.borrow().contains(&RenderCall::Highlight(p.id.clone())));
        assert_eq!(board.highlighted().count(), 1);

        board.pointer_move(Point::new(300.0, 300.0));
        assert!(!board.element(&p.id).unwrap().highlighted);
        assert!(log.borrow().contains(&RenderCall::NoHighlight(p.id.clone())));
        assert_eq!(board.highlighted().count(), 0);
    }

    #[test]
    fn test_snapped_drag() {
        let (mut board, _log) = test_board();
        board.set_snap_to_grid(true);
        let p = board.add_point(Element::point(0.0, 0.0)).unwrap();
        board.pointer_down(Point::new(150.0, 150.0), Modifiers::default());
        // (1.18, 0.9) snaps to halves at 50px per unit.
        board.pointer_move(Point::new(209.0, 105.0));
        assert_eq!(board.position_of(&p.id), Some(Point::new(1.0, 1.0)));
    }

    #[test]
    fn test_group_members_move_together() {
        let (mut board, _log) = test_board();
        let a = board.add_point(Element::point(0.0, 0.0)).unwrap();
        let b = board.add_point(Element::point(3.0, 0.0)).unwrap();
        board.create_group("pair", &[a.id.as_str(), b.id.as_str()]).unwrap();
        board.pointer_down(Point::new(150.0, 150.0), Modifiers::default());
        board.pointer_move(Point::new(150.0, 100.0));
        assert_eq!(board.position_of(&a.id), Some(Point::new(0.0, 1.0)));
        assert_eq!(board.position_of(&b.id), Some(Point::new(3.0, 1.0)));
    }
}
