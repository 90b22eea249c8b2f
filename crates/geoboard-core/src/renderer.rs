//! Renderer contract.
//!
//! The board calls a renderer to create nodes the first time an element is
//! drawn and to refresh them afterwards. Renderers hold no graph state.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use kurbo::Size;

use crate::coords::CoordinateSystem;
use crate::elements::{Element, ElementId, ElementKind};
use crate::interaction::InfoBox;

/// A drawing backend.
pub trait Renderer {
    fn draw_point(&mut self, element: &Element);
    fn update_point(&mut self, element: &Element);
    fn draw_line(&mut self, element: &Element);
    fn update_line(&mut self, element: &Element);
    fn draw_circle(&mut self, element: &Element);
    fn update_circle(&mut self, element: &Element);
    fn draw_curve(&mut self, element: &Element);
    fn update_curve(&mut self, element: &Element);
    fn draw_polygon(&mut self, element: &Element);
    fn update_polygon(&mut self, element: &Element);
    fn draw_text(&mut self, element: &Element);
    fn update_text(&mut self, element: &Element);

    fn show(&mut self, element: &Element);
    fn hide(&mut self, element: &Element);

    /// Drop the node of a removed element. Returns `false` if there was none.
    fn remove(&mut self, element: &Element) -> bool;

    fn highlight(&mut self, _element: &Element) {}
    fn no_highlight(&mut self, _element: &Element) {}

    /// Start a batch of updates.
    fn suspend_redraw(&mut self) {}
    /// End a batch of updates.
    fn unsuspend_redraw(&mut self) {}

    fn draw_grid(&mut self, _cs: &CoordinateSystem) {}
    fn remove_grid(&mut self) {}

    /// The canvas changed size. Called before the elements are refreshed.
    fn resize(&mut self, _size: Size) {}

    fn update_infobox(&mut self, _info: &InfoBox) {}
    fn show_infobox(&mut self) {}
    fn hide_infobox(&mut self) {}

    /// Create the node for any element kind.
    fn draw_element(&mut self, element: &Element) {
        match element.kind() {
            ElementKind::Point | ElementKind::Glider => self.draw_point(element),
            ElementKind::Line => self.draw_line(element),
            ElementKind::Circle => self.draw_circle(element),
            ElementKind::Curve => self.draw_curve(element),
            ElementKind::Polygon => self.draw_polygon(element),
            ElementKind::Text => self.draw_text(element),
        }
    }

    /// Refresh the node for any element kind.
    fn update_element(&mut self, element: &Element) {
        match element.kind() {
            ElementKind::Point | ElementKind::Glider => self.update_point(element),
            ElementKind::Line => self.update_line(element),
            ElementKind::Circle => self.update_circle(element),
            ElementKind::Curve => self.update_curve(element),
            ElementKind::Polygon => self.update_polygon(element),
            ElementKind::Text => self.update_text(element),
        }
    }
}

/// A renderer that draws nothing.
#[derive(Debug, Default)]
pub struct NoRenderer;

impl Renderer for NoRenderer {
    fn draw_point(&mut self, _: &Element) {}
    fn update_point(&mut self, _: &Element) {}
    fn draw_line(&mut self, _: &Element) {}
    fn update_line(&mut self, _: &Element) {}
    fn draw_circle(&mut self, _: &Element) {}
    fn update_circle(&mut self, _: &Element) {}
    fn draw_curve(&mut self, _: &Element) {}
    fn update_curve(&mut self, _: &Element) {}
    fn draw_polygon(&mut self, _: &Element) {}
    fn update_polygon(&mut self, _: &Element) {}
    fn draw_text(&mut self, _: &Element) {}
    fn update_text(&mut self, _: &Element) {}
    fn show(&mut self, _: &Element) {}
    fn hide(&mut self, _: &Element) {}
    fn remove(&mut self, _: &Element) -> bool {
        true
    }
}

/// One call observed by [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    Draw(ElementKind, ElementId),
    Update(ElementKind, ElementId),
    Show(ElementId),
    Hide(ElementId),
    Remove(ElementId),
    Highlight(ElementId),
    NoHighlight(ElementId),
    SuspendRedraw,
    UnsuspendRedraw,
    DrawGrid,
    RemoveGrid,
    Resize(Size),
    UpdateInfobox(String),
    ShowInfobox,
    HideInfobox,
}

/// Shared log of renderer calls.
pub type RenderLog = Rc<RefCell<Vec<RenderCall>>>;

/// A renderer that records every call, for hosts and tests that inspect
/// what the board asked for.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    log: RenderLog,
    nodes: HashSet<ElementId>,
}

impl RecordingRenderer {
    /// Create a renderer and a handle to its call log.
    pub fn new() -> (Self, RenderLog) {
        let renderer = Self::default();
        let log = renderer.log.clone();
        (renderer, log)
    }

    fn record(&self, call: RenderCall) {
        self.log.borrow_mut().push(call);
    }

    fn draw(&mut self, element: &Element) {
        self.nodes.insert(element.id.clone());
        self.record(RenderCall::Draw(element.kind(), element.id.clone()));
    }

    fn update(&mut self, element: &Element) {
        self.record(RenderCall::Update(element.kind(), element.id.clone()));
    }
}

impl Renderer for RecordingRenderer {
    fn draw_point(&mut self, element: &Element) {
        self.draw(element);
    }
    fn update_point(&mut self, element: &Element) {
        self.update(element);
    }
    fn draw_line(&mut self, element: &Element) {
        self.draw(element);
    }
    fn update_line(&mut self, element: &Element) {
        self.update(element);
    }
    fn draw_circle(&mut self, element: &Element) {
        self.draw(element);
    }
    fn update_circle(&mut self, element: &Element) {
        self.update(element);
    }
    fn draw_curve(&mut self, element: &Element) {
        self.draw(element);
    }
    fn update_curve(&mut self, element: &Element) {
        self.update(element);
    }
    fn draw_polygon(&mut self, element: &Element) {
        self.draw(element);
    }
    fn update_polygon(&mut self, element: &Element) {
        self.update(element);
    }
    fn draw_text(&mut self, element: &Element) {
        self.draw(element);
    }
    fn update_text(&mut self, element: &Element) {
        self.update(element);
    }

    fn show(&mut self, element: &Element) {
        self.record(RenderCall::Show(element.id.clone()));
    }

    fn hide(&mut self, element: &Element) {
        self.record(RenderCall::Hide(element.id.clone()));
    }

    fn remove(&mut self, element: &Element) -> bool {
        self.record(RenderCall::Remove(element.id.clone()));
        self.nodes.remove(&element.id)
    }

    fn highlight(&mut self, element: &Element) {
        self.record(RenderCall::Highlight(element.id.clone()));
    }

    fn no_highlight(&mut self, element: &Element) {
        self.record(RenderCall::NoHighlight(element.id.clone()));
    }

    fn suspend_redraw(&mut self) {
        self.record(RenderCall::SuspendRedraw);
    }

    fn unsuspend_redraw(&mut self) {
        self.record(RenderCall::UnsuspendRedraw);
    }

    fn draw_grid(&mut self, _cs: &CoordinateSystem) {
        self.record(RenderCall::DrawGrid);
    }

    fn remove_grid(&mut self) {
        self.record(RenderCall::RemoveGrid);
    }

    fn resize(&mut self, size: Size) {
        self.record(RenderCall::Resize(size));
    }

    fn update_infobox(&mut self, info: &InfoBox) {
        self.record(RenderCall::UpdateInfobox(info.text.clone()));
    }

    fn show_infobox(&mut self) {
        self.record(RenderCall::ShowInfobox);
    }

    fn hide_infobox(&mut self) {
        self.record(RenderCall::HideInfobox);
    }
}
