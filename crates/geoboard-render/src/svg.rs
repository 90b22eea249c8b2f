//! SVG renderer backed by a shared in-memory scene.

use std::cell::RefCell;
use std::rc::Rc;

use geoboard_core::{CoordinateSystem, Element, InfoBox, Renderer};
use kurbo::Size;

use crate::scene::{NodeShape, Scene, SceneNode};

/// Scene handle shared between the renderer and its host.
pub type SharedScene = Rc<RefCell<Scene>>;

/// Renders board elements into a [`Scene`].
#[derive(Debug)]
pub struct SvgRenderer {
    scene: SharedScene,
}

impl SvgRenderer {
    /// Create a renderer for a canvas of `size` pixels. The returned handle
    /// stays valid after the renderer is boxed into a board.
    pub fn new(size: Size) -> (Self, SharedScene) {
        let scene = Rc::new(RefCell::new(Scene::new(size)));
        (
            Self {
                scene: scene.clone(),
            },
            scene,
        )
    }

    /// Another handle to the scene this renderer draws into.
    pub fn scene(&self) -> SharedScene {
        self.scene.clone()
    }

    fn draw(&mut self, element: &Element) {
        let mut scene = self.scene.borrow_mut();
        let shape = NodeShape::from_element(element, scene.viewport());
        scene.upsert(SceneNode {
            id: element.id.clone(),
            kind: element.kind(),
            shape,
            style: element.style.clone(),
            visible: element.visible(),
            highlighted: element.highlighted,
        });
    }

    fn refresh(&mut self, element: &Element) {
        if self.scene.borrow().node(&element.id).is_none() {
            log::debug!("No node for {}, drawing it", element.id);
        }
        self.draw(element);
    }

    fn set_flags(&mut self, element: &Element, f: impl FnOnce(&mut SceneNode)) {
        match self.scene.borrow_mut().node_mut(&element.id) {
            Some(node) => f(node),
            None => log::warn!("No node for {}", element.id),
        }
    }
}

impl Renderer for SvgRenderer {
    fn draw_point(&mut self, element: &Element) {
        self.draw(element);
    }

    fn update_point(&mut self, element: &Element) {
        self.refresh(element);
    }

    fn draw_line(&mut self, element: &Element) {
        self.draw(element);
    }

    fn update_line(&mut self, element: &Element) {
        self.refresh(element);
    }

    fn draw_circle(&mut self, element: &Element) {
        self.draw(element);
    }

    fn update_circle(&mut self, element: &Element) {
        self.refresh(element);
    }

    fn draw_curve(&mut self, element: &Element) {
        self.draw(element);
    }

    fn update_curve(&mut self, element: &Element) {
        self.refresh(element);
    }

    fn draw_polygon(&mut self, element: &Element) {
        self.draw(element);
    }

    fn update_polygon(&mut self, element: &Element) {
        self.refresh(element);
    }

    fn draw_text(&mut self, element: &Element) {
        self.draw(element);
    }

    fn update_text(&mut self, element: &Element) {
        self.refresh(element);
    }

    fn show(&mut self, element: &Element) {
        self.set_flags(element, |node| node.visible = true);
    }

    fn hide(&mut self, element: &Element) {
        self.set_flags(element, |node| node.visible = false);
    }

    fn remove(&mut self, element: &Element) -> bool {
        self.scene.borrow_mut().remove(&element.id)
    }

    fn highlight(&mut self, element: &Element) {
        self.set_flags(element, |node| node.highlighted = true);
    }

    fn no_highlight(&mut self, element: &Element) {
        self.set_flags(element, |node| node.highlighted = false);
    }

    fn suspend_redraw(&mut self) {
        self.scene.borrow_mut().begin_batch();
    }

    fn unsuspend_redraw(&mut self) {
        self.scene.borrow_mut().end_batch();
    }

    fn draw_grid(&mut self, cs: &CoordinateSystem) {
        let mut scene = self.scene.borrow_mut();
        scene.set_size(cs.canvas);
        scene.set_grid(cs);
    }

    fn remove_grid(&mut self) {
        self.scene.borrow_mut().clear_grid();
    }

    fn resize(&mut self, size: Size) {
        self.scene.borrow_mut().set_size(size);
    }

    fn update_infobox(&mut self, info: &InfoBox) {
        let mut scene = self.scene.borrow_mut();
        let visible = scene.infobox().visible;
        *scene.infobox_mut() = InfoBox {
            visible,
            ..info.clone()
        };
    }

    fn show_infobox(&mut self) {
        self.scene.borrow_mut().infobox_mut().visible = true;
    }

    fn hide_infobox(&mut self) {
        self.scene.borrow_mut().infobox_mut().visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoboard_core::{Attributes, Board, BoardOptions, ElementKind, Modifiers};
    use kurbo::{Point, Shape};

    fn svg_board() -> (Board, SharedScene) {
        let size = Size::new(500.0, 500.0);
        let (renderer, scene) = SvgRenderer::new(size);
        let board = Board::new("svg", size, BoardOptions::default(), Box::new(renderer)).unwrap();
        (board, scene)
    }

    fn create(board: &mut Board, kind: &str, parents: &[geoboard_core::ParentArg]) -> String {
        board
            .create_element(kind, parents, Attributes::default())
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_nodes_follow_elements() {
        let (mut board, scene) = svg_board();
        let a = create(&mut board, "point", &[0.0.into(), 0.0.into()]);
        let b = create(&mut board, "point", &[2.0.into(), 0.0.into()]);
        let line = create(&mut board, "segment", &[a.as_str().into(), b.as_str().into()]);

        let scene_ref = scene.borrow();
        assert_eq!(scene_ref.len(), 3);
        let node = scene_ref.node(&a).unwrap();
        assert_eq!(node.kind, ElementKind::Point);
        assert_eq!(
            node.shape,
            NodeShape::Dot {
                center: Point::new(150.0, 150.0),
                radius: board.element(&a).unwrap().style.size,
            }
        );
        let svg = scene_ref.node_svg(&line).unwrap();
        assert!(svg.starts_with(&format!("<path id=\"{}\" d=\"M", line)));
        assert!(svg.contains("250"));
        assert!(svg.contains("fill=\"none\""));
    }

    #[test]
    fn test_drag_updates_scene() {
        let (mut board, scene) = svg_board();
        let a = create(&mut board, "point", &[0.0.into(), 0.0.into()]);
        board.pointer_down(Point::new(150.0, 150.0), Modifiers::default());
        board.pointer_move(Point::new(200.0, 100.0));
        board.pointer_up(Point::new(200.0, 100.0));
        let scene = scene.borrow();
        let Some(NodeShape::Dot { center, .. }) = scene.node(&a).map(|n| n.shape.clone()) else {
            panic!("expected a dot");
        };
        assert_eq!(center, Point::new(200.0, 100.0));
        assert!(scene.redraw_count() > 0);
    }

    #[test]
    fn test_hidden_nodes_are_not_exported() {
        let (mut board, scene) = svg_board();
        let a = create(&mut board, "point", &[0.0.into(), 0.0.into()]);
        let t = create(&mut board, "text", &[1.0.into(), 1.0.into(), "x < y".into()]);
        board.set_visible(&a, false).unwrap();
        let svg = scene.borrow().to_svg().unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(!svg.contains(&format!("id=\"{}\"", a)));
        assert!(svg.contains(&format!("<text id=\"{}\"", t)));
        assert!(svg.contains("x &lt; y"));
    }

    #[test]
    fn test_circle_radius_in_pixels() {
        let (mut board, scene) = svg_board();
        let c = create(&mut board, "point", &[0.0.into(), 0.0.into()]);
        let circle = create(&mut board, "circle", &[c.as_str().into(), 2.0.into()]);
        board.zoom_in(Some(Point::new(150.0, 150.0)));
        let scene = scene.borrow();
        let Some(NodeShape::Ellipse { radii, .. }) = scene.node(&circle).map(|n| n.shape.clone())
        else {
            panic!("expected an ellipse");
        };
        assert!((radii.x - 125.0).abs() < 1e-9);
        assert!((radii.y - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_remove_and_grid() {
        let (mut board, scene) = svg_board();
        let a = create(&mut board, "point", &[0.0.into(), 0.0.into()]);
        board.set_grid(true);
        assert!(scene.borrow().grid().is_some());
        assert!(scene.borrow().to_svg().unwrap().contains("class=\"grid\""));
        board.remove_element(&a).unwrap();
        assert!(scene.borrow().node(&a).is_none());
        assert!(board.diagnostics().is_empty());
        board.set_grid(false);
        assert!(scene.borrow().grid().is_none());
    }

    #[test]
    fn test_resize_clips_to_new_canvas() {
        let (mut board, scene) = svg_board();
        let a = create(&mut board, "point", &[0.0.into(), 0.0.into()]);
        let b = create(&mut board, "point", &[2.0.into(), 0.0.into()]);
        let line = create(&mut board, "line", &[a.as_str().into(), b.as_str().into()]);
        board.resize_container(300.0, 300.0);

        let scene = scene.borrow();
        assert_eq!(scene.size(), Size::new(300.0, 300.0));
        assert!(scene.grid().is_none());
        let Some(NodeShape::Path { path, .. }) = scene.node(&line).map(|n| n.shape.clone()) else {
            panic!("expected a path");
        };
        let bounds = path.bounding_box();
        assert!((bounds.x0 - 0.0).abs() < 1e-9);
        assert!((bounds.x1 - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_node_error() {
        let (_board, scene) = svg_board();
        assert!(matches!(
            scene.borrow().node_svg("nothing"),
            Err(crate::RenderError::MissingNode(_))
        ));
    }
}
