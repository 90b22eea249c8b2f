//! GeoBoard Render Library
//!
//! Renderer implementations for GeoBoard boards. The SVG renderer keeps an
//! in-memory scene that can be inspected or exported as an SVG document.

mod error;
mod scene;
mod svg;

pub use error::{RenderError, RenderResult};
pub use scene::{NodeShape, Scene, SceneNode, clip_line};
pub use svg::{SharedScene, SvgRenderer};
