//! GeoBoard Core Library
//!
//! Construction graph, coordinate system and update engine for interactive
//! geometry boards. Drawing is delegated to a [`Renderer`] implementation.

pub mod algebra;
pub mod board;
pub mod boards;
pub mod conditions;
pub mod coords;
pub mod elements;
pub mod error;
pub mod graph;
pub mod interaction;
pub mod options;
pub mod registry;
pub mod renderer;
pub mod scheduler;
pub mod snap;

pub use board::{Board, ELEMENT_KINDS, ParentArg};
pub use boards::{BoardHandle, BoardRegistry};
pub use conditions::{Condition, ConditionProperty, ConditionValue};
pub use coords::{CoordinateSystem, Coords};
pub use elements::{
    Attributes, Element, ElementId, ElementKind, ElementStyle, Geometry, Group, Midpoint,
    RadiusSource, Recompute, Reflection, Rgba, UpdateContext,
};
pub use error::{BoardError, BoardResult, Diagnostic};
pub use graph::{DependencyGraph, OrderingViolation};
pub use interaction::{BoardMode, InfoBox, Modifiers, MouseButton, PointerEvent};
pub use options::BoardOptions;
pub use registry::{DependentToken, ElementRegistry, Registration};
pub use renderer::{NoRenderer, RecordingRenderer, RenderCall, RenderLog, Renderer};
pub use scheduler::{UpdateQuality, UpdateStats};
pub use snap::SnapGrid;
