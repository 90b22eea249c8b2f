//! Post-update adjustments: element properties computed from the board
//! after every element pass.

use std::fmt;

use kurbo::Point;

use crate::board::Board;
use crate::elements::{ElementId, Rgba};

/// The property a condition writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionProperty {
    X,
    Y,
    Visible,
    StrokeColor,
    FillColor,
    StrokeWidth,
}

impl ConditionProperty {
    /// Parse the property names used in serialized constructions.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "x" => Some(Self::X),
            "y" => Some(Self::Y),
            "visible" => Some(Self::Visible),
            "strokecolor" => Some(Self::StrokeColor),
            "fillcolor" => Some(Self::FillColor),
            "strokewidth" => Some(Self::StrokeWidth),
            _ => None,
        }
    }
}

/// A value produced by a condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConditionValue {
    Number(f64),
    Bool(bool),
    Color(Rgba),
}

impl From<f64> for ConditionValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for ConditionValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Rgba> for ConditionValue {
    fn from(v: Rgba) -> Self {
        Self::Color(v)
    }
}

type ConditionFn = Box<dyn Fn(&Board) -> ConditionValue>;

/// Sets one property of one element from a function of the board.
pub struct Condition {
    /// Id or name of the element to adjust.
    pub target: String,
    pub property: ConditionProperty,
    value: ConditionFn,
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("target", &self.target)
            .field("property", &self.property)
            .finish_non_exhaustive()
    }
}

impl Condition {
    /// A condition setting `property` of `target` to the value of `value`.
    pub fn new<F, V>(target: impl Into<String>, property: ConditionProperty, value: F) -> Self
    where
        F: Fn(&Board) -> V + 'static,
        V: Into<ConditionValue>,
    {
        Self {
            target: target.into(),
            property,
            value: Box::new(move |board| value(board).into()),
        }
    }

    /// Compute the value for the current board state.
    pub fn evaluate(&self, board: &Board) -> ConditionValue {
        (self.value)(board)
    }
}

/// A condition bound to a resolved element id.
pub(crate) struct BoundCondition {
    pub(crate) element: ElementId,
    pub(crate) condition: Condition,
}

impl Board {
    /// Register conditions. Targets are resolved now; unknown targets are
    /// logged and dropped. Returns how many were accepted.
    pub fn add_conditions(&mut self, conditions: Vec<Condition>) -> usize {
        let mut accepted = 0;
        for condition in conditions {
            match self.registry.resolve(&condition.target) {
                Some(element) => {
                    self.conditions.push(BoundCondition { element, condition });
                    accepted += 1;
                }
                None => log::warn!(
                    "Board {}: condition target {} not found",
                    self.id,
                    condition.target
                ),
            }
        }
        self.prepare_update();
        self.update_elements(None);
        accepted
    }

    /// Apply every condition, then recompute elements so dependents see the
    /// adjusted values.
    pub fn update_conditions(&mut self, drag: Option<&str>) {
        if self.conditions.is_empty() {
            return;
        }
        let conditions = std::mem::take(&mut self.conditions);
        for bound in &conditions {
            let value = bound.condition.evaluate(self);
            self.apply_condition(&bound.element, bound.condition.property, value);
        }
        // Conditions added while evaluating are kept after the existing ones.
        let added = std::mem::replace(&mut self.conditions, conditions);
        self.conditions.extend(added);

        self.prepare_update();
        self.update_elements(drag);
    }

    fn apply_condition(&mut self, id: &str, property: ConditionProperty, value: ConditionValue) {
        let Some(element) = self.registry.get_mut(id) else {
            return;
        };
        match (property, value) {
            (ConditionProperty::X, ConditionValue::Number(x)) => {
                if let Some(p) = element.position() {
                    element.set_position(&self.cs, Point::new(x, p.y));
                }
            }
            (ConditionProperty::Y, ConditionValue::Number(y)) => {
                if let Some(p) = element.position() {
                    element.set_position(&self.cs, Point::new(p.x, y));
                }
            }
            (ConditionProperty::Visible, ConditionValue::Bool(v)) => {
                if element.style.visible != v {
                    element.style.visible = v;
                    if v {
                        self.renderer.show(element);
                    } else {
                        self.renderer.hide(element);
                    }
                }
            }
            (ConditionProperty::StrokeColor, ConditionValue::Color(c)) => element.style.stroke_color = c,
            (ConditionProperty::FillColor, ConditionValue::Color(c)) => element.style.fill_color = c,
            (ConditionProperty::StrokeWidth, ConditionValue::Number(w)) => element.style.stroke_width = w,
            (property, value) => log::warn!(
                "Board {}: condition on {} gave {:?} for {:?}",
                self.id,
                id,
                value,
                property
            ),
        }
    }
}
