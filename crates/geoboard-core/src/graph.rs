//! Dependency edges between elements.
//!
//! Edges are recorded explicitly: a parent lists the elements that must be
//! recomputed after it changes. Nothing is inferred from update routines and
//! no reverse index is kept. Recompute order is registration order, so a
//! child registered before one of its parents lags by one update.

use std::collections::{HashSet, VecDeque};

use crate::elements::ElementId;
use crate::error::{BoardError, BoardResult};
use crate::registry::{DependentToken, ElementRegistry};

/// An edge whose child was registered before its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingViolation {
    pub parent: ElementId,
    pub child: ElementId,
}

/// Record that the token's element depends on `parent`.
///
/// Returns `true` if the edge points backwards in registration order.
pub(crate) fn link(
    registry: &mut ElementRegistry,
    parent: &str,
    token: &DependentToken,
) -> BoardResult<bool> {
    if token.key() != registry.key() {
        return Err(BoardError::ForeignToken {
            token_board: token.board().to_string(),
            board: registry.board_id().to_string(),
        });
    }
    let child_pos = registry
        .position(token.element())
        .ok_or_else(|| BoardError::NotFound(token.element().to_string()))?;
    let parent_pos = registry
        .position(parent)
        .ok_or_else(|| BoardError::NotFound(parent.to_string()))?;
    if let Some(element) = registry.get_mut(parent) {
        element.children.insert(token.element().to_string());
    }
    Ok(child_pos < parent_pos)
}

/// Remove `id` from every child set. Returns the parents it was removed from.
pub(crate) fn unlink_everywhere(registry: &mut ElementRegistry, id: &str) -> Vec<ElementId> {
    let mut parents = Vec::new();
    for element in registry.iter_mut() {
        if element.children.remove(id) {
            parents.push(element.id.clone());
        }
    }
    parents
}

/// Read-only queries over the dependency edges of a registry.
pub struct DependencyGraph<'a> {
    registry: &'a ElementRegistry,
}

impl<'a> DependencyGraph<'a> {
    /// A view over `registry`.
    pub fn new(registry: &'a ElementRegistry) -> Self {
        Self { registry }
    }

    /// Direct children of `id`, in registration order.
    pub fn children(&self, id: &str) -> Vec<ElementId> {
        let Some(element) = self.registry.get(id) else {
            return Vec::new();
        };
        self.registry
            .ids()
            .iter()
            .filter(|c| element.has_child(c))
            .cloned()
            .collect()
    }

    /// Elements that list `id` as a child, in registration order.
    pub fn parents(&self, id: &str) -> Vec<ElementId> {
        self.registry
            .iter()
            .filter(|e| e.has_child(id))
            .map(|e| e.id.clone())
            .collect()
    }

    /// Everything reachable from `id` through child edges, breadth first.
    pub fn descendants(&self, id: &str) -> Vec<ElementId> {
        let mut seen: HashSet<ElementId> = HashSet::new();
        let mut out = Vec::new();
        let mut queue: VecDeque<ElementId> = self.children(id).into();
        seen.insert(id.to_string());
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next.clone()) {
                continue;
            }
            queue.extend(self.children(&next));
            out.push(next);
        }
        out
    }

    /// Edges whose child precedes its parent in registration order.
    pub fn ordering_violations(&self) -> Vec<OrderingViolation> {
        let mut violations = Vec::new();
        for (parent_pos, parent) in self.registry.iter().enumerate() {
            for child in self.children(&parent.id) {
                if self.registry.position(&child).is_some_and(|pos| pos < parent_pos) {
                    violations.push(OrderingViolation {
                        parent: parent.id.clone(),
                        child,
                    });
                }
            }
        }
        violations
    }
}
