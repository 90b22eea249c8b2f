//! Element registry: id and name lookup, id and name generation.

use std::collections::HashMap;

use uuid::Uuid;

use crate::elements::{Element, ElementId, ElementKind};
use crate::error::{BoardError, BoardResult};

/// Letters available to one name position; index 0 is the empty letter.
const NAME_ALPHABET_LEN: usize = 27;

/// Capability to make the issuing element depend on another element.
///
/// Only registration creates tokens, so a dependency can only be recorded
/// for an element that is actually on the board. Tokens carry the issuing
/// registry's key, so boards with equal ids still reject each other's
/// tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentToken {
    element: ElementId,
    board: String,
    key: Uuid,
}

impl DependentToken {
    pub(crate) fn new(element: ElementId, board: String, key: Uuid) -> Self {
        Self {
            element,
            board,
            key,
        }
    }

    /// Id of the element that becomes a dependent.
    pub fn element(&self) -> &str {
        &self.element
    }

    /// Id of the board that issued the token.
    pub fn board(&self) -> &str {
        &self.board
    }

    pub(crate) fn key(&self) -> Uuid {
        self.key
    }
}

/// Result of registering an element.
#[derive(Debug, Clone)]
pub struct Registration {
    pub id: ElementId,
    pub token: DependentToken,
}

/// Owns the elements of one board in registration order.
#[derive(Debug)]
pub struct ElementRegistry {
    board_id: String,
    key: Uuid,
    elements: HashMap<ElementId, Element>,
    order: Vec<ElementId>,
    by_name: HashMap<String, ElementId>,
    sequence: u64,
}

impl ElementRegistry {
    /// An empty registry for the board `board_id`.
    pub fn new(board_id: impl Into<String>) -> Self {
        Self {
            board_id: board_id.into(),
            key: Uuid::new_v4(),
            elements: HashMap::new(),
            order: Vec::new(),
            by_name: HashMap::new(),
            sequence: 0,
        }
    }

    /// Id of the board this registry belongs to.
    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    /// Key stamped into every token this registry issues.
    pub(crate) fn key(&self) -> Uuid {
        self.key
    }

    /// Number of registration calls made so far.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Insert an element and assign its id and display name.
    ///
    /// Without a preferred id the id is `board id + kind prefix + sequence`.
    /// The sequence advances on every call, whatever the kind. A preferred id
    /// that is already taken is rejected. An empty name is replaced by a
    /// generated one; a name already in use is taken over by this element.
    pub fn register(
        &mut self,
        mut element: Element,
        preferred_id: Option<&str>,
    ) -> BoardResult<Registration> {
        let number = self.sequence;
        self.sequence += 1;

        let id = match preferred_id.filter(|id| !id.is_empty()) {
            Some(id) if self.elements.contains_key(id) => {
                return Err(BoardError::DuplicateId(id.to_string()));
            }
            Some(id) => id.to_string(),
            None => self.next_free_id(element.kind().id_prefix(), number),
        };

        if element.name.is_empty() {
            element.name = self.generate_name(element.kind());
        }
        if !element.name.is_empty() {
            self.by_name.insert(element.name.clone(), id.clone());
        }

        element.id = id.clone();
        self.elements.insert(id.clone(), element);
        self.order.push(id.clone());

        let token = DependentToken::new(id.clone(), self.board_id.clone(), self.key);
        Ok(Registration { id, token })
    }

    fn next_free_id(&self, prefix: &str, number: u64) -> ElementId {
        let mut number = number;
        loop {
            let id = format!("{}{}{}", self.board_id, prefix, number);
            if !self.elements.contains_key(&id) {
                return id;
            }
            number += 1;
        }
    }

    /// First unused display name for `kind`, or an empty string once all
    /// names of up to three letters are taken.
    pub fn generate_name(&self, kind: ElementKind) -> String {
        name_candidates(kind)
            .find(|name| !self.by_name.contains_key(name))
            .unwrap_or_default()
    }

    /// Resolve an id, falling back to a display name.
    pub fn resolve(&self, id_or_name: &str) -> Option<ElementId> {
        if self.elements.contains_key(id_or_name) {
            return Some(id_or_name.to_string());
        }
        self.by_name
            .get(id_or_name)
            .filter(|id| self.elements.contains_key(id.as_str()))
            .cloned()
    }

    /// Whether an element with this exact id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    /// The element registered under `id`.
    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    /// Mutable access to the element registered under `id`.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    /// The element currently owning the display name `name`.
    pub fn get_by_name(&self, name: &str) -> Option<&Element> {
        self.by_name.get(name).and_then(|id| self.elements.get(id))
    }

    /// Ids in registration order.
    pub fn ids(&self) -> &[ElementId] {
        &self.order
    }

    /// Elements in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.order.iter().filter_map(|id| self.elements.get(id))
    }

    /// Position of `id` in registration order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.order.iter().position(|o| o == id)
    }

    /// Number of registered elements.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no element is registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Change the display name of an element.
    pub fn rename(&mut self, id: &str, name: &str) -> bool {
        let Some(element) = self.elements.get_mut(id) else {
            return false;
        };
        let old = std::mem::replace(&mut element.name, name.to_string());
        self.release_name(&old, id);
        if !name.is_empty() {
            self.by_name.insert(name.to_string(), id.to_string());
        }
        true
    }

    /// Evict an element by id or name. Returns `None` if neither matches.
    ///
    /// Child sets of other elements are left alone.
    pub fn remove(&mut self, id_or_name: &str) -> Option<Element> {
        let id = self.resolve(id_or_name)?;
        let element = self.elements.remove(&id)?;
        self.order.retain(|o| *o != id);
        self.release_name(&element.name, &id);
        Some(element)
    }

    /// Drop `id`'s claim on `name`. The name passes to the latest
    /// registered element still carrying it.
    fn release_name(&mut self, name: &str, id: &str) {
        if !self.by_name.get(name).is_some_and(|owner| owner == id) {
            return;
        }
        let heir = self
            .order
            .iter()
            .rev()
            .filter(|o| o.as_str() != id)
            .find(|o| self.elements.get(o.as_str()).is_some_and(|e| e.name == name))
            .cloned();
        match heir {
            Some(heir) => {
                self.by_name.insert(name.to_string(), heir);
            }
            None => {
                self.by_name.remove(name);
            }
        }
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.elements.values_mut()
    }

    #[cfg(test)]
    pub(crate) fn reserve_name(&mut self, name: String) {
        self.by_name.insert(name, ElementId::new());
    }
}

/// Every display name `generate_name` may hand out for `kind`, in search
/// order: one letter, then two, then three.
pub fn name_candidates(kind: ElementKind) -> impl Iterator<Item = String> {
    let (pre, post) = kind.name_decoration();
    let base = if kind.is_point_like() { b'A' } else { b'a' };
    let n = NAME_ALPHABET_LEN;

    let one = (1..n).map(|i0| [0, 0, i0]);
    let two = (1..n).flat_map(move |i1| (1..n).map(move |i0| [0, i1, i0]));
    let three = (1..n)
        .flat_map(move |i2| (1..n).flat_map(move |i1| (1..n).map(move |i0| [i2, i1, i0])));

    one.chain(two).chain(three).map(move |indices| {
        let mut name = String::from(pre);
        for i in indices {
            if i > 0 {
                name.push(char::from(base + (i - 1) as u8));
            }
        }
        name.push_str(post);
        name
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesized_ids_share_one_sequence() {
        let mut registry = ElementRegistry::new("jxgBoard1");
        let p = registry.register(Element::point(0.0, 0.0), None).unwrap();
        let l = registry.register(Element::line("a", "b"), None).unwrap();
        let q = registry.register(Element::point(1.0, 0.0), None).unwrap();
        assert_eq!(p.id, "jxgBoard1P0");
        assert_eq!(l.id, "jxgBoard1L1");
        assert_eq!(q.id, "jxgBoard1P2");
        assert_eq!(registry.sequence(), 3);
    }

    #[test]
    fn test_preferred_id() {
        let mut registry = ElementRegistry::new("b");
        let r = registry.register(Element::point(0.0, 0.0), Some("start")).unwrap();
        assert_eq!(r.id, "start");
        assert_eq!(r.token.element(), "start");
        assert_eq!(r.token.board(), "b");
        let dup = registry.register(Element::point(0.0, 0.0), Some("start"));
        assert!(matches!(dup, Err(BoardError::DuplicateId(_))));
        // The failed call still consumed a sequence number.
        assert_eq!(registry.sequence(), 2);
    }

    #[test]
    fn test_synthesized_id_skips_taken_ids() {
        let mut registry = ElementRegistry::new("b");
        registry.register(Element::point(0.0, 0.0), Some("bP1")).unwrap();
        let r = registry.register(Element::point(0.0, 0.0), None).unwrap();
        assert_eq!(r.id, "bP2");
    }

    #[test]
    fn test_generated_names() {
        let mut registry = ElementRegistry::new("b");
        let a = registry.register(Element::point(0.0, 0.0), None).unwrap();
        let b = registry.register(Element::point(0.0, 0.0), None).unwrap();
        let l = registry.register(Element::line("x", "y"), None).unwrap();
        let c = registry
            .register(Element::circle("x", crate::elements::RadiusSource::Fixed(1.0)), None)
            .unwrap();
        assert_eq!(registry.get(&a.id).unwrap().name, "A");
        assert_eq!(registry.get(&b.id).unwrap().name, "B");
        assert_eq!(registry.get(&l.id).unwrap().name, "a");
        assert_eq!(registry.get(&c.id).unwrap().name, "k_{a}");
    }

    #[test]
    fn test_name_candidate_order() {
        let names: Vec<String> = name_candidates(ElementKind::Point).collect();
        assert_eq!(names.len(), 26 + 26 * 26 + 26 * 26 * 26);
        assert_eq!(names[0], "A");
        assert_eq!(names[25], "Z");
        assert_eq!(names[26], "AA");
        assert_eq!(names[27], "AB");
        assert_eq!(names[26 + 676], "AAA");
        assert_eq!(names.last().map(String::as_str), Some("ZZZ"));
        let polygons: Vec<String> = name_candidates(ElementKind::Polygon).take(1).collect();
        assert_eq!(polygons, vec!["P_{a}".to_string()]);
    }

    #[test]
    fn test_name_exhaustion_returns_empty() {
        let mut registry = ElementRegistry::new("b");
        for name in name_candidates(ElementKind::Point) {
            registry.reserve_name(name);
        }
        assert_eq!(registry.generate_name(ElementKind::Point), "");
        assert_eq!(registry.generate_name(ElementKind::Line), "a");
    }

    #[test]
    fn test_last_name_wins() {
        let mut registry = ElementRegistry::new("b");
        let first = registry
            .register(Element::point(0.0, 0.0).with_name("P"), None)
            .unwrap();
        let second = registry
            .register(Element::point(1.0, 0.0).with_name("P"), None)
            .unwrap();
        assert_eq!(registry.resolve("P"), Some(second.id.clone()));
        assert_eq!(registry.resolve(&first.id), Some(first.id));
    }

    #[test]
    fn test_shared_name_falls_back_to_earlier_owner() {
        let mut registry = ElementRegistry::new("b");
        let first = registry
            .register(Element::point(0.0, 0.0).with_name("P"), None)
            .unwrap();
        let second = registry
            .register(Element::point(1.0, 0.0).with_name("P"), None)
            .unwrap();
        let third = registry
            .register(Element::point(2.0, 0.0).with_name("P"), None)
            .unwrap();

        assert!(registry.remove(&third.id).is_some());
        assert_eq!(registry.resolve("P"), Some(second.id.clone()));
        assert!(registry.rename(&second.id, "R"));
        assert_eq!(registry.resolve("P"), Some(first.id.clone()));
        assert_eq!(registry.resolve("R"), Some(second.id));
        assert!(registry.remove("P").is_some());
        assert!(registry.resolve("P").is_none());
    }

    #[test]
    fn test_remove_by_name_and_not_found() {
        let mut registry = ElementRegistry::new("b");
        registry
            .register(Element::point(0.0, 0.0).with_name("Q"), None)
            .unwrap();
        assert!(registry.remove("Q").is_some());
        assert!(registry.remove("Q").is_none());
        assert!(registry.is_empty());
        assert!(registry.get_by_name("Q").is_none());
    }

    #[test]
    fn test_rename() {
        let mut registry = ElementRegistry::new("b");
        let r = registry.register(Element::point(0.0, 0.0), None).unwrap();
        assert!(registry.rename(&r.id, "Start"));
        assert!(registry.get_by_name("A").is_none());
        assert_eq!(registry.resolve("Start"), Some(r.id));
    }
}
