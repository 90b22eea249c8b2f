use super::ElementId;

/// A named set of elements translated together when one of them is dragged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub members: Vec<ElementId>,
}

impl Group {
    /// A group with the given members.
    pub fn new(id: impl Into<String>, name: impl Into<String>, members: Vec<ElementId>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            members,
        }
    }

    /// Whether `id` is a member.
    pub fn contains(&self, id: &str) -> bool {
        self.members.iter().any(|m| m == id)
    }

    /// Drop a member. Returns whether it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != id);
        self.members.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership() {
        let mut group = Group::new("g0", "pair", vec!["a".into(), "b".into()]);
        assert!(group.contains("a"));
        assert!(group.remove("a"));
        assert!(!group.remove("a"));
        assert_eq!(group.members, vec!["b".to_string()]);
    }
}
