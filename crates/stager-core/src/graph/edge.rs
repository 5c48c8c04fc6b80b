//! Labelled edges from a vertex to one of its children.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::vertex::VertexId;

/// Globally unique edge identifier.
pub type EdgeId = Uuid;

/// Which arm of a conditional an edge leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Branch {
    Then,
    Else,
}

/// The role of a child relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    /// Positional argument `i`.
    Parameter(usize),
    /// Declared dependency `i`.
    Dependency(usize),
    /// Arm of a conditional.
    Branch(Branch),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Parameter(i) => write!(f, "param {i}"),
            Label::Dependency(i) => write!(f, "dep {i}"),
            Label::Branch(Branch::Then) => write!(f, "then"),
            Label::Branch(Branch::Else) => write!(f, "else"),
        }
    }
}

/// An edge from a parent vertex to a child vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Unique edge identifier.
    pub id: EdgeId,
    /// The parent.
    pub source: VertexId,
    /// The child.
    pub target: VertexId,
    /// Role of the child.
    pub label: Label,
}

impl Edge {
    /// Create a new edge with a random UUID.
    pub fn new(source: VertexId, target: VertexId, label: Label) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            target,
            label,
        }
    }

    /// The same edge under a fresh id with a different source.
    pub fn from_source(&self, source: VertexId) -> Self {
        Self::new(source, self.target, self.label)
    }

    /// The same edge under a fresh id with a different target.
    pub fn to_target(&self, target: VertexId) -> Self {
        Self::new(self.source, target, self.label)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edge({} -[{}]-> {})", self.source, self.label, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retarget_keeps_label() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let edge = Edge::new(a, b, Label::Dependency(3));
        let moved = edge.to_target(c);
        assert_ne!(moved.id, edge.id);
        assert_eq!(moved.source, a);
        assert_eq!(moved.target, c);
        assert_eq!(moved.label, Label::Dependency(3));
    }

    #[test]
    fn labels_order_by_kind_then_index() {
        let mut labels = vec![
            Label::Branch(Branch::Else),
            Label::Dependency(0),
            Label::Parameter(1),
            Label::Branch(Branch::Then),
            Label::Parameter(0),
        ];
        labels.sort();
        assert_eq!(
            labels,
            vec![
                Label::Parameter(0),
                Label::Parameter(1),
                Label::Dependency(0),
                Label::Branch(Branch::Then),
                Label::Branch(Branch::Else),
            ]
        );
    }
}
