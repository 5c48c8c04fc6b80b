//! Vertex kinds and the Vertex struct.
//!
//! A vertex is either a pending conditional, a component instance, or a
//! curried application awaiting flattening.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::component::Component;
use crate::key::Key;

/// Globally unique vertex identifier.
pub type VertexId = Uuid;

/// The tag (and payload) of a vertex.
#[derive(Debug, Clone)]
pub enum VertexKind {
    /// Two-way branch on a boolean key.
    Conditional(Key),
    /// A configurable unit with an opaque capability record.
    Component(Arc<dyn Component>),
    /// Application of parameter 0 to parameters `1..n`.
    Apply,
}

impl VertexKind {
    pub fn is_conditional(&self) -> bool {
        matches!(self, VertexKind::Conditional(_))
    }

    pub fn is_component(&self) -> bool {
        matches!(self, VertexKind::Component(_))
    }

    pub fn is_apply(&self) -> bool {
        matches!(self, VertexKind::Apply)
    }

    /// Short tag name, used in error messages.
    pub fn tag(&self) -> &'static str {
        match self {
            VertexKind::Conditional(_) => "conditional",
            VertexKind::Component(_) => "component",
            VertexKind::Apply => "apply",
        }
    }
}

impl fmt::Display for VertexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VertexKind::Conditional(key) => write!(f, "If({key})"),
            VertexKind::Component(c) => write!(f, "Component({})", c.name()),
            VertexKind::Apply => write!(f, "Apply"),
        }
    }
}

/// A vertex in a configuration graph.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Globally unique identifier.
    pub id: VertexId,
    /// Tag and payload.
    pub kind: VertexKind,
}

impl Vertex {
    /// Create a new vertex with a random UUID.
    pub fn new(kind: VertexKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
        }
    }

    /// A fresh vertex with the same tag and payload as `self`.
    pub fn fresh_copy(&self) -> Self {
        Self::new(self.kind.clone())
    }

    /// The component payload, if this is a component vertex.
    pub fn component(&self) -> Option<&Arc<dyn Component>> {
        match &self.kind {
            VertexKind::Component(c) => Some(c),
            _ => None,
        }
    }
}
