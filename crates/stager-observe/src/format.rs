//! Shared formatting helpers for observability views.

use std::collections::HashMap;

use stager_core::graph::edge::{Branch, Label};
use stager_core::graph::vertex::{Vertex, VertexId, VertexKind};
use stager_core::graph::Graph;

/// Short display name of a vertex.
///
/// Applications render as `$`, conditionals as `If`, and components by the
/// instance module name when one is known, else by their module name.
pub fn vertex_label(vertex: &Vertex, instances: &HashMap<VertexId, String>) -> String {
    match &vertex.kind {
        VertexKind::Apply => "$".to_string(),
        VertexKind::Conditional(_) => "If".to_string(),
        VertexKind::Component(c) => instances
            .get(&vertex.id)
            .cloned()
            .unwrap_or_else(|| c.module_name().to_string()),
    }
}

/// Graphviz attributes for an edge label.
pub fn edge_attributes(label: &Label) -> String {
    match label {
        Label::Parameter(i) => format!("label=\"{i}\""),
        Label::Dependency(_) => "style=dashed".to_string(),
        Label::Branch(Branch::Then) => "style=dotted, label=\"then\"".to_string(),
        Label::Branch(Branch::Else) => "style=dotted, label=\"else\"".to_string(),
    }
}

/// Longest path from a root to each vertex, 0-indexed.
pub fn compute_levels(graph: &Graph, sorted: &[VertexId]) -> HashMap<VertexId, usize> {
    let mut levels: HashMap<VertexId, usize> = HashMap::new();

    for id in sorted {
        let level = graph
            .predecessors(id)
            .filter_map(|edge| levels.get(&edge.source).map(|l| l + 1))
            .max()
            .unwrap_or(0);
        levels.insert(*id, level);
    }

    levels
}

/// Escape a string for use inside a double-quoted DOT identifier.
pub fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
