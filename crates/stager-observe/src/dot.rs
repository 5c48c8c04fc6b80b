//! Graphviz export.
//!
//! Vertices are numbered in topological order and edges emitted per source
//! in label order, so the same graph value always renders the same text.

use std::collections::HashMap;
use std::fmt::Write;

use serde_json::json;
use stager_core::component::module_names;
use stager_core::graph::edge::Edge;
use stager_core::graph::traverse::topological_sort;
use stager_core::graph::vertex::{VertexId, VertexKind};
use stager_core::graph::Graph;

use crate::error::ObserveError;
use crate::format::{edge_attributes, escape, vertex_label};
use crate::view::{RenderContext, View, ViewKind, ViewOutput};

/// DOT rendering of a configuration graph.
pub struct DotView;

impl View for DotView {
    fn kind(&self) -> ViewKind {
        ViewKind::Dot
    }

    fn render(&self, graph: &Graph, ctx: &RenderContext<'_>) -> Result<ViewOutput, ObserveError> {
        let sorted = topological_sort(graph)?;
        let instances = module_names(graph)?;
        let index: HashMap<VertexId, usize> =
            sorted.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut text = String::new();
        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        // Writing into a String cannot fail.
        let _ = writeln!(text, "digraph \"{}\" {{", escape(ctx.project_name()));
        let _ = writeln!(text, "  node [shape=box];");

        for (i, id) in sorted.iter().enumerate() {
            let vertex = graph.vertex(id)?;
            let label = vertex_label(vertex, &instances);
            let shape = match &vertex.kind {
                VertexKind::Conditional(_) => ", shape=diamond",
                VertexKind::Apply => ", shape=circle",
                VertexKind::Component(_) => "",
            };
            let tooltip = match &vertex.kind {
                VertexKind::Conditional(key) => format!(", tooltip=\"{}\"", escape(&key.name)),
                _ => String::new(),
            };
            let _ = writeln!(text, "  n{i} [label=\"{}\"{shape}{tooltip}];", escape(&label));
            nodes.push(json!({
                "index": i,
                "id": id.to_string(),
                "kind": vertex.kind.tag(),
                "label": label,
            }));
        }

        for (i, id) in sorted.iter().enumerate() {
            let mut out: Vec<&Edge> = graph.successors(id).collect();
            out.sort_by_key(|e| (e.label, index.get(&e.target).copied()));
            for edge in out {
                let Some(j) = index.get(&edge.target) else {
                    continue;
                };
                let _ = writeln!(text, "  n{i} -> n{j} [{}];", edge_attributes(&edge.label));
                edges.push(json!({
                    "source": i,
                    "target": j,
                    "label": edge.label.to_string(),
                }));
            }
        }
        text.push_str("}\n");

        let data = json!({
            "view": "dot",
            "nodes": nodes,
            "edges": edges,
        });

        Ok(ViewOutput { text, data })
    }
}
