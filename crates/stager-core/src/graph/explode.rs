//! Vertex decoder: rebuild the typed view of a vertex from its raw edges.

use std::sync::Arc;

use super::edge::{Branch, Label};
use super::vertex::{VertexId, VertexKind};
use super::{Graph, GraphError};
use crate::component::Component;
use crate::key::Key;

/// Typed view of a vertex and its ordered children.
#[derive(Debug, Clone)]
pub enum Exploded {
    /// A component with its ordered parameters and dependencies.
    Component {
        component: Arc<dyn Component>,
        args: Vec<VertexId>,
        deps: Vec<VertexId>,
    },
    /// A conditional with its two arms.
    Conditional {
        key: Key,
        then_: VertexId,
        else_: VertexId,
    },
    /// An application: parameter 0 applied to the remaining parameters.
    Apply { func: VertexId, args: Vec<VertexId> },
}

/// Decode `id`, checking arity and index invariants against its tag.
pub fn explode(graph: &Graph, id: &VertexId) -> Result<Exploded, GraphError> {
    let vertex = graph.vertex(id)?;
    let kind = vertex.kind.tag();

    let mut params = Vec::new();
    let mut deps = Vec::new();
    let mut thens = Vec::new();
    let mut elses = Vec::new();
    for edge in graph.successors(id) {
        match edge.label {
            Label::Parameter(i) => params.push((i, edge.target)),
            Label::Dependency(i) => deps.push((i, edge.target)),
            Label::Branch(Branch::Then) => thens.push(edge.target),
            Label::Branch(Branch::Else) => elses.push(edge.target),
        }
    }
    let has_branches = !thens.is_empty() || !elses.is_empty();

    match &vertex.kind {
        VertexKind::Conditional(key) => {
            if !params.is_empty() || !deps.is_empty() {
                return Err(GraphError::ShapeMismatch {
                    vertex: *id,
                    kind,
                    detail: format!(
                        "{} parameter and {} dependency edge(s) next to branch edges",
                        params.len(),
                        deps.len()
                    ),
                });
            }
            match (thens.as_slice(), elses.as_slice()) {
                ([then_], [else_]) => Ok(Exploded::Conditional {
                    key: key.clone(),
                    then_: *then_,
                    else_: *else_,
                }),
                _ => Err(GraphError::MalformedConditional {
                    vertex: *id,
                    then_count: thens.len(),
                    else_count: elses.len(),
                }),
            }
        }
        VertexKind::Component(component) => {
            if has_branches {
                return Err(GraphError::ShapeMismatch {
                    vertex: *id,
                    kind,
                    detail: "branch edges on a component".to_string(),
                });
            }
            Ok(Exploded::Component {
                component: component.clone(),
                args: contiguous(*id, kind, "parameter", params)?,
                deps: contiguous(*id, kind, "dependency", deps)?,
            })
        }
        VertexKind::Apply => {
            if has_branches || !deps.is_empty() {
                return Err(GraphError::ShapeMismatch {
                    vertex: *id,
                    kind,
                    detail: "branch or dependency edges on an application".to_string(),
                });
            }
            let mut params = contiguous(*id, kind, "parameter", params)?;
            if params.len() < 2 {
                return Err(GraphError::ShapeMismatch {
                    vertex: *id,
                    kind,
                    detail: format!("expected at least 2 parameters, found {}", params.len()),
                });
            }
            let func = params.remove(0);
            Ok(Exploded::Apply { func, args: params })
        }
    }
}

/// Sort indexed children and require the indices to be exactly `0..n`.
fn contiguous(
    vertex: VertexId,
    kind: &'static str,
    role: &'static str,
    mut indexed: Vec<(usize, VertexId)>,
) -> Result<Vec<VertexId>, GraphError> {
    indexed.sort_by_key(|(i, _)| *i);
    if indexed.iter().enumerate().any(|(pos, (i, _))| pos != *i) {
        return Err(GraphError::NonContiguousIndices {
            vertex,
            kind,
            role,
            indices: indexed.iter().map(|(i, _)| *i).collect(),
        });
    }
    Ok(indexed.into_iter().map(|(_, target)| target).collect())
}
