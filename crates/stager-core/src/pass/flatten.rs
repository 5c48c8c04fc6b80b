//! Application flattening: collapse curried application chains into fully
//! applied component vertices.

use crate::graph::edge::Label;
use crate::graph::explode::{explode, Exploded};
use crate::graph::vertex::{Vertex, VertexId, VertexKind};
use crate::graph::{Graph, GraphError};
use crate::rewrite::{transform, RewriteLimit};

use super::resolve::prune;
use super::PassStats;

pub const PASS_NAME: &str = "remove-partial-app";

/// The function-position child of an application, if it is a component.
pub fn applied_component(graph: &Graph, vertex: &Vertex) -> Option<VertexId> {
    if !vertex.kind.is_apply() {
        return None;
    }
    graph
        .successors(&vertex.id)
        .find(|edge| edge.label == Label::Parameter(0))
        .map(|edge| edge.target)
        .filter(|func| {
            graph
                .get_vertex(func)
                .is_some_and(|f| f.kind.is_component())
        })
}

/// Run application flattening to a fixpoint.
pub fn flatten(graph: Graph, limit: RewriteLimit) -> Result<(Graph, PassStats), GraphError> {
    let mut pruned = 0;
    let (graph, rewrites) = transform(
        graph,
        PASS_NAME,
        limit,
        |g, v| Ok::<_, GraphError>(applied_component(g, v)),
        |g, v, _| {
            let (g, n) = remove_partial_app(g, v)?;
            pruned += n;
            Ok(g)
        },
    )?;
    Ok((graph, PassStats { rewrites, pruned }))
}

/// Replace application `v` of a component by a component applied to the
/// concatenated parameter list.
///
/// The applied component is reclaimed if `v` was its last parent. Returns
/// the rewritten graph and the number of vertices pruned.
pub fn remove_partial_app(mut graph: Graph, v: VertexId) -> Result<(Graph, usize), GraphError> {
    let (func, extra) = match explode(&graph, &v)? {
        Exploded::Apply { func, args } => (func, args),
        _ => {
            return Err(GraphError::ShapeMismatch {
                vertex: v,
                kind: graph.vertex(&v)?.kind.tag(),
                detail: "flattened vertex is not an application".to_string(),
            })
        }
    };
    let (component, args, deps) = match explode(&graph, &func)? {
        Exploded::Component {
            component,
            args,
            deps,
        } => (component, args, deps),
        _ => {
            return Err(GraphError::ShapeMismatch {
                vertex: func,
                kind: graph.vertex(&func)?.kind.tag(),
                detail: "applied function is not a component".to_string(),
            })
        }
    };

    let applied = graph.add_vertex(Vertex::new(VertexKind::Component(component)));
    for (i, arg) in args.iter().chain(extra.iter()).enumerate() {
        graph.connect(applied, *arg, Label::Parameter(i));
    }
    for (i, dep) in deps.iter().enumerate() {
        graph.connect(applied, *dep, Label::Dependency(i));
    }

    graph.redirect_incoming(v, applied);
    graph.remove_vertex(v);
    let pruned = prune(&mut graph, func, &[applied]);

    Ok((graph, pruned))
}
