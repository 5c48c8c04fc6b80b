//! Fixpoint rewriting: find a matching vertex, rewrite, repeat.
//!
//! Every normalization and evaluation pass is a `(predicate, apply)` pair
//! driven by [`transform`]. A pass terminates when its `apply` removes the
//! matched vertex without creating an unbounded supply of new matches; the
//! [`RewriteLimit`] turns a violation of that contract into an error instead
//! of a hang.

use tracing::{debug, trace};

use crate::graph::vertex::{Vertex, VertexId};
use crate::graph::{Graph, GraphError};

/// Maximum number of rewrites a single fixpoint run may apply.
///
/// Hoisting duplicates context per conditional, so an application over `n`
/// independent conditionals needs on the order of `2^n` rewrites. Inputs
/// that outgrow the limit are rejected with
/// [`GraphError::RewriteLimitExceeded`], a configuration error the caller can
/// fix by raising the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteLimit(pub usize);

impl Default for RewriteLimit {
    fn default() -> Self {
        RewriteLimit(100_000)
    }
}

/// Return the first vertex for which `predicate` yields a match.
///
/// Vertices are scanned in unspecified order; the scan stops at the first
/// match.
pub fn find<T, E, P>(graph: &Graph, mut predicate: P) -> Result<Option<(VertexId, T)>, E>
where
    P: FnMut(&Graph, &Vertex) -> Result<Option<T>, E>,
{
    for vertex in graph.vertices() {
        if let Some(found) = predicate(graph, vertex)? {
            return Ok(Some((vertex.id, found)));
        }
    }
    Ok(None)
}

/// Rewrite `graph` with `apply` until `predicate` matches nothing.
///
/// Returns the fixpoint graph and the number of rewrites applied.
pub fn transform<T, E, P, A>(
    mut graph: Graph,
    pass: &'static str,
    limit: RewriteLimit,
    mut predicate: P,
    mut apply: A,
) -> Result<(Graph, usize), E>
where
    P: FnMut(&Graph, &Vertex) -> Result<Option<T>, E>,
    A: FnMut(Graph, VertexId, T) -> Result<Graph, E>,
    E: From<GraphError>,
{
    let mut rewrites = 0;
    while let Some((id, found)) = find(&graph, &mut predicate)? {
        if rewrites == limit.0 {
            return Err(GraphError::RewriteLimitExceeded {
                pass,
                limit: limit.0,
            }
            .into());
        }
        graph = apply(graph, id, found)?;
        rewrites += 1;
        trace!(pass, vertex = %id, "rewrite applied");
    }
    debug!(
        pass,
        rewrites,
        vertices = graph.vertex_count(),
        "fixpoint reached"
    );
    Ok((graph, rewrites))
}
