//! Ordered traversal and whole-graph aggregation.
//!
//! Downstream code generation visits surviving components with [`iter`] and
//! gathers global properties with [`collect`].

use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::vertex::{Vertex, VertexId, VertexKind};
use super::{Graph, GraphError};

/// Compute a topological ordering of the vertices.
///
/// For every edge `(u, v)`, `u` appears before `v`. Ties are broken by vertex
/// id so the order is deterministic for a given graph value.
pub fn topological_sort(graph: &Graph) -> Result<Vec<VertexId>, GraphError> {
    let mut in_degree: BTreeMap<VertexId, usize> =
        graph.vertex_ids().into_iter().map(|id| (id, 0)).collect();
    for edge in graph.edges() {
        if let Some(deg) = in_degree.get_mut(&edge.target) {
            *deg += 1;
        }
    }

    let mut ready: BTreeSet<VertexId> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(id, _)| *id)
        .collect();

    let mut order = Vec::with_capacity(graph.vertex_count());
    while let Some(id) = ready.pop_first() {
        order.push(id);
        for edge in graph.successors(&id) {
            if let Some(deg) = in_degree.get_mut(&edge.target) {
                *deg -= 1;
                if *deg == 0 {
                    ready.insert(edge.target);
                }
            }
        }
    }

    if order.len() < graph.vertex_count() {
        let stuck = in_degree
            .iter()
            .find(|(_, &deg)| deg > 0)
            .map(|(id, _)| *id)
            .ok_or(GraphError::NoRoot)?;
        return Err(GraphError::CycleDetected(stuck));
    }
    Ok(order)
}

/// Visit every vertex once, parents before children.
///
/// Fails with [`GraphError::CycleDetected`] before visiting anything if the
/// graph is not acyclic.
pub fn iter<F>(graph: &Graph, mut f: F) -> Result<(), GraphError>
where
    F: FnMut(&Vertex),
{
    for id in topological_sort(graph)? {
        f(graph.vertex(&id)?);
    }
    Ok(())
}

/// Like [`iter`], but stops at the first error returned by the callback.
pub fn try_iter<F, E>(graph: &Graph, mut f: F) -> Result<(), E>
where
    F: FnMut(&Vertex) -> Result<(), E>,
    E: From<GraphError>,
{
    for id in topological_sort(graph)? {
        f(graph.vertex(&id)?)?;
    }
    Ok(())
}

/// Every vertex reachable from `root`, `root` included.
pub fn reachable(graph: &Graph, root: &VertexId) -> HashSet<VertexId> {
    let mut seen = HashSet::new();
    let mut stack = vec![*root];
    while let Some(id) = stack.pop() {
        if !graph.contains_vertex(&id) || !seen.insert(id) {
            continue;
        }
        stack.extend(graph.successors(&id).map(|e| e.target));
    }
    seen
}

/// An associative operation with an identity element.
///
/// [`collect`] combines values in an unspecified order, so instances used
/// there should also be commutative.
pub trait Monoid {
    fn empty() -> Self;
    fn combine(self, other: Self) -> Self;
}

/// Counting monoid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Count(pub usize);

impl Monoid for Count {
    fn empty() -> Self {
        Count(0)
    }

    fn combine(self, other: Self) -> Self {
        Count(self.0 + other.0)
    }
}

/// Conjunction monoid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct All(pub bool);

impl Monoid for All {
    fn empty() -> Self {
        All(true)
    }

    fn combine(self, other: Self) -> Self {
        All(self.0 && other.0)
    }
}

/// Set-union monoid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Union<T: Ord>(pub BTreeSet<T>);

impl<T: Ord> Default for Union<T> {
    fn default() -> Self {
        Union(BTreeSet::new())
    }
}

impl<T: Ord> FromIterator<T> for Union<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Union(iter.into_iter().collect())
    }
}

impl<T: Ord> Monoid for Union<T> {
    fn empty() -> Self {
        Self::default()
    }

    fn combine(mut self, mut other: Self) -> Self {
        if self.0.len() < other.0.len() {
            std::mem::swap(&mut self, &mut other);
        }
        self.0.extend(other.0);
        self
    }
}

/// Fold `f` over the payload of every vertex.
pub fn collect<M, F>(graph: &Graph, mut f: F) -> M
where
    M: Monoid,
    F: FnMut(&VertexKind) -> M,
{
    graph
        .vertices()
        .fold(M::empty(), |acc, v| acc.combine(f(&v.kind)))
}
