//! Core graph data structures: vertices, labelled edges, and the graph store.
//!
//! A configuration graph is a rooted DAG. Parents point at their children
//! through edges labelled `Parameter(i)`, `Dependency(i)` or `Branch(_)`.
//! Children may be shared by several parents, so removal is always driven by
//! in-degree rather than by tree ownership.
//!
//! The store is a plain owned value. Passes take a `Graph` by value and hand
//! back a new one; a clone taken beforehand is never affected.

pub mod edge;
pub mod explode;
pub mod traverse;
pub mod vertex;

use std::collections::HashMap;

use thiserror::Error;

use self::edge::{Edge, EdgeId, Label};
use self::vertex::{Vertex, VertexId};

/// Internal invariant violations.
///
/// These signal a defect in construction or rewriting and are never expected
/// in correct operation. The exception is
/// [`GraphError::RewriteLimitExceeded`], which means a well-formed input
/// needed more rewrites than allowed; see [`GraphError::is_limit`].
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("vertex not found: {0}")]
    VertexNotFound(VertexId),

    #[error("{kind} vertex {vertex} has non-contiguous {role} indices {indices:?}")]
    NonContiguousIndices {
        vertex: VertexId,
        kind: &'static str,
        role: &'static str,
        indices: Vec<usize>,
    },

    #[error("conditional vertex {vertex} has {then_count} then-branch(es) and {else_count} else-branch(es)")]
    MalformedConditional {
        vertex: VertexId,
        then_count: usize,
        else_count: usize,
    },

    #[error("{kind} vertex {vertex} has an invalid shape: {detail}")]
    ShapeMismatch {
        vertex: VertexId,
        kind: &'static str,
        detail: String,
    },

    #[error("cycle detected involving vertex {0}")]
    CycleDetected(VertexId),

    #[error("graph has no root vertex")]
    NoRoot,

    #[error("graph has {count} root vertices, expected exactly one")]
    MultipleRoots { count: usize },

    #[error("vertex {0} is not reachable from the root")]
    Unreachable(VertexId),

    #[error("{pass} exceeded the limit of {limit} rewrites (raise `[rewrite] limit`)")]
    RewriteLimitExceeded { pass: &'static str, limit: usize },

    #[error("full evaluation left {remaining} non-component vertex(es) behind")]
    NotFullyReduced { remaining: usize },
}

impl GraphError {
    /// True when the error reports a resource limit rather than a defect.
    pub fn is_limit(&self) -> bool {
        matches!(self, GraphError::RewriteLimitExceeded { .. })
    }
}

/// The graph store.
///
/// Stores vertices and edges with lookup by ID and per-vertex adjacency
/// indexes. Store operations never fail; keeping the graph well formed is the
/// caller's job, and [`Graph::validate`] checks the result.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    vertices: HashMap<VertexId, Vertex>,
    edges: HashMap<EdgeId, Edge>,

    /// Index: vertex -> outgoing edges (edges where this vertex is the source)
    outgoing: HashMap<VertexId, Vec<EdgeId>>,
    /// Index: vertex -> incoming edges (edges where this vertex is the target)
    incoming: HashMap<VertexId, Vec<EdgeId>>,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a vertex, replacing any vertex with the same ID.
    pub fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
        let id = vertex.id;
        self.outgoing.entry(id).or_default();
        self.incoming.entry(id).or_default();
        self.vertices.insert(id, vertex);
        id
    }

    /// Insert an edge.
    pub fn add_edge(&mut self, edge: Edge) -> EdgeId {
        let id = edge.id;
        self.outgoing.entry(edge.source).or_default().push(id);
        self.incoming.entry(edge.target).or_default().push(id);
        self.edges.insert(id, edge);
        id
    }

    /// Insert a fresh edge `source -[label]-> target`.
    pub fn connect(&mut self, source: VertexId, target: VertexId, label: Label) -> EdgeId {
        self.add_edge(Edge::new(source, target, label))
    }

    /// Look up a vertex by ID.
    pub fn get_vertex(&self, id: &VertexId) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    /// Look up a vertex by ID, failing with [`GraphError::VertexNotFound`].
    pub fn vertex(&self, id: &VertexId) -> Result<&Vertex, GraphError> {
        self.vertices.get(id).ok_or(GraphError::VertexNotFound(*id))
    }

    /// Whether the graph contains a vertex.
    pub fn contains_vertex(&self, id: &VertexId) -> bool {
        self.vertices.contains_key(id)
    }

    /// IDs of all outgoing edges of a vertex, in insertion order.
    pub fn outgoing_edges(&self, id: &VertexId) -> &[EdgeId] {
        self.outgoing.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// IDs of all incoming edges of a vertex, in insertion order.
    pub fn incoming_edges(&self, id: &VertexId) -> &[EdgeId] {
        self.incoming.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Outgoing edges of a vertex.
    pub fn successors(&self, id: &VertexId) -> impl Iterator<Item = &Edge> {
        self.outgoing_edges(id)
            .iter()
            .filter_map(|eid| self.edges.get(eid))
    }

    /// Incoming edges of a vertex.
    pub fn predecessors(&self, id: &VertexId) -> impl Iterator<Item = &Edge> {
        self.incoming_edges(id)
            .iter()
            .filter_map(|eid| self.edges.get(eid))
    }

    /// Distinct children of a vertex, in edge insertion order.
    pub fn children(&self, id: &VertexId) -> Vec<VertexId> {
        let mut out: Vec<VertexId> = Vec::new();
        for edge in self.successors(id) {
            if !out.contains(&edge.target) {
                out.push(edge.target);
            }
        }
        out
    }

    /// Number of edges pointing into a vertex.
    pub fn in_degree(&self, id: &VertexId) -> usize {
        self.incoming_edges(id).len()
    }

    /// Number of edges leaving a vertex.
    pub fn out_degree(&self, id: &VertexId) -> usize {
        self.outgoing_edges(id).len()
    }

    /// Return the total number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Return the total number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Iterate over all vertices.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    /// All vertex IDs, sorted.
    pub fn vertex_ids(&self) -> Vec<VertexId> {
        let mut ids: Vec<VertexId> = self.vertices.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Iterate over all edges.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Remove an edge, returning it if it was present.
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let edge = self.edges.remove(&id)?;
        if let Some(list) = self.outgoing.get_mut(&edge.source) {
            list.retain(|&eid| eid != id);
        }
        if let Some(list) = self.incoming.get_mut(&edge.target) {
            list.retain(|&eid| eid != id);
        }
        Some(edge)
    }

    /// Remove a vertex and every edge touching it.
    pub fn remove_vertex(&mut self, id: VertexId) -> Option<Vertex> {
        let vertex = self.vertices.remove(&id)?;

        let out_edges = self.outgoing.remove(&id).unwrap_or_default();
        let in_edges = self.incoming.remove(&id).unwrap_or_default();

        for eid in out_edges {
            if let Some(edge) = self.edges.remove(&eid) {
                if let Some(list) = self.incoming.get_mut(&edge.target) {
                    list.retain(|&e| e != eid);
                }
            }
        }
        for eid in in_edges {
            if let Some(edge) = self.edges.remove(&eid) {
                if let Some(list) = self.outgoing.get_mut(&edge.source) {
                    list.retain(|&e| e != eid);
                }
            }
        }

        Some(vertex)
    }

    /// Point every edge entering `from` at `to` instead, keeping labels.
    ///
    /// Returns the number of edges moved.
    pub fn redirect_incoming(&mut self, from: VertexId, to: VertexId) -> usize {
        let incoming: Vec<EdgeId> = self.incoming_edges(&from).to_vec();
        let mut moved = 0;
        for edge_id in incoming {
            if let Some(edge) = self.remove_edge(edge_id) {
                self.add_edge(edge.to_target(to));
                moved += 1;
            }
        }
        moved
    }

    /// All vertices without incoming edges, sorted.
    pub fn roots(&self) -> Vec<VertexId> {
        let mut roots: Vec<VertexId> = self
            .vertices
            .keys()
            .filter(|id| self.in_degree(id) == 0)
            .copied()
            .collect();
        roots.sort();
        roots
    }

    /// The unique vertex without incoming edges.
    pub fn root(&self) -> Result<VertexId, GraphError> {
        match self.roots().as_slice() {
            [] => Err(GraphError::NoRoot),
            [root] => Ok(*root),
            many => Err(GraphError::MultipleRoots { count: many.len() }),
        }
    }

    /// Check every structural invariant and return the root.
    ///
    /// - every vertex decodes (arity, contiguous indices, tag/shape agreement)
    /// - the graph is acyclic
    /// - exactly one vertex has no incoming edges
    /// - every vertex is reachable from that root
    pub fn validate(&self) -> Result<VertexId, GraphError> {
        for id in self.vertex_ids() {
            explode::explode(self, &id)?;
        }
        traverse::topological_sort(self)?;
        let root = self.root()?;
        let reachable = traverse::reachable(self, &root);
        if let Some(orphan) = self
            .vertex_ids()
            .into_iter()
            .find(|id| !reachable.contains(id))
        {
            return Err(GraphError::Unreachable(orphan));
        }
        Ok(root)
    }
}
