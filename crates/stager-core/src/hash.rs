//! Content-addressed hashing of configuration graphs.
//!
//! A shape hash covers what a rooted graph computes (vertex tags, component
//! names, key names and labelled children) but not the randomly assigned
//! vertex ids, so two graphs built independently from the same expression
//! hash identically.

use std::collections::HashMap;

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::graph::edge::Label;
use crate::graph::traverse::{reachable, topological_sort};
use crate::graph::vertex::{VertexId, VertexKind};
use crate::graph::{Graph, GraphError};

/// A 32-byte SHA-256 content hash.
pub type ContentHash = [u8; 32];

#[derive(Debug, Error)]
pub enum HashError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("failed to encode value for hashing: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Compute the SHA-256 content hash of any serializable value.
pub fn content_hash<T: Serialize>(value: &T) -> Result<ContentHash, serde_json::Error> {
    let json = serde_json::to_vec(value)?;
    let mut hasher = Sha256::new();
    hasher.update(&json);
    Ok(hasher.finalize().into())
}

/// Format a content hash as a hex string.
pub fn hash_hex(hash: &ContentHash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Serialize)]
struct Shape<'a> {
    tag: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<&'a str>,
    children: Vec<(Label, String)>,
}

/// Hash the structure reachable from `root`.
///
/// Shared children contribute their hash once per referencing edge, so a
/// graph and its tree unfolding hash the same.
pub fn shape_hash(graph: &Graph, root: &VertexId) -> Result<ContentHash, HashError> {
    let live = reachable(graph, root);
    let order = topological_sort(graph)?;
    let mut hashes: HashMap<VertexId, String> = HashMap::new();
    let mut root_hash = None;

    for id in order.iter().rev().filter(|id| live.contains(id)) {
        let vertex = graph.vertex(id)?;
        let (name, key) = match &vertex.kind {
            VertexKind::Component(c) => (Some(c.name()), None),
            VertexKind::Conditional(k) => (None, Some(k.name.as_str())),
            VertexKind::Apply => (None, None),
        };
        let mut children = Vec::new();
        for edge in graph.successors(id) {
            let child = hashes
                .get(&edge.target)
                .ok_or(GraphError::VertexNotFound(edge.target))?;
            children.push((edge.label, child.clone()));
        }
        children.sort();

        let hash = content_hash(&Shape {
            tag: vertex.kind.tag(),
            name,
            key,
            children,
        })?;
        if id == root {
            root_hash = Some(hash);
        }
        hashes.insert(*id, hash_hex(&hash));
    }

    root_hash.ok_or_else(|| GraphError::VertexNotFound(*root).into())
}
