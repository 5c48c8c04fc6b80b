//! The rewriting passes and their composition.
//!
//! [`normalize`] runs branch hoisting then application flattening, each to a
//! fixpoint. [`eval`] resolves conditionals against key values.

pub mod flatten;
pub mod hoist;
pub mod resolve;

use serde::Serialize;
use thiserror::Error;

use crate::graph::{Graph, GraphError};
use crate::key::KeyResolver;
use crate::rewrite::RewriteLimit;

pub use resolve::{is_fully_reduced, prune};

/// How much of the graph [`eval`] must resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EvalMode {
    /// Every conditional must resolve; an unbound key is an error.
    #[default]
    Full,
    /// Only conditionals whose key is already bound resolve.
    Partial,
}

/// Errors raised while evaluating a graph.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("configuration key `{key}` has no value; bind it or give it a default")]
    UnboundKey { key: String },
}

impl EvalError {
    /// True for errors the user can fix by supplying configuration: an
    /// unbound key, or a graph too large for the configured rewrite limit.
    pub fn is_configuration_error(&self) -> bool {
        match self {
            EvalError::UnboundKey { .. } => true,
            EvalError::Graph(e) => e.is_limit(),
        }
    }
}

/// Counters reported by a single pass run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    pub rewrites: usize,
    pub pruned: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    pub hoist: PassStats,
    pub flatten: PassStats,
}

/// Hoist every conditional above component and application structure, then
/// collapse application chains.
pub fn normalize(graph: Graph) -> Result<(Graph, NormalizeStats), GraphError> {
    normalize_with(graph, RewriteLimit::default())
}

pub fn normalize_with(
    graph: Graph,
    limit: RewriteLimit,
) -> Result<(Graph, NormalizeStats), GraphError> {
    let (graph, hoist) = hoist::hoist(graph, limit)?;
    let (graph, flatten) = flatten::flatten(graph, limit)?;
    Ok((graph, NormalizeStats { hoist, flatten }))
}

/// Resolve conditionals using `resolver`.
pub fn eval(
    graph: Graph,
    resolver: &dyn KeyResolver,
    mode: EvalMode,
) -> Result<(Graph, PassStats), EvalError> {
    eval_with(graph, resolver, mode, RewriteLimit::default())
}

pub fn eval_with(
    graph: Graph,
    resolver: &dyn KeyResolver,
    mode: EvalMode,
    limit: RewriteLimit,
) -> Result<(Graph, PassStats), EvalError> {
    resolve::resolve(graph, resolver, mode, limit)
}
