//! Errors from the observability layer.

use stager_core::graph::GraphError;
use thiserror::Error;

/// Errors that can occur during view rendering.
#[derive(Debug, Error)]
pub enum ObserveError {
    #[error("unknown view: '{name}'. Available views: dot, summary")]
    UnknownView { name: String },

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
