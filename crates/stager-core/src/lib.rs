//! Configuration graph specialization.
//!
//! An [`Expr`] describing components, conditionals on late-bound keys and
//! curried applications is turned into a rooted DAG ([`Graph`]), normalized
//! so every conditional sits above the structure depending on it, and then
//! evaluated against key values until only components remain.

pub mod builder;
pub mod component;
pub mod expr;
pub mod graph;
pub mod hash;
pub mod key;
pub mod pass;
pub mod pipeline;
pub mod rewrite;

pub use builder::{create, GraphBuilder};
pub use component::{Component, ComponentError, Device, Info, Package};
pub use expr::Expr;
pub use graph::edge::{Branch, Edge, EdgeId, Label};
pub use graph::explode::{explode, Exploded};
pub use graph::vertex::{Vertex, VertexId, VertexKind};
pub use graph::{Graph, GraphError};
pub use key::{Bindings, Key, KeyResolver};
pub use pass::{eval, is_fully_reduced, normalize, EvalError, EvalMode, NormalizeStats, PassStats};
pub use pipeline::{specialize, SpecializeConfig, SpecializeReport, Specialized};
pub use rewrite::RewriteLimit;
