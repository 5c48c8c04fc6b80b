//! Diagnostic views over stager configuration graphs.
//!
//! Provides a Graphviz export and a textual summary. Every view also yields a
//! JSON form for tooling.

pub mod dot;
pub mod error;
pub mod format;
pub mod summary;
pub mod view;

pub use dot::DotView;
pub use error::ObserveError;
pub use format::{compute_levels, edge_attributes, vertex_label};
pub use summary::SummaryView;
pub use view::{available_views, view_for, RenderContext, View, ViewFormat, ViewKind, ViewOutput};
