//! End-to-end specialization: construct, normalize, evaluate.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::builder::create;
use crate::expr::Expr;
use crate::graph::traverse::{collect, Count};
use crate::graph::vertex::VertexId;
use crate::graph::{Graph, GraphError};
use crate::key::KeyResolver;
use crate::pass::{eval_with, is_fully_reduced, normalize_with, EvalError, EvalMode};
use crate::rewrite::RewriteLimit;

/// Knobs for [`specialize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpecializeConfig {
    pub mode: EvalMode,
    pub limit: RewriteLimit,
}

impl SpecializeConfig {
    pub fn partial() -> Self {
        Self {
            mode: EvalMode::Partial,
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: RewriteLimit) -> Self {
        self.limit = limit;
        self
    }
}

/// What a specialization run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpecializeReport {
    pub mode: EvalMode,
    pub initial_vertices: usize,
    pub hoisted: usize,
    pub flattened: usize,
    pub resolved: usize,
    pub pruned: usize,
    pub final_vertices: usize,
    pub fully_reduced: bool,
    pub duration_ms: u64,
}

/// A specialized graph with its root.
#[derive(Debug, Clone)]
pub struct Specialized {
    pub root: VertexId,
    pub graph: Graph,
    pub report: SpecializeReport,
}

/// Build the graph for `expr`, normalize it and resolve its conditionals.
///
/// In [`EvalMode::Full`] the result is guaranteed fully reduced.
pub fn specialize(
    expr: &Expr,
    resolver: &dyn KeyResolver,
    config: &SpecializeConfig,
) -> Result<Specialized, EvalError> {
    let start = Instant::now();
    let (_, graph) = create(expr)?;
    let initial_vertices = graph.vertex_count();
    debug!(vertices = initial_vertices, "graph constructed");

    let (graph, normalized) = normalize_with(graph, config.limit)?;
    let (graph, resolved) = eval_with(graph, resolver, config.mode, config.limit)?;
    let root = graph.validate()?;

    let fully_reduced = is_fully_reduced(&graph);
    if config.mode == EvalMode::Full && !fully_reduced {
        let Count(remaining) =
            collect(&graph, |kind| Count(usize::from(!kind.is_component())));
        return Err(GraphError::NotFullyReduced { remaining }.into());
    }

    let report = SpecializeReport {
        mode: config.mode,
        initial_vertices,
        hoisted: normalized.hoist.rewrites,
        flattened: normalized.flatten.rewrites,
        resolved: resolved.rewrites,
        pruned: normalized.hoist.pruned + normalized.flatten.pruned + resolved.pruned,
        final_vertices: graph.vertex_count(),
        fully_reduced,
        duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
    };
    info!(
        vertices = report.final_vertices,
        resolved = report.resolved,
        fully_reduced,
        "specialization complete"
    );

    Ok(Specialized {
        root,
        graph,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Device;
    use crate::key::{Bindings, Key};

    fn leaf(name: &str) -> Expr {
        Expr::component(Device::new(name).into_component())
    }

    fn network() -> Expr {
        Expr::app_all(
            leaf("app"),
            [
                Expr::if_(Key::new("dhcp").with_default(true), leaf("dhcp"), leaf("static")),
                Expr::if_(Key::new("socket"), leaf("socket"), leaf("direct")),
            ],
        )
    }

    #[test]
    fn full_specialization_reports_counts() {
        let bindings = Bindings::new().with("socket", false);
        let out = specialize(&network(), &bindings, &SpecializeConfig::default()).unwrap();

        assert!(out.report.fully_reduced);
        assert_eq!(out.report.initial_vertices, 9);
        // one decision per key on the selected path; the copy of the inner
        // conditional under the losing branch is pruned, not resolved
        assert_eq!(out.report.resolved, 2);
        assert_eq!(out.report.hoisted, 4);
        assert_eq!(out.report.final_vertices, 3);
        assert_eq!(out.root, out.graph.validate().unwrap());
        let app = out.graph.get_vertex(&out.root).unwrap().component().unwrap();
        assert_eq!(app.name(), "app");
    }

    #[test]
    fn partial_specialization_keeps_unbound() {
        let bindings = Bindings::new().with("dhcp", false);
        let out = specialize(&network(), &bindings, &SpecializeConfig::partial()).unwrap();
        assert!(!out.report.fully_reduced);
        assert_eq!(out.report.mode, EvalMode::Partial);
        assert!(out.graph.get_vertex(&out.root).unwrap().kind.is_conditional());
    }

    #[test]
    fn full_specialization_needs_every_key() {
        let err = specialize(&network(), &Bindings::new(), &SpecializeConfig::default())
            .unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn resolution_count_is_stable() {
        let bindings = Bindings::new().with("socket", false);
        for _ in 0..32 {
            let out = specialize(&network(), &bindings, &SpecializeConfig::default()).unwrap();
            assert_eq!(out.report.resolved, 2);
            assert_eq!(out.report.final_vertices, 3);
        }
    }

    #[test]
    fn tight_limit_is_a_configuration_error() {
        let config = SpecializeConfig::default().with_limit(RewriteLimit(1));
        let bindings = Bindings::new().with("socket", true);
        let err = specialize(&network(), &bindings, &config).unwrap_err();
        assert!(matches!(
            err,
            EvalError::Graph(GraphError::RewriteLimitExceeded { limit: 1, .. })
        ));
        assert!(err.is_configuration_error());
    }
}
