//! Conditional resolution against concrete key values, and in-degree driven
//! pruning of the branches that lose.

use std::collections::HashSet;

use tracing::trace;

use crate::graph::explode::{explode, Exploded};
use crate::graph::traverse::{collect, All};
use crate::graph::vertex::{Vertex, VertexId, VertexKind};
use crate::graph::{Graph, GraphError};
use crate::key::KeyResolver;
use crate::rewrite::{transform, RewriteLimit};

use super::{EvalError, EvalMode, PassStats};

pub const PASS_NAME: &str = "eval-if";

/// Whether `vertex` is a conditional this mode can resolve.
fn resolvable(resolver: &dyn KeyResolver, mode: EvalMode, vertex: &Vertex) -> bool {
    match &vertex.kind {
        VertexKind::Conditional(key) => match mode {
            EvalMode::Full => true,
            EvalMode::Partial => resolver.peek(key).is_some(),
        },
        _ => false,
    }
}

/// Whether some ancestor of `id` is itself resolvable in this mode.
///
/// Such an ancestor goes first: it may discard the branch holding `id`, whose
/// key then never needs a value.
fn shadowed(graph: &Graph, resolver: &dyn KeyResolver, mode: EvalMode, id: &VertexId) -> bool {
    let mut seen = HashSet::new();
    let mut stack: Vec<VertexId> = graph.predecessors(id).map(|e| e.source).collect();
    while let Some(parent) = stack.pop() {
        if !seen.insert(parent) {
            continue;
        }
        match graph.get_vertex(&parent) {
            Some(v) if resolvable(resolver, mode, v) => return true,
            Some(_) => stack.extend(graph.predecessors(&parent).map(|e| e.source)),
            None => {}
        }
    }
    false
}

/// Whether `vertex` is the next conditional to resolve: resolvable, with no
/// resolvable conditional above it.
fn selectable(graph: &Graph, resolver: &dyn KeyResolver, mode: EvalMode, vertex: &Vertex) -> bool {
    resolvable(resolver, mode, vertex) && !shadowed(graph, resolver, mode, &vertex.id)
}

/// Resolve conditionals to a fixpoint.
///
/// In [`EvalMode::Partial`] only conditionals whose key is already bound are
/// touched. In [`EvalMode::Full`] every conditional must resolve, and a key
/// that cannot be forced is reported as [`EvalError::UnboundKey`].
///
/// Conditionals resolve from the root down, so keys that only appear under a
/// discarded branch are never consulted.
pub fn resolve(
    graph: Graph,
    resolver: &dyn KeyResolver,
    mode: EvalMode,
    limit: RewriteLimit,
) -> Result<(Graph, PassStats), EvalError> {
    let mut pruned = 0;
    let (graph, rewrites) = transform(
        graph,
        PASS_NAME,
        limit,
        |g, v| Ok::<_, EvalError>(selectable(g, resolver, mode, v).then_some(())),
        |g, v, ()| {
            let (g, n) = eval_if(g, v, resolver, mode)?;
            pruned += n;
            Ok(g)
        },
    )?;
    Ok((graph, PassStats { rewrites, pruned }))
}

/// Replace conditional `c` by the branch its key selects and prune the other
/// branch.
///
/// Returns the rewritten graph and the number of vertices pruned.
pub fn eval_if(
    mut graph: Graph,
    c: VertexId,
    resolver: &dyn KeyResolver,
    mode: EvalMode,
) -> Result<(Graph, usize), EvalError> {
    let (key, then_, else_) = match explode(&graph, &c)? {
        Exploded::Conditional { key, then_, else_ } => (key, then_, else_),
        _ => {
            return Err(GraphError::ShapeMismatch {
                vertex: c,
                kind: graph.vertex(&c)?.kind.tag(),
                detail: "resolved vertex is not a conditional".to_string(),
            }
            .into())
        }
    };

    let value = match mode {
        EvalMode::Full => resolver.force(&key),
        EvalMode::Partial => resolver.peek(&key),
    }
    .ok_or_else(|| EvalError::UnboundKey {
        key: key.name.clone(),
    })?;

    let (selected, discarded) = if value { (then_, else_) } else { (else_, then_) };
    graph.redirect_incoming(c, selected);
    graph.remove_vertex(c);
    let pruned = if discarded == selected {
        0
    } else {
        prune(&mut graph, discarded, &[selected])
    };
    trace!(key = %key, value, pruned, "conditional resolved");

    Ok((graph, pruned))
}

/// Remove `start` if nothing references it any more, then recursively every
/// child left without parents.
///
/// Vertices in `keep` and vertices that still have a parent are never
/// removed. Returns the number of vertices removed.
pub fn prune(graph: &mut Graph, start: VertexId, keep: &[VertexId]) -> usize {
    let mut removed = 0;
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        if keep.contains(&id) || !graph.contains_vertex(&id) || graph.in_degree(&id) > 0 {
            continue;
        }
        let children = graph.children(&id);
        graph.remove_vertex(id);
        removed += 1;
        stack.extend(children);
    }
    removed
}

/// True iff every vertex is a component.
pub fn is_fully_reduced(graph: &Graph) -> bool {
    let All(reduced) = collect(graph, |kind| All(kind.is_component()));
    reduced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{create, GraphBuilder};
    use crate::component::Device;
    use crate::expr::Expr;
    use crate::key::{Bindings, Key};

    fn leaf(name: &str) -> Expr {
        Expr::component(Device::new(name).into_component())
    }

    fn has_component(g: &Graph, name: &str) -> bool {
        g.vertices()
            .any(|v| v.component().is_some_and(|c| c.name() == name))
    }

    #[test]
    fn selects_then_branch_and_prunes_else() {
        let expr = Expr::if_(
            Key::new("k"),
            leaf("a"),
            Expr::component_with(Device::new("b").into_component(), vec![leaf("b_dep")]),
        );
        let (_, g) = create(&expr).unwrap();
        let bindings = Bindings::new().with("k", true);
        let (g, stats) = resolve(g, &bindings, EvalMode::Full, RewriteLimit::default()).unwrap();

        assert_eq!(stats.rewrites, 1);
        assert_eq!(stats.pruned, 2);
        assert_eq!(g.vertex_count(), 1);
        assert!(has_component(&g, "a"));
        assert!(is_fully_reduced(&g));
    }

    #[test]
    fn shared_vertex_survives_pruning() {
        // if k then a(dep shared) else b(dep shared)
        let mut b = GraphBuilder::new();
        let shared = b.add_component(Device::new("shared").into_component(), &[], &[]);
        let a = b.add_component(Device::new("a").into_component(), &[], &[shared]);
        let bv = b.add_component(Device::new("b").into_component(), &[], &[shared]);
        b.add_conditional(Key::new("k"), a, bv);
        let (_, g) = b.build().unwrap();

        let bindings = Bindings::new().with("k", false);
        let (g, stats) = resolve(g, &bindings, EvalMode::Full, RewriteLimit::default()).unwrap();
        assert_eq!(stats.pruned, 1);
        assert!(!g.contains_vertex(&a));
        assert!(g.contains_vertex(&shared));
        assert_eq!(g.validate().unwrap(), bv);
    }

    #[test]
    fn selected_branch_reachable_from_discarded_is_kept() {
        // if k then a else b(dep a): resolving to `a` must not prune it via `b`
        let mut b = GraphBuilder::new();
        let a = b.add_component(Device::new("a").into_component(), &[], &[]);
        let bv = b.add_component(Device::new("b").into_component(), &[], &[a]);
        b.add_conditional(Key::new("k"), a, bv);
        let (_, g) = b.build().unwrap();

        let bindings = Bindings::new().with("k", true);
        let (g, _) = resolve(g, &bindings, EvalMode::Full, RewriteLimit::default()).unwrap();
        assert_eq!(g.vertex_count(), 1);
        assert_eq!(g.validate().unwrap(), a);
    }

    #[test]
    fn identical_arms() {
        let mut b = GraphBuilder::new();
        let a = b.add_component(Device::new("a").into_component(), &[], &[]);
        b.add_conditional(Key::new("k"), a, a);
        let (_, g) = b.build().unwrap();

        let bindings = Bindings::new().with("k", false);
        let (g, stats) = resolve(g, &bindings, EvalMode::Full, RewriteLimit::default()).unwrap();
        assert_eq!(stats.pruned, 0);
        assert_eq!(g.validate().unwrap(), a);
    }

    #[test]
    fn partial_leaves_unbound_conditionals() {
        let expr = Expr::if_(
            Key::new("outer"),
            Expr::if_(Key::new("inner"), leaf("a"), leaf("b")),
            leaf("c"),
        );
        let (_, g) = create(&expr).unwrap();
        let bindings = Bindings::new().with("outer", true);
        let (g, stats) =
            resolve(g, &bindings, EvalMode::Partial, RewriteLimit::default()).unwrap();

        assert_eq!(stats.rewrites, 1);
        assert!(!has_component(&g, "c"));
        assert!(!is_fully_reduced(&g));
        let root = g.validate().unwrap();
        match &g.get_vertex(&root).unwrap().kind {
            VertexKind::Conditional(key) => assert_eq!(key.name, "inner"),
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn partial_ignores_defaults() {
        let expr = Expr::if_(Key::new("k").with_default(true), leaf("a"), leaf("b"));
        let (_, g) = create(&expr).unwrap();
        let (g, stats) =
            resolve(g, &Bindings::new(), EvalMode::Partial, RewriteLimit::default()).unwrap();
        assert_eq!(stats.rewrites, 0);
        assert_eq!(g.vertex_count(), 3);
    }

    #[test]
    fn full_uses_defaults() {
        let expr = Expr::if_(Key::new("k").with_default(false), leaf("a"), leaf("b"));
        let (_, g) = create(&expr).unwrap();
        let (g, _) =
            resolve(g, &Bindings::new(), EvalMode::Full, RewriteLimit::default()).unwrap();
        assert!(has_component(&g, "b"));
        assert_eq!(g.vertex_count(), 1);
    }

    #[test]
    fn full_reports_unbound_key() {
        let expr = Expr::if_(Key::new("net"), leaf("a"), leaf("b"));
        let (_, g) = create(&expr).unwrap();
        let err = resolve(g, &Bindings::new(), EvalMode::Full, RewriteLimit::default())
            .unwrap_err();
        assert!(err.is_configuration_error());
        assert!(matches!(err, EvalError::UnboundKey { ref key } if key == "net"));
    }

    #[test]
    fn keys_under_discarded_branch_are_never_forced() {
        // `inner` is unbound but sits under the branch `outer=false` discards
        let bindings = Bindings::new().with("outer", false);
        for _ in 0..64 {
            let expr = Expr::if_(
                Key::new("outer"),
                Expr::if_(Key::new("inner"), leaf("a"), leaf("b")),
                leaf("c"),
            );
            let (_, g) = create(&expr).unwrap();
            let (g, stats) =
                resolve(g, &bindings, EvalMode::Full, RewriteLimit::default()).unwrap();
            assert_eq!(stats.rewrites, 1);
            assert_eq!(stats.pruned, 3);
            assert!(has_component(&g, "c"));
            assert_eq!(g.vertex_count(), 1);
        }
    }

    #[test]
    fn outer_conditional_resolves_before_nested_one() {
        // both bound: the nested conditional is pruned with its branch instead
        // of being resolved on its own
        let bindings = Bindings::new().with("outer", true).with("inner", false);
        for _ in 0..64 {
            let expr = Expr::if_(
                Key::new("outer"),
                leaf("a"),
                Expr::component_with(
                    Device::new("b").into_component(),
                    vec![Expr::if_(Key::new("inner"), leaf("c"), leaf("d"))],
                ),
            );
            let (_, g) = create(&expr).unwrap();
            let (g, stats) =
                resolve(g, &bindings, EvalMode::Full, RewriteLimit::default()).unwrap();
            assert_eq!(stats.rewrites, 1);
            assert_eq!(stats.pruned, 4);
            g.validate().unwrap();
            assert_eq!(g.vertex_count(), 1);
            assert!(has_component(&g, "a"));
        }
    }

    #[test]
    fn partial_skips_past_unbound_ancestor() {
        let expr = Expr::if_(
            Key::new("outer"),
            Expr::if_(Key::new("inner"), leaf("a"), leaf("b")),
            leaf("c"),
        );
        let (_, g) = create(&expr).unwrap();
        let bindings = Bindings::new().with("inner", true);
        let (g, stats) =
            resolve(g, &bindings, EvalMode::Partial, RewriteLimit::default()).unwrap();
        assert_eq!(stats.rewrites, 1);
        assert!(!has_component(&g, "b"));
        assert_eq!(g.vertex_count(), 3);
    }

    #[test]
    fn prune_respects_keep() {
        let (root, mut g) = create(&leaf("a")).unwrap();
        assert_eq!(prune(&mut g, root, &[root]), 0);
        assert_eq!(prune(&mut g, root, &[]), 1);
        assert!(g.is_empty());
    }
}
