//! Property-based tests for construction, normalization and evaluation.
//!
//! Random expression trees over a small key set are pushed through the
//! passes and checked against a direct evaluation of the tree.

use proptest::prelude::*;

use stager_core::graph::traverse::topological_sort;
use stager_core::hash::shape_hash;
use stager_core::pass::{flatten, hoist};
use stager_core::rewrite::find;
use stager_core::{
    create, eval, is_fully_reduced, normalize, Bindings, Device, EvalMode, Expr, Graph,
    GraphError, Key, NormalizeStats, VertexId,
};

const KEYS: [&str; 3] = ["k0", "k1", "k2"];

fn name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["a", "b", "c", "d"])
}

fn key() -> impl Strategy<Value = Key> {
    prop::sample::select(KEYS.to_vec()).prop_map(|k| Key::new(k))
}

fn leaf() -> impl Strategy<Value = Expr> {
    name().prop_map(|n| Expr::component(Device::new(n).into_component()))
}

/// Strategy for generating expression trees mixing all three node kinds.
fn expr() -> impl Strategy<Value = Expr> {
    leaf().prop_recursive(4, 16, 3, |inner| {
        prop_oneof![
            (key(), inner.clone(), inner.clone()).prop_map(|(k, t, e)| Expr::if_(k, t, e)),
            (inner.clone(), inner.clone()).prop_map(|(f, a)| Expr::app(f, a)),
            (name(), prop::collection::vec(inner, 0..3)).prop_map(|(n, deps)| {
                Expr::component_with(Device::new(n).into_component(), deps)
            }),
        ]
    })
}

fn bindings() -> impl Strategy<Value = Bindings> {
    prop::collection::vec(any::<bool>(), KEYS.len()).prop_map(|values| {
        KEYS.iter()
            .zip(values)
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    })
}

/// Component names of the tree-shaped reading of `expr` under `bindings`.
fn denote(expr: &Expr, bindings: &Bindings, out: &mut Vec<String>) {
    match expr {
        Expr::Impl { component, deps } => {
            out.push(component.name().to_string());
            for dep in deps {
                denote(dep, bindings, out);
            }
        }
        Expr::If { key, then_, else_ } => {
            if bindings.get(&key.name).unwrap_or(false) {
                denote(then_, bindings, out);
            } else {
                denote(else_, bindings, out);
            }
        }
        Expr::App { func, arg } => {
            denote(func, bindings, out);
            denote(arg, bindings, out);
        }
    }
}

/// Component names met on every path from `id`, counting shared vertices
/// once per path.
fn unfold(graph: &Graph, id: &VertexId, out: &mut Vec<String>) {
    if let Some(component) = graph.get_vertex(id).and_then(|v| v.component()) {
        out.push(component.name().to_string());
    }
    let children: Vec<VertexId> = graph.successors(id).map(|e| e.target).collect();
    for child in children {
        unfold(graph, &child, out);
    }
}

fn sorted_denotation(expr: &Expr, bindings: &Bindings) -> Vec<String> {
    let mut out = Vec::new();
    denote(expr, bindings, &mut out);
    out.sort();
    out
}

fn sorted_unfolding(graph: &Graph, root: &VertexId) -> Vec<String> {
    let mut out = Vec::new();
    unfold(graph, root, &mut out);
    out.sort();
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Every constructed graph satisfies the structural invariants.
    #[test]
    fn construction_is_well_formed(e in expr()) {
        let (root, graph) = create(&e).unwrap();
        prop_assert_eq!(graph.validate().unwrap(), root);
        prop_assert_eq!(graph.vertex_count(), e.size());
        prop_assert_eq!(topological_sort(&graph).unwrap().len(), e.size());
    }

    /// Normalization reaches a true fixpoint and re-running it changes nothing.
    #[test]
    fn normalize_is_idempotent(e in expr()) {
        let (_, graph) = create(&e).unwrap();
        let (graph, _) = normalize(graph).unwrap();
        let root = graph.validate().unwrap();

        let hoistable = find(&graph, |g, v| Ok::<_, GraphError>(hoist::conditional_child(g, v))).unwrap();
        prop_assert!(hoistable.is_none());
        let flattenable = find(&graph, |g, v| Ok::<_, GraphError>(flatten::applied_component(g, v))).unwrap();
        prop_assert!(flattenable.is_none());

        let before = shape_hash(&graph, &root).unwrap();
        let (again, stats) = normalize(graph).unwrap();
        prop_assert_eq!(stats, NormalizeStats::default());
        let root = again.validate().unwrap();
        prop_assert_eq!(shape_hash(&again, &root).unwrap(), before);
    }

    /// Full evaluation with every key bound leaves only components.
    #[test]
    fn full_evaluation_reduces(e in expr(), b in bindings()) {
        let (_, graph) = create(&e).unwrap();
        let (graph, _) = normalize(graph).unwrap();
        let (graph, _) = eval(graph, &b, EvalMode::Full).unwrap();
        prop_assert!(is_fully_reduced(&graph));
        graph.validate().unwrap();
    }

    /// Normalizing before evaluation selects the same components as reading
    /// the tree directly, and so does evaluating without normalizing.
    #[test]
    fn hoisting_preserves_denotation(e in expr(), b in bindings()) {
        let expected = sorted_denotation(&e, &b);

        let (_, raw) = create(&e).unwrap();
        let (raw, _) = eval(raw, &b, EvalMode::Full).unwrap();
        let raw_root = raw.validate().unwrap();
        prop_assert_eq!(&sorted_unfolding(&raw, &raw_root), &expected);

        let (_, graph) = create(&e).unwrap();
        let (graph, _) = normalize(graph).unwrap();
        let (graph, _) = eval(graph, &b, EvalMode::Full).unwrap();
        let root = graph.validate().unwrap();
        prop_assert_eq!(&sorted_unfolding(&graph, &root), &expected);
    }

    /// Partial evaluation with a subset of keys followed by full evaluation
    /// agrees with a single full evaluation.
    #[test]
    fn partial_then_full_agrees(e in expr(), b in bindings()) {
        let expected = sorted_denotation(&e, &b);
        let first: Bindings = b.iter().take(1).map(|(k, v)| (k.to_string(), v)).collect();

        let (_, graph) = create(&e).unwrap();
        let (graph, _) = normalize(graph).unwrap();
        let (graph, _) = eval(graph, &first, EvalMode::Partial).unwrap();
        graph.validate().unwrap();
        let (graph, _) = eval(graph, &b, EvalMode::Full).unwrap();
        let root = graph.validate().unwrap();
        prop_assert_eq!(&sorted_unfolding(&graph, &root), &expected);
    }
}
