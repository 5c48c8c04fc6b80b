//! Branch hoisting: commute conditionals upward past components and
//! applications.
//!
//! For a component or application `v` with a conditional child
//! `c = if k then t else e`, the rewrite builds
//!
//! ```text
//! if k then v[c := t] else v[c := e]
//! ```
//!
//! out of two fresh copies of `v`, moves every edge that entered `v` onto the
//! new conditional, and drops `v`. `c` is dropped too unless another parent
//! still points at it. Only `v` is copied; its other children are shared by
//! both copies.

use crate::graph::edge::{Branch, Edge, Label};
use crate::graph::explode::{explode, Exploded};
use crate::graph::vertex::{Vertex, VertexId, VertexKind};
use crate::graph::{Graph, GraphError};
use crate::rewrite::{transform, RewriteLimit};

use super::resolve::prune;
use super::PassStats;

pub const PASS_NAME: &str = "push-if";

/// The first conditional child of a component or application vertex.
pub fn conditional_child(graph: &Graph, vertex: &Vertex) -> Option<VertexId> {
    if vertex.kind.is_conditional() {
        return None;
    }
    graph
        .successors(&vertex.id)
        .map(|edge| edge.target)
        .find(|child| {
            graph
                .get_vertex(child)
                .is_some_and(|c| c.kind.is_conditional())
        })
}

/// Run branch hoisting to a fixpoint.
pub fn hoist(graph: Graph, limit: RewriteLimit) -> Result<(Graph, PassStats), GraphError> {
    let mut pruned = 0;
    let (graph, rewrites) = transform(
        graph,
        PASS_NAME,
        limit,
        |g, v| Ok::<_, GraphError>(conditional_child(g, v)),
        |g, v, c| {
            let (g, n) = push_if(g, v, c)?;
            pruned += n;
            Ok(g)
        },
    )?;
    Ok((graph, PassStats { rewrites, pruned }))
}

/// Hoist conditional child `c` above its parent `v`.
///
/// Returns the rewritten graph and the number of vertices pruned.
pub fn push_if(
    mut graph: Graph,
    v: VertexId,
    c: VertexId,
) -> Result<(Graph, usize), GraphError> {
    let (key, then_, else_) = match explode(&graph, &c)? {
        Exploded::Conditional { key, then_, else_ } => (key, then_, else_),
        _ => {
            return Err(GraphError::ShapeMismatch {
                vertex: c,
                kind: graph.vertex(&c)?.kind.tag(),
                detail: "hoisted child is not a conditional".to_string(),
            })
        }
    };

    let parent = graph.vertex(&v)?.clone();
    let edges: Vec<Edge> = graph.successors(&v).cloned().collect();

    let v_then = graph.add_vertex(parent.fresh_copy());
    let v_else = graph.add_vertex(parent.fresh_copy());
    for edge in &edges {
        if edge.target == c {
            graph.connect(v_then, then_, edge.label);
            graph.connect(v_else, else_, edge.label);
        } else {
            graph.add_edge(edge.from_source(v_then));
            graph.add_edge(edge.from_source(v_else));
        }
    }

    let hoisted = graph.add_vertex(Vertex::new(VertexKind::Conditional(key)));
    graph.connect(hoisted, v_then, Label::Branch(Branch::Then));
    graph.connect(hoisted, v_else, Label::Branch(Branch::Else));

    graph.redirect_incoming(v, hoisted);
    graph.remove_vertex(v);
    let pruned = prune(&mut graph, c, &[hoisted]);

    Ok((graph, pruned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{create, GraphBuilder};
    use crate::component::Device;
    use crate::expr::Expr;
    use crate::key::Key;

    fn leaf(name: &str) -> Expr {
        Expr::component(Device::new(name).into_component())
    }

    fn name_of(g: &Graph, id: &VertexId) -> String {
        g.get_vertex(id).unwrap().component().unwrap().name().to_string()
    }

    #[test]
    fn hoists_through_application() {
        let expr = Expr::app(leaf("wrap"), Expr::if_(Key::new("k"), leaf("a"), leaf("b")));
        let (_, g) = create(&expr).unwrap();
        let (g, stats) = hoist(g, RewriteLimit::default()).unwrap();

        assert_eq!(stats.rewrites, 1);
        let root = g.validate().unwrap();
        match explode(&g, &root).unwrap() {
            Exploded::Conditional { key, then_, else_ } => {
                assert_eq!(key.name, "k");
                for (arm, expected) in [(then_, "a"), (else_, "b")] {
                    match explode(&g, &arm).unwrap() {
                        Exploded::Apply { func, args } => {
                            assert_eq!(name_of(&g, &func), "wrap");
                            assert_eq!(name_of(&g, &args[0]), expected);
                        }
                        other => panic!("unexpected {other:?}"),
                    }
                }
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn copies_share_untouched_children() {
        // stack(dep0 = clock, dep1 = if k then eth else tap)
        let expr = Expr::component_with(
            Device::new("stack").into_component(),
            vec![leaf("clock"), Expr::if_(Key::new("k"), leaf("eth"), leaf("tap"))],
        );
        let (_, g) = create(&expr).unwrap();
        let (g, _) = hoist(g, RewriteLimit::default()).unwrap();
        g.validate().unwrap();

        // the clock is shared by both copies instead of being duplicated
        let clocks: Vec<_> = g
            .vertices()
            .filter(|v| v.component().is_some_and(|c| c.name() == "clock"))
            .collect();
        assert_eq!(clocks.len(), 1);
        assert_eq!(g.in_degree(&clocks[0].id), 2);
        // dependency labels survive on the copies
        for edge in g.predecessors(&clocks[0].id) {
            assert_eq!(edge.label, Label::Dependency(0));
        }
        assert_eq!(g.vertex_count(), 6);
    }

    #[test]
    fn nested_conditionals_reach_the_top() {
        let expr = Expr::app(
            leaf("f"),
            Expr::app(leaf("g"), Expr::if_(Key::new("k"), leaf("a"), leaf("b"))),
        );
        let (_, g) = create(&expr).unwrap();
        let (g, stats) = hoist(g, RewriteLimit::default()).unwrap();

        assert_eq!(stats.rewrites, 2);
        let root = g.validate().unwrap();
        assert!(g.get_vertex(&root).unwrap().kind.is_conditional());
        for v in g.vertices() {
            assert!(conditional_child(&g, v).is_none());
        }
    }

    #[test]
    fn shared_conditional_survives_partial_hoist() {
        let mut b = GraphBuilder::new();
        let x = b.add_component(Device::new("x").into_component(), &[], &[]);
        let y = b.add_component(Device::new("y").into_component(), &[], &[]);
        let cond = b.add_conditional(Key::new("k"), x, y);
        let p = b.add_component(Device::new("p").into_component(), &[], &[cond]);
        let q = b.add_component(Device::new("q").into_component(), &[], &[cond]);
        b.add_conditional(Key::new("top"), p, q);
        let (_, g) = b.build().unwrap();

        let (g, pruned) = push_if(g, p, cond).unwrap();
        assert_eq!(pruned, 0);
        assert!(g.contains_vertex(&cond));
        assert_eq!(g.in_degree(&cond), 1);
        g.validate().unwrap();

        let (g, _) = hoist(g, RewriteLimit::default()).unwrap();
        assert!(!g.contains_vertex(&cond));
        g.validate().unwrap();
    }
}
