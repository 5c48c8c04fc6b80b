//! Graph construction from expression trees.
//!
//! [`create`] maps an [`Expr`] onto a fresh graph by recursive descent, one
//! vertex per expression node. [`GraphBuilder`] exposes the same wiring
//! primitives for callers that need to assemble graphs by hand, e.g. with
//! shared children.
//!
//! # Example
//!
//! ```rust
//! use stager_core::builder::create;
//! use stager_core::component::Device;
//! use stager_core::expr::Expr;
//! use stager_core::key::Key;
//!
//! let a = Expr::component(Device::new("a").into_component());
//! let b = Expr::component(Device::new("b").into_component());
//! let expr = Expr::if_(Key::new("k"), a, b);
//!
//! let (_root, graph) = create(&expr).unwrap();
//! assert_eq!(graph.vertex_count(), 3);
//! ```

use std::sync::Arc;

use crate::component::Component;
use crate::expr::Expr;
use crate::graph::edge::{Branch, Label};
use crate::graph::vertex::{Vertex, VertexId, VertexKind};
use crate::graph::{Graph, GraphError};
use crate::key::Key;

/// A builder for configuration graphs.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    /// Create a new empty graph builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component vertex with the given parameters and dependencies.
    pub fn add_component(
        &mut self,
        component: Arc<dyn Component>,
        args: &[VertexId],
        deps: &[VertexId],
    ) -> VertexId {
        let id = self
            .graph
            .add_vertex(Vertex::new(VertexKind::Component(component)));
        for (i, arg) in args.iter().enumerate() {
            self.graph.connect(id, *arg, Label::Parameter(i));
        }
        for (i, dep) in deps.iter().enumerate() {
            self.graph.connect(id, *dep, Label::Dependency(i));
        }
        id
    }

    /// Add a conditional vertex choosing between `then_` and `else_`.
    pub fn add_conditional(&mut self, key: Key, then_: VertexId, else_: VertexId) -> VertexId {
        let id = self
            .graph
            .add_vertex(Vertex::new(VertexKind::Conditional(key)));
        self.graph.connect(id, then_, Label::Branch(Branch::Then));
        self.graph.connect(id, else_, Label::Branch(Branch::Else));
        id
    }

    /// Add an application of `func` to `args`.
    pub fn add_apply(&mut self, func: VertexId, args: &[VertexId]) -> VertexId {
        let id = self.graph.add_vertex(Vertex::new(VertexKind::Apply));
        self.graph.connect(id, func, Label::Parameter(0));
        for (i, arg) in args.iter().enumerate() {
            self.graph.connect(id, *arg, Label::Parameter(i + 1));
        }
        id
    }

    /// Add the vertices for `expr` and return the vertex of its top node.
    pub fn add_expr(&mut self, expr: &Expr) -> VertexId {
        match expr {
            Expr::Impl { component, deps } => {
                let deps: Vec<VertexId> = deps.iter().map(|d| self.add_expr(d)).collect();
                self.add_component(component.clone(), &[], &deps)
            }
            Expr::If { key, then_, else_ } => {
                let then_ = self.add_expr(then_);
                let else_ = self.add_expr(else_);
                self.add_conditional(key.clone(), then_, else_)
            }
            Expr::App { func, arg } => {
                let func = self.add_expr(func);
                let arg = self.add_expr(arg);
                self.add_apply(func, &[arg])
            }
        }
    }

    /// Finish building, checking every structural invariant.
    pub fn build(self) -> Result<(VertexId, Graph), GraphError> {
        let root = self.graph.validate()?;
        Ok((root, self.graph))
    }
}

/// Build the graph of `expr`, returning its root and the graph.
pub fn create(expr: &Expr) -> Result<(VertexId, Graph), GraphError> {
    let mut builder = GraphBuilder::new();
    let root = builder.add_expr(expr);
    let (validated, graph) = builder.build()?;
    debug_assert_eq!(root, validated);
    Ok((root, graph))
}
