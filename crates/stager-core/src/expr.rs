//! Expression trees handed over by the surface DSL.

use std::sync::Arc;

use crate::component::Component;
use crate::key::Key;

/// A staged configuration expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A component instance with its dependency sub-expressions.
    Impl {
        component: Arc<dyn Component>,
        deps: Vec<Expr>,
    },
    /// Late-bound choice between two sub-expressions.
    If {
        key: Key,
        then_: Box<Expr>,
        else_: Box<Expr>,
    },
    /// Curried application of `func` to `arg`.
    App { func: Box<Expr>, arg: Box<Expr> },
}

impl Expr {
    /// A component without dependencies.
    pub fn component(component: Arc<dyn Component>) -> Self {
        Expr::Impl {
            component,
            deps: Vec::new(),
        }
    }

    /// A component with dependencies.
    pub fn component_with(component: Arc<dyn Component>, deps: Vec<Expr>) -> Self {
        Expr::Impl { component, deps }
    }

    pub fn if_(key: Key, then_: Expr, else_: Expr) -> Self {
        Expr::If {
            key,
            then_: Box::new(then_),
            else_: Box::new(else_),
        }
    }

    pub fn app(func: Expr, arg: Expr) -> Self {
        Expr::App {
            func: Box::new(func),
            arg: Box::new(arg),
        }
    }

    /// Apply `func` to each of `args` in turn: `app(app(func, a0), a1)...`.
    pub fn app_all(func: Expr, args: impl IntoIterator<Item = Expr>) -> Self {
        args.into_iter().fold(func, Expr::app)
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            Expr::Impl { deps, .. } => 1 + deps.iter().map(Expr::size).sum::<usize>(),
            Expr::If { then_, else_, .. } => 1 + then_.size() + else_.size(),
            Expr::App { func, arg } => 1 + func.size() + arg.size(),
        }
    }
}
