//! Component capabilities carried by component vertices.
//!
//! A component is an externally supplied, immutable record describing a
//! configurable unit: its names, the keys it reads, the packages and
//! libraries it needs, and the opaque `connect`/`configure`/`clean`
//! operations invoked by downstream code generation.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::traverse::{collect, topological_sort, try_iter, Count, Monoid, Union};
use crate::graph::vertex::{VertexId, VertexKind};
use crate::graph::{Graph, GraphError};
use crate::key::Key;

/// Errors raised by a component's `configure` or `clean` operation.
#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("configure failed for {component}: {message}")]
    Configure { component: String, message: String },

    #[error("clean failed for {component}: {message}")]
    Clean { component: String, message: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// A package requirement with optional version bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub max: Option<String>,
}

impl Package {
    /// An unconstrained package requirement.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min: None,
            max: None,
        }
    }

    /// Require at least version `min`.
    pub fn with_min(mut self, min: impl Into<String>) -> Self {
        self.min = Some(min.into());
        self
    }

    /// Require a version strictly below `max`.
    pub fn with_max(mut self, max: impl Into<String>) -> Self {
        self.max = Some(max.into());
        self
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        match (&self.min, &self.max) {
            (Some(min), Some(max)) => write!(f, " (>= {min} & < {max})"),
            (Some(min), None) => write!(f, " (>= {min})"),
            (None, Some(max)) => write!(f, " (< {max})"),
            (None, None) => Ok(()),
        }
    }
}

/// The capability record of a component vertex.
///
/// Object-safe so components can be shared as `Arc<dyn Component>`.
pub trait Component: fmt::Debug + Send + Sync {
    /// Display name.
    fn name(&self) -> &str;

    /// Name of the code module implementing this component.
    fn module_name(&self) -> &str;

    /// Configuration keys this component reads.
    fn keys(&self) -> Vec<Key> {
        Vec::new()
    }

    /// Packages required to build this component.
    fn packages(&self) -> Vec<Package> {
        Vec::new()
    }

    /// Libraries linked by this component.
    fn libraries(&self) -> Vec<String> {
        Vec::new()
    }

    /// Code fragment connecting this component, instantiated as `modname`,
    /// to the already connected instances named in `args`.
    fn connect(&self, _info: &Info, modname: &str, args: &[String]) -> String {
        if args.is_empty() {
            format!("{modname}.start ()")
        } else {
            format!("{modname}.start {}", args.join(" "))
        }
    }

    /// Prepare whatever this component needs before code generation.
    fn configure(&self, _info: &Info) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Undo the effects of [`Component::configure`].
    fn clean(&self, _info: &Info) -> Result<(), ComponentError> {
        Ok(())
    }
}

/// A component described entirely by data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    name: String,
    module: String,
    keys: Vec<Key>,
    packages: Vec<Package>,
    libraries: Vec<String>,
}

impl Device {
    /// A device whose module name equals its display name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            module: name.clone(),
            name,
            keys: Vec::new(),
            packages: Vec::new(),
            libraries: Vec::new(),
        }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    pub fn with_key(mut self, key: Key) -> Self {
        self.keys.push(key);
        self
    }

    pub fn with_package(mut self, package: Package) -> Self {
        self.packages.push(package);
        self
    }

    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.libraries.push(library.into());
        self
    }

    /// Wrap into a shareable capability record.
    pub fn into_component(self) -> Arc<dyn Component> {
        Arc::new(self)
    }
}

impl Component for Device {
    fn name(&self) -> &str {
        &self.name
    }

    fn module_name(&self) -> &str {
        &self.module
    }

    fn keys(&self) -> Vec<Key> {
        self.keys.clone()
    }

    fn packages(&self) -> Vec<Package> {
        self.packages.clone()
    }

    fn libraries(&self) -> Vec<String> {
        self.libraries.clone()
    }
}

/// Global build information aggregated over every component of a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Info {
    /// Project name.
    pub name: String,
    /// Union of all package requirements.
    pub packages: BTreeSet<Package>,
    /// Union of all linked libraries.
    pub libraries: BTreeSet<String>,
    /// Union of all keys read by components.
    pub keys: BTreeSet<Key>,
    /// Number of component vertices.
    pub component_count: usize,
}

#[derive(Default)]
struct InfoAcc {
    packages: Union<Package>,
    libraries: Union<String>,
    keys: Union<Key>,
    components: Count,
}

impl Monoid for InfoAcc {
    fn empty() -> Self {
        Self::default()
    }

    fn combine(self, other: Self) -> Self {
        Self {
            packages: self.packages.combine(other.packages),
            libraries: self.libraries.combine(other.libraries),
            keys: self.keys.combine(other.keys),
            components: self.components.combine(other.components),
        }
    }
}

impl Info {
    /// Aggregate build information over all component vertices of `graph`.
    pub fn collect(name: impl Into<String>, graph: &Graph) -> Self {
        let acc: InfoAcc = collect(graph, |kind| match kind {
            VertexKind::Component(c) => InfoAcc {
                packages: c.packages().into_iter().collect(),
                libraries: c.libraries().into_iter().collect(),
                keys: c.keys().into_iter().collect(),
                components: Count(1),
            },
            _ => InfoAcc::empty(),
        });
        Self {
            name: name.into(),
            packages: acc.packages.0,
            libraries: acc.libraries.0,
            keys: acc.keys.0,
            component_count: acc.components.0,
        }
    }
}

/// Assign every component vertex an instance module name `<module>__<n>`,
/// numbered in topological order.
pub fn module_names(graph: &Graph) -> Result<HashMap<VertexId, String>, GraphError> {
    let mut names = HashMap::new();
    for id in topological_sort(graph)? {
        if let Some(VertexKind::Component(c)) = graph.get_vertex(&id).map(|v| &v.kind) {
            let n = names.len() + 1;
            names.insert(id, format!("{}__{n}", c.module_name()));
        }
    }
    Ok(names)
}

/// Call [`Component::clean`] on every component, parents before the children
/// they were connected to.
///
/// Stops at the first failure. Returns the instance names cleaned, in order.
pub fn clean_all(graph: &Graph, info: &Info) -> Result<Vec<String>, ComponentError> {
    let instances = module_names(graph)?;
    let mut cleaned = Vec::new();
    try_iter(graph, |v| {
        if let VertexKind::Component(c) = &v.kind {
            c.clean(info)?;
            let name = instances
                .get(&v.id)
                .cloned()
                .unwrap_or_else(|| c.module_name().to_string());
            cleaned.push(name);
        }
        Ok::<_, ComponentError>(())
    })?;
    Ok(cleaned)
}
