//! `stager.toml` manifest parsing and project configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use stager_core::component::{Component, Device, Package};
use stager_core::expr::Expr;
use stager_core::key::{Bindings, Key};
use stager_core::rewrite::RewriteLimit;
use tracing::warn;

pub const MANIFEST_FILE: &str = "stager.toml";

/// The top-level manifest structure for a stager project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagerManifest {
    /// Project metadata (required).
    pub project: ProjectConfig,
    /// Configuration keys that conditionals may branch on.
    #[serde(default)]
    pub keys: BTreeMap<String, KeyConfig>,
    /// Component declarations, by name.
    #[serde(default)]
    pub components: BTreeMap<String, ComponentConfig>,
    /// Concrete key values.
    #[serde(default)]
    pub bindings: BTreeMap<String, bool>,
    /// Rewriting limits.
    #[serde(default)]
    pub rewrite: Option<RewriteConfig>,
    /// The configuration expression to specialize.
    #[serde(default)]
    pub root: Option<ExprSpec>,
}

/// Project metadata section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required).
    pub name: String,
    /// Project version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Short description.
    #[serde(default)]
    pub description: Option<String>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// A `[keys.<name>]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyConfig {
    #[serde(default)]
    pub default: Option<bool>,
    #[serde(default)]
    pub doc: Option<String>,
}

/// A `[components.<name>]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// Code module implementing the component; defaults to the entry name.
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub packages: Vec<Package>,
    #[serde(default)]
    pub libraries: Vec<String>,
    /// Names of the keys this component reads.
    #[serde(default)]
    pub keys: Vec<String>,
}

/// The `[rewrite]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteConfig {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// An expression tree written in TOML.
///
/// ```toml
/// [root.apply]
/// func = { component = "app" }
/// args = [{ if = { key = "dhcp", then = { component = "dhcp" }, else = { component = "static" } } }]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExprSpec {
    Component(ComponentNode),
    If(IfNode),
    Apply(ApplyNode),
}

/// Every node kind rejects foreign fields, so a table mixing `component`,
/// `if` and `apply` matches no kind at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentNode {
    pub component: String,
    #[serde(default)]
    pub deps: Vec<ExprSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IfNode {
    #[serde(rename = "if")]
    pub cond: IfSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplyNode {
    pub apply: ApplySpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IfSpec {
    pub key: String,
    pub then: Box<ExprSpec>,
    #[serde(rename = "else")]
    pub otherwise: Box<ExprSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplySpec {
    pub func: Box<ExprSpec>,
    pub args: Vec<ExprSpec>,
}

impl StagerManifest {
    /// Search upward from `start_dir` for a `stager.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: StagerManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing stager.toml")
    }

    /// Declared keys, resolved to [`Key`] values.
    pub fn keys(&self) -> BTreeMap<String, Key> {
        self.keys
            .iter()
            .map(|(name, cfg)| {
                let mut key = Key::new(name.clone());
                if let Some(default) = cfg.default {
                    key = key.with_default(default);
                }
                if let Some(doc) = &cfg.doc {
                    key = key.with_doc(doc.clone());
                }
                (name.clone(), key)
            })
            .collect()
    }

    fn key(&self, keys: &BTreeMap<String, Key>, name: &str, context: &str) -> Result<Key> {
        match keys.get(name) {
            Some(key) => Ok(key.clone()),
            None => bail!("{context} uses undeclared key `{name}` (add a [keys.{name}] section)"),
        }
    }

    /// Declared components, built into capability records.
    pub fn components(&self) -> Result<BTreeMap<String, Arc<dyn Component>>> {
        let keys = self.keys();
        let mut out = BTreeMap::new();
        for (name, cfg) in &self.components {
            let mut device = Device::new(name.clone());
            if let Some(module) = &cfg.module {
                device = device.with_module(module.clone());
            }
            for package in &cfg.packages {
                device = device.with_package(package.clone());
            }
            for library in &cfg.libraries {
                device = device.with_library(library.clone());
            }
            for key in &cfg.keys {
                device = device.with_key(self.key(&keys, key, &format!("component `{name}`"))?);
            }
            out.insert(name.clone(), device.into_component());
        }
        Ok(out)
    }

    /// Build the root expression.
    pub fn expr(&self) -> Result<Expr> {
        let Some(root) = &self.root else {
            bail!("{MANIFEST_FILE} has no [root] expression");
        };
        let keys = self.keys();
        let components = self.components()?;
        self.build_expr(root, &keys, &components)
    }

    fn build_expr(
        &self,
        node: &ExprSpec,
        keys: &BTreeMap<String, Key>,
        components: &BTreeMap<String, Arc<dyn Component>>,
    ) -> Result<Expr> {
        match node {
            ExprSpec::Component(ComponentNode { component, deps }) => {
                let Some(c) = components.get(component) else {
                    bail!("unknown component `{component}` (add a [components.{component}] section)");
                };
                let deps = deps
                    .iter()
                    .map(|d| self.build_expr(d, keys, components))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Expr::component_with(Arc::clone(c), deps))
            }
            ExprSpec::If(IfNode { cond }) => Ok(Expr::if_(
                self.key(keys, &cond.key, "conditional")?,
                self.build_expr(&cond.then, keys, components)?,
                self.build_expr(&cond.otherwise, keys, components)?,
            )),
            ExprSpec::Apply(ApplyNode { apply }) => {
                if apply.args.is_empty() {
                    bail!("application needs at least one argument");
                }
                let func = self.build_expr(&apply.func, keys, components)?;
                let args = apply
                    .args
                    .iter()
                    .map(|a| self.build_expr(a, keys, components))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Expr::app_all(func, args))
            }
        }
    }

    /// Manifest bindings overlaid with command-line overrides.
    pub fn bindings(&self, overrides: &[(String, bool)]) -> Bindings {
        let mut bindings: Bindings = self
            .bindings
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        for (name, value) in overrides {
            if !self.keys.contains_key(name) {
                warn!(key = %name, "binding an undeclared key");
            }
            bindings.bind(name.clone(), *value);
        }
        bindings
    }

    /// The configured rewrite limit, or the library default.
    pub fn rewrite_limit(&self) -> RewriteLimit {
        self.rewrite
            .as_ref()
            .and_then(|r| r.limit)
            .map(RewriteLimit)
            .unwrap_or_default()
    }

    /// Generate the default template for `stager init`.
    pub fn template(name: &str) -> String {
        format!(
            r#"[project]
name = "{name}"
version = "0.1.0"

[keys.dhcp]
default = true
doc = "Obtain the network address with DHCP"

[keys.socket]
doc = "Use the host socket stack instead of the direct driver"

[components.app]
module = "App"
packages = [{{ name = "logs", min = "0.5" }}]

[components.dhcp]
module = "Dhcp"
keys = ["dhcp"]

[components.static]
module = "Static_ip"

[components.socket]
module = "Socket_stack"
libraries = ["socket.unix"]

[components.direct]
module = "Direct_stack"
packages = [{{ name = "tcpip" }}]

[bindings]
socket = true

[rewrite]
limit = 100000

[root.apply]
func = {{ component = "app" }}
args = [
    {{ if = {{ key = "dhcp", then = {{ component = "dhcp" }}, else = {{ component = "static" }} }} }},
    {{ if = {{ key = "socket", then = {{ component = "socket" }}, else = {{ component = "direct" }} }} }},
]
"#
        )
    }
}

/// Parse a `key=value` override.
pub fn parse_override(s: &str) -> Result<(String, bool)> {
    let Some((name, value)) = s.split_once('=') else {
        bail!("invalid binding '{s}': expected KEY=true|false");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("invalid binding '{s}': empty key name");
    }
    let value = match value.trim() {
        "true" | "on" | "yes" | "1" => true,
        "false" | "off" | "no" | "0" => false,
        other => bail!("invalid value '{other}' for key `{name}`: expected true or false"),
    };
    Ok((name.to_string(), value))
}
