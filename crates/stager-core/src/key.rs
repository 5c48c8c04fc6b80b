//! Configuration keys and the resolver interface used by evaluation.
//!
//! Keys are owned by an external configuration subsystem. The graph passes
//! only read them: [`KeyResolver::peek`] during partial evaluation and
//! [`KeyResolver::force`] once a full evaluation is requested.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A boolean configuration key referenced by conditional vertices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    /// Unique key name.
    pub name: String,
    /// Value used by [`KeyResolver::force`] when nothing is bound.
    #[serde(default)]
    pub default: Option<bool>,
    /// Human-readable description.
    #[serde(default)]
    pub doc: Option<String>,
}

impl Key {
    /// Create a key with no default value.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            doc: None,
        }
    }

    /// Set the default value of this key.
    pub fn with_default(mut self, default: bool) -> Self {
        self.default = Some(default);
        self
    }

    /// Attach a description to this key.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Read access to concrete key values.
pub trait KeyResolver {
    /// The value of `key` if it has already been bound.
    fn peek(&self, key: &Key) -> Option<bool>;

    /// The value of `key`, falling back to whatever the resolver can derive
    /// (e.g. a default). `None` means the key cannot be made concrete.
    fn force(&self, key: &Key) -> Option<bool>;
}

/// An explicit set of key bindings.
///
/// `peek` only sees explicit bindings; `force` additionally falls back to the
/// key's declared default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    values: BTreeMap<String, bool>,
}

impl Bindings {
    /// Create an empty set of bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, replacing any previous binding.
    pub fn bind(&mut self, name: impl Into<String>, value: bool) -> Option<bool> {
        self.values.insert(name.into(), value)
    }

    /// Builder form of [`Bindings::bind`].
    pub fn with(mut self, name: impl Into<String>, value: bool) -> Self {
        self.bind(name, value);
        self
    }

    /// Look up a binding by key name.
    pub fn get(&self, name: &str) -> Option<bool> {
        self.values.get(name).copied()
    }

    /// Overlay `other` on top of these bindings.
    pub fn extend(&mut self, other: &Bindings) {
        for (name, value) in &other.values {
            self.values.insert(name.clone(), *value);
        }
    }

    /// Number of bound keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no key is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, bool)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl KeyResolver for Bindings {
    fn peek(&self, key: &Key) -> Option<bool> {
        self.get(&key.name)
    }

    fn force(&self, key: &Key) -> Option<bool> {
        self.get(&key.name).or(key.default)
    }
}
