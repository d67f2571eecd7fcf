//! Stable textual handles for places and transitions.
//!
//! A [`Uri`] is `label` for a net's own nodes and `label.subnet_label` when
//! the node was introduced by embedding a sub-net. URIs, not in-process
//! identities, are the stable external handle: embedding a net rewrites
//! nothing about how a node is reached from outside except by adding a
//! suffix.

use derive_more::Display;
use std::sync::Arc;

/// A node handle of the form `label( '.' label )*`.
///
/// Cheap to clone: internally an `Arc<str>`, not an owned `String`, since
/// URIs are passed around constantly (arc table keys, sub-net maps, matrix
/// row/column labels) and are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display(fmt = "{}", _0)]
pub struct Uri(Arc<str>);

impl Uri {
    /// Builds a URI from a single label with no embedding suffix.
    pub fn new(label: impl AsRef<str>) -> Self {
        Uri(Arc::from(label.as_ref()))
    }

    /// Mints the URI a node gets when its defining net is embedded under
    /// `subnet_label`: `{self}.{subnet_label}`.
    pub fn mint(&self, subnet_label: &str) -> Self {
        Uri(Arc::from(format!("{self}.{subnet_label}").as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The labels that make up this URI, outermost-defining-net first.
    /// `"P0"` -> `["P0"]`, `"P0.Producer"` -> `["P0", "Producer"]`.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

impl From<&str> for Uri {
    fn from(s: &str) -> Self {
        Uri::new(s)
    }
}

impl From<String> for Uri {
    fn from(s: String) -> Self {
        Uri(Arc::from(s.as_str()))
    }
}

impl std::borrow::Borrow<str> for Uri {
    fn borrow(&self) -> &str {
        &self.0
    }
}
