//! Transitions: stateless named events. A transition carries no marking and
//! no task; it exists only as an endpoint in the arc table and as a row in
//! the **I**/**O** matrices.

use crate::uri::Uri;

#[derive(Debug, Clone)]
pub struct Transition {
    uri: Uri,
    label: String,
}

impl Transition {
    pub fn new(uri: Uri, label: impl Into<String>) -> Self {
        Transition {
            uri,
            label: label.into(),
        }
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}
