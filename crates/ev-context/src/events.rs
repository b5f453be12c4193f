//! Typed events emitted during execution.

use serde::{Deserialize, Serialize};

/// An event with string attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event type.
    pub ty: String,
    /// Ordered key/value attributes.
    pub attributes: Vec<(String, String)>,
}

impl Event {
    /// Creates an event without attributes.
    pub fn new(ty: impl Into<String>) -> Self {
        Self { ty: ty.into(), attributes: Vec::new() }
    }

    /// Appends an attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push((key.into(), value.to_string()));
        self
    }

    /// Looks an attribute up by key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}
