use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute bag for one remote record, keyed by logical attribute name.
///
/// Values keep the remote JSON shape; typing happens in [`crate::mapper`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    attributes: Map<String, Value>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    /// Returns the attribute, treating JSON `null` as absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name).filter(|v| !v.is_null())
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Keeps only the named attributes (plus OData annotations, which start with `@`).
    pub fn project(&self, columns: &[String]) -> Self {
        let attributes = self
            .attributes
            .iter()
            .filter(|(k, _)| k.starts_with('@') || columns.iter().any(|c| c == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { attributes }
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(attributes: Map<String, Value>) -> Self {
        Self { attributes }
    }
}
