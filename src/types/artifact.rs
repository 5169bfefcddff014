//! Artifact types for the trace graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Unique identifier for an artifact in the trace graph.
///
/// Wraps the caller's string id and implements `Ord` for deterministic ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Create a new ArtifactId.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is empty (a malformed reference).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArtifactId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ArtifactId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A traceable project item (requirement, hazard, code unit, safety-case node).
///
/// Equality is structural over every field, which is what the delta engine
/// relies on to classify an artifact as modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Unique artifact identifier.
    pub id: ArtifactId,
    /// Artifact type name (e.g. "requirement", "hazard").
    #[serde(rename = "type")]
    pub artifact_type: String,
    /// Display name.
    pub name: String,
    /// Free text body.
    #[serde(default)]
    pub body: String,
    /// Opaque payload fields, ordered for deterministic serialization.
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl Artifact {
    /// Create a new artifact with an empty body and no fields.
    pub fn new(
        id: impl Into<ArtifactId>,
        artifact_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            artifact_type: artifact_type.into(),
            name: name.into(),
            body: String::new(),
            fields: BTreeMap::new(),
        }
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a payload field.
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Return a copy with a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}
