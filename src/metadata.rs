//! Typed view over the front-matter mapping.
//!
//! The splitter returns a generic `serde_yaml::Mapping` so documents can
//! carry arbitrary metadata; publishing only cares about a small contract:
//! a top-level `title` and a `confluence` section controlling eligibility
//! and destination. These types deserialize that contract and ignore
//! everything else.

use crate::error::MarkonError;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fmt;

/// The front-matter fields the publishing layer consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Target page title. Required for publishing, optional for conversion.
    #[serde(default)]
    pub title: Option<String>,

    /// Confluence publishing controls. Absent section means "do not share".
    #[serde(default)]
    pub confluence: ConfluenceMeta,
}

/// The `confluence` front-matter section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfluenceMeta {
    /// Whether the document may be published at all.
    #[serde(default)]
    pub share: bool,

    /// Destination space key. Falls back to the CLI/environment value.
    #[serde(default)]
    pub space: Option<String>,

    /// Parent page id. Falls back to the CLI/environment value.
    #[serde(default)]
    pub ancestor_id: Option<AncestorId>,
}

/// A Confluence page id as written in YAML: authors use both bare integers
/// and quoted strings, and the REST API wants a string either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AncestorId {
    Number(u64),
    Text(String),
}

impl fmt::Display for AncestorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AncestorId::Number(n) => write!(f, "{n}"),
            AncestorId::Text(s) => f.write_str(s),
        }
    }
}

impl PageMetadata {
    /// Deserialize the typed contract from a raw front-matter mapping.
    ///
    /// Unknown keys are ignored; a missing `confluence` section yields the
    /// non-shareable default.
    pub fn from_mapping(metadata: &Mapping) -> Result<Self, MarkonError> {
        serde_yaml::from_value(Value::Mapping(metadata.clone()))
            .map_err(|source| MarkonError::Frontmatter { source })
    }
}
