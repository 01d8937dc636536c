//! Tag index model matching `tags.json`.

use serde::{Deserialize, Serialize};

use super::tags_from_value;

/// Root of `tags.json`.
///
/// A multiset: every occurrence of a tag on some slide has one entry here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagIndexDocument {
    #[serde(default, deserialize_with = "deserialize_index")]
    pub tags: Vec<String>,
}

fn deserialize_index<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map(|v| tags_from_value(&v)).unwrap_or_default())
}

/// A distinct tag with the number of slides using it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSuggestion {
    pub name: String,
    pub count: usize,
}

/// Drift repaired by rebuilding the tag index from the slide list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Entries the rebuilt index has that the old one lacked
    pub added: Vec<String>,
    /// Entries the old index had that no slide accounts for
    pub removed: Vec<String>,
    pub total: usize,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
