use crate::RowId;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// One listing as supplied by the corpus source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub raw_text: Option<String>,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, raw_text: Option<String>) -> Self {
        Self { id: id.into(), display_name: display_name.into(), raw_text }
    }

    /// A listing whose name is also its searchable text.
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self { id: id.into(), display_name: name.clone(), raw_text: Some(name) }
    }
}

/// Listing ids arrive as JSON strings or integers; both are kept as opaque strings.
pub(crate) fn id_from_string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("listing id must be a string or number, got {other}"))),
    }
}

/// Row position <-> stable id and display name for one index generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogIndex {
    ids: Vec<String>,
    names: Vec<String>,
    #[serde(skip)]
    by_id: HashMap<String, RowId>,
}

impl CatalogIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, id: String, display_name: String) -> RowId {
        let row = self.ids.len() as RowId;
        self.by_id.insert(id.clone(), row);
        self.ids.push(id);
        self.names.push(display_name);
        row
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn id(&self, row: RowId) -> Option<&str> {
        self.ids.get(row as usize).map(String::as_str)
    }

    pub fn display_name(&self, row: RowId) -> Option<&str> {
        self.names.get(row as usize).map(String::as_str)
    }

    pub fn row_of(&self, id: &str) -> Option<RowId> {
        self.by_id.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RowId, &str, &str)> {
        self.ids
            .iter()
            .zip(self.names.iter())
            .enumerate()
            .map(|(row, (id, name))| (row as RowId, id.as_str(), name.as_str()))
    }

    /// Rebuild the id lookup after deserialization.
    pub(crate) fn reindex(&mut self) {
        self.by_id = self.ids.iter().enumerate().map(|(row, id)| (id.clone(), row as RowId)).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_follow_insertion_order() {
        let mut c = CatalogIndex::new();
        assert_eq!(c.push("10".into(), "Loft".into()), 0);
        assert_eq!(c.push("7".into(), "Villa".into()), 1);
        assert_eq!(c.id(1), Some("7"));
        assert_eq!(c.display_name(0), Some("Loft"));
        assert_eq!(c.row_of("10"), Some(0));
        assert_eq!(c.row_of("missing"), None);
    }

    #[test]
    fn reindex_restores_lookup() {
        let mut c = CatalogIndex::new();
        c.push("a".into(), "A".into());
        let json = serde_json::to_string(&c).unwrap();
        let mut back: CatalogIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back.row_of("a"), None);
        back.reindex();
        assert_eq!(back.row_of("a"), Some(0));
    }

    #[test]
    fn numeric_ids_become_strings() {
        let e: CatalogEntry = serde_json::from_str(r#"{"id": 4417, "display_name": "Sea view"}"#).unwrap();
        assert_eq!(e.id, "4417");
        assert_eq!(e.raw_text, None);
    }
}
