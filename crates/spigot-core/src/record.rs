//! Ordered record values produced by the stream extractor.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One emitted row: an ordered mapping of column name to value,
/// conformant to the stream's catalog entry. Field order follows the
/// catalog entry's column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.0.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_preserves_insertion_order() {
        let mut record = Record::new();
        record.insert("zeta", json!(1));
        record.insert("alpha", json!(2));
        let columns: Vec<&String> = record.columns().collect();
        assert_eq!(columns, ["zeta", "alpha"]);
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let mut record = Record::new();
        record.insert("id", json!(1));
        record.insert("name", json!("a"));
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"id":1,"name":"a"}"#);
    }

    #[test]
    fn test_deserialize_round_trip() {
        let record: Record = serde_json::from_str(r#"{"id":1,"name":"a"}"#).unwrap();
        assert_eq!(record.get("id"), Some(&json!(1)));
        assert_eq!(record.get("name"), Some(&json!("a")));
        assert_eq!(record.len(), 2);
    }
}
