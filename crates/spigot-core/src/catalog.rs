//! The catalog model: discovered tables, views, and their columns.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::SourceError;
use crate::name::SEPARATOR;
use crate::types::PortableType;

/// One column of a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Declared type as reported by the engine (may be empty for
    /// expression columns in views).
    pub native_type: String,
    pub nullable: bool,
    pub portable: PortableType,
}

/// One discovered table or view. `(database, schema, table)` uniquely
/// identifies an entry; `schema` is stored in its database-qualified form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub database: String,
    pub schema: String,
    pub table: String,
    pub is_view: bool,
    /// Whether the stream is selected for extraction. Discovery marks
    /// everything selected; users deselect by editing the persisted
    /// catalog document.
    #[serde(default = "default_selected")]
    pub selected: bool,
    pub columns: Vec<Column>,
    /// Primary-key column names, in key order. Empty for views and
    /// keyless tables.
    pub key_properties: Vec<String>,
}

fn default_selected() -> bool {
    true
}

impl CatalogEntry {
    /// Stable stream identifier used for state bookkeeping and catalog
    /// keys: the qualified schema joined with the table name.
    pub fn stream_id(&self) -> String {
        format!("{}{}{}", self.schema, SEPARATOR, self.table)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// The JSON-schema document for this stream's records.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        for column in &self.columns {
            properties.insert(
                column.name.clone(),
                column.portable.json_schema(column.nullable),
            );
        }
        json!({
            "type": "object",
            "properties": properties,
        })
    }
}

/// The discovered set of available streams. Regenerated whole on each
/// discovery pass, or loaded verbatim from a persisted document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate `(database, schema, table)`
    /// identities.
    pub fn new(streams: Vec<CatalogEntry>) -> Result<Self, SourceError> {
        for (i, entry) in streams.iter().enumerate() {
            let dup = streams[..i].iter().any(|other| {
                other.database == entry.database
                    && other.schema == entry.schema
                    && other.table == entry.table
            });
            if dup {
                return Err(SourceError::discovery(format!(
                    "duplicate catalog entry for '{}'",
                    entry.stream_id()
                )));
            }
        }
        Ok(Self { streams })
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Entries selected for extraction, in catalog order.
    pub fn selected(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.streams.iter().filter(|entry| entry.selected)
    }

    pub fn get(&self, stream_id: &str) -> Option<&CatalogEntry> {
        self.streams
            .iter()
            .find(|entry| entry.stream_id() == stream_id)
    }
}
