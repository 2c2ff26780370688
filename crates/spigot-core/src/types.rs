//! Portable column type descriptors and the native-type mapping.
//!
//! The embedded engine reports declared column types as free-form strings
//! (`INTEGER`, `VARCHAR(50)`, `TIMESTAMP`, ...). [`PortableType`] is the
//! engine-agnostic descriptor used in catalog documents and SCHEMA
//! messages. Both directions of the mapping are total: unknown native
//! types fall back to [`PortableType::String`], and the inverse always
//! yields a valid native type spec (losing length/precision is allowed).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// Engine-agnostic representation of a column's data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PortableType {
    Integer,
    Number,
    Boolean,
    String,
    Date,
    DateTime,
    Binary,
}

impl PortableType {
    /// Map a declared native type to its portable descriptor.
    ///
    /// Matching follows the engine's affinity rules: keyword containment
    /// on the uppercased declaration, with date/time and boolean checks
    /// ahead of the broader affinity buckets. Total over all inputs.
    pub fn from_native(native: &str) -> PortableType {
        let decl = native.to_uppercase();
        if decl.contains("BOOL") {
            PortableType::Boolean
        } else if decl.contains("DATETIME") || decl.contains("TIMESTAMP") {
            PortableType::DateTime
        } else if decl.contains("DATE") {
            PortableType::Date
        } else if decl.contains("INT") {
            PortableType::Integer
        } else if decl.contains("CHAR") || decl.contains("CLOB") || decl.contains("TEXT") {
            PortableType::String
        } else if decl.contains("BLOB") {
            PortableType::Binary
        } else if decl.contains("REAL")
            || decl.contains("FLOA")
            || decl.contains("DOUB")
            || decl.contains("NUMERIC")
            || decl.contains("DECIMAL")
        {
            PortableType::Number
        } else {
            debug!("Unknown native type '{}', defaulting to string", native);
            PortableType::String
        }
    }

    /// The native type spec this descriptor maps back to.
    ///
    /// The round trip is lossy: `VARCHAR(50)` comes back as `TEXT`.
    pub fn to_native(self) -> &'static str {
        match self {
            PortableType::Integer => "INTEGER",
            PortableType::Number => "REAL",
            PortableType::Boolean => "BOOLEAN",
            PortableType::String => "TEXT",
            PortableType::Date => "DATE",
            PortableType::DateTime => "TIMESTAMP",
            PortableType::Binary => "BLOB",
        }
    }

    /// The JSON-schema fragment describing a column of this type.
    pub fn json_schema(self, nullable: bool) -> Value {
        let type_name = match self {
            PortableType::Integer => "integer",
            PortableType::Number => "number",
            PortableType::Boolean => "boolean",
            PortableType::String | PortableType::Date | PortableType::DateTime
            | PortableType::Binary => "string",
        };
        let types = if nullable {
            json!([type_name, "null"])
        } else {
            json!([type_name])
        };
        match self {
            PortableType::Date => json!({"type": types, "format": "date"}),
            PortableType::DateTime => json!({"type": types, "format": "date-time"}),
            _ => json!({"type": types}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_native_integer_family() {
        assert_eq!(PortableType::from_native("INTEGER"), PortableType::Integer);
        assert_eq!(PortableType::from_native("int"), PortableType::Integer);
        assert_eq!(PortableType::from_native("BIGINT"), PortableType::Integer);
        assert_eq!(PortableType::from_native("SMALLINT"), PortableType::Integer);
        assert_eq!(
            PortableType::from_native("UNSIGNED BIG INT"),
            PortableType::Integer
        );
    }

    #[test]
    fn test_from_native_text_family() {
        assert_eq!(PortableType::from_native("TEXT"), PortableType::String);
        assert_eq!(
            PortableType::from_native("VARCHAR(50)"),
            PortableType::String
        );
        assert_eq!(
            PortableType::from_native("NVARCHAR(100)"),
            PortableType::String
        );
        assert_eq!(
            PortableType::from_native("CHARACTER(20)"),
            PortableType::String
        );
        assert_eq!(PortableType::from_native("CLOB"), PortableType::String);
    }

    #[test]
    fn test_from_native_number_family() {
        assert_eq!(PortableType::from_native("REAL"), PortableType::Number);
        assert_eq!(PortableType::from_native("DOUBLE"), PortableType::Number);
        assert_eq!(
            PortableType::from_native("DOUBLE PRECISION"),
            PortableType::Number
        );
        assert_eq!(PortableType::from_native("FLOAT"), PortableType::Number);
        assert_eq!(
            PortableType::from_native("DECIMAL(10,5)"),
            PortableType::Number
        );
        assert_eq!(PortableType::from_native("NUMERIC"), PortableType::Number);
    }

    #[test]
    fn test_from_native_boolean_and_temporal() {
        assert_eq!(PortableType::from_native("BOOLEAN"), PortableType::Boolean);
        assert_eq!(PortableType::from_native("bool"), PortableType::Boolean);
        assert_eq!(PortableType::from_native("DATE"), PortableType::Date);
        assert_eq!(
            PortableType::from_native("DATETIME"),
            PortableType::DateTime
        );
        assert_eq!(
            PortableType::from_native("TIMESTAMP"),
            PortableType::DateTime
        );
    }

    #[test]
    fn test_from_native_binary() {
        assert_eq!(PortableType::from_native("BLOB"), PortableType::Binary);
    }

    #[test]
    fn test_from_native_unknown_falls_back_to_string() {
        assert_eq!(PortableType::from_native("GEOMETRY"), PortableType::String);
        assert_eq!(PortableType::from_native(""), PortableType::String);
        assert_eq!(PortableType::from_native("JSONB"), PortableType::String);
    }

    #[test]
    fn test_to_native_total() {
        // Every descriptor maps back to a non-empty native spec.
        for ty in [
            PortableType::Integer,
            PortableType::Number,
            PortableType::Boolean,
            PortableType::String,
            PortableType::Date,
            PortableType::DateTime,
            PortableType::Binary,
        ] {
            assert!(!ty.to_native().is_empty());
        }
    }

    #[test]
    fn test_round_trip_normalizes() {
        // native -> portable -> native may lose length, never fails
        let portable = PortableType::from_native("VARCHAR(50)");
        assert_eq!(portable.to_native(), "TEXT");
        let portable = PortableType::from_native("BIGINT");
        assert_eq!(portable.to_native(), "INTEGER");
    }

    #[test]
    fn test_json_schema_nullable() {
        let schema = PortableType::Integer.json_schema(true);
        assert_eq!(schema, json!({"type": ["integer", "null"]}));
    }

    #[test]
    fn test_json_schema_not_nullable() {
        let schema = PortableType::Integer.json_schema(false);
        assert_eq!(schema, json!({"type": ["integer"]}));
    }

    #[test]
    fn test_json_schema_date_time_format() {
        let schema = PortableType::DateTime.json_schema(true);
        assert_eq!(
            schema,
            json!({"type": ["string", "null"], "format": "date-time"})
        );
    }

    #[test]
    fn test_serde_representation() {
        let json = serde_json::to_string(&PortableType::DateTime).unwrap();
        assert_eq!(json, "\"date-time\"");
        let parsed: PortableType = serde_json::from_str("\"integer\"").unwrap();
        assert_eq!(parsed, PortableType::Integer);
    }
}
