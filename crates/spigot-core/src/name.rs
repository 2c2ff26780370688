//! Qualified table names and the naming convention of the embedded engine.
//!
//! A fully-qualified name has up to three dot-separated parts:
//! `database.schema.table`. Absent parts are represented as `None`, never
//! as an empty string.
//!
//! The resolver carries one engine-specific convention: the embedded
//! engine addresses everything within a single database file, so whenever
//! a schema is present the parsed schema component comes back prefixed
//! with the configured database name (`"{database}.{schema}"`). Callers
//! must not assume the returned schema string is the literal schema name;
//! [`NameResolver::physical_schema`] recovers the literal name for SQL
//! emission. Targeting a different engine means constructing a resolver
//! with a different convention, not changing callers.

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// Separator between qualified-name parts.
pub const SEPARATOR: char = '.';

/// A parsed table identifier. `schema`, when present, is always
/// database-qualified per the resolver's convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifiedName {
    pub database: Option<String>,
    pub schema: Option<String>,
    pub table: String,
}

/// Parses and formats qualified names for one configured database.
#[derive(Debug, Clone)]
pub struct NameResolver {
    database: String,
}

impl NameResolver {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Prefix a literal schema name with the configured database.
    pub fn qualify_schema(&self, schema: &str) -> String {
        format!("{}{}{}", self.database, SEPARATOR, schema)
    }

    /// Recover the literal engine schema name from a qualified schema.
    pub fn physical_schema<'a>(&self, schema: &'a str) -> &'a str {
        schema
            .strip_prefix(self.database.as_str())
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
            .unwrap_or(schema)
    }

    /// Parse a dot-separated name into its parts.
    ///
    /// 1 part is a bare table, 2 parts `(schema, table)`, 3 parts
    /// `(database, schema, table)`. More than 3 parts or an empty part is
    /// an [`SourceError::InvalidName`].
    pub fn parse(&self, full_name: &str) -> Result<QualifiedName, SourceError> {
        let parts: Vec<&str> = full_name.split(SEPARATOR).collect();
        for part in &parts {
            if part.is_empty() {
                return Err(SourceError::invalid_name(full_name, "empty name component"));
            }
        }
        match parts.as_slice() {
            [table] => Ok(QualifiedName {
                database: None,
                schema: None,
                table: (*table).to_string(),
            }),
            [schema, table] => Ok(QualifiedName {
                database: None,
                schema: Some(self.qualify_schema(schema)),
                table: (*table).to_string(),
            }),
            [database, schema, table] => Ok(QualifiedName {
                database: Some((*database).to_string()),
                schema: Some(self.qualify_schema(schema)),
                table: (*table).to_string(),
            }),
            _ => Err(SourceError::invalid_name(
                full_name,
                format!("expected at most 3 parts, got {}", parts.len()),
            )),
        }
    }

    /// Join the present parts back into a dot-separated name.
    ///
    /// The database qualification applied by [`NameResolver::parse`] is
    /// stripped from the schema component, so `format` inverts `parse`:
    /// `parse(format(q)) == q` for any parsed name, and
    /// `format(parse(s)) == s` for any well-formed input string.
    pub fn format(&self, name: &QualifiedName) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(3);
        if let Some(database) = &name.database {
            parts.push(database);
        }
        if let Some(schema) = &name.schema {
            parts.push(self.physical_schema(schema));
        }
        parts.push(&name.table);
        parts.join(&SEPARATOR.to_string())
    }
}

/// Check that a raw name component is usable in a qualified name.
pub fn validate_component(component: &str) -> Result<(), SourceError> {
    if component.is_empty() {
        return Err(SourceError::invalid_name(component, "empty name component"));
    }
    if component.contains(SEPARATOR) {
        return Err(SourceError::invalid_name(
            component,
            "name component contains the separator",
        ));
    }
    Ok(())
}
