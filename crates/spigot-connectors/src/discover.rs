//! Catalog discovery over the engine's introspection surface.
//!
//! Discovery regenerates the whole catalog on each pass: enumerate the
//! schemas visible on the connection, list tables and views per schema,
//! reflect columns/types/nullability/primary key, and stamp the
//! configured database name onto every entry (a file-backed engine has
//! exactly one implicit database and cannot report the logical name
//! itself).

use sqlx::Row;
use tracing::{debug, info, warn};

use spigot_core::name::{validate_component, SEPARATOR};
use spigot_core::{Catalog, CatalogEntry, Column, NameResolver, PortableType, SourceConfig, SourceError};

use crate::engine::SourceEngine;
use crate::predicate::sanitize_sql_identifier;

/// Discover the catalog of all tables and views in the source.
///
/// A database with zero tables yields an empty catalog. Any introspection
/// failure aborts the whole pass; no partial catalog is emitted. Objects
/// whose names cannot form a valid qualified name are reported and
/// skipped without aborting the rest of the catalog.
pub async fn discover_catalog(
    engine: &SourceEngine,
    config: &SourceConfig,
) -> Result<Catalog, SourceError> {
    let resolver = NameResolver::new(&config.database);

    let mut schemas = list_schemas(engine).await?;
    schemas.sort();

    let mut entries = Vec::new();
    for schema in &schemas {
        for (table, kind) in list_tables(engine, schema).await? {
            if let Err(e) = validate_component(&table) {
                warn!("Skipping object in schema '{}': {}", schema, e);
                continue;
            }
            let (columns, key_properties) = reflect_columns(engine, schema, &table).await?;
            entries.push(CatalogEntry {
                database: config.database.clone(),
                schema: resolver.qualify_schema(schema),
                table,
                is_view: kind == "view",
                selected: true,
                columns,
                key_properties,
            });
        }
    }

    info!(
        "Discovered {} stream(s) across {} schema(s)",
        entries.len(),
        schemas.len()
    );
    Catalog::new(entries)
}

/// Enumerate schema names visible on the connection, with any
/// `database.`-prefix stripped.
async fn list_schemas(engine: &SourceEngine) -> Result<Vec<String>, SourceError> {
    let rows = sqlx::query("PRAGMA database_list")
        .fetch_all(engine.pool())
        .await
        .map_err(|e| SourceError::discovery(format!("enumerate schemas: {}", e)))?;

    let mut names = Vec::with_capacity(rows.len());
    for row in &rows {
        let name: String = row
            .try_get("name")
            .map_err(|e| SourceError::discovery(format!("read schema name: {}", e)))?;
        if name == "temp" {
            continue;
        }
        names.push(strip_database_prefix(&name).to_string());
    }
    Ok(names)
}

/// Drop a `database.`-prefix from a schema name reported in qualified
/// form. The connection is scoped to a single database file, so the
/// database component carries no information at this level.
fn strip_database_prefix(schema: &str) -> &str {
    match schema.split_once(SEPARATOR) {
        Some((_, rest)) => rest,
        None => schema,
    }
}

/// List `(name, kind)` for every table and view in a schema, in lexical
/// order. Internal engine objects are excluded.
async fn list_tables(
    engine: &SourceEngine,
    schema: &str,
) -> Result<Vec<(String, String)>, SourceError> {
    let sql = format!(
        "SELECT name, type FROM \"{}\".sqlite_master \
         WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
         ORDER BY name",
        sanitize_sql_identifier(schema)
    );
    let rows = sqlx::query(&sql)
        .fetch_all(engine.pool())
        .await
        .map_err(|e| SourceError::discovery(format!("list tables in schema '{}': {}", schema, e)))?;

    rows.iter()
        .map(|row| {
            let name: String = row.try_get("name").map_err(|e| {
                SourceError::discovery(format!("read table name in schema '{}': {}", schema, e))
            })?;
            let kind: String = row.try_get("type").map_err(|e| {
                SourceError::discovery(format!("read table kind in schema '{}': {}", schema, e))
            })?;
            Ok((name, kind))
        })
        .collect()
}

/// Reflect columns, declared types, nullability, and the primary key of
/// one table.
async fn reflect_columns(
    engine: &SourceEngine,
    schema: &str,
    table: &str,
) -> Result<(Vec<Column>, Vec<String>), SourceError> {
    let rows = sqlx::query(
        "SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1, ?2) ORDER BY cid",
    )
    .bind(table)
    .bind(schema)
    .fetch_all(engine.pool())
    .await
    .map_err(|e| {
        SourceError::discovery(format!(
            "reflect columns for '{}{}{}': {}",
            schema, SEPARATOR, table, e
        ))
    })?;

    let mut columns = Vec::with_capacity(rows.len());
    let mut keys: Vec<(i64, String)> = Vec::new();

    for row in &rows {
        let name: String = row.try_get("name").map_err(|e| {
            SourceError::discovery(format!("read column metadata for '{}': {}", table, e))
        })?;
        let native_type: String = row.try_get("type").map_err(|e| {
            SourceError::discovery(format!("read column metadata for '{}': {}", table, e))
        })?;
        let notnull: i64 = row.try_get("notnull").map_err(|e| {
            SourceError::discovery(format!("read column metadata for '{}': {}", table, e))
        })?;
        let pk: i64 = row.try_get("pk").map_err(|e| {
            SourceError::discovery(format!("read column metadata for '{}': {}", table, e))
        })?;

        if pk > 0 {
            keys.push((pk, name.clone()));
        }
        debug!(
            "Column {}.{}.{}: type='{}' notnull={} pk={}",
            schema, table, name, native_type, notnull, pk
        );
        columns.push(Column {
            portable: PortableType::from_native(&native_type),
            name,
            native_type,
            nullable: notnull == 0,
        });
    }

    keys.sort();
    Ok((columns, keys.into_iter().map(|(_, name)| name).collect()))
}
