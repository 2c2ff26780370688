//! Streaming record extraction for one catalog entry.

use futures::StreamExt;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use spigot_core::{CatalogEntry, NameResolver, PortableType, Record, SourceError};

use crate::engine::SourceEngine;
use crate::predicate::{build_where_clause, sanitize_sql_identifier, KeyRange};

/// A lazy, single-pass sequence of records for one stream.
///
/// The stream owns its connection: dropping or exhausting it returns the
/// connection to the pool on every exit path, including early abandonment
/// mid-iteration. The sequence is not restartable; resume by opening a
/// fresh stream with a key range reflecting prior progress.
pub struct RecordStream {
    rx: mpsc::Receiver<Result<Record, SourceError>>,
    producer: Option<JoinHandle<()>>,
}

impl RecordStream {
    /// Open a streaming scan over `entry`, optionally narrowed to a key
    /// range. Rows are fetched incrementally, never materialized in full.
    pub async fn open(
        engine: &SourceEngine,
        entry: &CatalogEntry,
        resolver: &NameResolver,
        range: Option<KeyRange>,
    ) -> Result<Self, SourceError> {
        let conn = engine.acquire().await?;
        let sql = build_scan_query(entry, resolver, range.as_ref());
        let stream_id = entry.stream_id();
        debug!("Scan for '{}': {}", stream_id, sql);

        let columns: Vec<(String, PortableType)> = entry
            .columns
            .iter()
            .map(|c| (c.name.clone(), c.portable))
            .collect();

        let (tx, rx) = mpsc::channel(64);
        let producer = tokio::spawn(async move {
            let mut conn = conn;
            let sql = sql;
            let mut rows = sqlx::query(&sql).fetch(&mut *conn);
            while let Some(fetched) = rows.next().await {
                let item = match fetched {
                    Ok(row) => Ok(decode_row(&row, &columns)),
                    Err(e) => Err(SourceError::extraction(&stream_id, e)),
                };
                let stop = item.is_err();
                if tx.send(item).await.is_err() {
                    // Consumer dropped the stream; stop fetching.
                    break;
                }
                if stop {
                    break;
                }
            }
        });

        Ok(Self {
            rx,
            producer: Some(producer),
        })
    }

    /// Build a stream from an already-produced channel. Used by
    /// connectors that materialize records outside this crate.
    pub fn from_channel(rx: mpsc::Receiver<Result<Record, SourceError>>) -> Self {
        Self { rx, producer: None }
    }

    /// The next record, or `None` once the underlying result set is
    /// exhausted. After an `Err` item the stream yields nothing further.
    pub async fn next(&mut self) -> Option<Result<Record, SourceError>> {
        self.rx.recv().await
    }
}

impl Drop for RecordStream {
    fn drop(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

/// Build the scan query: selected columns only, optional key-range
/// predicate. A keyed scan orders by the range column so bookmarks are
/// monotone; an unkeyed scan keeps the engine's natural order.
fn build_scan_query(
    entry: &CatalogEntry,
    resolver: &NameResolver,
    range: Option<&KeyRange>,
) -> String {
    let columns_sql: String = entry
        .columns
        .iter()
        .map(|c| format!("\"{}\"", sanitize_sql_identifier(&c.name)))
        .collect::<Vec<_>>()
        .join(", ");

    let schema = sanitize_sql_identifier(resolver.physical_schema(&entry.schema));
    let table = sanitize_sql_identifier(&entry.table);
    let where_clause = build_where_clause(range);

    match range {
        Some(range) => format!(
            "SELECT {} FROM \"{}\".\"{}\"{} ORDER BY \"{}\"",
            columns_sql,
            schema,
            table,
            where_clause,
            sanitize_sql_identifier(&range.column)
        ),
        None => format!(
            "SELECT {} FROM \"{}\".\"{}\"{}",
            columns_sql, schema, table, where_clause
        ),
    }
}

fn decode_row(row: &SqliteRow, columns: &[(String, PortableType)]) -> Record {
    let mut record = Record::new();
    for (idx, (name, portable)) in columns.iter().enumerate() {
        record.insert(name.clone(), decode_value(row, idx, *portable));
    }
    record
}

fn decode_value(row: &SqliteRow, idx: usize, portable: PortableType) -> Value {
    let decoded = match portable {
        PortableType::Integer => row
            .try_get::<Option<i64>, _>(idx)
            .map(|v| v.map(Value::from)),
        PortableType::Number => row
            .try_get::<Option<f64>, _>(idx)
            .map(|v| v.map(Value::from)),
        PortableType::Boolean => row
            .try_get::<Option<bool>, _>(idx)
            .map(|v| v.map(Value::from)),
        PortableType::Binary => row
            .try_get::<Option<Vec<u8>>, _>(idx)
            .map(|v| v.map(|bytes| Value::String(to_hex(&bytes)))),
        PortableType::String | PortableType::Date | PortableType::DateTime => row
            .try_get::<Option<String>, _>(idx)
            .map(|v| v.map(Value::String)),
    };
    match decoded {
        Ok(Some(value)) => value,
        Ok(None) => Value::Null,
        // The engine is dynamically typed: a declared INTEGER column may
        // hold text. Fall back through the storage classes.
        Err(_) => fallback_value(row, idx),
    }
}

fn fallback_value(row: &SqliteRow, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map(Value::String).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return v
            .map(|bytes| Value::String(to_hex(&bytes)))
            .unwrap_or(Value::Null);
    }
    Value::Null
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
