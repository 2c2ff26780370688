//! Spigot Connectors - Embedded-database source adapter
//!
//! This crate adapts a single-file embedded database to the extraction
//! engine: connection management, catalog discovery, partition
//! predicates, and streaming record extraction, all built on sqlx's
//! SQLite driver.

pub mod discover;
pub mod engine;
pub mod extract;
pub mod predicate;

pub use discover::discover_catalog;
pub use engine::SourceEngine;
pub use extract::RecordStream;
pub use predicate::{build_where_clause, KeyRange};

use async_trait::async_trait;
use spigot_core::{Catalog, CatalogEntry, NameResolver, SourceConfig, SourceError};

/// A source that can discover its catalog and open record streams.
///
/// Implementations are chosen at startup and injected into the
/// coordinator; nothing downstream depends on the concrete engine.
#[async_trait]
pub trait SourceConnector: Send + Sync {
    /// Discover the full catalog of available streams.
    async fn discover(&self) -> Result<Catalog, SourceError>;

    /// Open a lazy record stream for one catalog entry, optionally
    /// narrowed to a key range.
    async fn open_stream(
        &self,
        entry: &CatalogEntry,
        range: Option<KeyRange>,
    ) -> Result<RecordStream, SourceError>;
}

/// Connector for the embedded single-file database.
pub struct EmbeddedConnector {
    engine: SourceEngine,
    config: SourceConfig,
    resolver: NameResolver,
}

impl EmbeddedConnector {
    /// Open the engine for `config` and wire up the naming convention.
    pub async fn connect(config: SourceConfig) -> Result<Self, SourceError> {
        let engine = SourceEngine::connect(&config).await?;
        let resolver = NameResolver::new(&config.database);
        Ok(Self {
            engine,
            config,
            resolver,
        })
    }

    pub fn engine(&self) -> &SourceEngine {
        &self.engine
    }

    pub fn resolver(&self) -> &NameResolver {
        &self.resolver
    }
}

#[async_trait]
impl SourceConnector for EmbeddedConnector {
    async fn discover(&self) -> Result<Catalog, SourceError> {
        discover_catalog(&self.engine, &self.config).await
    }

    async fn open_stream(
        &self,
        entry: &CatalogEntry,
        range: Option<KeyRange>,
    ) -> Result<RecordStream, SourceError> {
        RecordStream::open(&self.engine, entry, &self.resolver, range).await
    }
}
