//! Spigot Core - Data model for the extraction engine
//!
//! This crate holds the pure, database-free parts of Spigot: source
//! configuration, the catalog model, the portable type mapper, the
//! qualified-name resolver, record and tap-message shapes, and the
//! error taxonomy.

pub mod catalog;
pub mod config;
pub mod error;
pub mod message;
pub mod name;
pub mod record;
pub mod types;

pub use catalog::{Catalog, CatalogEntry, Column};
pub use config::SourceConfig;
pub use error::SourceError;
pub use message::{MessageSink, TapMessage, WriterSink};
pub use name::{NameResolver, QualifiedName, SEPARATOR};
pub use record::Record;
pub use types::PortableType;
