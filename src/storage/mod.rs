//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - entities(name, entity_type)
//! - observations(entity_name, content)
//! - relations(from_entity, to_entity, relation_type)

pub mod registry;
pub mod schema;
pub mod sqlite;

pub use registry::StoreRegistry;
pub use sqlite::{KnowledgeGraphStore, StoreOptions, DEFAULT_BUSY_TIMEOUT};
