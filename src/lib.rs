//! # kgmem - Knowledge Graph Memory
//!
//! A persistent knowledge graph of named entities, free-text observations
//! and typed directed relations.
//!
//! kgmem provides:
//! - SQLite-backed storage with WAL journaling for multi-process access
//! - Atomic batch operations (create, delete, observe, search, open)
//! - A keyed registry of stores, one database file per project
//! - MCP (stdio) and HTTP request layers mapping calls onto the store

pub mod graph;
pub mod storage;
pub mod server;
pub mod output;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use graph::{
    AddedObservations, Entity, GraphStats, KnowledgeGraph, ObservationAddition,
    ObservationDeletion, Relation,
};
pub use storage::{KnowledgeGraphStore, StoreOptions, StoreRegistry};

/// Result type alias for kgmem operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for kgmem operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Entity with name {0} not found")]
    EntityNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store is closed")]
    Closed,
}
