//! # ormforms-db
//!
//! Persistence contracts for ormforms. A form binder never talks to a
//! database driver directly; it goes through the [`PersistenceLayer`] and
//! [`Repository`] traits defined here and manipulates records through the
//! [`Entity`] capability protocol.
//!
//! ## Module Overview
//!
//! - [`value`] - The backend-agnostic [`Value`] enum
//! - [`mapping`] - Column ([`FieldMapping`]) and relation ([`RelationMapping`]) metadata
//! - [`entity`] - The [`Entity`] trait and [`EntityCapabilities`]
//! - [`record`] - [`Record`], a dynamic map-backed entity
//! - [`persistence`] - [`PersistenceLayer`], [`Repository`], and [`persist_atomic`]
//! - [`memory`] - [`MemoryPersistence`], an in-memory persistence layer

#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::return_self_not_must_use)]

pub mod entity;
pub mod mapping;
pub mod memory;
pub mod persistence;
pub mod record;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use entity::{Entity, EntityCapabilities, FieldValue, Property, Related};
pub use mapping::{
    join_map, Cardinality, ColumnType, FieldMapping, FieldMappingSource, RelationJoinMap,
    RelationMap, RelationMapping,
};
pub use memory::{EntitySchema, MemoryPersistence, MemoryRepository};
pub use persistence::{persist_atomic, PersistenceLayer, Repository};
pub use record::Record;
pub use value::Value;
