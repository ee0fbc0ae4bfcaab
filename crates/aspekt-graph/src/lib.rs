//! Aspekt Graph — relationship builders over aspekt records.
//!
//! A [`RelationshipBuilder`] turns one aspect type into batches of typed
//! edges ([`RelationshipUpdates`]). Builders are collected once into a
//! read-only [`BuilderRegistry`] and dispatched by aspect type. The
//! [`RelationshipGraph`] applies batches to a petgraph `DiGraph`, honoring
//! each batch's [`RemovalOption`].
//!
//! # Modules
//!
//! - [`types`]: Relationship kinds, records, and batches
//! - [`builder`]: The builder contract and a path-driven implementation
//! - [`registry`]: Aspect type to builder dispatch
//! - [`graph`]: In-memory graph honoring `Full` and `Partial` batches

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod graph;
pub mod registry;
pub mod types;

// Re-exports
pub use builder::{PathRelationshipBuilder, RelationshipBuilder};
pub use graph::{ApplyStats, RelationshipGraph};
pub use registry::{BuilderRegistry, BuilderRegistryBuilder};
pub use types::{RelationshipKind, RelationshipRecord, RelationshipUpdates, RemovalOption};
