//! Aspekt Search — bulk writer pipeline for search indices.
//!
//! Documents are encoded to their JSON wire form and staged as bulk
//! operations. A [`BulkProcessor`] batches them and hands each batch to a
//! [`BulkClient`]; per-document outcomes are tracked as [`DocumentState`]s
//! and reported to a [`BulkListener`].
//!
//! # Modules
//!
//! - [`config`]: batching configuration loaded from TOML
//! - [`request`]: bulk request and response types
//! - [`client`]: transport trait
//! - [`listener`]: flush callbacks
//! - [`processor`]: background batching queue
//! - [`writer`]: typed document writer
//! - [`memory`]: in-memory index for tests and examples

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod listener;
pub mod memory;
pub mod processor;
pub mod request;
pub mod writer;

pub use client::BulkClient;
pub use config::BulkConfig;
pub use listener::{BulkListener, LoggingListener, NoopListener};
pub use memory::{InMemoryIndex, StoredDocument};
pub use processor::{BulkProcessor, BulkStats};
pub use request::{
    BulkItemResponse, BulkOperation, DeleteRequest, DocumentKey, DocumentState, FailureKind,
    IndexRequest, ItemFailure, ItemOutcome, MAX_RETRIES, UpdateRequest,
};
pub use writer::{BulkWriter, SearchWriter};
