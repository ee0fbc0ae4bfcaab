//! Aspekt — umbrella crate.
//!
//! Re-exports every aspekt component. Enable `graph` and `search` (or
//! `full`) for the relationship and bulk-writer layers.

#![doc = include_str!("../README.md")]

pub use aspekt_core as core;
pub use aspekt_record as record;

pub use aspekt_core::{Error, Result};

#[cfg(feature = "graph")]
pub use aspekt_graph as graph;

#[cfg(feature = "search")]
pub use aspekt_search as search;
