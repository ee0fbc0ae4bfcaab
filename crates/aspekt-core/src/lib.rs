//! Aspekt Core — shared error types.
//!
//! This crate has no internal aspekt dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;

pub use error::{Error, Result};
