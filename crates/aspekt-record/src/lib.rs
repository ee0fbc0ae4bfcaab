//! Aspekt Record — typed record trees and path-based field resolution.
//!
//! Records are immutable trees of typed nodes described by shared schema
//! descriptors. A [`PathSpec`] such as `/recordArray/*/value` locates values
//! inside a tree; the resolver returns zero, one, or many of them without
//! treating missing data as an error.
//!
//! # Modules
//!
//! - [`schema`]: Record, union, array, and typeref descriptors
//! - [`node`]: The record model and borrowed node views
//! - [`path`]: Path text parsing and schema binding
//! - [`resolver`]: Path resolution with wildcard fan-out
//! - [`narrow`]: Narrowing resolved nodes into Rust types
//! - [`union`]: Union member access and role lookup
//! - [`codec`]: Canonical JSON wire form
//! - [`urn`]: Entity identifiers
//!
//! # Example
//!
//! ```rust
//! use aspekt_record::{resolve_str, ArrayNode, DataSchema, RecordNode, RecordSchema};
//!
//! let foo = RecordSchema::builder("com.example.AspectFoo")
//!     .field("value", DataSchema::string())
//!     .build()
//!     .unwrap();
//! let mixed = RecordSchema::builder("com.example.Mixed")
//!     .optional_field("recordArray", DataSchema::array(DataSchema::Record(foo.clone())))
//!     .build()
//!     .unwrap();
//!
//! let items: ArrayNode = ["a", "b"]
//!     .iter()
//!     .map(|v| RecordNode::new(&foo).with("value", *v).unwrap())
//!     .collect();
//! let record = RecordNode::new(&mixed).with("recordArray", items).unwrap();
//!
//! let values = resolve_str(&record, "/recordArray/*/value").unwrap();
//! assert_eq!(values.sequence::<&str>().unwrap(), Some(vec!["a", "b"]));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod narrow;
pub mod node;
pub mod path;
pub mod resolver;
pub mod schema;
pub mod union;
pub mod urn;

mod proptests;

// Re-exports
pub use codec::{from_json_str, from_json_value, to_json_string, to_json_value};
pub use narrow::FromNode;
pub use node::{ArrayNode, DataNode, NodeRef, PrimitiveValue, RecordNode, TyperefNode, UnionNode};
pub use path::{PathSpec, Segment};
pub use resolver::{resolve, resolve_node, resolve_str, ResolvedValue};
pub use schema::{
    DataSchema, FieldSchema, PrimitiveType, RecordSchema, TypeTag, TyperefSchema,
    UnionMemberSchema, UnionSchema,
};
pub use union::{active_field_name, active_field_value, field_name_for_role};
pub use urn::Urn;
