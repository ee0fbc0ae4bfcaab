//! Path resolution over record trees.
//!
//! The resolver walks a [`PathSpec`] from a root node using an explicit
//! stack of branches. A wildcard splits a branch into one branch per array
//! element, so results come out depth-first in element order and nested
//! wildcards flatten into a single sequence.
//!
//! Missing data is not an error: an unset optional field or an inactive
//! union member silently drops the branch. Only structural problems
//! (undeclared names, segments applied to the wrong kind of node, literal
//! array indexes) fail the resolution.

use aspekt_core::{Error, Result};

use crate::node::{NodeRef, RecordNode};
use crate::path::{ensure_no_index, PathSpec, Segment};

/// Outcome of a resolution.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedValue<'a> {
    /// Nothing found.
    Absent,
    /// Exactly one value, no fan-out involved.
    Single(NodeRef<'a>),
    /// Values produced through at least one wildcard, in order.
    Sequence(Vec<NodeRef<'a>>),
}

struct Branch<'p, 'a> {
    rest: &'p [Segment],
    node: NodeRef<'a>,
}

/// Resolves `path` against a root record.
pub fn resolve<'a>(root: &'a RecordNode, path: &PathSpec) -> Result<ResolvedValue<'a>> {
    resolve_node(NodeRef::Record(root), path)
}

/// Parses, binds, and resolves path text against a root record.
///
/// # Example
///
/// ```rust
/// use aspekt_record::{resolve_str, DataSchema, RecordNode, RecordSchema};
///
/// let schema = RecordSchema::builder("com.example.AspectFoo")
///     .field("value", DataSchema::string())
///     .build()
///     .unwrap();
/// let foo = RecordNode::new(&schema).with("value", "foo").unwrap();
///
/// let value = resolve_str(&foo, "/value").unwrap();
/// assert_eq!(value.single::<&str>().unwrap(), Some("foo"));
/// ```
pub fn resolve_str<'a>(root: &'a RecordNode, text: &str) -> Result<ResolvedValue<'a>> {
    let path = PathSpec::parse(text)?.bind(root.schema())?;
    resolve(root, &path)
}

/// Resolves `path` against any node.
pub fn resolve_node<'a>(root: NodeRef<'a>, path: &PathSpec) -> Result<ResolvedValue<'a>> {
    ensure_no_index(path)?;

    let mut stack = vec![Branch {
        rest: path.segments(),
        node: root,
    }];
    let mut found = Vec::new();
    let mut fanned_out = false;

    while let Some(Branch { rest, node }) = stack.pop() {
        let node = node.unwrap_typerefs();
        let Some((segment, rest)) = rest.split_first() else {
            found.push(node);
            continue;
        };

        match (segment, node) {
            (Segment::Name(name), NodeRef::Record(record)) => {
                let schema = record.schema();
                let pos = schema.require_position(name)?;
                let child = record
                    .value_at(pos)
                    .or_else(|| schema.fields()[pos].default_value());
                if let Some(child) = child {
                    stack.push(Branch {
                        rest,
                        node: child.as_node_ref(),
                    });
                }
            }
            (Segment::Wildcard, NodeRef::Array(array)) => {
                fanned_out = true;
                stack.extend(array.iter().rev().map(|item| Branch {
                    rest,
                    node: item.as_node_ref(),
                }));
            }
            (Segment::Name(tag) | Segment::UnionMember(tag), NodeRef::Union(union)) => {
                if union.schema().position(tag).is_none() {
                    return Err(Error::schema_mismatch(
                        union.schema().display_name(),
                        tag.as_str(),
                    ));
                }
                if let Some(value) = union.select_member(tag) {
                    stack.push(Branch {
                        rest,
                        node: value.as_node_ref(),
                    });
                }
            }
            (segment, node) => {
                return Err(Error::unsupported(format!(
                    "{} `{}` cannot be applied to {} in path `{}`",
                    segment.kind(),
                    segment,
                    node.kind(),
                    path
                )));
            }
        }
    }

    if fanned_out {
        return Ok(ResolvedValue::Sequence(found));
    }
    Ok(match found.pop() {
        Some(node) => ResolvedValue::Single(node),
        None => ResolvedValue::Absent,
    })
}

// ============================================================================
// Tests
// ============================================================================
