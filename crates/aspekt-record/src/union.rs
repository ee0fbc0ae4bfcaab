//! Union member access.
//!
//! A [`UnionNode`] holds at most one `(tag, value)` pair. `set_member` is the
//! only write path and always replaces the whole content.

use aspekt_core::{Error, Result};
use std::sync::Arc;

use crate::node::{DataNode, NodeRef, RecordNode, UnionNode};
use crate::schema::UnionSchema;

impl UnionNode {
    /// Creates an empty union.
    pub fn new(schema: &Arc<UnionSchema>) -> Self {
        Self {
            schema: Arc::clone(schema),
            active: None,
        }
    }

    /// Creates a union with `tag` active.
    pub fn with_member(
        schema: &Arc<UnionSchema>,
        tag: &str,
        value: impl Into<DataNode>,
    ) -> Result<Self> {
        let mut union = Self::new(schema);
        union.set_member(tag, value)?;
        Ok(union)
    }

    /// Schema of this union.
    pub fn schema(&self) -> &Arc<UnionSchema> {
        &self.schema
    }

    /// The active member's tag and value.
    pub fn active_member(&self) -> Option<(&str, &DataNode)> {
        self.active
            .as_ref()
            .map(|(pos, value)| (self.schema.members()[*pos].tag(), value.as_ref()))
    }

    /// The active value, only when `tag` is the active member.
    pub fn select_member(&self, tag: &str) -> Option<&DataNode> {
        self.active_member()
            .filter(|(active, _)| *active == tag)
            .map(|(_, value)| value)
    }

    /// Replaces the union's content with `(tag, value)`.
    pub fn set_member(&mut self, tag: &str, value: impl Into<DataNode>) -> Result<()> {
        let pos = self
            .schema
            .position(tag)
            .ok_or_else(|| Error::schema_mismatch(self.schema.display_name(), tag))?;
        self.active = Some((pos, Box::new(value.into())));
        Ok(())
    }

    /// Clears the active member.
    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Whether no member is active.
    pub fn is_empty(&self) -> bool {
        self.active.is_none()
    }
}

/// Tag of the first member of `schema` mapped to `role`.
pub fn field_name_for_role<'s>(schema: &'s UnionSchema, role: &str) -> Result<&'s str> {
    schema
        .members()
        .iter()
        .find(|m| m.role() == Some(role))
        .map(|m| m.tag())
        .ok_or_else(|| Error::schema_mismatch(schema.display_name(), format!("role:{role}")))
}

/// Tag of the active member of the union stored in `record.field`.
///
/// Returns `None` when the field is unset or the union is empty.
pub fn active_field_name<'a>(record: &'a RecordNode, field: &str) -> Result<Option<&'a str>> {
    Ok(union_field(record, field)?
        .and_then(UnionNode::active_member)
        .map(|(tag, _)| tag))
}

/// Active value of the union stored in `record.field`, rendered as text.
///
/// The active member must be a primitive (possibly behind typerefs).
pub fn active_field_value(record: &RecordNode, field: &str) -> Result<Option<String>> {
    let Some((_, value)) = union_field(record, field)?.and_then(UnionNode::active_member) else {
        return Ok(None);
    };
    match value.as_node_ref().unwrap_typerefs() {
        NodeRef::Primitive(p) => Ok(Some(p.to_text())),
        other => Err(Error::type_mismatch("primitive", other.kind())),
    }
}

fn union_field<'a>(record: &'a RecordNode, field: &str) -> Result<Option<&'a UnionNode>> {
    let Some(node) = record.get(field)? else {
        return Ok(None);
    };
    match node.as_node_ref().unwrap_typerefs() {
        NodeRef::Union(union) => Ok(Some(union)),
        other => Err(Error::type_mismatch("union", other.kind())),
    }
}

// ============================================================================
// Tests
// ============================================================================
