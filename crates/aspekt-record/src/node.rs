//! The record model: an immutable tree of typed nodes.
//!
//! Nodes are produced once (by the wire decoder or by aspect constructors)
//! and only read afterwards. [`NodeRef`] is the borrowed view the resolver
//! walks; it can point at any node, including a root [`RecordNode`].

use aspekt_core::Result;
use serde::{Serialize, Serializer};
use std::sync::Arc;

use crate::schema::{FieldSchema, PrimitiveType, RecordSchema, TypeTag, TyperefSchema, UnionSchema};
use crate::urn::Urn;

// ============================================================================
// PrimitiveValue
// ============================================================================

/// Scalar leaf value.
#[derive(Clone, Debug, PartialEq)]
pub enum PrimitiveValue {
    /// Boolean
    Boolean(bool),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// Text
    String(String),
    /// Entity identifier
    Urn(Urn),
}

impl PrimitiveValue {
    /// Type of this value.
    pub fn primitive_type(&self) -> PrimitiveType {
        match self {
            Self::Boolean(_) => PrimitiveType::Boolean,
            Self::Int(_) => PrimitiveType::Int,
            Self::Long(_) => PrimitiveType::Long,
            Self::Float(_) => PrimitiveType::Float,
            Self::Double(_) => PrimitiveType::Double,
            Self::String(_) => PrimitiveType::String,
            Self::Urn(_) => PrimitiveType::Urn,
        }
    }

    /// Renders the value as plain text (URNs in canonical form).
    pub fn to_text(&self) -> String {
        match self {
            Self::Boolean(v) => v.to_string(),
            Self::Int(v) => v.to_string(),
            Self::Long(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Double(v) => v.to_string(),
            Self::String(v) => v.clone(),
            Self::Urn(v) => v.to_string(),
        }
    }
}

impl Serialize for PrimitiveValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Boolean(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i32(*v),
            Self::Long(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f32(*v),
            Self::Double(v) => serializer.serialize_f64(*v),
            Self::String(v) => serializer.serialize_str(v),
            Self::Urn(v) => serializer.collect_str(v),
        }
    }
}

impl From<bool> for PrimitiveValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i32> for PrimitiveValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for PrimitiveValue {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f64> for PrimitiveValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for PrimitiveValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for PrimitiveValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Urn> for PrimitiveValue {
    fn from(v: Urn) -> Self {
        Self::Urn(v)
    }
}

// ============================================================================
// DataNode
// ============================================================================

/// Any node of a record tree.
#[derive(Clone, Debug, PartialEq)]
pub enum DataNode {
    /// Record with declared fields.
    Record(RecordNode),
    /// Ordered sequence.
    Array(ArrayNode),
    /// Tagged union.
    Union(UnionNode),
    /// Transparent alias wrapper.
    Typeref(TyperefNode),
    /// Scalar leaf.
    Primitive(PrimitiveValue),
}

impl DataNode {
    /// String leaf.
    pub fn string(v: impl Into<String>) -> Self {
        Self::Primitive(PrimitiveValue::String(v.into()))
    }

    /// Long leaf.
    pub fn long(v: i64) -> Self {
        Self::Primitive(PrimitiveValue::Long(v))
    }

    /// Int leaf.
    pub fn int(v: i32) -> Self {
        Self::Primitive(PrimitiveValue::Int(v))
    }

    /// Boolean leaf.
    pub fn boolean(v: bool) -> Self {
        Self::Primitive(PrimitiveValue::Boolean(v))
    }

    /// URN leaf.
    pub fn urn(v: Urn) -> Self {
        Self::Primitive(PrimitiveValue::Urn(v))
    }

    /// Borrowed view of this node.
    pub fn as_node_ref(&self) -> NodeRef<'_> {
        match self {
            Self::Record(n) => NodeRef::Record(n),
            Self::Array(n) => NodeRef::Array(n),
            Self::Union(n) => NodeRef::Union(n),
            Self::Typeref(n) => NodeRef::Typeref(n),
            Self::Primitive(n) => NodeRef::Primitive(n),
        }
    }

    /// Short structural name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        self.as_node_ref().kind()
    }
}

impl From<RecordNode> for DataNode {
    fn from(n: RecordNode) -> Self {
        Self::Record(n)
    }
}

impl From<ArrayNode> for DataNode {
    fn from(n: ArrayNode) -> Self {
        Self::Array(n)
    }
}

impl From<UnionNode> for DataNode {
    fn from(n: UnionNode) -> Self {
        Self::Union(n)
    }
}

impl From<TyperefNode> for DataNode {
    fn from(n: TyperefNode) -> Self {
        Self::Typeref(n)
    }
}

impl From<PrimitiveValue> for DataNode {
    fn from(v: PrimitiveValue) -> Self {
        Self::Primitive(v)
    }
}

impl From<&str> for DataNode {
    fn from(v: &str) -> Self {
        Self::string(v)
    }
}

impl From<Urn> for DataNode {
    fn from(v: Urn) -> Self {
        Self::urn(v)
    }
}

// ============================================================================
// RecordNode
// ============================================================================

/// Record instance. Values are stored by field position in the schema.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordNode {
    schema: Arc<RecordSchema>,
    values: Vec<Option<DataNode>>,
}

impl RecordNode {
    /// Creates a record with every field unset.
    pub fn new(schema: &Arc<RecordSchema>) -> Self {
        Self {
            schema: Arc::clone(schema),
            values: vec![None; schema.fields().len()],
        }
    }

    /// Schema of this record.
    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    /// Type tag of this record.
    pub fn type_tag(&self) -> TypeTag {
        self.schema.type_tag()
    }

    /// Explicitly set value of a field; defaults are not applied.
    pub fn get(&self, name: &str) -> Result<Option<&DataNode>> {
        let pos = self.schema.require_position(name)?;
        Ok(self.values[pos].as_ref())
    }

    /// Whether a field has an explicit value.
    pub fn is_set(&self, name: &str) -> Result<bool> {
        Ok(self.get(name)?.is_some())
    }

    /// Sets a declared field.
    pub fn set(&mut self, name: &str, value: impl Into<DataNode>) -> Result<()> {
        let pos = self.schema.require_position(name)?;
        self.values[pos] = Some(value.into());
        Ok(())
    }

    /// Sets a declared field, builder style.
    pub fn with(mut self, name: &str, value: impl Into<DataNode>) -> Result<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Clears a declared field, returning its previous value.
    pub fn unset(&mut self, name: &str) -> Result<Option<DataNode>> {
        let pos = self.schema.require_position(name)?;
        Ok(self.values[pos].take())
    }

    /// Set fields in declaration order.
    pub fn iter_set(&self) -> impl Iterator<Item = (&FieldSchema, &DataNode)> {
        self.schema
            .fields()
            .iter()
            .zip(&self.values)
            .filter_map(|(field, value)| value.as_ref().map(|v| (field, v)))
    }

    pub(crate) fn value_at(&self, pos: usize) -> Option<&DataNode> {
        self.values.get(pos).and_then(Option::as_ref)
    }
}

// ============================================================================
// ArrayNode
// ============================================================================

/// Ordered sequence of nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArrayNode {
    items: Vec<DataNode>,
}

impl ArrayNode {
    /// Creates an array from its items.
    pub fn new(items: Vec<DataNode>) -> Self {
        Self { items }
    }

    /// Items in order.
    pub fn items(&self) -> &[DataNode] {
        &self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the array has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates items in order.
    pub fn iter(&self) -> std::slice::Iter<'_, DataNode> {
        self.items.iter()
    }
}

impl<T: Into<DataNode>> FromIterator<T> for ArrayNode {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// UnionNode
// ============================================================================

/// Tagged union instance with at most one active member.
///
/// Member access lives in [`crate::union`].
#[derive(Clone, Debug, PartialEq)]
pub struct UnionNode {
    pub(crate) schema: Arc<UnionSchema>,
    pub(crate) active: Option<(usize, Box<DataNode>)>,
}

// ============================================================================
// TyperefNode
// ============================================================================

/// Transparent alias around another node.
#[derive(Clone, Debug, PartialEq)]
pub struct TyperefNode {
    schema: Arc<TyperefSchema>,
    inner: Box<DataNode>,
}

impl TyperefNode {
    /// Wraps `inner` in the alias described by `schema`.
    pub fn new(schema: &Arc<TyperefSchema>, inner: impl Into<DataNode>) -> Self {
        Self {
            schema: Arc::clone(schema),
            inner: Box::new(inner.into()),
        }
    }

    /// Alias name, for diagnostics only.
    pub fn alias(&self) -> &str {
        self.schema.name()
    }

    /// Alias schema.
    pub fn schema(&self) -> &Arc<TyperefSchema> {
        &self.schema
    }

    /// Wrapped node.
    pub fn inner(&self) -> &DataNode {
        &self.inner
    }
}

// ============================================================================
// NodeRef
// ============================================================================

/// Borrowed view of any node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeRef<'a> {
    /// Record
    Record(&'a RecordNode),
    /// Array
    Array(&'a ArrayNode),
    /// Union
    Union(&'a UnionNode),
    /// Alias wrapper
    Typeref(&'a TyperefNode),
    /// Scalar
    Primitive(&'a PrimitiveValue),
}

impl<'a> NodeRef<'a> {
    /// Strips typeref wrappers until a non-alias node is reached.
    pub fn unwrap_typerefs(self) -> NodeRef<'a> {
        let mut current = self;
        while let NodeRef::Typeref(alias) = current {
            current = alias.inner().as_node_ref();
        }
        current
    }

    /// Short structural name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Record(_) => "record",
            Self::Array(_) => "array",
            Self::Union(_) => "union",
            Self::Typeref(_) => "typeref",
            Self::Primitive(p) => p.primitive_type().name(),
        }
    }

    /// Clones the referenced node into an owned [`DataNode`].
    pub fn to_data_node(&self) -> DataNode {
        match *self {
            Self::Record(n) => DataNode::Record(n.clone()),
            Self::Array(n) => DataNode::Array(n.clone()),
            Self::Union(n) => DataNode::Union(n.clone()),
            Self::Typeref(n) => DataNode::Typeref(n.clone()),
            Self::Primitive(n) => DataNode::Primitive(n.clone()),
        }
    }
}

impl<'a> From<&'a RecordNode> for NodeRef<'a> {
    fn from(record: &'a RecordNode) -> Self {
        Self::Record(record)
    }
}

impl<'a> From<&'a DataNode> for NodeRef<'a> {
    fn from(node: &'a DataNode) -> Self {
        node.as_node_ref()
    }
}

// ============================================================================
// Tests
// ============================================================================
