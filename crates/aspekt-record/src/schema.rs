//! Schema descriptors for record trees.
//!
//! A schema is built once per type and shared (`Arc`) by every node of that
//! type. The resolver, the path binder, and the wire codec consult these
//! descriptors instead of inspecting values at runtime.
//!
//! # Example
//!
//! ```rust
//! use aspekt_record::{DataSchema, RecordSchema};
//!
//! let foo = RecordSchema::builder("com.example.AspectFoo")
//!     .field("value", DataSchema::string())
//!     .optional_field("note", DataSchema::string())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(foo.fields().len(), 2);
//! assert!(foo.field("note").unwrap().is_optional());
//! ```

use aspekt_core::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::node::DataNode;

// ============================================================================
// PrimitiveType
// ============================================================================

/// Scalar leaf types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// `true` / `false`
    Boolean,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
    /// UTF-8 text
    String,
    /// Entity identifier, carried as text on the wire
    Urn,
}

impl PrimitiveType {
    /// Returns the lowercase type name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Urn => "urn",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// DataSchema
// ============================================================================

/// Schema of any node in a record tree.
#[derive(Clone, Debug, PartialEq)]
pub enum DataSchema {
    /// Scalar leaf.
    Primitive(PrimitiveType),
    /// Record with a fixed set of declared fields.
    Record(Arc<RecordSchema>),
    /// Homogeneous array of the item schema.
    Array(Arc<DataSchema>),
    /// Tagged union.
    Union(Arc<UnionSchema>),
    /// Transparent alias.
    Typeref(Arc<TyperefSchema>),
}

impl DataSchema {
    /// `boolean` schema.
    pub fn boolean() -> Self {
        Self::Primitive(PrimitiveType::Boolean)
    }

    /// `int` schema.
    pub fn int() -> Self {
        Self::Primitive(PrimitiveType::Int)
    }

    /// `long` schema.
    pub fn long() -> Self {
        Self::Primitive(PrimitiveType::Long)
    }

    /// `float` schema.
    pub fn float() -> Self {
        Self::Primitive(PrimitiveType::Float)
    }

    /// `double` schema.
    pub fn double() -> Self {
        Self::Primitive(PrimitiveType::Double)
    }

    /// `string` schema.
    pub fn string() -> Self {
        Self::Primitive(PrimitiveType::String)
    }

    /// `urn` schema.
    pub fn urn() -> Self {
        Self::Primitive(PrimitiveType::Urn)
    }

    /// Array of `items`.
    pub fn array(items: DataSchema) -> Self {
        Self::Array(Arc::new(items))
    }

    /// Alias `name` over `referenced`.
    pub fn typeref(name: impl Into<String>, referenced: DataSchema) -> Self {
        Self::Typeref(Arc::new(TyperefSchema {
            name: name.into(),
            referenced,
        }))
    }

    /// Short structural name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Primitive(p) => p.name(),
            Self::Record(_) => "record",
            Self::Array(_) => "array",
            Self::Union(_) => "union",
            Self::Typeref(_) => "typeref",
        }
    }

    /// Follows typerefs until a non-alias schema is reached.
    pub fn dereference(&self) -> &DataSchema {
        let mut current = self;
        while let Self::Typeref(alias) = current {
            current = &alias.referenced;
        }
        current
    }

    /// Name a union member of this schema gets when no alias is given.
    fn member_tag(&self) -> String {
        match self {
            Self::Primitive(p) => p.name().to_string(),
            Self::Record(record) => record.name.clone(),
            Self::Array(_) => "array".to_string(),
            Self::Union(union) => union.display_name().to_string(),
            Self::Typeref(alias) => alias.name.clone(),
        }
    }
}

impl From<Arc<RecordSchema>> for DataSchema {
    fn from(schema: Arc<RecordSchema>) -> Self {
        Self::Record(schema)
    }
}

impl From<Arc<UnionSchema>> for DataSchema {
    fn from(schema: Arc<UnionSchema>) -> Self {
        Self::Union(schema)
    }
}

impl From<PrimitiveType> for DataSchema {
    fn from(primitive: PrimitiveType) -> Self {
        Self::Primitive(primitive)
    }
}

// ============================================================================
// TypeTag
// ============================================================================

/// Identity of a record type (its fully-qualified schema name).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(String);

impl TypeTag {
    /// Creates a type tag from a schema name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the schema name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeTag {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

// ============================================================================
// RecordSchema
// ============================================================================

/// A declared record field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSchema {
    name: String,
    schema: DataSchema,
    optional: bool,
    default: Option<DataNode>,
}

impl FieldSchema {
    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema of the field's value.
    pub fn schema(&self) -> &DataSchema {
        &self.schema
    }

    /// Whether the field may be absent.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Value used when a required field is unset.
    pub fn default_value(&self) -> Option<&DataNode> {
        self.default.as_ref()
    }
}

/// Descriptor of a record type: its name and ordered, declared fields.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordSchema {
    name: String,
    fields: Vec<FieldSchema>,
    index: HashMap<String, usize>,
}

impl RecordSchema {
    /// Starts building a record schema with the given fully-qualified name.
    pub fn builder(name: impl Into<String>) -> RecordSchemaBuilder {
        RecordSchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Fully-qualified name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type tag of this record type.
    pub fn type_tag(&self) -> TypeTag {
        TypeTag::new(self.name.clone())
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Looks up a declared field.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.index.get(name).map(|&pos| &self.fields[pos])
    }

    /// Position of a declared field, used as the value accessor.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Position of a declared field, or `SchemaMismatch`.
    pub fn require_position(&self, name: &str) -> Result<usize> {
        self.position(name)
            .ok_or_else(|| Error::schema_mismatch(&self.name, name))
    }
}

/// Builder for [`RecordSchema`].
#[derive(Debug)]
pub struct RecordSchemaBuilder {
    name: String,
    fields: Vec<FieldSchema>,
}

impl RecordSchemaBuilder {
    /// Adds a required field.
    pub fn field(self, name: impl Into<String>, schema: impl Into<DataSchema>) -> Self {
        self.push(name.into(), schema.into(), false, None)
    }

    /// Adds an optional field.
    pub fn optional_field(self, name: impl Into<String>, schema: impl Into<DataSchema>) -> Self {
        self.push(name.into(), schema.into(), true, None)
    }

    /// Adds a required field with a default value.
    pub fn field_with_default(
        self,
        name: impl Into<String>,
        schema: impl Into<DataSchema>,
        default: impl Into<DataNode>,
    ) -> Self {
        self.push(name.into(), schema.into(), false, Some(default.into()))
    }

    fn push(
        mut self,
        name: String,
        schema: DataSchema,
        optional: bool,
        default: Option<DataNode>,
    ) -> Self {
        self.fields.push(FieldSchema {
            name,
            schema,
            optional,
            default,
        });
        self
    }

    /// Finishes the schema. Duplicate field names are rejected.
    pub fn build(self) -> Result<Arc<RecordSchema>> {
        let mut index = HashMap::with_capacity(self.fields.len());
        for (pos, field) in self.fields.iter().enumerate() {
            if index.insert(field.name.clone(), pos).is_some() {
                return Err(Error::invalid_schema(format!(
                    "field `{}` declared twice on `{}`",
                    field.name, self.name
                )));
            }
        }
        Ok(Arc::new(RecordSchema {
            name: self.name,
            fields: self.fields,
            index,
        }))
    }
}

// ============================================================================
// UnionSchema
// ============================================================================

/// A declared union member.
#[derive(Clone, Debug, PartialEq)]
pub struct UnionMemberSchema {
    tag: String,
    schema: DataSchema,
    role: Option<String>,
}

impl UnionMemberSchema {
    /// Member name: the alias when aliased, otherwise the member type's name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Schema of the member's value.
    pub fn schema(&self) -> &DataSchema {
        &self.schema
    }

    /// Semantic role label, if any.
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }
}

/// Descriptor of a tagged union.
#[derive(Clone, Debug, PartialEq)]
pub struct UnionSchema {
    name: Option<String>,
    members: Vec<UnionMemberSchema>,
}

impl UnionSchema {
    /// Starts building an anonymous union.
    pub fn builder() -> UnionSchemaBuilder {
        UnionSchemaBuilder {
            name: None,
            members: Vec::new(),
        }
    }

    /// Starts building a named union.
    pub fn named(name: impl Into<String>) -> UnionSchemaBuilder {
        UnionSchemaBuilder {
            name: Some(name.into()),
            members: Vec::new(),
        }
    }

    /// Name for diagnostics.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("union")
    }

    /// Declared members in declaration order.
    pub fn members(&self) -> &[UnionMemberSchema] {
        &self.members
    }

    /// Looks up a member by tag.
    pub fn member(&self, tag: &str) -> Option<&UnionMemberSchema> {
        self.members.iter().find(|m| m.tag == tag)
    }

    /// Position of a member by tag.
    pub fn position(&self, tag: &str) -> Option<usize> {
        self.members.iter().position(|m| m.tag == tag)
    }
}

/// Builder for [`UnionSchema`].
#[derive(Debug)]
pub struct UnionSchemaBuilder {
    name: Option<String>,
    members: Vec<UnionMemberSchema>,
}

impl UnionSchemaBuilder {
    /// Adds a member tagged with its type's name.
    pub fn member(mut self, schema: impl Into<DataSchema>) -> Self {
        let schema = schema.into();
        self.members.push(UnionMemberSchema {
            tag: schema.member_tag(),
            schema,
            role: None,
        });
        self
    }

    /// Adds a member under an alias.
    pub fn aliased(mut self, alias: impl Into<String>, schema: impl Into<DataSchema>) -> Self {
        self.members.push(UnionMemberSchema {
            tag: alias.into(),
            schema: schema.into(),
            role: None,
        });
        self
    }

    /// Adds an aliased member carrying a semantic role label.
    pub fn with_role(
        mut self,
        alias: impl Into<String>,
        schema: impl Into<DataSchema>,
        role: impl Into<String>,
    ) -> Self {
        self.members.push(UnionMemberSchema {
            tag: alias.into(),
            schema: schema.into(),
            role: Some(role.into()),
        });
        self
    }

    /// Finishes the union. Duplicate member tags are rejected.
    pub fn build(self) -> Result<Arc<UnionSchema>> {
        for (pos, member) in self.members.iter().enumerate() {
            if self.members[..pos].iter().any(|m| m.tag == member.tag) {
                return Err(Error::invalid_schema(format!(
                    "union member `{}` declared twice on `{}`",
                    member.tag,
                    self.name.as_deref().unwrap_or("union")
                )));
            }
        }
        Ok(Arc::new(UnionSchema {
            name: self.name,
            members: self.members,
        }))
    }
}

// ============================================================================
// TyperefSchema
// ============================================================================

/// Descriptor of a transparent alias.
#[derive(Clone, Debug, PartialEq)]
pub struct TyperefSchema {
    name: String,
    referenced: DataSchema,
}

impl TyperefSchema {
    /// Creates an alias schema.
    pub fn new(name: impl Into<String>, referenced: DataSchema) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            referenced,
        })
    }

    /// Alias name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Aliased schema.
    pub fn referenced(&self) -> &DataSchema {
        &self.referenced
    }
}

// ============================================================================
// Tests
// ============================================================================
