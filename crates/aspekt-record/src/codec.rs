//! Canonical JSON wire form.
//!
//! Records encode as objects holding their set fields in declaration order,
//! unions as a single-key object `{ "<tag>": value }` (`{}` when empty),
//! typerefs as their underlying value, and URNs as strings. Decoding is
//! driven by the schema and fails as a whole: no partial record is returned.

use aspekt_core::{Error, Result};
use serde_json::{Map, Number, Value};
use std::sync::Arc;

use crate::node::{ArrayNode, DataNode, NodeRef, PrimitiveValue, RecordNode, TyperefNode, UnionNode};
use crate::schema::{DataSchema, PrimitiveType, RecordSchema};
use crate::urn::Urn;

/// Encodes any node into a JSON value.
pub fn to_json_value(node: NodeRef<'_>) -> Result<Value> {
    match node {
        NodeRef::Record(record) => {
            let mut object = Map::new();
            for (field, value) in record.iter_set() {
                object.insert(field.name().to_string(), to_json_value(value.as_node_ref())?);
            }
            Ok(Value::Object(object))
        }
        NodeRef::Array(array) => array
            .iter()
            .map(|item| to_json_value(item.as_node_ref()))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        NodeRef::Union(union) => {
            let mut object = Map::new();
            if let Some((tag, value)) = union.active_member() {
                object.insert(tag.to_string(), to_json_value(value.as_node_ref())?);
            }
            Ok(Value::Object(object))
        }
        NodeRef::Typeref(alias) => to_json_value(alias.inner().as_node_ref()),
        NodeRef::Primitive(value) => primitive_to_json(value),
    }
}

fn primitive_to_json(value: &PrimitiveValue) -> Result<Value> {
    let float = |v: f64| {
        Number::from_f64(v)
            .map(Value::Number)
            .ok_or_else(|| Error::unsupported(format!("cannot encode non-finite number {v}")))
    };
    match value {
        PrimitiveValue::Boolean(v) => Ok(Value::Bool(*v)),
        PrimitiveValue::Int(v) => Ok(Value::from(*v)),
        PrimitiveValue::Long(v) => Ok(Value::from(*v)),
        PrimitiveValue::Float(v) => float(widen_shortest(*v)),
        PrimitiveValue::Double(v) => float(*v),
        PrimitiveValue::String(v) => Ok(Value::String(v.clone())),
        PrimitiveValue::Urn(v) => Ok(Value::String(v.to_string())),
    }
}

/// Widens through the shortest decimal text of `v`, so `0.1f32` becomes
/// `0.1` rather than `0.10000000149011612`.
fn widen_shortest(v: f32) -> f64 {
    v.to_string().parse().unwrap_or_else(|_| f64::from(v))
}

/// Encodes a record as compact JSON text.
pub fn to_json_string(record: &RecordNode) -> Result<String> {
    let value = to_json_value(NodeRef::Record(record))?;
    Ok(serde_json::to_string(&value)?)
}

/// Decodes a record of type `schema` from JSON text.
pub fn from_json_str(schema: &Arc<RecordSchema>, text: &str) -> Result<RecordNode> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| Error::decode(format!("malformed JSON: {e}")))?;
    from_json_value(schema, &value)
}

/// Decodes a record of type `schema` from a JSON value.
pub fn from_json_value(schema: &Arc<RecordSchema>, value: &Value) -> Result<RecordNode> {
    decode_record(schema, value, "")
}

fn decode_record(schema: &Arc<RecordSchema>, value: &Value, at: &str) -> Result<RecordNode> {
    let Value::Object(object) = value else {
        return Err(unexpected("object", value, at));
    };
    let mut record = RecordNode::new(schema);
    for (name, field_value) in object {
        let location = format!("{at}/{name}");
        let field = schema.field(name).ok_or_else(|| {
            Error::decode(format!(
                "unknown field `{name}` for `{}` at {}",
                schema.name(),
                display(&location)
            ))
        })?;
        let node = decode_node(field.schema(), field_value, &location)?;
        record.set(name, node)?;
    }
    Ok(record)
}

fn decode_node(schema: &DataSchema, value: &Value, at: &str) -> Result<DataNode> {
    if value.is_null() {
        return Err(Error::decode(format!("null value at {}", display(at))));
    }
    match schema {
        DataSchema::Primitive(primitive) => decode_primitive(*primitive, value, at).map(DataNode::from),
        DataSchema::Record(record) => decode_record(record, value, at).map(DataNode::from),
        DataSchema::Array(items) => {
            let Value::Array(values) = value else {
                return Err(unexpected("array", value, at));
            };
            values
                .iter()
                .enumerate()
                .map(|(i, item)| decode_node(items, item, &format!("{at}/{i}")))
                .collect::<Result<Vec<_>>>()
                .map(|items| DataNode::from(ArrayNode::new(items)))
        }
        DataSchema::Union(union_schema) => {
            let Value::Object(object) = value else {
                return Err(unexpected("union object", value, at));
            };
            let mut union = UnionNode::new(union_schema);
            let mut entries = object.iter();
            if let Some((tag, member_value)) = entries.next() {
                if entries.next().is_some() {
                    return Err(Error::decode(format!(
                        "union at {} has more than one member",
                        display(at)
                    )));
                }
                let member = union_schema.member(tag).ok_or_else(|| {
                    Error::decode(format!(
                        "unknown member `{tag}` for `{}` at {}",
                        union_schema.display_name(),
                        display(at)
                    ))
                })?;
                let location = format!("{at}/{tag}");
                union.set_member(tag, decode_node(member.schema(), member_value, &location)?)?;
            }
            Ok(DataNode::from(union))
        }
        DataSchema::Typeref(alias) => {
            let inner = decode_node(alias.referenced(), value, at)?;
            Ok(DataNode::from(TyperefNode::new(alias, inner)))
        }
    }
}

fn decode_primitive(primitive: PrimitiveType, value: &Value, at: &str) -> Result<PrimitiveValue> {
    let decoded = match primitive {
        PrimitiveType::Boolean => value.as_bool().map(PrimitiveValue::Boolean),
        PrimitiveType::Int => value
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(PrimitiveValue::Int),
        PrimitiveType::Long => value.as_i64().map(PrimitiveValue::Long),
        PrimitiveType::Float => value.as_f64().map(|v| PrimitiveValue::Float(v as f32)),
        PrimitiveType::Double => value.as_f64().map(PrimitiveValue::Double),
        PrimitiveType::String => value.as_str().map(|v| PrimitiveValue::String(v.to_string())),
        PrimitiveType::Urn => match value.as_str() {
            Some(text) => Some(PrimitiveValue::Urn(text.parse::<Urn>().map_err(|_| {
                Error::decode(format!("invalid URN `{text}` at {}", display(at)))
            })?)),
            None => None,
        },
    };
    decoded.ok_or_else(|| unexpected(primitive.name(), value, at))
}

fn unexpected(expected: &str, value: &Value, at: &str) -> Error {
    let found = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    Error::decode(format!("expected {expected}, found {found} at {}", display(at)))
}

fn display(at: &str) -> &str {
    if at.is_empty() { "/" } else { at }
}

// ============================================================================
// Tests
// ============================================================================
