//! Narrowing resolved nodes into caller-requested shapes.

use aspekt_core::{Error, Result};

use crate::node::{ArrayNode, DataNode, NodeRef, PrimitiveValue, RecordNode, UnionNode};
use crate::resolver::ResolvedValue;
use crate::urn::Urn;

/// A shape a resolved node can be narrowed into.
///
/// Typerefs are unwrapped before narrowing.
pub trait FromNode<'a>: Sized {
    /// Name of the shape, used in `TypeMismatch` errors.
    fn expected() -> &'static str;

    /// Narrows an unwrapped node, or returns `None` on a shape mismatch.
    fn try_from_node(node: NodeRef<'a>) -> Option<Self>;

    /// Narrows a node, failing with `TypeMismatch` on a shape mismatch.
    fn from_node(node: NodeRef<'a>) -> Result<Self> {
        let node = node.unwrap_typerefs();
        Self::try_from_node(node).ok_or_else(|| Error::type_mismatch(Self::expected(), node.kind()))
    }
}

macro_rules! primitive_shape {
    ($ty:ty, $name:literal, $($pattern:pat => $value:expr),+ $(,)?) => {
        impl<'a> FromNode<'a> for $ty {
            fn expected() -> &'static str {
                $name
            }

            fn try_from_node(node: NodeRef<'a>) -> Option<Self> {
                match node {
                    $(NodeRef::Primitive($pattern) => Some($value),)+
                    _ => None,
                }
            }
        }
    };
}

primitive_shape!(String, "string", PrimitiveValue::String(v) => v.clone());
primitive_shape!(bool, "boolean", PrimitiveValue::Boolean(v) => *v);
primitive_shape!(i32, "int", PrimitiveValue::Int(v) => *v);
primitive_shape!(
    i64, "long",
    PrimitiveValue::Long(v) => *v,
    PrimitiveValue::Int(v) => i64::from(*v),
);
primitive_shape!(f32, "float", PrimitiveValue::Float(v) => *v);
primitive_shape!(
    f64, "double",
    PrimitiveValue::Double(v) => *v,
    PrimitiveValue::Float(v) => f64::from(*v),
);
primitive_shape!(Urn, "urn", PrimitiveValue::Urn(v) => v.clone());

impl<'a> FromNode<'a> for &'a str {
    fn expected() -> &'static str {
        "string"
    }

    fn try_from_node(node: NodeRef<'a>) -> Option<Self> {
        match node {
            NodeRef::Primitive(PrimitiveValue::String(v)) => Some(v.as_str()),
            _ => None,
        }
    }
}

impl<'a> FromNode<'a> for &'a Urn {
    fn expected() -> &'static str {
        "urn"
    }

    fn try_from_node(node: NodeRef<'a>) -> Option<Self> {
        match node {
            NodeRef::Primitive(PrimitiveValue::Urn(v)) => Some(v),
            _ => None,
        }
    }
}

impl<'a> FromNode<'a> for &'a PrimitiveValue {
    fn expected() -> &'static str {
        "primitive"
    }

    fn try_from_node(node: NodeRef<'a>) -> Option<Self> {
        match node {
            NodeRef::Primitive(v) => Some(v),
            _ => None,
        }
    }
}

impl<'a> FromNode<'a> for &'a RecordNode {
    fn expected() -> &'static str {
        "record"
    }

    fn try_from_node(node: NodeRef<'a>) -> Option<Self> {
        match node {
            NodeRef::Record(record) => Some(record),
            _ => None,
        }
    }
}

impl<'a> FromNode<'a> for &'a ArrayNode {
    fn expected() -> &'static str {
        "array"
    }

    fn try_from_node(node: NodeRef<'a>) -> Option<Self> {
        match node {
            NodeRef::Array(array) => Some(array),
            _ => None,
        }
    }
}

impl<'a> FromNode<'a> for &'a UnionNode {
    fn expected() -> &'static str {
        "union"
    }

    fn try_from_node(node: NodeRef<'a>) -> Option<Self> {
        match node {
            NodeRef::Union(union) => Some(union),
            _ => None,
        }
    }
}

impl<'a> FromNode<'a> for NodeRef<'a> {
    fn expected() -> &'static str {
        "node"
    }

    fn try_from_node(node: NodeRef<'a>) -> Option<Self> {
        Some(node)
    }
}

impl<'a> FromNode<'a> for DataNode {
    fn expected() -> &'static str {
        "node"
    }

    fn try_from_node(node: NodeRef<'a>) -> Option<Self> {
        Some(node.to_data_node())
    }
}

impl<'a> ResolvedValue<'a> {
    /// Whether nothing was found.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Every found node, in order.
    pub fn nodes(&self) -> Vec<NodeRef<'a>> {
        match self {
            Self::Absent => Vec::new(),
            Self::Single(node) => vec![*node],
            Self::Sequence(nodes) => nodes.clone(),
        }
    }

    /// Narrows a single value. A sequence is a shape mismatch.
    pub fn single<T: FromNode<'a>>(&self) -> Result<Option<T>> {
        match self {
            Self::Absent => Ok(None),
            Self::Single(node) => T::from_node(*node).map(Some),
            Self::Sequence(_) => Err(Error::type_mismatch(T::expected(), "sequence")),
        }
    }

    /// Narrows every element of a sequence.
    ///
    /// A single array node counts as a sequence of its items.
    pub fn sequence<T: FromNode<'a>>(&self) -> Result<Option<Vec<T>>> {
        match self {
            Self::Absent => Ok(None),
            Self::Single(node) => match node.unwrap_typerefs() {
                NodeRef::Array(array) => array
                    .iter()
                    .map(|item| T::from_node(item.as_node_ref()))
                    .collect::<Result<Vec<_>>>()
                    .map(Some),
                other => Err(Error::type_mismatch(
                    format!("sequence of {}", T::expected()),
                    other.kind(),
                )),
            },
            Self::Sequence(nodes) => nodes
                .iter()
                .map(|node| T::from_node(*node))
                .collect::<Result<Vec<_>>>()
                .map(Some),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
