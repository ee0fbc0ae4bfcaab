//! Shared record fixtures for the resolver integration tests.
//!
//! `Mixed` carries one field of every shape the resolver has to walk:
//! primitives, a defaulted field, typerefs, nested records, arrays, and
//! unions with and without aliases.

#![allow(dead_code)]

use aspekt_record::{
    ArrayNode, DataNode, DataSchema, RecordNode, RecordSchema, TyperefSchema, UnionNode,
    UnionSchema, Urn,
};
use std::sync::Arc;

pub const FOO: &str = "com.example.AspectFoo";
pub const BAR: &str = "com.example.AspectBar";
pub const BAZ: &str = "com.example.AspectBaz";

/// Every schema used by the fixtures.
pub struct Schemas {
    pub foo: Arc<RecordSchema>,
    pub bar: Arc<RecordSchema>,
    pub baz: Arc<RecordSchema>,
    pub nested: Arc<RecordSchema>,
    pub aspect_union: Arc<UnionSchema>,
    pub complex_union: Arc<UnionSchema>,
    pub alias_union: Arc<UnionSchema>,
    pub string_union: Arc<UnionSchema>,
    pub foo_urn: Arc<TyperefSchema>,
    pub int_ref: Arc<TyperefSchema>,
    pub foo_ref: Arc<TyperefSchema>,
    pub mixed: Arc<RecordSchema>,
}

impl Schemas {
    pub fn new() -> Self {
        let foo = value_record(FOO);
        let bar = value_record(BAR);
        let baz = RecordSchema::builder(BAZ)
            .optional_field(
                "arrayRecordsField",
                DataSchema::array(DataSchema::Record(Arc::clone(&bar))),
            )
            .build()
            .unwrap();
        let nested = RecordSchema::builder("com.example.NestedRecord")
            .optional_field("foo", Arc::clone(&foo))
            .optional_field("bar", Arc::clone(&bar))
            .build()
            .unwrap();

        let aspect_union = UnionSchema::named("com.example.EntityAspectUnion")
            .member(Arc::clone(&foo))
            .member(Arc::clone(&bar))
            .build()
            .unwrap();
        let complex_union = UnionSchema::builder()
            .member(Arc::clone(&baz))
            .member(Arc::clone(&foo))
            .build()
            .unwrap();
        let alias_union = UnionSchema::builder()
            .aliased("Foo", Arc::clone(&foo))
            .aliased("Bar", Arc::clone(&bar))
            .build()
            .unwrap();
        let string_union = UnionSchema::named("com.example.StringUnion")
            .member(DataSchema::string())
            .build()
            .unwrap();

        let foo_urn = TyperefSchema::new("com.example.FooUrn", DataSchema::urn());
        let int_ref = TyperefSchema::new("com.example.IntRef", DataSchema::int());
        let foo_ref = TyperefSchema::new("com.example.FooRef", DataSchema::Record(Arc::clone(&foo)));

        let mixed = RecordSchema::builder("com.example.MixedRecord")
            .optional_field("value", DataSchema::string())
            .optional_field("flag", DataSchema::boolean())
            .field_with_default("defaultField", DataSchema::string(), "defaultVal")
            .optional_field("fooUrn", DataSchema::Typeref(Arc::clone(&foo_urn)))
            .optional_field("intTypeRef", DataSchema::Typeref(Arc::clone(&int_ref)))
            .optional_field("recordTypeRef", DataSchema::Typeref(Arc::clone(&foo_ref)))
            .optional_field("recordField", Arc::clone(&foo))
            .optional_field("nestedRecordField", Arc::clone(&nested))
            .optional_field("stringArray", DataSchema::array(DataSchema::string()))
            .optional_field("recordArray", DataSchema::array(DataSchema::Record(Arc::clone(&foo))))
            .optional_field(
                "nestedRecordArray",
                DataSchema::array(DataSchema::Record(Arc::clone(&nested))),
            )
            .optional_field(
                "unionArray",
                DataSchema::array(DataSchema::Union(Arc::clone(&string_union))),
            )
            .optional_field("primitiveUnion", Arc::clone(&string_union))
            .optional_field("recordUnion", Arc::clone(&aspect_union))
            .optional_field("recordUnionComplex", Arc::clone(&complex_union))
            .optional_field("recordUnionAlias", Arc::clone(&alias_union))
            .build()
            .unwrap();

        Self {
            foo,
            bar,
            baz,
            nested,
            aspect_union,
            complex_union,
            alias_union,
            string_union,
            foo_urn,
            int_ref,
            foo_ref,
            mixed,
        }
    }

    pub fn foo(&self, value: &str) -> RecordNode {
        RecordNode::new(&self.foo).with("value", value).unwrap()
    }

    pub fn bar(&self, value: &str) -> RecordNode {
        RecordNode::new(&self.bar).with("value", value).unwrap()
    }

    pub fn mixed(&self) -> RecordNode {
        RecordNode::new(&self.mixed)
    }

    pub fn nested(&self, foo: Option<&str>, bar: Option<&str>) -> RecordNode {
        let mut nested = RecordNode::new(&self.nested);
        if let Some(value) = foo {
            nested.set("foo", self.foo(value)).unwrap();
        }
        if let Some(value) = bar {
            nested.set("bar", self.bar(value)).unwrap();
        }
        nested
    }

    pub fn foo_array(&self, values: &[&str]) -> ArrayNode {
        values.iter().map(|v| self.foo(v)).collect()
    }

    pub fn string_union(&self, value: &str) -> UnionNode {
        UnionNode::with_member(&self.string_union, "string", value).unwrap()
    }
}

fn value_record(name: &str) -> Arc<RecordSchema> {
    RecordSchema::builder(name)
        .optional_field("value", DataSchema::string())
        .build()
        .unwrap()
}

pub fn urn(text: &str) -> Urn {
    text.parse().unwrap()
}

pub fn strings(values: &[&str]) -> DataNode {
    DataNode::Array(values.iter().copied().collect())
}
