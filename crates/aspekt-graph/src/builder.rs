//! Relationship builders.
//!
//! A builder turns one aspect of an entity into relationship batches. Each
//! builder serves exactly one aspect type; the provided
//! [`RelationshipBuilder::build_relationships`] method enforces that before
//! handing the aspect to the implementation.

use aspekt_core::{Error, Result};
use aspekt_record::{
    resolve, FromNode, PathSpec, PrimitiveValue, RecordNode, RecordSchema, TypeTag, Urn,
};
use std::sync::Arc;

use crate::types::{RelationshipKind, RelationshipRecord, RelationshipUpdates, RemovalOption};

/// Turns aspects of one type into relationship batches.
///
/// # Example
///
/// ```rust,ignore
/// struct OwnershipBuilder { aspect_type: TypeTag }
///
/// impl RelationshipBuilder for OwnershipBuilder {
///     fn supported_aspect_type(&self) -> &TypeTag {
///         &self.aspect_type
///     }
///
///     fn extract(&self, entity: &Urn, aspect: &RecordNode) -> Result<Vec<RelationshipUpdates>> {
///         // resolve owner URNs and emit one OwnedBy batch
///     }
/// }
/// ```
pub trait RelationshipBuilder: Send + Sync {
    /// The aspect type this builder accepts.
    fn supported_aspect_type(&self) -> &TypeTag;

    /// Produces relationship batches from an aspect already known to be of
    /// the supported type.
    fn extract(&self, entity: &Urn, aspect: &RecordNode) -> Result<Vec<RelationshipUpdates>>;

    /// Checks the aspect's type and produces its relationship batches.
    ///
    /// Returns `TypeMismatch` when the aspect is not of the supported type.
    fn build_relationships(
        &self,
        entity: &Urn,
        aspect: &RecordNode,
    ) -> Result<Vec<RelationshipUpdates>> {
        let found = aspect.type_tag();
        let expected = self.supported_aspect_type();
        if &found != expected {
            return Err(Error::type_mismatch(expected.as_str(), found.as_str()));
        }
        self.extract(entity, aspect)
    }
}

// ============================================================================
// PathRelationshipBuilder
// ============================================================================

/// A builder configured by paths instead of code.
///
/// The destination path resolves to one or many URNs; each becomes a
/// relationship from the entity. Attribute paths resolve to at most one
/// primitive each and are attached to every relationship of the batch.
/// All paths are bound against the aspect schema at construction.
///
/// # Example
///
/// ```rust
/// use aspekt_graph::{PathRelationshipBuilder, RelationshipBuilder, RelationshipKind};
/// use aspekt_record::{ArrayNode, DataSchema, RecordNode, RecordSchema, Urn};
///
/// let ownership = RecordSchema::builder("com.example.Ownership")
///     .optional_field("owners", DataSchema::array(DataSchema::urn()))
///     .build()
///     .unwrap();
/// let builder =
///     PathRelationshipBuilder::new(&ownership, RelationshipKind::OwnedBy, "/owners/*").unwrap();
///
/// let owner: Urn = "urn:li:corpuser:alice".parse().unwrap();
/// let aspect = RecordNode::new(&ownership)
///     .with("owners", ArrayNode::from_iter([owner]))
///     .unwrap();
/// let entity: Urn = "urn:li:dataset:1".parse().unwrap();
///
/// let batches = builder.build_relationships(&entity, &aspect).unwrap();
/// assert_eq!(batches[0].relationships().len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct PathRelationshipBuilder {
    aspect_type: TypeTag,
    schema: Arc<RecordSchema>,
    kind: RelationshipKind,
    destination: PathSpec,
    attributes: Vec<(String, PathSpec)>,
    removal: RemovalOption,
}

impl PathRelationshipBuilder {
    /// Creates a builder for aspects of type `schema`.
    pub fn new(schema: &Arc<RecordSchema>, kind: RelationshipKind, destination: &str) -> Result<Self> {
        let destination = PathSpec::parse(destination)?.bind(schema)?;
        Ok(Self {
            aspect_type: schema.type_tag(),
            schema: Arc::clone(schema),
            kind,
            destination,
            attributes: Vec::new(),
            removal: RemovalOption::default(),
        })
    }

    /// Attaches the value at `path` to every relationship as `name`.
    pub fn with_attribute(mut self, name: impl Into<String>, path: &str) -> Result<Self> {
        let path = PathSpec::parse(path)?.bind(&self.schema)?;
        if path.has_wildcard() {
            return Err(Error::config(format!(
                "attribute path `{path}` must not fan out"
            )));
        }
        self.attributes.push((name.into(), path));
        Ok(self)
    }

    /// Sets the removal policy of produced batches.
    pub fn with_removal(mut self, removal: RemovalOption) -> Self {
        self.removal = removal;
        self
    }

    /// Kind of produced relationships.
    pub fn kind(&self) -> &RelationshipKind {
        &self.kind
    }

    /// Bound destination path.
    pub fn destination(&self) -> &PathSpec {
        &self.destination
    }

    fn destinations(&self, aspect: &RecordNode) -> Result<Vec<Urn>> {
        resolve(aspect, &self.destination)?
            .nodes()
            .into_iter()
            .map(Urn::from_node)
            .collect()
    }

    fn attribute_values(&self, aspect: &RecordNode) -> Result<Vec<(String, PrimitiveValue)>> {
        let mut values = Vec::with_capacity(self.attributes.len());
        for (name, path) in &self.attributes {
            if let Some(value) = resolve(aspect, path)?.single::<&PrimitiveValue>()? {
                values.push((name.clone(), value.clone()));
            }
        }
        Ok(values)
    }
}

impl RelationshipBuilder for PathRelationshipBuilder {
    fn supported_aspect_type(&self) -> &TypeTag {
        &self.aspect_type
    }

    fn extract(&self, entity: &Urn, aspect: &RecordNode) -> Result<Vec<RelationshipUpdates>> {
        let attributes = self.attribute_values(aspect)?;
        let relationships = self
            .destinations(aspect)?
            .into_iter()
            .map(|destination| {
                let mut record =
                    RelationshipRecord::new(entity.clone(), destination, self.kind.clone());
                record.attributes.extend(attributes.iter().cloned());
                record
            })
            .collect();

        let updates = RelationshipUpdates::new(relationships, self.kind.clone(), self.removal)?;
        log::debug!(
            "Built {} {} relationship(s) for {entity} from {}",
            updates.relationships().len(),
            self.kind,
            self.aspect_type
        );
        Ok(vec![updates])
    }
}

// ============================================================================
// Tests
// ============================================================================
