//! Builder registry keyed by aspect type.
//!
//! The registry is assembled once during initialization and is read-only
//! afterwards, so it can be shared by reference across threads.

use aspekt_core::{Error, Result};
use aspekt_record::{RecordNode, TypeTag, Urn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::builder::RelationshipBuilder;
use crate::types::RelationshipUpdates;

/// Read-only map from aspect type to its relationship builder.
///
/// # Example
///
/// ```rust
/// use aspekt_graph::{BuilderRegistry, PathRelationshipBuilder, RelationshipKind};
/// use aspekt_record::{DataSchema, RecordSchema};
///
/// let ownership = RecordSchema::builder("com.example.Ownership")
///     .optional_field("owner", DataSchema::urn())
///     .build()
///     .unwrap();
/// let registry = BuilderRegistry::builder()
///     .register(PathRelationshipBuilder::new(&ownership, RelationshipKind::OwnedBy, "/owner").unwrap())
///     .build()
///     .unwrap();
///
/// assert!(registry.get(&ownership.type_tag()).is_some());
/// ```
#[derive(Clone, Default)]
pub struct BuilderRegistry {
    builders: HashMap<TypeTag, Arc<dyn RelationshipBuilder>>,
}

impl BuilderRegistry {
    /// Starts assembling a registry.
    pub fn builder() -> BuilderRegistryBuilder {
        BuilderRegistryBuilder::default()
    }

    /// Builder registered for `aspect_type`.
    pub fn get(&self, aspect_type: &TypeTag) -> Option<&Arc<dyn RelationshipBuilder>> {
        self.builders.get(aspect_type)
    }

    /// Whether a builder is registered for `aspect_type`.
    pub fn contains(&self, aspect_type: &TypeTag) -> bool {
        self.builders.contains_key(aspect_type)
    }

    /// Registered aspect types.
    pub fn aspect_types(&self) -> impl Iterator<Item = &TypeTag> {
        self.builders.keys()
    }

    /// Number of registered builders.
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    /// Whether no builders are registered.
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Dispatches `aspect` to the builder for its type.
    ///
    /// Aspects without a builder produce no batches.
    pub fn build_relationships(
        &self,
        entity: &Urn,
        aspect: &RecordNode,
    ) -> Result<Vec<RelationshipUpdates>> {
        let aspect_type = aspect.type_tag();
        match self.builders.get(&aspect_type) {
            Some(builder) => builder.build_relationships(entity, aspect),
            None => {
                log::debug!("No relationship builder registered for {aspect_type}");
                Ok(Vec::new())
            }
        }
    }
}

impl std::fmt::Debug for BuilderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.builders.keys().map(TypeTag::as_str).collect();
        types.sort_unstable();
        f.debug_struct("BuilderRegistry")
            .field("aspect_types", &types)
            .finish()
    }
}

/// Assembles a [`BuilderRegistry`].
#[derive(Default)]
pub struct BuilderRegistryBuilder {
    builders: Vec<Arc<dyn RelationshipBuilder>>,
}

impl BuilderRegistryBuilder {
    /// Adds a builder.
    pub fn register<B: RelationshipBuilder + 'static>(self, builder: B) -> Self {
        self.register_arc(Arc::new(builder))
    }

    /// Adds a shared builder.
    pub fn register_arc(mut self, builder: Arc<dyn RelationshipBuilder>) -> Self {
        self.builders.push(builder);
        self
    }

    /// Finishes the registry. Two builders for one aspect type are rejected.
    pub fn build(self) -> Result<BuilderRegistry> {
        let mut builders = HashMap::with_capacity(self.builders.len());
        for builder in self.builders {
            let aspect_type = builder.supported_aspect_type().clone();
            if builders.contains_key(&aspect_type) {
                return Err(Error::config(format!(
                    "more than one relationship builder registered for {aspect_type}"
                )));
            }
            builders.insert(aspect_type, builder);
        }
        log::debug!("Relationship builder registry ready with {} builder(s)", builders.len());
        Ok(BuilderRegistry { builders })
    }
}

// ============================================================================
// Tests
// ============================================================================
