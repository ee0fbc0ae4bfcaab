//! Relationship types shared by builders and graph writers.
//!
//! Builders emit [`RelationshipUpdates`] batches; a graph writer applies each
//! batch for the entity that produced it, honoring the batch's
//! [`RemovalOption`].

use aspekt_core::{Error, Result};
use aspekt_record::{PrimitiveValue, Urn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// RelationshipKind enum
// ============================================================================

/// Kind of a relationship edge.
///
/// Common kinds are first-class variants; anything else uses `Custom`.
///
/// # Example
///
/// ```rust
/// use aspekt_graph::RelationshipKind;
///
/// assert_eq!(RelationshipKind::OwnedBy.name(), "owned_by");
/// assert_eq!(RelationshipKind::parse("OwnedBy"), RelationshipKind::OwnedBy);
/// assert_eq!(
///     RelationshipKind::parse("reviews"),
///     RelationshipKind::Custom("reviews".to_string())
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// Entity is owned by the destination.
    OwnedBy,
    /// Entity is downstream of the destination.
    DownstreamOf,
    /// Entity contains the destination.
    Contains,
    /// Entity is part of the destination.
    IsPartOf,
    /// Entity consumes the destination.
    Consumes,
    /// Entity produces the destination.
    Produces,
    /// Kind not covered above.
    Custom(String),
}

impl RelationshipKind {
    /// Returns the kind name in snake case (custom names verbatim).
    pub fn name(&self) -> &str {
        match self {
            Self::OwnedBy => "owned_by",
            Self::DownstreamOf => "downstream_of",
            Self::Contains => "contains",
            Self::IsPartOf => "is_part_of",
            Self::Consumes => "consumes",
            Self::Produces => "produces",
            Self::Custom(name) => name,
        }
    }

    /// Parses a kind name.
    ///
    /// Known kinds match case-insensitively in snake or Pascal case.
    /// Any other name becomes `Custom`.
    pub fn parse(name: &str) -> Self {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "ownedby" => Self::OwnedBy,
            "downstreamof" => Self::DownstreamOf,
            "contains" => Self::Contains,
            "ispartof" => Self::IsPartOf,
            "consumes" => Self::Consumes,
            "produces" => Self::Produces,
            _ => Self::Custom(name.to_string()),
        }
    }
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// RemovalOption enum
// ============================================================================

/// How a batch treats relationships the entity already has.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalOption {
    /// The batch is authoritative: every existing relationship of the batch's
    /// kind from the entity is replaced by the batch contents.
    #[default]
    Full,
    /// Only the listed relationships are added or updated.
    Partial,
}

// ============================================================================
// RelationshipRecord struct
// ============================================================================

/// A typed directed edge between two entities.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RelationshipRecord {
    /// Source entity.
    pub source: Urn,
    /// Destination entity.
    pub destination: Urn,
    /// Kind of relationship.
    pub kind: RelationshipKind,
    /// Extra attributes carried by the edge.
    pub attributes: BTreeMap<String, PrimitiveValue>,
}

impl RelationshipRecord {
    /// Creates a relationship without attributes.
    pub fn new(source: Urn, destination: Urn, kind: RelationshipKind) -> Self {
        Self {
            source,
            destination,
            kind,
            attributes: BTreeMap::new(),
        }
    }

    /// Adds an attribute.
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<PrimitiveValue>,
    ) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

// ============================================================================
// RelationshipUpdates struct
// ============================================================================

/// One batch of relationships of a single kind, with its removal policy.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RelationshipUpdates {
    relationships: Vec<RelationshipRecord>,
    kind: RelationshipKind,
    removal: RemovalOption,
}

impl RelationshipUpdates {
    /// Creates a batch. Every record must be of the batch's kind.
    pub fn new(
        relationships: Vec<RelationshipRecord>,
        kind: RelationshipKind,
        removal: RemovalOption,
    ) -> Result<Self> {
        if let Some(other) = relationships.iter().find(|r| r.kind != kind) {
            return Err(Error::type_mismatch(kind.name(), other.kind.name()));
        }
        Ok(Self {
            relationships,
            kind,
            removal,
        })
    }

    /// Records in the batch.
    pub fn relationships(&self) -> &[RelationshipRecord] {
        &self.relationships
    }

    /// Kind shared by every record.
    pub fn kind(&self) -> &RelationshipKind {
        &self.kind
    }

    /// Removal policy.
    pub fn removal(&self) -> RemovalOption {
        self.removal
    }

    /// Whether the batch carries no records.
    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    /// Consumes the batch, returning its records.
    pub fn into_relationships(self) -> Vec<RelationshipRecord> {
        self.relationships
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn urn(text: &str) -> Urn {
        text.parse().unwrap()
    }

    #[test]
    fn test_kind_names_round_trip_through_parse() {
        let kinds = [
            RelationshipKind::OwnedBy,
            RelationshipKind::DownstreamOf,
            RelationshipKind::Contains,
            RelationshipKind::IsPartOf,
            RelationshipKind::Consumes,
            RelationshipKind::Produces,
        ];
        for kind in kinds {
            assert_eq!(RelationshipKind::parse(kind.name()), kind);
        }
    }

    #[test]
    fn test_kind_parse_is_lenient() {
        assert_eq!(RelationshipKind::parse("DownstreamOf"), RelationshipKind::DownstreamOf);
        assert_eq!(RelationshipKind::parse("IS_PART_OF"), RelationshipKind::IsPartOf);
        assert_eq!(
            RelationshipKind::parse("BelongsTo"),
            RelationshipKind::Custom("BelongsTo".to_string())
        );
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&RelationshipKind::OwnedBy).unwrap();
        assert_eq!(json, "\"owned_by\"");

        let custom = RelationshipKind::Custom("reviews".to_string());
        let parsed: RelationshipKind =
            serde_json::from_str(&serde_json::to_string(&custom).unwrap()).unwrap();
        assert_eq!(parsed, custom);
    }

    #[test]
    fn test_removal_option_default_and_serde() {
        assert_eq!(RemovalOption::default(), RemovalOption::Full);
        assert_eq!(
            serde_json::to_string(&RemovalOption::Partial).unwrap(),
            "\"partial\""
        );
    }

    #[test]
    fn test_updates_reject_mixed_kinds() {
        let records = vec![
            RelationshipRecord::new(urn("urn:li:foo:1"), urn("urn:li:bar:1"), RelationshipKind::OwnedBy),
            RelationshipRecord::new(urn("urn:li:foo:1"), urn("urn:li:bar:2"), RelationshipKind::Contains),
        ];
        let err = RelationshipUpdates::new(records, RelationshipKind::OwnedBy, RemovalOption::Full)
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_record_attributes() {
        let record = RelationshipRecord::new(
            urn("urn:li:foo:1"),
            urn("urn:li:bar:1"),
            RelationshipKind::Consumes,
        )
        .with_attribute("label", "nightly")
        .with_attribute("weight", 3_i64);

        assert_eq!(record.attributes.len(), 2);
        assert_eq!(record.attributes["label"], PrimitiveValue::from("nightly"));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["destination"], "urn:li:bar:1");
        assert_eq!(json["attributes"]["weight"], 3);
    }
}
