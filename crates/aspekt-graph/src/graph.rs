//! In-memory relationship graph.
//!
//! Applies [`RelationshipUpdates`] batches the way a graph writer does:
//! a `Full` batch replaces every relationship of its kind from the entity,
//! a `Partial` batch only adds or updates the listed relationships.

use aspekt_record::Urn;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

use crate::types::{RelationshipKind, RelationshipRecord, RelationshipUpdates, RemovalOption};

/// Counts from applying one or more batches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyStats {
    /// Relationships that did not exist before.
    pub added: usize,
    /// Existing relationships whose attributes were replaced.
    pub updated: usize,
    /// Relationships removed by `Full` batches.
    pub removed: usize,
}

impl std::ops::AddAssign for ApplyStats {
    fn add_assign(&mut self, other: Self) {
        self.added += other.added;
        self.updated += other.updated;
        self.removed += other.removed;
    }
}

/// Directed graph of entities connected by relationship records.
#[derive(Clone, Debug, Default)]
pub struct RelationshipGraph {
    graph: DiGraph<Urn, RelationshipRecord>,
    node_indices: HashMap<Urn, NodeIndex>,
}

impl RelationshipGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of relationships.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the entity appears in the graph.
    pub fn contains(&self, urn: &Urn) -> bool {
        self.node_indices.contains_key(urn)
    }

    /// Applies one batch produced for `entity`.
    pub fn apply(&mut self, entity: &Urn, updates: &RelationshipUpdates) -> ApplyStats {
        let mut stats = ApplyStats::default();
        if updates.removal() == RemovalOption::Full {
            stats.removed = self.remove_outgoing(entity, updates.kind());
        }
        for record in updates.relationships() {
            if self.upsert_edge(record) {
                stats.updated += 1;
            } else {
                stats.added += 1;
            }
        }
        log::debug!(
            "Applied {:?} {} batch for {entity}: +{} ~{} -{}",
            updates.removal(),
            updates.kind(),
            stats.added,
            stats.updated,
            stats.removed
        );
        stats
    }

    /// Applies every batch produced for `entity`, in order.
    pub fn apply_all(&mut self, entity: &Urn, batches: &[RelationshipUpdates]) -> ApplyStats {
        let mut stats = ApplyStats::default();
        for updates in batches {
            stats += self.apply(entity, updates);
        }
        stats
    }

    /// Relationships leaving `urn`, optionally restricted to one kind.
    pub fn outgoing(&self, urn: &Urn, kind: Option<&RelationshipKind>) -> Vec<&RelationshipRecord> {
        self.edges(urn, Direction::Outgoing, kind)
    }

    /// Relationships arriving at `urn`, optionally restricted to one kind.
    pub fn incoming(&self, urn: &Urn, kind: Option<&RelationshipKind>) -> Vec<&RelationshipRecord> {
        self.edges(urn, Direction::Incoming, kind)
    }

    /// Every relationship in the graph.
    pub fn iter_relationships(&self) -> impl Iterator<Item = &RelationshipRecord> {
        self.graph.edge_weights()
    }

    fn edges(
        &self,
        urn: &Urn,
        direction: Direction,
        kind: Option<&RelationshipKind>,
    ) -> Vec<&RelationshipRecord> {
        let Some(&idx) = self.node_indices.get(urn) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| e.weight())
            .filter(|r| kind.is_none_or(|k| &r.kind == k))
            .collect();
        // petgraph yields adjacency lists newest first
        edges.reverse();
        edges
    }

    fn node(&mut self, urn: &Urn) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(urn) {
            return idx;
        }
        let idx = self.graph.add_node(urn.clone());
        self.node_indices.insert(urn.clone(), idx);
        idx
    }

    fn find_edge(&self, record: &RelationshipRecord) -> Option<EdgeIndex> {
        let from = *self.node_indices.get(&record.source)?;
        let to = *self.node_indices.get(&record.destination)?;
        self.graph
            .edges_connecting(from, to)
            .find(|e| e.weight().kind == record.kind)
            .map(|e| e.id())
    }

    /// Inserts or replaces the edge; returns whether it already existed.
    fn upsert_edge(&mut self, record: &RelationshipRecord) -> bool {
        if let Some(edge) = self.find_edge(record) {
            self.graph[edge] = record.clone();
            return true;
        }
        let from = self.node(&record.source);
        let to = self.node(&record.destination);
        self.graph.add_edge(from, to, record.clone());
        false
    }

    fn remove_outgoing(&mut self, entity: &Urn, kind: &RelationshipKind) -> usize {
        let Some(&idx) = self.node_indices.get(entity) else {
            return 0;
        };
        let mut doomed: Vec<EdgeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .filter(|e| &e.weight().kind == kind)
            .map(|e| e.id())
            .collect();
        // removal swaps the last edge into the freed slot, so go high to low
        doomed.sort_unstable_by(|a, b| b.cmp(a));
        for edge in &doomed {
            self.graph.remove_edge(*edge);
        }
        doomed.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
