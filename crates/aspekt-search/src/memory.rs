//! In-memory search index implementing [`BulkClient`].
//!
//! Stores documents per `(index, id)` with a version counter and can
//! simulate version conflicts and transport outages.

use async_trait::async_trait;
use aspekt_core::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::client::BulkClient;
use crate::request::{
    BulkItemResponse, BulkOperation, DeleteRequest, DocumentKey, FailureKind, ItemFailure,
    ItemOutcome, UpdateRequest,
};

/// A stored document.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredDocument {
    /// Document source.
    pub source: Value,
    /// Number of writes applied, starting at 1.
    pub version: u64,
}

#[derive(Debug, Default)]
struct IndexState {
    documents: HashMap<DocumentKey, StoredDocument>,
    conflicts: HashMap<DocumentKey, u32>,
    requests: usize,
}

impl IndexState {
    /// Consumes one injected conflict for `key`, if any remain.
    fn take_conflict(&mut self, key: &DocumentKey) -> bool {
        match self.conflicts.get_mut(key) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn update(&mut self, request: &UpdateRequest) -> ItemOutcome {
        let attempts = 1 + request.retry_on_conflict;
        for _ in 0..attempts {
            if !self.take_conflict(&request.key) {
                return self.write(request);
            }
        }
        failure(
            FailureKind::Conflict,
            format!(
                "version conflict on {} after {attempts} attempt(s)",
                request.key
            ),
        )
    }

    fn write(&mut self, request: &UpdateRequest) -> ItemOutcome {
        if !request.doc.is_object() || !request.upsert.source.is_object() {
            return failure(
                FailureKind::Rejected,
                format!("document source for {} is not an object", request.key),
            );
        }
        match self.documents.get_mut(&request.key) {
            Some(stored) => {
                if request.detect_noop && stored.source == request.doc {
                    return ItemOutcome::Updated;
                }
                stored.source = request.doc.clone();
                stored.version += 1;
                ItemOutcome::Updated
            }
            None => {
                self.documents.insert(
                    request.upsert.key.clone(),
                    StoredDocument {
                        source: request.upsert.source.clone(),
                        version: 1,
                    },
                );
                ItemOutcome::Created
            }
        }
    }

    fn delete(&mut self, request: &DeleteRequest) -> ItemOutcome {
        if self.take_conflict(&request.key) {
            return failure(
                FailureKind::Conflict,
                format!("version conflict deleting {}", request.key),
            );
        }
        match self.documents.remove(&request.key) {
            Some(_) => ItemOutcome::Deleted,
            None => ItemOutcome::NotFound,
        }
    }
}

fn failure(kind: FailureKind, message: String) -> ItemOutcome {
    ItemOutcome::Failed(ItemFailure { kind, message })
}

/// Search index held in memory.
///
/// Clones share the same storage, so a test can hand one clone to a
/// [`BulkProcessor`](crate::BulkProcessor) and inspect another.
#[derive(Clone, Debug, Default)]
pub struct InMemoryIndex {
    state: Arc<Mutex<IndexState>>,
    transport_down: Arc<AtomicBool>,
}

impl InMemoryIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, IndexState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes the next `n` write attempts on the document fail with a
    /// version conflict.
    pub fn inject_conflicts(&self, index: &str, id: &str, n: u32) {
        self.lock().conflicts.insert(DocumentKey::new(index, id), n);
    }

    /// When `down`, every bulk request fails as a whole.
    pub fn fail_transport(&self, down: bool) {
        self.transport_down.store(down, Ordering::SeqCst);
    }

    /// Stored document, if present.
    pub fn get(&self, index: &str, id: &str) -> Option<StoredDocument> {
        self.lock().documents.get(&DocumentKey::new(index, id)).cloned()
    }

    /// Number of stored documents across all indices.
    pub fn len(&self) -> usize {
        self.lock().documents.len()
    }

    /// Whether no documents are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bulk requests received, including failed ones.
    pub fn request_count(&self) -> usize {
        self.lock().requests
    }
}

#[async_trait]
impl BulkClient for InMemoryIndex {
    async fn execute(&self, operations: Vec<BulkOperation>) -> Result<Vec<BulkItemResponse>> {
        let mut state = self.lock();
        state.requests += 1;
        if self.transport_down.load(Ordering::SeqCst) {
            return Err(Error::transport("search index unavailable"));
        }
        let responses = operations
            .iter()
            .map(|operation| {
                let outcome = match operation {
                    BulkOperation::Update(request) => state.update(request),
                    BulkOperation::Delete(request) => state.delete(request),
                };
                BulkItemResponse {
                    key: operation.key().clone(),
                    outcome,
                }
            })
            .collect();
        Ok(responses)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upsert(id: &str, source: Value) -> BulkOperation {
        BulkOperation::Update(UpdateRequest::replace(DocumentKey::new("idx", id), source))
    }

    fn delete(id: &str) -> BulkOperation {
        BulkOperation::Delete(DeleteRequest {
            key: DocumentKey::new("idx", id),
        })
    }

    #[tokio::test]
    async fn test_create_then_replace() {
        let index = InMemoryIndex::new();

        let first = index.execute(vec![upsert("a", json!({"x": 1, "y": 2}))]).await.unwrap();
        let second = index.execute(vec![upsert("a", json!({"x": 3}))]).await.unwrap();

        assert_eq!(first[0].outcome, ItemOutcome::Created);
        assert_eq!(second[0].outcome, ItemOutcome::Updated);
        let stored = index.get("idx", "a").unwrap();
        assert_eq!(stored.source, json!({"x": 3}));
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn test_identical_write_still_bumps_version() {
        let index = InMemoryIndex::new();
        index.execute(vec![upsert("a", json!({"x": 1}))]).await.unwrap();
        index.execute(vec![upsert("a", json!({"x": 1}))]).await.unwrap();

        assert_eq!(index.get("idx", "a").unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_conflicts_within_retry_budget_commit() {
        let index = InMemoryIndex::new();
        index.inject_conflicts("idx", "a", 3);

        let responses = index.execute(vec![upsert("a", json!({"x": 1}))]).await.unwrap();

        assert_eq!(responses[0].outcome, ItemOutcome::Created);
    }

    #[tokio::test]
    async fn test_conflicts_beyond_retry_budget_fail() {
        let index = InMemoryIndex::new();
        index.inject_conflicts("idx", "a", 4);

        let responses = index.execute(vec![upsert("a", json!({"x": 1}))]).await.unwrap();

        assert!(matches!(
            &responses[0].outcome,
            ItemOutcome::Failed(ItemFailure { kind: FailureKind::Conflict, .. })
        ));
        assert!(index.get("idx", "a").is_none());
    }

    #[tokio::test]
    async fn test_delete_outcomes() {
        let index = InMemoryIndex::new();
        index.execute(vec![upsert("a", json!({}))]).await.unwrap();

        let responses = index.execute(vec![delete("a"), delete("a")]).await.unwrap();

        assert_eq!(responses[0].outcome, ItemOutcome::Deleted);
        assert_eq!(responses[1].outcome, ItemOutcome::NotFound);
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_non_object_rejected() {
        let index = InMemoryIndex::new();
        let responses = index.execute(vec![upsert("a", json!([1, 2]))]).await.unwrap();
        assert!(matches!(
            &responses[0].outcome,
            ItemOutcome::Failed(ItemFailure { kind: FailureKind::Rejected, .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_down() {
        let index = InMemoryIndex::new();
        index.fail_transport(true);

        let err = index.execute(vec![upsert("a", json!({}))]).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(index.request_count(), 1);

        index.fail_transport(false);
        assert!(index.execute(vec![upsert("a", json!({}))]).await.is_ok());
    }
}
