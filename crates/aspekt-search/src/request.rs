//! Bulk request and response types exchanged with a [`BulkClient`](crate::BulkClient).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Conflict retries the transport applies to each upsert.
pub const MAX_RETRIES: u32 = 3;

// ============================================================================
// DocumentKey
// ============================================================================

/// Identity of a document: index name plus document id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentKey {
    /// Index name.
    pub index: String,
    /// Document id within the index.
    pub id: String,
}

impl DocumentKey {
    /// Creates a key.
    pub fn new(index: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.index, self.id)
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Full document written when the target does not exist yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexRequest {
    /// Target document.
    pub key: DocumentKey,
    /// Document source.
    pub source: Value,
}

/// Replace-or-create request for one document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    /// Target document.
    pub key: DocumentKey,
    /// Replacement source for an existing document.
    pub doc: Value,
    /// Request used when the document does not exist.
    pub upsert: IndexRequest,
    /// Skip the write when the stored source is identical.
    pub detect_noop: bool,
    /// Extra attempts on a version conflict.
    pub retry_on_conflict: u32,
}

impl UpdateRequest {
    /// Builds a whole-document upsert: the same source replaces an existing
    /// document or creates a missing one.
    pub fn replace(key: DocumentKey, source: Value) -> Self {
        Self {
            upsert: IndexRequest {
                key: key.clone(),
                source: source.clone(),
            },
            key,
            doc: source,
            detect_noop: false,
            retry_on_conflict: MAX_RETRIES,
        }
    }
}

/// Removes one document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeleteRequest {
    /// Target document.
    pub key: DocumentKey,
}

/// One entry of a bulk request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkOperation {
    /// Replace or create.
    Update(UpdateRequest),
    /// Remove.
    Delete(DeleteRequest),
}

impl BulkOperation {
    /// Document targeted by this operation.
    pub fn key(&self) -> &DocumentKey {
        match self {
            Self::Update(request) => &request.key,
            Self::Delete(request) => &request.key,
        }
    }

    /// Short operation name for logs.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Why an item failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Version conflict persisted through every retry.
    Conflict,
    /// The index refused the operation.
    Rejected,
}

/// Per-item failure detail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    /// Failure category.
    pub kind: FailureKind,
    /// Transport-provided reason.
    pub message: String,
}

/// Result of one operation in a bulk request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    /// A new document was written.
    Created,
    /// An existing document was replaced.
    Updated,
    /// The document was removed.
    Deleted,
    /// Delete target did not exist.
    NotFound,
    /// The operation failed.
    Failed(ItemFailure),
}

impl ItemOutcome {
    /// Whether the operation failed.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Response to one [`BulkOperation`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItemResponse {
    /// Document the response refers to.
    pub key: DocumentKey,
    /// What happened.
    pub outcome: ItemOutcome,
}

// ============================================================================
// DocumentState
// ============================================================================

/// Lifecycle of a staged document: `Pending → InFlight → Committed | Failed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    /// Queued, not yet sent.
    Pending,
    /// Part of a bulk request awaiting its response.
    InFlight,
    /// Written (or deleted) by the index.
    Committed,
    /// Reported as failed.
    Failed,
}

impl DocumentState {
    /// Whether the document has left the pipeline.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Failed)
    }
}

// ============================================================================
// Tests
// ============================================================================
