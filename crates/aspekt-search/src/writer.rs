//! Document writer on top of a [`BulkProcessor`].

use async_trait::async_trait;
use aspekt_core::{Error, Result};
use aspekt_record::{NodeRef, RecordNode, TypeTag, to_json_value};

use crate::processor::{BulkProcessor, BulkStats};
use crate::request::{BulkOperation, DeleteRequest, DocumentKey, DocumentState, UpdateRequest};

/// Writes whole documents into a search index.
#[async_trait]
pub trait SearchWriter: Send + Sync {
    /// Stages a create-or-replace of the document under `id`.
    fn upsert(&self, document: &RecordNode, id: &str) -> Result<()>;

    /// Stages removal of the document under `id`.
    fn delete(&self, id: &str) -> Result<()>;

    /// Flushes everything staged and releases the transport.
    async fn close(&self) -> Result<BulkStats>;
}

/// [`SearchWriter`] for one document type and one index.
///
/// Upserts replace the stored document wholesale. Concurrent upserts of one
/// id are ordered only by the transport's conflict retry; the last write to
/// commit wins.
#[derive(Debug)]
pub struct BulkWriter {
    document_type: TypeTag,
    index_name: String,
    processor: BulkProcessor,
}

impl BulkWriter {
    /// Creates a writer staging into `processor` for index `index_name`.
    pub fn new(
        document_type: TypeTag,
        processor: BulkProcessor,
        index_name: impl Into<String>,
    ) -> Self {
        Self {
            document_type,
            index_name: index_name.into(),
            processor,
        }
    }

    /// Type every written document must have.
    pub fn document_type(&self) -> &TypeTag {
        &self.document_type
    }

    /// Target index.
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Stages a create-or-replace of `document` under `id`.
    pub fn upsert(&self, document: &RecordNode, id: &str) -> Result<()> {
        let found = document.type_tag();
        if found != self.document_type {
            return Err(Error::type_mismatch(
                self.document_type.as_str(),
                found.as_str(),
            ));
        }
        let source = to_json_value(NodeRef::from(document))?;
        self.processor
            .add(BulkOperation::Update(UpdateRequest::replace(self.key(id), source)))
    }

    /// Stages removal of the document under `id`.
    pub fn delete(&self, id: &str) -> Result<()> {
        self.processor
            .add(BulkOperation::Delete(DeleteRequest { key: self.key(id) }))
    }

    /// Waits for every staged operation to finish, then shuts the
    /// processor down.
    pub async fn close(&self) -> Result<BulkStats> {
        self.processor.close().await
    }

    /// Last known state of the document under `id`.
    pub fn state(&self, id: &str) -> Option<DocumentState> {
        self.processor.state(&self.key(id))
    }

    fn key(&self, id: &str) -> DocumentKey {
        DocumentKey::new(self.index_name.as_str(), id)
    }
}

#[async_trait]
impl SearchWriter for BulkWriter {
    fn upsert(&self, document: &RecordNode, id: &str) -> Result<()> {
        BulkWriter::upsert(self, document, id)
    }

    fn delete(&self, id: &str) -> Result<()> {
        BulkWriter::delete(self, id)
    }

    async fn close(&self) -> Result<BulkStats> {
        BulkWriter::close(self).await
    }
}

// ============================================================================
// Tests
// ============================================================================
