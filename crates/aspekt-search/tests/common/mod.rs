//! Shared fixtures for the bulk writer integration tests.

#![allow(dead_code)]

use aspekt_core::Error;
use aspekt_record::{ArrayNode, DataSchema, RecordNode, RecordSchema};
use aspekt_search::{
    BulkConfig, BulkItemResponse, BulkListener, BulkProcessor, BulkWriter, DocumentKey,
    InMemoryIndex, ItemOutcome,
};
use std::sync::{Arc, Mutex};

pub const INDEX: &str = "datasetindex_v2";

/// Search document schema for datasets.
pub fn dataset_document() -> Arc<RecordSchema> {
    RecordSchema::builder("com.example.DatasetDocument")
        .field("urn", DataSchema::urn())
        .optional_field("name", DataSchema::string())
        .optional_field("description", DataSchema::string())
        .optional_field("tags", DataSchema::array(DataSchema::string()))
        .build()
        .unwrap()
}

/// A dataset document with the given fields set.
pub fn document(
    schema: &Arc<RecordSchema>,
    id: &str,
    name: Option<&str>,
    description: Option<&str>,
    tags: &[&str],
) -> RecordNode {
    let mut doc = RecordNode::new(schema)
        .with("urn", id.parse::<aspekt_record::Urn>().unwrap())
        .unwrap();
    if let Some(name) = name {
        doc.set("name", name).unwrap();
    }
    if let Some(description) = description {
        doc.set("description", description).unwrap();
    }
    if !tags.is_empty() {
        doc.set("tags", tags.iter().copied().collect::<ArrayNode>())
            .unwrap();
    }
    doc
}

/// Listener keeping every reported outcome.
#[derive(Default)]
pub struct RecordingListener {
    pub responses: Mutex<Vec<BulkItemResponse>>,
    pub transport_failures: Mutex<Vec<DocumentKey>>,
}

impl RecordingListener {
    pub fn failed_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .responses
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.outcome.is_failure())
            .map(|r| r.key.id.clone())
            .collect();
        ids.extend(self.transport_failures.lock().unwrap().iter().map(|k| k.id.clone()));
        ids.sort();
        ids
    }

    pub fn outcome(&self, id: &str) -> Option<ItemOutcome> {
        self.responses
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.key.id == id)
            .map(|r| r.outcome.clone())
    }
}

impl BulkListener for RecordingListener {
    fn after_bulk(&self, _execution_id: u64, responses: &[BulkItemResponse]) {
        self.responses.lock().unwrap().extend_from_slice(responses);
    }

    fn after_failure(&self, _execution_id: u64, keys: &[DocumentKey], _error: &Error) {
        self.transport_failures.lock().unwrap().extend_from_slice(keys);
    }
}

/// Writer over `index` with a recording listener.
pub fn writer(
    index: &InMemoryIndex,
    config: BulkConfig,
) -> (BulkWriter, Arc<RecordingListener>) {
    let listener = Arc::new(RecordingListener::default());
    let processor =
        BulkProcessor::spawn(Arc::new(index.clone()), config, listener.clone()).unwrap();
    let writer = BulkWriter::new(dataset_document().type_tag(), processor, INDEX);
    (writer, listener)
}
