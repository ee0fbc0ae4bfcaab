//! Transport boundary of the bulk pipeline.

use async_trait::async_trait;
use aspekt_core::Result;

use crate::request::{BulkItemResponse, BulkOperation};

/// Sends bulk requests to a search index.
///
/// Implementations return exactly one response per operation, in request
/// order, and apply each update's `retry_on_conflict` themselves. An `Err`
/// means the whole request failed and no item outcome is known.
#[async_trait]
pub trait BulkClient: Send + Sync {
    /// Executes one bulk request.
    async fn execute(&self, operations: Vec<BulkOperation>) -> Result<Vec<BulkItemResponse>>;
}
