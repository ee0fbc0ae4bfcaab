//! Callbacks observing bulk flushes.

use aspekt_core::Error;

use crate::request::{BulkItemResponse, BulkOperation, DocumentKey, ItemOutcome};

/// Observer of every flush made by a [`BulkProcessor`](crate::BulkProcessor).
///
/// All methods default to no-ops. They run on the flush task, so they
/// should return quickly.
pub trait BulkListener: Send + Sync {
    /// Called before a bulk request is sent.
    fn before_bulk(&self, _execution_id: u64, _operations: &[BulkOperation]) {}

    /// Called with the per-item outcomes of a completed request.
    fn after_bulk(&self, _execution_id: u64, _responses: &[BulkItemResponse]) {}

    /// Called when the whole request failed.
    fn after_failure(&self, _execution_id: u64, _keys: &[DocumentKey], _error: &Error) {}
}

/// Listener that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;

impl BulkListener for NoopListener {}

/// Listener that reports flushes through `log`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingListener;

impl BulkListener for LoggingListener {
    fn before_bulk(&self, execution_id: u64, operations: &[BulkOperation]) {
        log::debug!("Bulk {execution_id}: sending {} operation(s)", operations.len());
    }

    fn after_bulk(&self, execution_id: u64, responses: &[BulkItemResponse]) {
        let mut failed = 0;
        for response in responses {
            if let ItemOutcome::Failed(failure) = &response.outcome {
                failed += 1;
                log::warn!(
                    "Bulk {execution_id}: {} failed ({:?}): {}",
                    response.key,
                    failure.kind,
                    failure.message
                );
            }
        }
        log::debug!(
            "Bulk {execution_id}: {} succeeded, {failed} failed",
            responses.len() - failed
        );
    }

    fn after_failure(&self, execution_id: u64, keys: &[DocumentKey], error: &Error) {
        log::warn!(
            "Bulk {execution_id}: request for {} operation(s) failed: {error}",
            keys.len()
        );
    }
}
