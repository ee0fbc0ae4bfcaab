//! Background bulk queue.
//!
//! [`BulkProcessor`] accepts operations from any number of threads without
//! blocking, groups them into bulk requests by count and by time, and sends
//! them through a [`BulkClient`] with bounded parallelism. Every operation
//! ends in a terminal [`DocumentState`] and is reported to the listener.

use aspekt_core::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::client::BulkClient;
use crate::config::BulkConfig;
use crate::listener::BulkListener;
use crate::request::{BulkOperation, DocumentKey, DocumentState};

const RESOURCE: &str = "bulk processor";

// ============================================================================
// BulkStats
// ============================================================================

/// Totals for the lifetime of a processor, returned by [`BulkProcessor::close`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BulkStats {
    /// Operations accepted by `add`.
    pub submitted: usize,
    /// Operations the index applied.
    pub committed: usize,
    /// Operations reported as failed.
    pub failed: usize,
    /// Bulk requests sent.
    pub batches: usize,
}

impl std::ops::AddAssign for BulkStats {
    fn add_assign(&mut self, other: Self) {
        self.submitted += other.submitted;
        self.committed += other.committed;
        self.failed += other.failed;
        self.batches += other.batches;
    }
}

// ============================================================================
// BulkProcessor
// ============================================================================

#[derive(Clone, Default)]
struct StateTable(Arc<Mutex<HashMap<DocumentKey, DocumentState>>>);

impl StateTable {
    fn lock(&self) -> MutexGuard<'_, HashMap<DocumentKey, DocumentState>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get(&self, key: &DocumentKey) -> Option<DocumentState> {
        self.lock().get(key).copied()
    }

    fn set_all<'k>(&self, keys: impl IntoIterator<Item = &'k DocumentKey>, state: DocumentState) {
        let mut table = self.lock();
        for key in keys {
            table.insert(key.clone(), state);
        }
    }

    /// Fails every key of an aborted flush that had not reached a terminal
    /// state, and tallies the batch from what the table recorded.
    fn settle_aborted(&self, keys: &[DocumentKey]) -> BulkStats {
        let mut stats = BulkStats {
            batches: 1,
            ..BulkStats::default()
        };
        let mut table = self.lock();
        for key in keys {
            match table.get(key) {
                Some(DocumentState::Committed) => stats.committed += 1,
                _ => {
                    table.insert(key.clone(), DocumentState::Failed);
                    stats.failed += 1;
                }
            }
        }
        stats
    }
}

/// Batching queue in front of a [`BulkClient`].
///
/// Must be spawned inside a tokio runtime.
///
/// # Example
///
/// ```rust
/// # tokio_test::block_on(async {
/// use aspekt_search::{
///     BulkConfig, BulkOperation, BulkProcessor, DocumentKey, InMemoryIndex, NoopListener,
///     UpdateRequest,
/// };
/// use std::sync::Arc;
///
/// let index = InMemoryIndex::new();
/// let processor = BulkProcessor::spawn(
///     Arc::new(index.clone()),
///     BulkConfig::default(),
///     Arc::new(NoopListener),
/// )
/// .unwrap();
///
/// let key = DocumentKey::new("docs", "1");
/// processor
///     .add(BulkOperation::Update(UpdateRequest::replace(key, serde_json::json!({"a": 1}))))
///     .unwrap();
///
/// let stats = processor.close().await.unwrap();
/// assert_eq!(stats.committed, 1);
/// assert!(index.get("docs", "1").is_some());
/// # });
/// ```
pub struct BulkProcessor {
    sender: RwLock<Option<mpsc::UnboundedSender<BulkOperation>>>,
    worker: Mutex<Option<JoinHandle<BulkStats>>>,
    states: StateTable,
}

impl BulkProcessor {
    /// Validates `config` and starts the background batching task.
    pub fn spawn(
        client: Arc<dyn BulkClient>,
        config: BulkConfig,
        listener: Arc<dyn BulkListener>,
    ) -> Result<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::config(format!("{RESOURCE} needs a tokio runtime: {e}")))?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let states = StateTable::default();
        let worker = Worker {
            client,
            listener,
            states: states.clone(),
            semaphore: Arc::new(Semaphore::new(config.concurrent_requests)),
            flushes: JoinSet::new(),
            next_execution_id: 0,
        };
        let handle = runtime.spawn(worker.run(receiver, config));

        Ok(Self {
            sender: RwLock::new(Some(sender)),
            worker: Mutex::new(Some(handle)),
            states,
        })
    }

    /// Queues an operation. Never blocks; fails with `Closed` once
    /// [`close`](Self::close) has started.
    pub fn add(&self, operation: BulkOperation) -> Result<()> {
        let sender = self.sender.read().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = sender.as_ref() else {
            return Err(Error::closed(RESOURCE));
        };
        let key = operation.key().clone();
        // Held across the send so the worker cannot advance the state first.
        let mut table = self.states.lock();
        sender.send(operation).map_err(|_| Error::closed(RESOURCE))?;
        table.insert(key, DocumentState::Pending);
        Ok(())
    }

    /// Last known state of a document, if it was ever queued here.
    pub fn state(&self, key: &DocumentKey) -> Option<DocumentState> {
        self.states.get(key)
    }

    /// Whether `close` has started.
    pub fn is_closed(&self) -> bool {
        self.sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Stops accepting operations and waits until every queued operation
    /// has been flushed, successfully or not.
    ///
    /// There is no timeout; wrap the call in `tokio::time::timeout` for one.
    /// A second call fails with `Closed`.
    pub async fn close(&self) -> Result<BulkStats> {
        let sender = self
            .sender
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_none() {
            return Err(Error::closed(RESOURCE));
        }
        drop(sender);

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(worker) = worker else {
            return Err(Error::closed(RESOURCE));
        };
        let stats = worker
            .await
            .map_err(|e| Error::transport(format!("{RESOURCE} task stopped abnormally: {e}")))?;

        log::info!(
            "Closed {RESOURCE}: {} submitted, {} committed, {} failed in {} request(s)",
            stats.submitted,
            stats.committed,
            stats.failed,
            stats.batches
        );
        Ok(stats)
    }
}

impl std::fmt::Debug for BulkProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkProcessor")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Worker
// ============================================================================

struct Worker {
    client: Arc<dyn BulkClient>,
    listener: Arc<dyn BulkListener>,
    states: StateTable,
    semaphore: Arc<Semaphore>,
    flushes: JoinSet<BulkStats>,
    next_execution_id: u64,
}

impl Worker {
    async fn run(
        mut self,
        mut receiver: mpsc::UnboundedReceiver<BulkOperation>,
        config: BulkConfig,
    ) -> BulkStats {
        let mut stats = BulkStats::default();
        let mut pending = Vec::new();
        let mut ticker = config.flush_interval().map(|period| {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            tokio::select! {
                received = receiver.recv() => {
                    let Some(operation) = received else {
                        break;
                    };
                    stats.submitted += 1;
                    pending.push(operation);
                    if pending.len() >= config.bulk_actions {
                        self.dispatch(std::mem::take(&mut pending)).await;
                    }
                }
                () = next_tick(&mut ticker) => {
                    if !pending.is_empty() {
                        self.dispatch(std::mem::take(&mut pending)).await;
                    }
                }
                Some(joined) = self.flushes.join_next() => {
                    stats += join_stats(joined);
                }
            }
        }

        if !pending.is_empty() {
            self.dispatch(pending).await;
        }
        while let Some(joined) = self.flushes.join_next().await {
            stats += join_stats(joined);
        }
        stats
    }

    /// Waits for a request slot, then starts the flush. Batches therefore
    /// start in dispatch order, and with one slot they also finish in it.
    async fn dispatch(&mut self, batch: Vec<BulkOperation>) {
        self.next_execution_id += 1;
        let execution_id = self.next_execution_id;
        log::debug!("Dispatching bulk {execution_id} with {} operation(s)", batch.len());

        // The semaphore is never closed, so this only fails after a bug.
        let permit = Arc::clone(&self.semaphore).acquire_owned().await.ok();
        let keys: Vec<DocumentKey> = batch.iter().map(|op| op.key().clone()).collect();
        let client = Arc::clone(&self.client);
        let listener = Arc::clone(&self.listener);
        let states = self.states.clone();
        self.flushes.spawn(async move {
            let _permit = permit;
            let task_states = states.clone();
            let flushed = tokio::spawn(async move {
                flush(execution_id, batch, client.as_ref(), listener.as_ref(), &task_states).await
            })
            .await;
            flushed.unwrap_or_else(|e| {
                log::warn!("Bulk {execution_id}: flush aborted: {e}");
                states.settle_aborted(&keys)
            })
        });
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn join_stats(joined: std::result::Result<BulkStats, JoinError>) -> BulkStats {
    joined.unwrap_or_else(|e| {
        log::warn!("Bulk flush task failed: {e}");
        BulkStats::default()
    })
}

async fn flush(
    execution_id: u64,
    batch: Vec<BulkOperation>,
    client: &dyn BulkClient,
    listener: &dyn BulkListener,
    states: &StateTable,
) -> BulkStats {
    let keys: Vec<DocumentKey> = batch.iter().map(|op| op.key().clone()).collect();
    states.set_all(&keys, DocumentState::InFlight);
    listener.before_bulk(execution_id, &batch);

    let mut stats = BulkStats {
        batches: 1,
        ..BulkStats::default()
    };
    match client.execute(batch).await {
        Ok(responses) => {
            if responses.len() != keys.len() {
                log::warn!(
                    "Bulk {execution_id}: expected {} response(s), got {}",
                    keys.len(),
                    responses.len()
                );
            }
            let mut table = states.lock();
            for (pos, key) in keys.iter().enumerate() {
                let failed = responses
                    .get(pos)
                    .is_none_or(|response| response.outcome.is_failure());
                let state = if failed {
                    stats.failed += 1;
                    DocumentState::Failed
                } else {
                    stats.committed += 1;
                    DocumentState::Committed
                };
                table.insert(key.clone(), state);
            }
            drop(table);
            listener.after_bulk(execution_id, &responses);
        }
        Err(error) => {
            log::warn!(
                "Bulk {execution_id}: request for {} operation(s) failed: {error}",
                keys.len()
            );
            states.set_all(&keys, DocumentState::Failed);
            stats.failed = keys.len();
            listener.after_failure(execution_id, &keys, &error);
        }
    }
    stats
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::listener::NoopListener;
    use crate::memory::InMemoryIndex;
    use crate::request::{BulkItemResponse, UpdateRequest};
    use serde_json::json;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingListener {
        before: Mutex<Vec<(u64, usize)>>,
        after: Mutex<Vec<BulkItemResponse>>,
        failures: Mutex<Vec<DocumentKey>>,
    }

    impl BulkListener for RecordingListener {
        fn before_bulk(&self, execution_id: u64, operations: &[BulkOperation]) {
            self.before.lock().unwrap().push((execution_id, operations.len()));
        }

        fn after_bulk(&self, _execution_id: u64, responses: &[BulkItemResponse]) {
            self.after.lock().unwrap().extend_from_slice(responses);
        }

        fn after_failure(&self, _execution_id: u64, keys: &[DocumentKey], _error: &Error) {
            self.failures.lock().unwrap().extend_from_slice(keys);
        }
    }

    fn config(bulk_actions: usize, flush_interval_ms: Option<u64>) -> BulkConfig {
        BulkConfig {
            bulk_actions,
            concurrent_requests: 1,
            flush_interval_ms,
        }
    }

    fn update(id: &str) -> BulkOperation {
        BulkOperation::Update(UpdateRequest::replace(
            DocumentKey::new("docs", id),
            json!({ "id": id }),
        ))
    }

    #[tokio::test]
    async fn test_batches_by_count() {
        let index = InMemoryIndex::new();
        let listener = Arc::new(RecordingListener::default());
        let processor =
            BulkProcessor::spawn(Arc::new(index.clone()), config(2, None), listener.clone())
                .unwrap();

        for id in ["a", "b", "c", "d", "e"] {
            processor.add(update(id)).unwrap();
        }
        let stats = processor.close().await.unwrap();

        assert_eq!(
            stats,
            BulkStats {
                submitted: 5,
                committed: 5,
                failed: 0,
                batches: 3
            }
        );
        let mut sizes: Vec<usize> = listener.before.lock().unwrap().iter().map(|b| b.1).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![1, 2, 2]);
        assert_eq!(listener.after.lock().unwrap().len(), 5);
        assert_eq!(index.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_flushes_partial_batch() {
        let index = InMemoryIndex::new();
        let processor = BulkProcessor::spawn(
            Arc::new(index.clone()),
            config(100, Some(50)),
            Arc::new(NoopListener),
        )
        .unwrap();

        processor.add(update("a")).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let key = DocumentKey::new("docs", "a");
        assert_eq!(processor.state(&key), Some(DocumentState::Committed));
        assert!(index.get("docs", "a").is_some());
        processor.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_is_a_barrier() {
        let index = InMemoryIndex::new();
        let processor = BulkProcessor::spawn(
            Arc::new(index.clone()),
            config(1000, None),
            Arc::new(NoopListener),
        )
        .unwrap();

        for n in 0..10 {
            processor.add(update(&n.to_string())).unwrap();
        }
        assert_eq!(
            processor.state(&DocumentKey::new("docs", "3")),
            Some(DocumentState::Pending)
        );
        processor.close().await.unwrap();

        assert_eq!(index.len(), 10);
        assert_eq!(
            processor.state(&DocumentKey::new("docs", "3")),
            Some(DocumentState::Committed)
        );
    }

    #[tokio::test]
    async fn test_add_and_close_after_close() {
        let processor = BulkProcessor::spawn(
            Arc::new(InMemoryIndex::new()),
            BulkConfig::default(),
            Arc::new(NoopListener),
        )
        .unwrap();

        processor.close().await.unwrap();

        assert!(processor.is_closed());
        assert!(matches!(processor.add(update("a")), Err(Error::Closed { .. })));
        assert!(matches!(processor.close().await, Err(Error::Closed { .. })));
    }

    #[tokio::test]
    async fn test_transport_failure_fails_whole_batch() {
        let index = InMemoryIndex::new();
        index.fail_transport(true);
        let listener = Arc::new(RecordingListener::default());
        let processor =
            BulkProcessor::spawn(Arc::new(index.clone()), config(10, None), listener.clone())
                .unwrap();

        for id in ["a", "b", "c"] {
            processor.add(update(id)).unwrap();
        }
        let stats = processor.close().await.unwrap();

        assert_eq!(stats.failed, 3);
        assert_eq!(stats.committed, 0);
        assert_eq!(listener.failures.lock().unwrap().len(), 3);
        assert_eq!(
            processor.state(&DocumentKey::new("docs", "b")),
            Some(DocumentState::Failed)
        );
        assert!(index.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_flushes() {
        let index = InMemoryIndex::new();
        let processor = BulkProcessor::spawn(
            Arc::new(index.clone()),
            BulkConfig {
                bulk_actions: 1,
                concurrent_requests: 4,
                flush_interval_ms: None,
            },
            Arc::new(NoopListener),
        )
        .unwrap();

        for n in 0..50 {
            processor.add(update(&n.to_string())).unwrap();
        }
        let stats = processor.close().await.unwrap();

        assert_eq!(stats.batches, 50);
        assert_eq!(stats.committed, 50);
        assert_eq!(index.len(), 50);
    }

    struct PanickingListener;

    impl BulkListener for PanickingListener {
        #[allow(clippy::panic)]
        fn before_bulk(&self, execution_id: u64, _operations: &[BulkOperation]) {
            if execution_id == 1 {
                panic!("listener gave up on bulk {execution_id}");
            }
        }
    }

    #[tokio::test]
    async fn test_aborted_flush_fails_its_operations() {
        let index = InMemoryIndex::new();
        let processor = BulkProcessor::spawn(
            Arc::new(index.clone()),
            config(2, None),
            Arc::new(PanickingListener),
        )
        .unwrap();

        for id in ["a", "b", "c"] {
            processor.add(update(id)).unwrap();
        }
        let stats = processor.close().await.unwrap();

        assert_eq!(
            stats,
            BulkStats {
                submitted: 3,
                committed: 1,
                failed: 2,
                batches: 2
            }
        );
        assert_eq!(
            processor.state(&DocumentKey::new("docs", "a")),
            Some(DocumentState::Failed)
        );
        assert_eq!(
            processor.state(&DocumentKey::new("docs", "c")),
            Some(DocumentState::Committed)
        );
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_rejected_add_records_no_state() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let processor = runtime
            .block_on(async {
                BulkProcessor::spawn(
                    Arc::new(InMemoryIndex::new()),
                    BulkConfig::default(),
                    Arc::new(NoopListener),
                )
            })
            .unwrap();
        // Dropping the runtime drops the worker and its receiver.
        drop(runtime);

        assert!(matches!(processor.add(update("a")), Err(Error::Closed { .. })));
        assert_eq!(processor.state(&DocumentKey::new("docs", "a")), None);
    }

    #[test]
    fn test_spawn_outside_runtime_fails() {
        let result = BulkProcessor::spawn(
            Arc::new(InMemoryIndex::new()),
            BulkConfig::default(),
            Arc::new(NoopListener),
        );
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let result = BulkProcessor::spawn(
            Arc::new(InMemoryIndex::new()),
            config(0, None),
            Arc::new(NoopListener),
        );
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
