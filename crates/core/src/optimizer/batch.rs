//! Time-windowed request batching
//!
//! The first request for a batch key opens a window; requests for the same key
//! that arrive before it closes join the batch. When the window closes (or the
//! batch reaches its size limit) every queued statement runs concurrently and
//! each caller receives exactly the rows for the statements it submitted, in
//! submission order. If any statement fails, every caller in the batch
//! receives that same error.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::{PerfError, PerfResult};
use crate::ports::{QueryExecutor, Rows, Statement};

type Reply = oneshot::Sender<PerfResult<Vec<Rows>>>;

/// One caller's statements and its reply channel
struct BatchRequest {
    statements: Vec<Statement>,
    reply: Reply,
}

/// Requests collected under one batch key
struct PendingBatch {
    /// Distinguishes this window from a later one reusing the same key
    id: u64,
    key: String,
    executor: Arc<dyn QueryExecutor>,
    requests: Vec<BatchRequest>,
}

impl PendingBatch {
    async fn execute(self) {
        let statement_count: usize = self.requests.iter().map(|r| r.statements.len()).sum();
        debug!(
            batch_key = %self.key,
            requests = self.requests.len(),
            statements = statement_count,
            "executing batch"
        );

        let executor = Arc::clone(&self.executor);
        let queries = self
            .requests
            .iter()
            .flat_map(|request| request.statements.iter())
            .map(|statement| executor.query(&statement.sql, &statement.params));

        let outcome = try_join_all(queries).await;
        match outcome {
            Ok(rows) => self.complete(rows),
            Err(err) => {
                warn!(batch_key = %self.key, error = %err, "batch failed");
                self.fail(err);
            }
        }
    }

    /// Hand each caller the slice of rows matching its statements
    fn complete(self, rows: Vec<Rows>) {
        let mut rows = rows.into_iter();
        for request in self.requests {
            let own: Vec<Rows> = rows.by_ref().take(request.statements.len()).collect();
            // Receiver may have been dropped by a cancelled caller
            let _ = request.reply.send(Ok(own));
        }
    }

    fn fail(self, err: PerfError) {
        for request in self.requests {
            let _ = request.reply.send(Err(err.clone()));
        }
    }
}

/// Collects concurrent requests per key and flushes them after a window
pub(crate) struct BatchScheduler {
    pending: Arc<Mutex<HashMap<String, PendingBatch>>>,
    next_id: AtomicU64,
    window: Duration,
}

impl BatchScheduler {
    pub(crate) fn new(window: Duration) -> Self {
        Self { pending: Arc::new(Mutex::new(HashMap::new())), next_id: AtomicU64::new(0), window }
    }

    /// Number of batch windows currently open
    pub(crate) fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Queue statements under `batch_key` and wait for their rows
    ///
    /// With `max_batch`, a batch that reaches that many requests is flushed
    /// immediately instead of waiting for the window to close.
    pub(crate) async fn submit(
        &self,
        executor: Arc<dyn QueryExecutor>,
        statements: Vec<Statement>,
        batch_key: &str,
        max_batch: Option<usize>,
    ) -> PerfResult<Vec<Rows>> {
        let (reply, receiver) = oneshot::channel();
        let request = BatchRequest { statements, reply };

        let ready = {
            let mut pending = self.pending.lock();
            let batch = pending.entry(batch_key.to_string()).or_insert_with(|| {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                self.schedule_flush(batch_key.to_string(), id);
                PendingBatch { id, key: batch_key.to_string(), executor, requests: Vec::new() }
            });
            batch.requests.push(request);

            if max_batch.is_some_and(|max| batch.requests.len() >= max) {
                pending.remove(batch_key)
            } else {
                None
            }
        };

        if let Some(batch) = ready {
            tokio::spawn(batch.execute());
        }

        receiver.await.map_err(|_| PerfError::BatchDropped { batch_key: batch_key.to_string() })?
    }

    fn schedule_flush(&self, key: String, id: u64) {
        let pending = Arc::clone(&self.pending);
        let window = self.window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let batch = {
                let mut pending = pending.lock();
                match pending.get(&key) {
                    Some(batch) if batch.id == id => pending.remove(&key),
                    _ => None,
                }
            };
            if let Some(batch) = batch {
                batch.execute().await;
            }
        });
    }
}
