//! Background worker for chart recomputation
//!
//! Keeps aggregation and trace building off the caller's thread. Requests are
//! handled in order on a single thread, so results come back in the order they
//! were requested.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde_json::Value;

use crate::data::{Row, TransformConfig};
use crate::state::{Derived, derive_chart};

/// One recomputation: the rows, the mapping they go through and the
/// interaction options layered into the template.
#[derive(Debug, Clone)]
pub struct RecomputeRequest {
    /// Bumped by a state reset, results from older epochs are dropped
    pub epoch: u64,
    pub rows: Arc<Vec<Row>>,
    pub columns: Vec<String>,
    pub transform: TransformConfig,
    pub interaction: Value,
}

/// Requests that can be sent to the background worker
pub enum WorkerRequest {
    Recompute(RecomputeRequest),
    /// Shutdown the worker
    Shutdown,
}

/// Results returned from the background worker
#[derive(Debug)]
pub enum WorkerResult {
    /// Processed rows and chart template are ready
    Recomputed { epoch: u64, derived: Derived },
    /// The recomputation failed
    Error { epoch: u64, msg: String },
}

impl WorkerResult {
    pub fn epoch(&self) -> u64 {
        match self {
            WorkerResult::Recomputed { epoch, .. } | WorkerResult::Error { epoch, .. } => *epoch,
        }
    }
}

/// Background worker that recomputes derived chart data off the caller's thread
pub struct RecomputeWorker {
    tx: Sender<WorkerRequest>,
    rx: Receiver<WorkerResult>,
    handle: Option<JoinHandle<()>>,
    pending: usize,
}

impl RecomputeWorker {
    /// Spawn a new background worker thread
    pub fn spawn() -> Self {
        let (req_tx, req_rx) = channel::<WorkerRequest>();
        let (res_tx, res_rx) = channel::<WorkerResult>();

        let handle = thread::spawn(move || {
            Self::worker_loop(req_rx, res_tx);
        });

        Self {
            tx: req_tx,
            rx: res_rx,
            handle: Some(handle),
            pending: 0,
        }
    }

    fn worker_loop(rx: Receiver<WorkerRequest>, tx: Sender<WorkerResult>) {
        while let Ok(request) = rx.recv() {
            let result = match request {
                WorkerRequest::Recompute(request) => Self::recompute(&request),
                WorkerRequest::Shutdown => break,
            };

            if tx.send(result).is_err() {
                break;
            }
        }
        tracing::debug!("recompute worker stopped");
    }

    fn recompute(request: &RecomputeRequest) -> WorkerResult {
        let outcome = crate::perf::timed!(
            "recompute",
            derive_chart(
                &request.rows,
                &request.transform,
                &request.columns,
                &request.interaction,
            )
        );
        match outcome {
            Ok(derived) => WorkerResult::Recomputed {
                epoch: request.epoch,
                derived,
            },
            Err(err) => WorkerResult::Error {
                epoch: request.epoch,
                msg: err.user_message(),
            },
        }
    }

    /// Send a request to the worker (non-blocking). Returns false when the
    /// worker thread is gone.
    pub fn request(&mut self, request: RecomputeRequest) -> bool {
        match self.tx.send(WorkerRequest::Recompute(request)) {
            Ok(()) => {
                self.pending += 1;
                true
            }
            Err(_) => {
                tracing::error!("recompute worker is not running");
                false
            }
        }
    }

    /// Poll for completed work (non-blocking)
    pub fn poll(&mut self) -> Option<WorkerResult> {
        match self.rx.try_recv() {
            Ok(result) => {
                self.pending = self.pending.saturating_sub(1);
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.pending = 0;
                None
            }
        }
    }

    /// Block until the next result arrives or the timeout passes
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<WorkerResult> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => {
                self.pending = self.pending.saturating_sub(1);
                Some(result)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.pending = 0;
                None
            }
        }
    }

    /// Number of requests sent whose results have not been collected
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Check if there's pending work
    pub fn is_busy(&self) -> bool {
        self.pending > 0
    }
}

impl Drop for RecomputeWorker {
    fn drop(&mut self) {
        let _ = self.tx.send(WorkerRequest::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Default for RecomputeWorker {
    fn default() -> Self {
        Self::spawn()
    }
}
