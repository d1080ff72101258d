//! Pipeline context: owns the dependency graph and the worker pool.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::PipelineError;
use super::graph::{Graph, NodeId, NodeInfo, NodeStatus, Task};

struct Shared {
    graph: Mutex<Graph>,
    changed: Condvar,
    pool: Mutex<Option<Arc<ThreadPool>>>,
    workers: usize,
}

/// Handle to a deferred execution pipeline.
///
/// Cloning the handle shares the same graph. Masks created in a context
/// register their operations as nodes instead of running them inline; the
/// nodes run on a fixed-size worker pool once [`start`](Self::start) is
/// called, each as soon as its dependencies have completed.
#[derive(Clone)]
pub struct PipelineContext {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("workers", &self.shared.workers)
            .field("started", &self.is_started())
            .field("pending", &self.pending())
            .finish()
    }
}

impl PipelineContext {
    /// Create a context that will run nodes on `workers` threads.
    pub fn new(workers: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                graph: Mutex::new(Graph::new()),
                changed: Condvar::new(),
                pool: Mutex::new(None),
                workers: workers.max(1),
            }),
        }
    }

    /// Number of worker threads used once started.
    pub fn workers(&self) -> usize {
        self.shared.workers
    }

    /// Whether two handles refer to the same pipeline.
    pub fn same_pipeline(&self, other: &PipelineContext) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    pub fn is_started(&self) -> bool {
        self.shared.graph.lock().is_started()
    }

    /// Launch the worker pool and dispatch every node whose dependencies are
    /// satisfied. Calling `start` on a running pipeline does nothing.
    pub fn start(&self) -> Result<(), PipelineError> {
        let mut pool_slot = self.shared.pool.lock();
        if pool_slot.is_none() {
            let pool = ThreadPoolBuilder::new()
                .num_threads(self.shared.workers)
                .thread_name(|i| format!("mask-pipeline-{i}"))
                .build()
                .map_err(|e| PipelineError::WorkerPool(e.to_string()))?;
            *pool_slot = Some(Arc::new(pool));
        }
        drop(pool_slot);

        let ready = {
            let mut graph = self.shared.graph.lock();
            if graph.is_started() {
                return Ok(());
            }
            let ready = graph.start();
            log::info!(
                "Pipeline started with {} workers ({} nodes registered, {} ready)",
                self.shared.workers,
                graph.pending(),
                ready.len()
            );
            ready
        };
        Shared::dispatch(&self.shared, ready);
        Ok(())
    }

    /// Register a node. It runs once the pipeline is started and every
    /// dependency has completed.
    pub(crate) fn submit(
        &self,
        mask: &str,
        operation: &'static str,
        deps: Vec<NodeId>,
        task: Task,
    ) -> NodeId {
        let (id, queued) = self.shared.graph.lock().add(mask, operation, deps, task);
        log::debug!("Enqueued `{operation}` on `{mask}` as node {}", id.index());
        if queued {
            Shared::dispatch(&self.shared, vec![id]);
        }
        id
    }

    /// Block until `node` has finished.
    ///
    /// Returns the node's failure, or the failure of any upstream node it
    /// depended on. Waiting on a node of a pipeline that was never started
    /// fails with [`PipelineError::NotStarted`] instead of blocking forever.
    pub fn wait_for(&self, node: NodeId) -> Result<(), PipelineError> {
        let mut graph = self.shared.graph.lock();
        loop {
            match graph.status(node) {
                NodeStatus::Done => return Ok(()),
                NodeStatus::Failed(err) => return Err(err),
                _ if !graph.is_started() => return Err(PipelineError::NotStarted),
                _ => self.shared.changed.wait(&mut graph),
            }
        }
    }

    /// Block until every registered node has finished. Returns the first
    /// failure in registration order.
    pub fn join(&self) -> Result<(), PipelineError> {
        let mut graph = self.shared.graph.lock();
        while graph.pending() > 0 {
            if !graph.is_started() {
                return Err(PipelineError::NotStarted);
            }
            self.shared.changed.wait(&mut graph);
        }
        log::info!("Pipeline joined ({} nodes)", graph.nodes().len());
        match graph.first_failure() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Clear the graph for a fresh generation run.
    ///
    /// Waits for nodes already handed to workers, drops everything else and
    /// stops the pool. Node handles held by existing masks become stale and
    /// count as completed.
    pub fn reset(&self) {
        let mut graph = self.shared.graph.lock();
        while graph.in_flight() > 0 {
            self.shared.changed.wait(&mut graph);
        }
        let dropped = graph.pending();
        graph.clear();
        drop(graph);
        *self.shared.pool.lock() = None;
        self.shared.changed.notify_all();
        log::info!("Pipeline reset ({dropped} unfinished nodes dropped)");
    }

    /// Number of nodes not yet finished.
    pub fn pending(&self) -> usize {
        self.shared.graph.lock().pending()
    }

    /// Snapshot of every node in the current generation.
    pub fn nodes(&self) -> Vec<NodeInfo> {
        self.shared.graph.lock().nodes()
    }

    /// Current status of a node.
    pub fn status(&self, node: NodeId) -> NodeStatus {
        self.shared.graph.lock().status(node)
    }
}

impl Shared {
    fn dispatch(shared: &Arc<Shared>, ids: Vec<NodeId>) {
        if ids.is_empty() {
            return;
        }
        let pool = shared.pool.lock().clone();
        let Some(pool) = pool else {
            return;
        };
        for id in ids {
            let shared = Arc::clone(shared);
            pool.spawn(move || Shared::execute(&shared, id));
        }
    }

    fn execute(shared: &Arc<Shared>, id: NodeId) {
        let (task, mask, operation) = {
            let mut graph = shared.graph.lock();
            let Some(task) = graph.begin(id) else {
                return;
            };
            let Some((mask, operation)) = graph.label(id) else {
                return;
            };
            (task, mask, operation)
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(task)).map_err(|payload| {
            let message = panic_message(payload.as_ref());
            log::warn!("Operation `{operation}` on `{mask}` failed: {message}");
            PipelineError::NodeFailed {
                mask: mask.clone(),
                operation,
                message,
            }
        });
        if outcome.is_ok() {
            log::debug!("Completed `{operation}` on `{mask}` (node {})", id.index());
        }

        let ready = shared.graph.lock().complete(id, outcome);
        shared.changed.notify_all();
        Shared::dispatch(shared, ready);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
