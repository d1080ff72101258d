//! Pipeline module - Deferred, dependency-ordered execution of mask operations.
//!
//! Masks created inside a [`PipelineContext`] do not run their operations
//! immediately. Each call registers a node whose dependencies are the mask's
//! previous node, the current node of every mask it reads, and every node
//! that read the mask's previous state. Nodes of independent masks run
//! concurrently on the context's worker pool; a mask's own nodes always run
//! in the order they were enqueued.

mod context;
mod graph;

pub use context::PipelineContext;
pub use graph::{NodeId, NodeInfo, NodeStatus};

/// Pipeline errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("Pipeline has not been started")]
    NotStarted,
    #[error("Operation `{operation}` on mask `{mask}` failed: {message}")]
    NodeFailed {
        mask: String,
        operation: &'static str,
        message: String,
    },
    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),
}
