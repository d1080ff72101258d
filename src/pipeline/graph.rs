//! Arena-backed dependency graph of deferred mask operations.
//!
//! The graph is plain data: it tracks dependency counts and node states but
//! never runs anything itself. [`super::PipelineContext`] owns one behind a
//! lock and feeds dispatched nodes to its worker pool.

use super::PipelineError;

/// Work carried by a node.
pub(crate) type Task = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a node. Handles from an earlier generation (before a reset)
/// count as completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    generation: u64,
    index: usize,
}

impl NodeId {
    /// Position of the node in its generation's arena.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Lifecycle state of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeStatus {
    /// Registered, waiting for dependencies or for the pipeline to start.
    Waiting,
    /// Handed to the worker pool.
    Queued,
    /// Executing on a worker.
    Running,
    /// Finished successfully.
    Done,
    /// Failed, either itself or through an upstream dependency.
    Failed(PipelineError),
}

impl NodeStatus {
    /// Whether the node will never change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeStatus::Done | NodeStatus::Failed(_))
    }
}

/// Read-only view of a node, for inspection.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub mask: String,
    pub operation: &'static str,
    pub deps: Vec<NodeId>,
    pub status: NodeStatus,
}

struct Node {
    mask: String,
    operation: &'static str,
    deps: Vec<NodeId>,
    dependents: Vec<usize>,
    unresolved: usize,
    status: NodeStatus,
    task: Option<Task>,
}

/// Dependency graph for one generation run.
pub(crate) struct Graph {
    generation: u64,
    started: bool,
    nodes: Vec<Node>,
}

impl Graph {
    pub(crate) fn new() -> Self {
        Self {
            generation: 0,
            started: false,
            nodes: Vec::new(),
        }
    }

    pub(crate) fn is_started(&self) -> bool {
        self.started
    }

    /// Register a node. Returns its handle and whether it was queued for
    /// immediate dispatch.
    pub(crate) fn add(
        &mut self,
        mask: &str,
        operation: &'static str,
        deps: Vec<NodeId>,
        task: Task,
    ) -> (NodeId, bool) {
        let index = self.nodes.len();
        let id = NodeId {
            generation: self.generation,
            index,
        };

        let mut unresolved = 0;
        let mut upstream_failure = None;
        for dep in &deps {
            if dep.generation != self.generation {
                continue;
            }
            let node = &mut self.nodes[dep.index];
            match &node.status {
                NodeStatus::Done => {}
                NodeStatus::Failed(err) => {
                    upstream_failure.get_or_insert_with(|| err.clone());
                }
                _ => {
                    node.dependents.push(index);
                    unresolved += 1;
                }
            }
        }

        let (status, task) = match upstream_failure {
            Some(err) => (NodeStatus::Failed(err), None),
            None => (NodeStatus::Waiting, Some(task)),
        };

        self.nodes.push(Node {
            mask: mask.to_string(),
            operation,
            deps,
            dependents: Vec::new(),
            unresolved,
            status,
            task,
        });

        let queued = self.try_queue(index);
        (id, queued)
    }

    /// Mark the graph started and queue every node that is ready.
    pub(crate) fn start(&mut self) -> Vec<NodeId> {
        self.started = true;
        let ready: Vec<usize> = (0..self.nodes.len())
            .filter(|&index| self.try_queue(index))
            .collect();
        ready.into_iter().map(|index| self.id(index)).collect()
    }

    /// Take the task of a queued node, marking it running.
    pub(crate) fn begin(&mut self, id: NodeId) -> Option<Task> {
        if id.generation != self.generation {
            return None;
        }
        let node = self.nodes.get_mut(id.index)?;
        if node.status != NodeStatus::Queued {
            return None;
        }
        node.status = NodeStatus::Running;
        node.task.take()
    }

    /// Record the outcome of a node. Returns the nodes queued as a result.
    pub(crate) fn complete(
        &mut self,
        id: NodeId,
        outcome: Result<(), PipelineError>,
    ) -> Vec<NodeId> {
        if id.generation != self.generation || id.index >= self.nodes.len() {
            return Vec::new();
        }

        match outcome {
            Ok(()) => {
                self.nodes[id.index].status = NodeStatus::Done;
                let dependents = self.nodes[id.index].dependents.clone();
                let mut queued = Vec::new();
                for dependent in dependents {
                    let node = &mut self.nodes[dependent];
                    node.unresolved = node.unresolved.saturating_sub(1);
                    if self.try_queue(dependent) {
                        queued.push(self.id(dependent));
                    }
                }
                queued
            }
            Err(err) => {
                self.fail(id.index, err);
                Vec::new()
            }
        }
    }

    /// Fail a node and everything downstream of it with the same error.
    fn fail(&mut self, index: usize, err: PipelineError) {
        let mut stack = vec![index];
        while let Some(current) = stack.pop() {
            let node = &mut self.nodes[current];
            if node.status.is_terminal() && current != index {
                continue;
            }
            node.status = NodeStatus::Failed(err.clone());
            node.task = None;
            stack.extend(node.dependents.iter().copied());
        }
    }

    pub(crate) fn status(&self, id: NodeId) -> NodeStatus {
        if id.generation != self.generation {
            return NodeStatus::Done;
        }
        self.nodes
            .get(id.index)
            .map(|node| node.status.clone())
            .unwrap_or(NodeStatus::Done)
    }

    /// Mask name and operation of a node in the current generation.
    pub(crate) fn label(&self, id: NodeId) -> Option<(String, &'static str)> {
        if id.generation != self.generation {
            return None;
        }
        self.nodes
            .get(id.index)
            .map(|node| (node.mask.clone(), node.operation))
    }

    /// Number of nodes not yet in a terminal state.
    pub(crate) fn pending(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| !node.status.is_terminal())
            .count()
    }

    /// Number of nodes handed to workers and not yet finished.
    pub(crate) fn in_flight(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node.status, NodeStatus::Queued | NodeStatus::Running))
            .count()
    }

    /// First failure in registration order.
    pub(crate) fn first_failure(&self) -> Option<PipelineError> {
        self.nodes.iter().find_map(|node| match &node.status {
            NodeStatus::Failed(err) => Some(err.clone()),
            _ => None,
        })
    }

    pub(crate) fn nodes(&self) -> Vec<NodeInfo> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| NodeInfo {
                id: self.id(index),
                mask: node.mask.clone(),
                operation: node.operation,
                deps: node.deps.clone(),
                status: node.status.clone(),
            })
            .collect()
    }

    /// Drop every node and start a new generation.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.generation += 1;
        self.started = false;
    }

    fn id(&self, index: usize) -> NodeId {
        NodeId {
            generation: self.generation,
            index,
        }
    }

    fn try_queue(&mut self, index: usize) -> bool {
        let started = self.started;
        let node = &mut self.nodes[index];
        if started && node.unresolved == 0 && node.status == NodeStatus::Waiting {
            node.status = NodeStatus::Queued;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Task {
        Box::new(|| {})
    }

    fn failure() -> PipelineError {
        PipelineError::NodeFailed {
            mask: "a".to_string(),
            operation: "boom",
            message: "exploded".to_string(),
        }
    }

    #[test]
    fn test_nodes_wait_until_started() {
        let mut graph = Graph::new();
        let (a, queued) = graph.add("a", "fill", vec![], noop());
        assert!(!queued);
        assert_eq!(graph.status(a), NodeStatus::Waiting);

        let started = graph.start();
        assert_eq!(started, vec![a]);
        assert_eq!(graph.status(a), NodeStatus::Queued);
    }

    #[test]
    fn test_start_queues_only_ready_nodes() {
        let mut graph = Graph::new();
        let (a, _) = graph.add("a", "fill", vec![], noop());
        let (b, _) = graph.add("b", "blur", vec![a], noop());
        let (c, _) = graph.add("c", "fill", vec![], noop());

        assert_eq!(graph.start(), vec![a, c]);
        assert_eq!(graph.status(b), NodeStatus::Waiting);
        assert!(graph.start().is_empty());
    }

    #[test]
    fn test_dependent_released_only_after_all_deps_complete() {
        let mut graph = Graph::new();
        graph.start();
        let (a, a_queued) = graph.add("a", "fill", vec![], noop());
        let (b, b_queued) = graph.add("b", "fill", vec![], noop());
        let (c, c_queued) = graph.add("c", "add", vec![a, b], noop());
        assert!(a_queued && b_queued);
        assert!(!c_queued);

        assert!(graph.begin(a).is_some());
        assert!(graph.complete(a, Ok(())).is_empty());
        assert_eq!(graph.status(c), NodeStatus::Waiting);

        assert!(graph.begin(b).is_some());
        assert_eq!(graph.complete(b, Ok(())), vec![c]);
        assert_eq!(graph.status(c), NodeStatus::Queued);
    }

    #[test]
    fn test_dependency_on_completed_node_is_resolved() {
        let mut graph = Graph::new();
        graph.start();
        let (a, _) = graph.add("a", "fill", vec![], noop());
        graph.begin(a);
        graph.complete(a, Ok(()));

        let (_, queued) = graph.add("a", "blur", vec![a], noop());
        assert!(queued);
    }

    #[test]
    fn test_failure_propagates_downstream() {
        let mut graph = Graph::new();
        graph.start();
        let (a, _) = graph.add("a", "boom", vec![], noop());
        let (b, _) = graph.add("a", "blur", vec![a], noop());
        let (c, _) = graph.add("c", "add", vec![b], noop());
        let (d, _) = graph.add("d", "fill", vec![], noop());

        graph.begin(a);
        assert!(graph.complete(a, Err(failure())).is_empty());

        assert_eq!(graph.status(a), NodeStatus::Failed(failure()));
        assert_eq!(graph.status(b), NodeStatus::Failed(failure()));
        assert_eq!(graph.status(c), NodeStatus::Failed(failure()));
        assert_eq!(graph.status(d), NodeStatus::Queued);
        assert_eq!(graph.first_failure(), Some(failure()));

        // Nodes added after the failure inherit it without running.
        let (e, queued) = graph.add("c", "blur", vec![c], noop());
        assert!(!queued);
        assert_eq!(graph.status(e), NodeStatus::Failed(failure()));
        assert!(graph.begin(e).is_none());
    }

    #[test]
    fn test_task_taken_once() {
        let mut graph = Graph::new();
        graph.start();
        let (a, _) = graph.add("a", "fill", vec![], noop());
        assert!(graph.begin(a).is_some());
        assert!(graph.begin(a).is_none());
        assert_eq!(graph.status(a), NodeStatus::Running);
        assert_eq!(graph.in_flight(), 1);
    }

    #[test]
    fn test_clear_makes_old_handles_complete() {
        let mut graph = Graph::new();
        let (a, _) = graph.add("a", "fill", vec![], noop());
        assert_eq!(graph.pending(), 1);
        graph.clear();
        assert!(!graph.is_started());
        assert_eq!(graph.pending(), 0);
        assert_eq!(graph.status(a), NodeStatus::Done);

        let (b, _) = graph.add("a", "blur", vec![a], noop());
        let started = graph.start();
        assert_eq!(started, vec![b]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_inspection_lists_dependencies() {
        let mut graph = Graph::new();
        let (a, _) = graph.add("a", "fill", vec![], noop());
        let (b, _) = graph.add("b", "copy", vec![a], noop());
        let infos = graph.nodes();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[1].id, b);
        assert_eq!(infos[1].mask, "b");
        assert_eq!(infos[1].operation, "copy");
        assert_eq!(infos[1].deps, vec![a]);
    }
}
