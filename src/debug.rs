//! Visual debugging hook.
//!
//! A mask carrying a [`VisualDebugger`] reports every mutating operation
//! after it ran. The hook only observes; it cannot change results or the
//! order in which operations execute.

/// What a debugger sees after an operation.
#[derive(Debug, Clone, Copy)]
pub struct DebugFrame<'a> {
    /// Name of the mask the operation ran on.
    pub mask: &'a str,
    pub operation: &'static str,
    /// Grid size after the operation.
    pub size: usize,
    /// Whether the operation ran on a pipeline worker.
    pub parallel: bool,
}

pub trait VisualDebugger: Send + Sync {
    fn visualize(&self, frame: &DebugFrame<'_>);
}

/// Debugger that traces every operation through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDebugger;

impl VisualDebugger for LogDebugger {
    fn visualize(&self, frame: &DebugFrame<'_>) {
        log::trace!(
            "[{}] {} (size {}, {})",
            frame.mask,
            frame.operation,
            frame.size,
            if frame.parallel { "pipeline" } else { "inline" }
        );
    }
}
