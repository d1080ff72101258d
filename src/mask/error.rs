use crate::brush::BrushError;
use crate::pipeline::PipelineError;
use crate::schema::SymmetrySettings;

/// Errors raised by mask operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MaskError {
    #[error("Mask sizes differ: {left} vs {right}")]
    SizeMismatch { left: usize, right: usize },
    #[error("Mask symmetry settings differ: {left:?} vs {right:?}")]
    SymmetryMismatch {
        left: SymmetrySettings,
        right: SymmetrySettings,
    },
    #[error("Masks `{left}` and `{right}` do not share a pipeline")]
    PipelineMismatch { left: String, right: String },
    #[error("Expected {expected} components, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Cannot aggregate an empty mask")]
    EmptyMask,
    #[error("Mask `{0}` has no seed, random operations need one")]
    Unseeded(String),
    #[error("Operation `{operation}` on mask `{mask}` left the value range")]
    OutOfRange {
        mask: String,
        operation: &'static str,
    },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Brush(#[from] BrushError),
}
