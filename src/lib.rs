//! Mask Engine - Symmetric procedural grids for generated game maps.
//!
//! This crate provides the mask layer of a map generator: square grids of
//! booleans, floats, integers or vectors that keep a configurable mirror or
//! rotational symmetry, plus a dependency-tracked pipeline that runs mask
//! operations concurrently while keeping results identical to a sequential
//! run for the same seed.
//!
//! # Architecture
//!
//! - `schema`: Symmetry settings and generation configuration
//! - `mask`: Grids, symmetry geometry and the mask operation families
//! - `pipeline`: Deferred execution of mask operations on a worker pool
//! - `brush`: Stamp patterns used by brush operations
//! - `debug`: Optional per-operation observation hook
//!
//! # Example
//!
//! ```rust,no_run
//! use mask_engine::{
//!     mask::BooleanMask,
//!     pipeline::PipelineContext,
//!     schema::{Symmetry, SymmetrySettings},
//! };
//!
//! let pipeline = PipelineContext::new(4);
//! let settings = SymmetrySettings::uniform(Symmetry::Point2);
//!
//! let mut land = BooleanMask::new(256, Some(7), settings, "land").in_pipeline(&pipeline);
//! land.randomize(0.5)?.blur(8).remove_areas_smaller_than(64);
//! let heights = land.distance_field();
//!
//! pipeline.start()?;
//! println!("land: {}", land.to_hash()?);
//! println!("max height: {}", heights.max()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod brush;
pub mod debug;
pub mod mask;
pub mod pipeline;
pub mod schema;

// Re-export commonly used types
pub use mask::{BooleanMask, FloatMask, Grid, IntegerMask, Mask, MaskError, NormalMask};
pub use pipeline::{PipelineContext, PipelineError};
pub use schema::{GenerationConfig, Symmetry, SymmetrySettings, SymmetryType};
