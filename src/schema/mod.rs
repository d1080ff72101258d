//! Schema module - Configuration and symmetry types for mask generation.

mod config;
mod symmetry;

pub use config::*;
pub use symmetry::*;
