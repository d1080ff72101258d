//! Mask module - Symmetric value grids and the operations on them.
//!
//! [`Grid`] is the plain data: a square array plus its symmetry settings,
//! with every algorithm implemented directly on it. [`Mask`] wraps a grid
//! with a seed, a name and an optional pipeline, and routes each operation
//! either inline or through the pipeline as a deferred node.

mod area;
mod boolean;
mod comparable;
mod core;
mod distance;
mod erosion;
mod error;
mod fill;
mod float;
mod grid;
mod morphology;
mod operations;
mod regions;
mod symmetry;
mod value;
mod vector;

pub use self::core::Mask;
pub use area::AreaTable;
pub use error::MaskError;
pub use grid::Grid;
pub use symmetry::SymmetryGeometry;
pub use value::{Arithmetic, Comparable, MaskValue, NumberValue};
pub use vector::VectorValue;

pub type BooleanMask = Mask<bool>;
pub type FloatMask = Mask<f32>;
pub type IntegerMask = Mask<i32>;
pub type Vector2Mask = Mask<glam::Vec2>;
pub type Vector3Mask = Mask<glam::Vec3>;
pub type Vector4Mask = Mask<glam::Vec4>;
/// Unit surface normals, `y` up.
pub type NormalMask = Vector3Mask;
