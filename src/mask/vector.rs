//! Vector masks: component access, normalisation and surface normals.

use glam::{Vec2, Vec3, Vec4};

use super::grid::Grid;
use super::value::Arithmetic;
use super::{FloatMask, Mask, MaskError, NormalMask};

/// Fixed-size float vector stored in a mask cell.
pub trait VectorValue: Arithmetic {
    const DIMENSIONS: usize;

    fn component(self, index: usize) -> f32;

    fn with_component(self, index: usize, value: f32) -> Self;

    fn normalize_or_zero(self) -> Self;
}

macro_rules! vector_impl {
    ($vec:ty, $dims:expr) => {
        impl VectorValue for $vec {
            const DIMENSIONS: usize = $dims;

            fn component(self, index: usize) -> f32 {
                self[index]
            }

            fn with_component(mut self, index: usize, value: f32) -> Self {
                self[index] = value;
                self
            }

            fn normalize_or_zero(self) -> Self {
                <$vec>::normalize_or_zero(self)
            }
        }
    };
}

vector_impl!(Vec2, 2);
vector_impl!(Vec3, 3);
vector_impl!(Vec4, 4);

impl<V: VectorValue> Mask<V> {
    /// Build a vector mask from one float mask per component.
    pub fn from_components(components: &[&FloatMask], name: impl Into<String>) -> Result<Mask<V>, MaskError> {
        if components.len() != V::DIMENSIONS {
            return Err(MaskError::DimensionMismatch {
                expected: V::DIMENSIONS,
                actual: components.len(),
            });
        }
        let first = components[0];
        let mut mask: Mask<V> = first.sibling(first.size(), name.into());
        for (index, &component) in components.iter().enumerate() {
            mask.enqueue_with("from_components", component, move |grid, source| {
                grid.zip_in_place(source, |value, c| value.with_component(index, c));
            })?;
        }
        Ok(mask)
    }

    /// Float mask holding component `index` of every cell.
    pub fn component(&self, index: usize) -> Result<FloatMask, MaskError> {
        if index >= V::DIMENSIONS {
            return Err(MaskError::InvalidArgument(format!(
                "component {index} out of range for {} dimensions",
                V::DIMENSIONS
            )));
        }
        Ok(FloatMask::derived(
            self,
            "component",
            format!("{}-{index}", self.name()),
            move |grid| grid.map(|value| value.component(index)),
        ))
    }

    /// Scale every vector to unit length. Zero vectors stay zero.
    pub fn normalize(&mut self) -> &mut Self {
        self.enqueue("normalize", |grid| {
            grid.map_in_place(|_, _, value| value.normalize_or_zero())
        })
    }
}

impl Grid<f32> {
    /// Surface normal of every cell.
    pub fn normals(&self, scale: f32) -> Grid<Vec3> {
        Grid::from_fn(self.size(), self.symmetry_settings(), |x, y| {
            self.surface_normal(x as i64, y as i64, scale)
        })
    }
}

impl FloatMask {
    /// Surface normals of this height mask.
    pub fn normals(&self, scale: f32) -> NormalMask {
        NormalMask::from_heights(self, scale)
    }
}

impl NormalMask {
    pub fn from_heights(heights: &FloatMask, scale: f32) -> NormalMask {
        Mask::derived(
            heights,
            "normals",
            format!("{}-normals", heights.name()),
            move |grid| grid.normals(scale),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::{Vector2Mask, Vector4Mask};
    use crate::pipeline::PipelineContext;
    use crate::schema::{Symmetry, SymmetrySettings};

    fn settings() -> SymmetrySettings {
        SymmetrySettings::uniform(Symmetry::None)
    }

    fn constant(value: f32, name: &str) -> FloatMask {
        let mut mask = FloatMask::new(4, Some(1), settings(), name);
        mask.fill(value);
        mask
    }

    #[test]
    fn test_from_components_and_back() {
        let x = constant(3.0, "x");
        let y = constant(4.0, "y");
        let vectors = Vector2Mask::from_components(&[&x, &y], "xy").unwrap();
        assert_eq!(vectors.get(2, 1), Vec2::new(3.0, 4.0));
        assert_eq!(vectors.component(1).unwrap().get(0, 0), 4.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let x = constant(1.0, "x");
        assert!(matches!(
            Vector4Mask::from_components(&[&x, &x], "bad"),
            Err(MaskError::DimensionMismatch { expected: 4, actual: 2 })
        ));
    }

    #[test]
    fn test_component_out_of_range() {
        let x = constant(1.0, "x");
        let vectors = Vector2Mask::from_components(&[&x, &x], "xx").unwrap();
        assert!(matches!(vectors.component(2), Err(MaskError::InvalidArgument(_))));
    }

    #[test]
    fn test_normalize() {
        let x = constant(3.0, "x");
        let y = constant(4.0, "y");
        let mut vectors = Vector2Mask::from_components(&[&x, &y], "xy").unwrap();
        vectors.normalize();
        assert!((vectors.get(0, 0) - Vec2::new(0.6, 0.8)).length() < 1e-6);
    }

    #[test]
    fn test_normals_of_slope() {
        let mut heights = FloatMask::new(8, None, settings(), "heights");
        heights.fill_with(|x, _| x as f32);
        let normals = heights.normals(1.0);
        let expected = Vec3::new(-2.0, 2.0, 0.0).normalize();
        assert!((normals.get(3, 3) - expected).length() < 1e-6);
    }

    #[test]
    fn test_normals_in_pipeline() {
        let pipeline = PipelineContext::new(2);
        let mut heights = FloatMask::new(8, None, settings(), "heights").in_pipeline(&pipeline);
        heights.fill(2.0);
        let normals = heights.normals(4.0);
        pipeline.start().unwrap();
        assert_eq!(normals.get(4, 4), Vec3::Y);
    }
}
