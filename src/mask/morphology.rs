//! Erosion, dilation and disc stamping on boolean masks.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::grid::Grid;
use super::{BooleanMask, MaskError};
use crate::schema::SymmetryType;

impl Grid<bool> {
    /// One pass of random erosion: each true edge cell turns false with
    /// probability `strength`. Evaluated on the canonical region.
    pub fn erode(&mut self, strength: f32, rng: &mut ChaCha8Rng) {
        self.apply_with_symmetry(SymmetryType::Spawn, |grid, x, y| {
            let value = grid.get(x, y);
            if value && grid.is_edge(x, y) && rng.r#gen::<f32>() < strength {
                false
            } else {
                value
            }
        });
    }

    /// One pass of random dilation: each false edge cell turns true with
    /// probability `strength`.
    pub fn dilate(&mut self, strength: f32, rng: &mut ChaCha8Rng) {
        self.apply_with_symmetry(SymmetryType::Spawn, |grid, x, y| {
            let value = grid.get(x, y);
            if !value && grid.is_edge(x, y) && rng.r#gen::<f32>() < strength {
                true
            } else {
                value
            }
        });
    }

    /// Stamp a disc of `value` around every edge cell holding `value`.
    fn stamp_edges(&mut self, radius: f32, value: bool) {
        let source = self.clone();
        let size = self.size();
        for y in 0..size {
            for x in 0..size {
                if source.get(x, y) == value && source.is_edge(x, y) {
                    self.fill_circle(x as f32, y as f32, radius, value);
                }
            }
        }
    }

    /// Grow true regions by `radius`.
    pub fn inflate(&mut self, radius: f32) {
        self.stamp_edges(radius, true);
    }

    /// Shrink true regions by `radius`.
    pub fn deflate(&mut self, radius: f32) {
        self.stamp_edges(radius, false);
    }

    /// Punch random holes: symmetric seeds with probability `strength`,
    /// inflated by `size`, cleared from the grid.
    pub fn acid(&mut self, strength: f32, size: f32, rng: &mut ChaCha8Rng) {
        let mut holes = Grid::<bool>::new(self.size(), self.symmetry_settings());
        holes.apply_with_symmetry(SymmetryType::Spawn, |_, _, _| rng.r#gen::<f32>() < strength);
        holes.inflate(size);
        self.zip_in_place(&holes, |value, hole| value && !hole);
    }
}

impl BooleanMask {
    pub fn erode(&mut self, strength: f32, count: usize) -> Result<&mut Self, MaskError> {
        self.enqueue_random("erode", move |grid, rng| {
            for _ in 0..count {
                grid.erode(strength, rng);
            }
        })
    }

    pub fn dilate(&mut self, strength: f32, count: usize) -> Result<&mut Self, MaskError> {
        self.enqueue_random("dilate", move |grid, rng| {
            for _ in 0..count {
                grid.dilate(strength, rng);
            }
        })
    }

    pub fn inflate(&mut self, radius: f32) -> &mut Self {
        self.enqueue("inflate", move |grid| grid.inflate(radius))
    }

    pub fn deflate(&mut self, radius: f32) -> &mut Self {
        self.enqueue("deflate", move |grid| grid.deflate(radius))
    }

    pub fn acid(&mut self, strength: f32, size: f32) -> Result<&mut Self, MaskError> {
        self.enqueue_random("acid", move |grid, rng| grid.acid(strength, size, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Symmetry, SymmetrySettings};

    fn square(symmetry: Symmetry) -> BooleanMask {
        let mut mask = BooleanMask::new(9, Some(11), SymmetrySettings::uniform(symmetry), "square");
        mask.fill_rect(2, 2, 5, 5, true);
        mask
    }

    #[test]
    fn test_full_strength_erode_peels_one_layer() {
        let mut mask = square(Symmetry::None);
        mask.erode(1.0, 1).unwrap();
        assert_eq!(mask.count().unwrap(), 9);
        assert!(mask.get(3, 3));
        assert!(!mask.get(2, 2));
    }

    #[test]
    fn test_full_strength_dilate_adds_one_layer() {
        let mut mask = square(Symmetry::None);
        mask.dilate(1.0, 1).unwrap();
        // 7x7 minus the four corners, which touch the square only diagonally.
        assert_eq!(mask.count().unwrap(), 45);
    }

    #[test]
    fn test_zero_strength_is_noop() {
        let mut mask = square(Symmetry::None);
        let before = mask.to_hash().unwrap();
        mask.erode(0.0, 3).unwrap().dilate(0.0, 3).unwrap();
        assert_eq!(mask.to_hash().unwrap(), before);
    }

    #[test]
    fn test_erosion_keeps_symmetry() {
        let mut mask = square(Symmetry::Quad);
        mask.erode(0.5, 2).unwrap();
        assert!(mask.to_grid().unwrap().is_symmetric(SymmetryType::Spawn));
    }

    #[test]
    fn test_inflate_and_deflate() {
        let mut mask = square(Symmetry::None);
        mask.inflate(1.0);
        assert!(mask.get(1, 4));
        assert!(!mask.get(0, 4));
        assert!(!mask.get(1, 1));

        let mut mask = square(Symmetry::None);
        mask.deflate(1.0);
        assert!(!mask.get(2, 4));
        assert!(mask.get(3, 4));
        assert_eq!(mask.count().unwrap(), 9);
    }

    #[test]
    fn test_acid_only_removes() {
        let mut mask = square(Symmetry::None);
        let original = mask.to_grid().unwrap();
        mask.acid(0.2, 1.0).unwrap();
        let eaten = mask.to_grid().unwrap();
        for (after, before) in eaten.values().iter().zip(original.values()) {
            assert!(!after || *before);
        }
    }

    #[test]
    fn test_random_morphology_needs_seed() {
        let mut mask = BooleanMask::new(4, None, SymmetrySettings::default(), "unseeded");
        assert!(matches!(mask.erode(0.5, 1), Err(MaskError::Unseeded(_))));
        assert!(matches!(mask.acid(0.5, 1.0), Err(MaskError::Unseeded(_))));
    }
}
