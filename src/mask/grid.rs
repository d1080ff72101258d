//! Square value grid backing a mask.
//!
//! Stored as a flat vector with indexing `y * size + x`.

use glam::Vec2;
use sha2::{Digest, Sha256};

use super::value::MaskValue;
use crate::schema::{SymmetrySettings, SymmetryType};

/// Materialized square grid of mask values plus the symmetry it obeys.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    size: usize,
    values: Vec<T>,
    symmetry_settings: SymmetrySettings,
}

impl<T: MaskValue> Grid<T> {
    /// Grid of `size * size` default values.
    pub fn new(size: usize, symmetry_settings: SymmetrySettings) -> Self {
        Self::filled(size, T::default(), symmetry_settings)
    }

    pub fn filled(size: usize, value: T, symmetry_settings: SymmetrySettings) -> Self {
        Self {
            size,
            values: vec![value; size * size],
            symmetry_settings,
        }
    }

    /// Build a grid from a value function.
    pub fn from_fn(
        size: usize,
        symmetry_settings: SymmetrySettings,
        mut f: impl FnMut(usize, usize) -> T,
    ) -> Self {
        let mut values = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                values.push(f(x, y));
            }
        }
        Self {
            size,
            values,
            symmetry_settings,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn symmetry_settings(&self) -> SymmetrySettings {
        self.symmetry_settings
    }

    /// Row-major cell values.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[inline]
    fn idx(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.size && y < self.size,
            "coordinate ({x}, {y}) out of bounds for size {}",
            self.size
        );
        y * self.size + x
    }

    /// Value at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate lies outside the grid.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.values[self.idx(x, y)]
    }

    /// # Panics
    ///
    /// Panics if the coordinate lies outside the grid.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.idx(x, y);
        self.values[idx] = value;
    }

    /// Value at a signed coordinate, `None` outside the grid.
    #[inline]
    pub fn try_get(&self, x: i64, y: i64) -> Option<T> {
        self.in_bounds(x, y)
            .then(|| self.values[y as usize * self.size + x as usize])
    }

    /// Value with the coordinate clamped onto the grid.
    #[inline]
    pub fn get_clamped(&self, x: i64, y: i64) -> T {
        let max = self.size as i64 - 1;
        let x = x.clamp(0, max) as usize;
        let y = y.clamp(0, max) as usize;
        self.values[y * self.size + x]
    }

    #[inline]
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.size && (y as usize) < self.size
    }

    /// Whether a continuous point lies on the grid.
    #[inline]
    pub fn contains_point(&self, point: Vec2) -> bool {
        let size = self.size as f32;
        point.x >= 0.0 && point.y >= 0.0 && point.x < size && point.y < size
    }

    /// Set a cell if it lies on the grid; returns whether it did.
    #[inline]
    pub fn set_if_in_bounds(&mut self, x: i64, y: i64, value: T) -> bool {
        if self.in_bounds(x, y) {
            let idx = y as usize * self.size + x as usize;
            self.values[idx] = value;
            true
        } else {
            false
        }
    }

    /// Apply `f` to every cell in place.
    pub fn map_in_place(&mut self, mut f: impl FnMut(usize, usize, T) -> T) {
        let size = self.size;
        for (i, value) in self.values.iter_mut().enumerate() {
            *value = f(i % size, i / size, *value);
        }
    }

    /// Fallible [`map_in_place`](Self::map_in_place). The grid is left
    /// untouched when `f` fails for any cell.
    pub fn try_map_in_place<E>(
        &mut self,
        mut f: impl FnMut(usize, usize, T) -> Result<T, E>,
    ) -> Result<(), E> {
        let size = self.size;
        let values = self
            .values
            .iter()
            .enumerate()
            .map(|(i, &value)| f(i % size, i / size, value))
            .collect::<Result<Vec<T>, E>>()?;
        self.values = values;
        Ok(())
    }

    /// Combine with another grid of equal size cell by cell.
    pub fn zip_in_place<U: MaskValue>(
        &mut self,
        other: &Grid<U>,
        mut f: impl FnMut(T, U) -> T,
    ) {
        assert_eq!(self.size, other.size, "grid sizes differ");
        for (value, &other) in self.values.iter_mut().zip(other.values.iter()) {
            *value = f(*value, other);
        }
    }

    /// Grid of another value type with the same size and symmetry.
    pub fn map<U: MaskValue>(&self, f: impl Fn(T) -> U) -> Grid<U> {
        Grid {
            size: self.size,
            values: self.values.iter().map(|&v| f(v)).collect(),
            symmetry_settings: self.symmetry_settings,
        }
    }

    pub fn fill(&mut self, value: T) {
        self.values.fill(value);
    }

    /// Fill the rectangle starting at `(x, y)`. Cells off the grid are skipped.
    pub fn fill_rect(&mut self, x: i64, y: i64, width: usize, height: usize, value: T) {
        for dy in 0..height as i64 {
            for dx in 0..width as i64 {
                self.set_if_in_bounds(x + dx, y + dy, value);
            }
        }
    }

    /// Fill every cell whose center lies within `radius` of `(cx, cy)`.
    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, value: T) {
        let r = radius.max(0.0);
        let min_x = (cx - r).floor() as i64;
        let max_x = (cx + r).ceil() as i64;
        let min_y = (cy - r).floor() as i64;
        let max_y = (cy + r).ceil() as i64;
        let r2 = r * r;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.set_if_in_bounds(x, y, value);
                }
            }
        }
    }

    /// Fill a border of `width` cells along every edge.
    pub fn fill_edge(&mut self, width: usize, value: T) {
        let size = self.size;
        for y in 0..size {
            for x in 0..size {
                if x < width || y < width || x + width >= size || y + width >= size {
                    self.set(x, y, value);
                }
            }
        }
    }

    pub fn fill_coordinates(&mut self, coordinates: &[(usize, usize)], value: T) {
        for &(x, y) in coordinates {
            self.set_if_in_bounds(x as i64, y as i64, value);
        }
    }

    /// Grow to `new_size`: each new cell takes `floor(c * old / new)`.
    pub(crate) fn enlarge(&mut self, new_size: usize) {
        let old = self.clone();
        let old_size = old.size;
        *self = Grid::from_fn(new_size, self.symmetry_settings, |x, y| {
            let ox = x * old_size / new_size;
            let oy = y * old_size / new_size;
            old.get(ox, oy)
        });
    }

    /// Shrink to `new_size` with rounded nearest-neighbour sampling.
    pub(crate) fn shrink(&mut self, new_size: usize) {
        let old = self.clone();
        let old_size = old.size;
        let scale = old_size as f64 / new_size as f64;
        *self = Grid::from_fn(new_size, self.symmetry_settings, |x, y| {
            let ox = ((x as f64 * scale).round() as usize).min(old_size - 1);
            let oy = ((y as f64 * scale).round() as usize).min(old_size - 1);
            old.get(ox, oy)
        });
    }

    /// Resample to `new_size` and re-project spawn symmetry.
    pub fn resample(&mut self, new_size: usize) {
        if new_size == self.size {
            return;
        }
        if self.size == 0 || new_size == 0 {
            *self = Grid::new(new_size, self.symmetry_settings);
            return;
        }
        if new_size > self.size {
            self.enlarge(new_size);
        } else {
            self.shrink(new_size);
        }
        self.apply_symmetry(SymmetryType::Spawn);
    }

    /// SHA-256 hex digest over the canonical spawn region.
    pub fn to_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update((self.size as u64).to_le_bytes());
        self.for_each_canonical(SymmetryType::Spawn, |x, y| {
            self.get(x, y).digest(&mut hasher);
        });
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Symmetry;

    fn none() -> SymmetrySettings {
        SymmetrySettings::uniform(Symmetry::None)
    }

    #[test]
    fn test_fill_rect_exact_cells() {
        let mut grid = Grid::<bool>::new(4, none());
        grid.fill_rect(0, 0, 2, 2, true);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(grid.get(x, y), x < 2 && y < 2, "cell ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_fill_rect_skips_out_of_bounds() {
        let mut grid = Grid::<i32>::new(4, none());
        grid.fill_rect(-1, 3, 3, 5, 7);
        assert_eq!(grid.get(0, 3), 7);
        assert_eq!(grid.get(1, 3), 7);
        assert_eq!(grid.get(2, 3), 0);
        assert_eq!(grid.values().iter().filter(|&&v| v == 7).count(), 2);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_get_out_of_bounds_panics() {
        let grid = Grid::<f32>::new(4, none());
        grid.get(4, 0);
    }

    #[test]
    fn test_try_get() {
        let mut grid = Grid::<f32>::new(3, none());
        grid.set(2, 1, 5.0);
        assert_eq!(grid.try_get(2, 1), Some(5.0));
        assert_eq!(grid.try_get(-1, 1), None);
        assert_eq!(grid.try_get(3, 1), None);
        assert_eq!(grid.get_clamped(9, 1), 5.0);
    }

    #[test]
    fn test_fill_circle() {
        let mut grid = Grid::<bool>::new(9, none());
        grid.fill_circle(4.0, 4.0, 2.0, true);
        assert!(grid.get(4, 4));
        assert!(grid.get(6, 4));
        assert!(grid.get(4, 2));
        assert!(!grid.get(6, 6));
        assert!(!grid.get(7, 4));
    }

    #[test]
    fn test_fill_edge() {
        let mut grid = Grid::<bool>::new(5, none());
        grid.fill_edge(1, true);
        assert!(grid.get(0, 2));
        assert!(grid.get(4, 4));
        assert!(!grid.get(2, 2));
        assert_eq!(grid.values().iter().filter(|&&v| v).count(), 16);
    }

    #[test]
    fn test_enlarge_replicates_blocks() {
        let mut grid = Grid::<i32>::from_fn(2, none(), |x, y| (y * 2 + x) as i32);
        grid.resample(4);
        assert_eq!(grid.size(), 4);
        assert_eq!(grid.get(0, 0), 0);
        assert_eq!(grid.get(1, 1), 0);
        assert_eq!(grid.get(2, 0), 1);
        assert_eq!(grid.get(3, 3), 3);
        assert_eq!(grid.get(0, 3), 2);
    }

    #[test]
    fn test_shrink_samples_nearest() {
        let mut grid = Grid::<i32>::from_fn(4, none(), |x, y| (y * 4 + x) as i32);
        grid.resample(2);
        assert_eq!(grid.size(), 2);
        assert_eq!(grid.get(0, 0), 0);
        assert_eq!(grid.get(1, 0), 2);
        assert_eq!(grid.get(0, 1), 8);
        assert_eq!(grid.get(1, 1), 10);
    }

    #[test]
    fn test_hash_depends_on_content() {
        let mut a = Grid::<f32>::new(4, none());
        let b = Grid::<f32>::new(4, none());
        assert_eq!(a.to_hash(), b.to_hash());
        assert_eq!(a.to_hash().len(), 64);
        a.set(3, 3, 1.0);
        assert_ne!(a.to_hash(), b.to_hash());
    }

    #[test]
    fn test_hash_ignores_mirrored_half() {
        let settings = SymmetrySettings::uniform(Symmetry::X);
        let mut a = Grid::<f32>::new(4, settings);
        let b = Grid::<f32>::new(4, settings);
        // (3, 0) mirrors (0, 0), which lies in the canonical half.
        a.set(3, 0, 1.0);
        assert_eq!(a.to_hash(), b.to_hash());
    }
}
