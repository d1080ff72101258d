//! Summed-area tables and the box-average operations built on them.

use super::grid::Grid;
use super::value::{MaskValue, NumberValue};
use super::{BooleanMask, Mask, MaskError};

/// Prefix sums over a grid, padded by one row and column of zeros so that
/// any axis-aligned box sum is four lookups.
///
/// The table is a snapshot: later edits to the grid are not reflected.
#[derive(Debug, Clone)]
pub struct AreaTable<T: MaskValue> {
    stride: usize,
    size: usize,
    sums: Vec<T::Sum>,
}

impl<T: MaskValue> AreaTable<T> {
    pub fn new(grid: &Grid<T>) -> Self {
        let size = grid.size();
        let stride = size + 1;
        let mut sums = vec![T::Sum::default(); stride * stride];
        for y in 0..size {
            for x in 0..size {
                let above = sums[y * stride + x + 1];
                let left = sums[(y + 1) * stride + x];
                let diagonal = sums[y * stride + x];
                sums[(y + 1) * stride + x + 1] =
                    grid.get(x, y).to_sum() + above + left - diagonal;
            }
        }
        Self { stride, size, sums }
    }

    /// Sum of the half-open box `[x0, x1) x [y0, y1)`.
    fn box_sum(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> T::Sum {
        let s = self.stride;
        self.sums[y1 * s + x1] - self.sums[y0 * s + x1] - self.sums[y1 * s + x0]
            + self.sums[y0 * s + x0]
    }

    /// Sum and cell count of the box of `radius` around `(x, y)`, clamped
    /// to the grid.
    pub fn around(&self, x: usize, y: usize, radius: usize) -> (T::Sum, usize) {
        let x0 = x.saturating_sub(radius);
        let y0 = y.saturating_sub(radius);
        let x1 = (x + radius + 1).min(self.size);
        let y1 = (y + radius + 1).min(self.size);
        (self.box_sum(x0, y0, x1, y1), (x1 - x0) * (y1 - y0))
    }

    /// Average of the box of `radius` around `(x, y)`.
    pub fn average(&self, x: usize, y: usize, radius: usize) -> T {
        let (sum, count) = self.around(x, y, radius);
        T::from_average(sum, count)
    }
}

impl<T: MaskValue> Grid<T> {
    /// Average of the box of `radius` around `(x, y)`.
    ///
    /// Builds a fresh table, so each call costs a full pass over the grid.
    /// Use [`area_table`](Self::area_table) for repeated queries.
    pub fn area_average(&self, x: usize, y: usize, radius: usize) -> T {
        self.area_table().average(x, y, radius)
    }

    /// Summed-area table of the current values.
    pub fn area_table(&self) -> AreaTable<T> {
        AreaTable::new(self)
    }

    /// Replace every cell with the average of its surrounding box.
    pub fn blur(&mut self, radius: usize) {
        if radius == 0 || self.size() == 0 {
            return;
        }
        let table = AreaTable::new(self);
        self.map_in_place(|x, y, _| table.average(x, y, radius));
    }

    /// Blur only the cells selected by `area`.
    pub fn blur_within(&mut self, radius: usize, area: &Grid<bool>) {
        if radius == 0 || self.size() == 0 {
            return;
        }
        let table = AreaTable::new(self);
        self.map_in_place(|x, y, value| {
            if area.get(x, y) {
                table.average(x, y, radius)
            } else {
                value
            }
        });
    }

    /// Enlarge, then blur by half the scale factor to soften the blocks.
    pub fn interpolate(&mut self, new_size: usize) {
        let old_size = self.size();
        self.resample(new_size);
        if old_size > 0 && new_size > old_size {
            self.blur(smoothing_radius(new_size, old_size));
        }
    }

    /// Blur by half the scale factor, then shrink.
    pub fn decimate(&mut self, new_size: usize) {
        let old_size = self.size();
        if new_size > 0 && new_size < old_size {
            self.blur(smoothing_radius(old_size, new_size));
        }
        self.resample(new_size);
    }
}

fn smoothing_radius(larger: usize, smaller: usize) -> usize {
    ((larger as f32 / smaller as f32 / 2.0).round() as usize).max(1)
}

impl Grid<bool> {
    /// Boolean blur with an explicit threshold: a cell becomes true when the
    /// fraction of true cells in its box is at least `density`.
    pub fn blur_with_density(&mut self, radius: usize, density: f32) {
        if self.size() == 0 {
            return;
        }
        let table = AreaTable::new(self);
        let density = f64::from(density);
        self.map_in_place(|x, y, _| {
            let (sum, count) = table.around(x, y, radius);
            sum as f64 / count as f64 >= density
        });
    }
}

impl<T: NumberValue> Grid<T> {
    /// Replace every cell with the square of its box average.
    pub fn spike(&mut self, radius: usize) {
        if self.size() == 0 {
            return;
        }
        let table = AreaTable::new(self);
        self.map_in_place(|x, y, _| {
            let average = table.average(x, y, radius).to_f64();
            T::from_f64(average * average)
        });
    }
}

impl<T: MaskValue> Mask<T> {
    /// Box blur with the given radius. Boolean masks blur by majority.
    pub fn blur(&mut self, radius: usize) -> &mut Self {
        self.enqueue("blur", move |grid| grid.blur(radius))
    }

    /// Blur only the cells selected by `area`.
    pub fn blur_within(&mut self, radius: usize, area: &BooleanMask) -> Result<&mut Self, MaskError> {
        self.enqueue_with("blur_within", area, move |grid, area| {
            grid.blur_within(radius, area)
        })
    }
}

impl<T: NumberValue> Mask<T> {
    pub fn spike(&mut self, radius: usize) -> &mut Self {
        self.enqueue("spike", move |grid| grid.spike(radius))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::mask::FloatMask;
    use crate::schema::{Symmetry, SymmetrySettings};

    fn none() -> SymmetrySettings {
        SymmetrySettings::uniform(Symmetry::None)
    }

    #[test]
    fn test_box_clamped_at_corner() {
        let grid = Grid::<f32>::from_fn(4, none(), |x, y| (y * 4 + x) as f32);
        // Box around (0, 0) with radius 1 covers (0..2, 0..2) = 0, 1, 4, 5.
        assert_eq!(grid.area_average(0, 0, 1), 2.5);
    }

    #[test]
    fn test_area_table_matches_single_queries() {
        let mut grid = Grid::<i32>::from_fn(6, none(), |x, y| (x * 7 + y * 3) as i32 % 5);
        let table = grid.area_table();
        for radius in 0..4 {
            for y in 0..6 {
                for x in 0..6 {
                    assert_eq!(table.average(x, y, radius), grid.area_average(x, y, radius));
                }
            }
        }
        let (sum, count) = table.around(5, 5, 1);
        assert_eq!(count, 4);
        let corner: i64 = [(4, 4), (5, 4), (4, 5), (5, 5)]
            .iter()
            .map(|&(x, y)| i64::from(grid.get(x, y)))
            .sum();
        assert_eq!(sum, corner);

        // Later edits do not reach an existing table.
        let before = table.average(0, 0, 0);
        grid.set(0, 0, 99);
        assert_eq!(table.average(0, 0, 0), before);
        assert_eq!(grid.area_table().average(0, 0, 0), 99);
    }

    #[test]
    fn test_blur_spreads_single_value() {
        let mut grid = Grid::<f32>::new(5, none());
        grid.set(2, 2, 9.0);
        grid.blur(1);
        assert_eq!(grid.get(2, 2), 1.0);
        assert_eq!(grid.get(1, 1), 1.0);
        assert_eq!(grid.get(0, 0), 0.0);
    }

    #[test]
    fn test_boolean_blur_majority() {
        let mut grid = Grid::<bool>::new(5, none());
        grid.fill_rect(0, 0, 5, 2, true);
        grid.blur(1);
        // Row 1 sees two of three rows true; row 2 only one.
        assert!(grid.get(2, 1));
        assert!(!grid.get(2, 2));
    }

    #[test]
    fn test_blur_with_density() {
        let mut grid = Grid::<bool>::new(5, none());
        grid.set(2, 2, true);
        grid.blur_with_density(1, 0.1);
        assert!(grid.get(1, 1));
        assert!(!grid.get(0, 0));
    }

    #[test]
    fn test_blur_within_area() {
        let mut grid = Grid::<f32>::new(3, none());
        grid.set(1, 1, 9.0);
        let mut area = Grid::<bool>::new(3, none());
        area.set(0, 0, true);
        grid.blur_within(1, &area);
        assert_eq!(grid.get(0, 0), 9.0 / 4.0);
        assert_eq!(grid.get(1, 1), 9.0);
    }

    #[test]
    fn test_mask_blur_within_checks_compatibility() {
        let mut heights = FloatMask::new(4, None, none(), "heights");
        heights.set(1, 1, 16.0);
        let small = BooleanMask::new(2, None, none(), "small");
        assert!(matches!(
            heights.blur_within(1, &small),
            Err(MaskError::SizeMismatch { .. })
        ));
        heights.blur(1).spike(0);
        assert_eq!(heights.get(0, 0), 16.0);
    }

    #[test]
    fn test_spike_squares_average() {
        let mut grid = Grid::<f32>::filled(4, 3.0, none());
        grid.spike(2);
        assert!(grid.values().iter().all(|&v| v == 9.0));
    }

    #[test]
    fn test_integer_blur_rounds() {
        let mut grid = Grid::<i32>::new(3, none());
        grid.set(0, 0, 3);
        grid.blur(1);
        // (0, 0) box is 2x2: 3 / 4 rounds to 1.
        assert_eq!(grid.get(0, 0), 1);
        // (1, 1) box is 3x3: 3 / 9 rounds to 0.
        assert_eq!(grid.get(1, 1), 0);
    }

    #[test]
    fn test_interpolate_smooths_steps() {
        let mut grid = Grid::<f32>::from_fn(4, none(), |x, _| if x < 2 { 0.0 } else { 8.0 });
        grid.interpolate(16);
        assert_eq!(grid.size(), 16);
        assert_eq!(grid.get(0, 0), 0.0);
        assert_eq!(grid.get(15, 0), 8.0);
        let edge = grid.get(8, 4);
        assert!(edge > 0.0 && edge < 8.0, "edge {edge}");
    }

    #[test]
    fn test_decimate_averages_before_shrinking() {
        let mut grid = Grid::<f32>::from_fn(8, none(), |x, y| ((x + y) % 2) as f32);
        grid.decimate(4);
        assert_eq!(grid.size(), 4);
        assert!(grid.values().iter().all(|&v| v > 0.2 && v < 0.8));
    }

    proptest! {
        #[test]
        fn prop_all_true_average_is_one(size in 1usize..40, radius in 0usize..20) {
            let grid = Grid::<f32>::filled(size, 1.0, none());
            let table = AreaTable::new(&grid);
            for y in 0..size {
                for x in 0..size {
                    prop_assert_eq!(table.average(x, y, radius), 1.0);
                }
            }
            let bools = Grid::<bool>::filled(size, true, none());
            let table = AreaTable::new(&bools);
            for y in 0..size {
                for x in 0..size {
                    let (sum, count) = table.around(x, y, radius);
                    prop_assert_eq!(sum as f64 / count as f64, 1.0);
                }
            }
        }
    }
}
