//! Connected regions: flood fill and size-based region removal.

use std::collections::VecDeque;

use super::grid::Grid;
use super::value::MaskValue;
use super::{BooleanMask, MaskError};

const NEIGHBORS: [(i64, i64); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

impl<T: MaskValue> Grid<T> {
    /// Cells of the 4-connected region holding the same value as `(x, y)`,
    /// in breadth-first order.
    ///
    /// The search stops once `max_area` cells have been collected, so a
    /// result of exactly `max_area` cells may be a truncated region.
    pub fn shape_coordinates(&self, x: usize, y: usize, max_area: usize) -> Vec<(usize, usize)> {
        let size = self.size();
        let value = self.get(x, y);
        let mut visited = vec![false; size * size];
        let mut queue = VecDeque::new();
        let mut shape = Vec::new();

        visited[y * size + x] = true;
        queue.push_back((x, y));
        while let Some((cx, cy)) = queue.pop_front() {
            if shape.len() >= max_area {
                break;
            }
            shape.push((cx, cy));
            for (dx, dy) in NEIGHBORS {
                let nx = cx as i64 + dx;
                let ny = cy as i64 + dy;
                if self.try_get(nx, ny) != Some(value) {
                    continue;
                }
                let index = ny as usize * size + nx as usize;
                if !visited[index] {
                    visited[index] = true;
                    queue.push_back((nx as usize, ny as usize));
                }
            }
        }
        shape
    }
}

impl Grid<bool> {
    /// Clear every true region whose area fails `keep`.
    pub fn retain_areas(&mut self, keep: impl Fn(usize) -> bool) {
        let size = self.size();
        let mut visited = vec![false; size * size];
        let mut queue = VecDeque::new();
        let mut region = Vec::new();

        for start in 0..size * size {
            if visited[start] || !self.values()[start] {
                continue;
            }
            region.clear();
            visited[start] = true;
            queue.push_back((start % size, start / size));
            while let Some((x, y)) = queue.pop_front() {
                region.push((x, y));
                for (dx, dy) in NEIGHBORS {
                    let nx = x as i64 + dx;
                    let ny = y as i64 + dy;
                    if self.try_get(nx, ny) != Some(true) {
                        continue;
                    }
                    let index = ny as usize * size + nx as usize;
                    if !visited[index] {
                        visited[index] = true;
                        queue.push_back((nx as usize, ny as usize));
                    }
                }
            }
            if !keep(region.len()) {
                for &(x, y) in &region {
                    self.set(x, y, false);
                }
            }
        }
    }
}

impl BooleanMask {
    /// Remove true regions with fewer than `min_area` cells.
    pub fn remove_areas_smaller_than(&mut self, min_area: usize) -> &mut Self {
        self.enqueue("remove_areas_smaller_than", move |grid| {
            grid.retain_areas(|area| area >= min_area)
        })
    }

    /// Remove true regions with more than `max_area` cells.
    pub fn remove_areas_bigger_than(&mut self, max_area: usize) -> &mut Self {
        self.enqueue("remove_areas_bigger_than", move |grid| {
            grid.retain_areas(|area| area <= max_area)
        })
    }

    /// Remove true regions whose area lies in `min_area..=max_area`.
    pub fn remove_areas_in_size_range(
        &mut self,
        min_area: usize,
        max_area: usize,
    ) -> Result<&mut Self, MaskError> {
        check_range(min_area, max_area)?;
        Ok(self.enqueue("remove_areas_in_size_range", move |grid| {
            grid.retain_areas(|area| area < min_area || area > max_area)
        }))
    }

    /// Remove true regions whose area lies outside `min_area..=max_area`.
    pub fn remove_areas_outside_size_range(
        &mut self,
        min_area: usize,
        max_area: usize,
    ) -> Result<&mut Self, MaskError> {
        check_range(min_area, max_area)?;
        Ok(self.enqueue("remove_areas_outside_size_range", move |grid| {
            grid.retain_areas(|area| (min_area..=max_area).contains(&area))
        }))
    }

    /// Flood fill from `(x, y)`, truncated at `max_area` cells.
    pub fn shape_coordinates(
        &self,
        x: usize,
        y: usize,
        max_area: usize,
    ) -> Result<Vec<(usize, usize)>, MaskError> {
        self.read(|grid| grid.shape_coordinates(x, y, max_area))
    }
}

fn check_range(min_area: usize, max_area: usize) -> Result<(), MaskError> {
    if min_area > max_area {
        return Err(MaskError::InvalidArgument(format!(
            "area range {min_area}..={max_area} is empty"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::schema::{Symmetry, SymmetrySettings};

    fn settings() -> SymmetrySettings {
        SymmetrySettings::uniform(Symmetry::None)
    }

    fn islands() -> BooleanMask {
        let mut mask = BooleanMask::new(10, None, settings(), "islands");
        mask.set(0, 0, true) // 1 cell
            .fill_rect(3, 0, 2, 2, true) // 4 cells
            .fill_rect(0, 5, 3, 3, true); // 9 cells
        mask
    }

    #[test]
    fn test_isolated_cell_removed() {
        let mut mask = BooleanMask::new(6, None, settings(), "single");
        mask.set(2, 2, true).remove_areas_smaller_than(3);
        assert!(!mask.get(2, 2));
        assert_eq!(mask.count().unwrap(), 0);
    }

    #[test]
    fn test_remove_by_size() {
        let mut mask = islands();
        mask.remove_areas_smaller_than(4);
        assert_eq!(mask.count().unwrap(), 13);

        let mut mask = islands();
        mask.remove_areas_bigger_than(4);
        assert_eq!(mask.count().unwrap(), 5);

        let mut mask = islands();
        mask.remove_areas_in_size_range(2, 8).unwrap();
        assert_eq!(mask.count().unwrap(), 10);

        let mut mask = islands();
        mask.remove_areas_outside_size_range(2, 8).unwrap();
        assert_eq!(mask.count().unwrap(), 4);
    }

    #[test]
    fn test_empty_range_rejected() {
        let mut mask = islands();
        assert!(matches!(
            mask.remove_areas_in_size_range(5, 2),
            Err(MaskError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_shape_coordinates_bounded() {
        let mask = islands();
        assert_eq!(mask.shape_coordinates(3, 0, 100).unwrap().len(), 4);
        assert_eq!(mask.shape_coordinates(0, 5, 5).unwrap().len(), 5);
        // False cells form one large background region.
        assert_eq!(mask.shape_coordinates(9, 9, 1000).unwrap().len(), 100 - 14);
    }

    proptest! {
        #[test]
        fn prop_no_small_regions_survive(
            cells in proptest::collection::vec(any::<bool>(), 144),
            min_area in 1usize..10,
        ) {
            let grid = Grid::<bool>::from_fn(12, settings(), |x, y| cells[y * 12 + x]);
            let mut filtered = grid.clone();
            filtered.retain_areas(|area| area >= min_area);
            for y in 0..12 {
                for x in 0..12 {
                    if filtered.get(x, y) {
                        let region = filtered.shape_coordinates(x, y, usize::MAX);
                        prop_assert!(region.len() >= min_area);
                        prop_assert!(grid.get(x, y));
                    }
                }
            }
        }
    }
}
