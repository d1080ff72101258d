//! Symmetry geometry on grids: companion points, canonical regions and
//! projection.

use std::f32::consts::TAU;

use super::grid::Grid;
use super::value::MaskValue;
use crate::schema::{Symmetry, SymmetrySettings, SymmetryType};

/// Symmetry geometry of a square grid: companion points and canonical
/// region bounds. Depends only on the size and the symmetry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymmetryGeometry {
    size: usize,
    settings: SymmetrySettings,
}

impl SymmetryGeometry {
    pub fn new(size: usize, settings: SymmetrySettings) -> Self {
        Self { size, settings }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.size && (y as usize) < self.size
    }

    /// Every in-bounds companion of `(x, y)` under the symmetry of `symmetry_type`.
    ///
    /// The cell itself is not included.
    pub fn symmetry_points(
        &self,
        x: usize,
        y: usize,
        symmetry_type: SymmetryType,
    ) -> Vec<(usize, usize)> {
        self.symmetry_points_with_out_of_bounds(x, y, symmetry_type)
            .into_iter()
            .filter(|&(px, py)| self.in_bounds(px, py))
            .map(|(px, py)| (px as usize, py as usize))
            .collect()
    }

    /// Companions of `(x, y)` including those that fall off the grid.
    pub fn symmetry_points_with_out_of_bounds(
        &self,
        x: usize,
        y: usize,
        symmetry_type: SymmetryType,
    ) -> Vec<(i64, i64)> {
        let s = self.size as i64;
        let (x, y) = (x as i64, y as i64);
        let symmetry = self.settings.symmetry(symmetry_type);
        let team = self.settings.team;

        match symmetry {
            Symmetry::None => Vec::new(),
            Symmetry::X => vec![(s - 1 - x, y)],
            Symmetry::Z => vec![(x, s - 1 - y)],
            Symmetry::Xz => vec![(y, x)],
            Symmetry::Zx => vec![(s - 1 - y, s - 1 - x)],
            Symmetry::Quad if team == Symmetry::Z => {
                vec![(x, s - 1 - y), (s - 1 - x, y), (s - 1 - x, s - 1 - y)]
            }
            Symmetry::Quad => vec![(s - 1 - x, y), (x, s - 1 - y), (s - 1 - x, s - 1 - y)],
            Symmetry::Diag if team == Symmetry::Zx => {
                vec![(s - 1 - y, s - 1 - x), (y, x), (s - 1 - x, s - 1 - y)]
            }
            Symmetry::Diag => vec![(y, x), (s - 1 - y, s - 1 - x), (s - 1 - x, s - 1 - y)],
            rotational => {
                let n = rotational.num_sym_points();
                if n % 2 == 0 {
                    let mut points = vec![(s - 1 - x, s - 1 - y)];
                    for i in 1..n / 2 {
                        let (rx, ry) = self.rotated(x, y, TAU * i as f32 / n as f32);
                        points.push((rx, ry));
                        points.push((s - 1 - rx, s - 1 - ry));
                    }
                    points
                } else {
                    (1..n)
                        .map(|i| self.rotated(x, y, TAU * i as f32 / n as f32))
                        .collect()
                }
            }
        }
    }

    /// Cell containing the center of `(x, y)` rotated by `angle` about the
    /// grid center.
    fn rotated(&self, x: i64, y: i64, angle: f32) -> (i64, i64) {
        let half = self.size as f32 / 2.0;
        let dx = x as f32 + 0.5 - half;
        let dy = y as f32 + 0.5 - half;
        let (sin, cos) = angle.sin_cos();
        let rx = dx * cos - dy * sin + half;
        let ry = dx * sin + dy * cos + half;
        (rx.floor() as i64, ry.floor() as i64)
    }

    /// Whether a cell lies in the rotational wedge of a `Point*` symmetry.
    fn in_wedge(&self, x: usize, y: usize, points: usize) -> bool {
        let half = self.size as f32 / 2.0;
        let dx = x as f32 + 0.5 - half;
        let dy = y as f32 + 0.5 - half;
        let angle = dy.atan2(dx).rem_euclid(TAU);
        angle < TAU / points as f32
    }

    fn canonical_symmetry(&self, symmetry_type: SymmetryType) -> Symmetry {
        self.settings.symmetry(symmetry_type)
    }

    /// First column of the canonical region.
    pub fn min_x_bound(&self, symmetry_type: SymmetryType) -> usize {
        match self.canonical_symmetry(symmetry_type) {
            s if s.is_rotational() && s != Symmetry::Point2 => (0..self.size)
                .find(|&x| self.min_y_bound(x, symmetry_type) < self.max_y_bound(x, symmetry_type))
                .unwrap_or(0),
            _ => 0,
        }
    }

    /// One past the last column of the canonical region.
    pub fn max_x_bound(&self, symmetry_type: SymmetryType) -> usize {
        let size = self.size;
        let half_up = size.div_ceil(2);
        match self.canonical_symmetry(symmetry_type) {
            Symmetry::None | Symmetry::Z | Symmetry::Xz | Symmetry::Zx => size,
            Symmetry::X | Symmetry::Quad | Symmetry::Diag | Symmetry::Point2 => half_up,
            _ => (0..size)
                .rev()
                .find(|&x| self.min_y_bound(x, symmetry_type) < self.max_y_bound(x, symmetry_type))
                .map_or(0, |x| x + 1),
        }
    }

    /// First row of the canonical region in column `x`.
    pub fn min_y_bound(&self, x: usize, symmetry_type: SymmetryType) -> usize {
        let size = self.size;
        match self.canonical_symmetry(symmetry_type) {
            Symmetry::Xz | Symmetry::Diag => x.min(size),
            Symmetry::None
            | Symmetry::X
            | Symmetry::Z
            | Symmetry::Zx
            | Symmetry::Quad
            | Symmetry::Point2 => 0,
            rotational => {
                let n = rotational.num_sym_points();
                (0..size).find(|&y| self.in_wedge(x, y, n)).unwrap_or(size)
            }
        }
    }

    /// One past the last row of the canonical region in column `x`.
    pub fn max_y_bound(&self, x: usize, symmetry_type: SymmetryType) -> usize {
        let size = self.size;
        let half_up = size.div_ceil(2);
        match self.canonical_symmetry(symmetry_type) {
            Symmetry::None | Symmetry::X | Symmetry::Xz => size,
            Symmetry::Z | Symmetry::Quad => half_up,
            Symmetry::Zx => size.saturating_sub(x),
            Symmetry::Diag => size.saturating_sub(x).max(x),
            Symmetry::Point2 if size % 2 == 1 && x == size / 2 => size / 2 + 1,
            Symmetry::Point2 => size,
            rotational => {
                let n = rotational.num_sym_points();
                (0..size)
                    .rev()
                    .find(|&y| self.in_wedge(x, y, n))
                    .map_or(0, |y| y + 1)
            }
        }
    }

    /// Visit one representative cell per symmetry orbit.
    pub fn for_each_canonical(&self, symmetry_type: SymmetryType, mut f: impl FnMut(usize, usize)) {
        for x in self.min_x_bound(symmetry_type)..self.max_x_bound(symmetry_type) {
            let min_y = self.min_y_bound(x, symmetry_type);
            let max_y = self.max_y_bound(x, symmetry_type);
            for y in min_y..max_y {
                f(x, y);
            }
        }
    }

    /// Canonical cells in iteration order.
    pub fn canonical_cells(&self, symmetry_type: SymmetryType) -> Vec<(usize, usize)> {
        let mut cells = Vec::new();
        self.for_each_canonical(symmetry_type, |x, y| cells.push((x, y)));
        cells
    }
}

impl<T: MaskValue> Grid<T> {
    pub fn geometry(&self) -> SymmetryGeometry {
        SymmetryGeometry::new(self.size(), self.symmetry_settings())
    }

    /// See [`SymmetryGeometry::symmetry_points`].
    pub fn symmetry_points(
        &self,
        x: usize,
        y: usize,
        symmetry_type: SymmetryType,
    ) -> Vec<(usize, usize)> {
        self.geometry().symmetry_points(x, y, symmetry_type)
    }

    pub fn for_each_canonical(&self, symmetry_type: SymmetryType, f: impl FnMut(usize, usize)) {
        self.geometry().for_each_canonical(symmetry_type, f);
    }

    pub fn canonical_cells(&self, symmetry_type: SymmetryType) -> Vec<(usize, usize)> {
        self.geometry().canonical_cells(symmetry_type)
    }

    /// Compute a value for every canonical cell and write it to the cell and
    /// its companions.
    ///
    /// All values are computed before any is written, so `f` always observes
    /// the grid as it was before the call.
    pub fn apply_with_symmetry(
        &mut self,
        symmetry_type: SymmetryType,
        mut f: impl FnMut(&Grid<T>, usize, usize) -> T,
    ) {
        let cells = self.canonical_cells(symmetry_type);
        let before: &Grid<T> = self;
        let values: Vec<T> = cells.iter().map(|&(x, y)| f(before, x, y)).collect();
        for (&(x, y), value) in cells.iter().zip(values) {
            self.set(x, y, value);
            for (px, py) in self.symmetry_points(x, y, symmetry_type) {
                self.set(px, py, value);
            }
        }
    }

    /// Copy every canonical value onto its companions.
    pub fn apply_symmetry(&mut self, symmetry_type: SymmetryType) {
        self.project(symmetry_type);
        self.smooth_imperfect(symmetry_type);
    }

    /// Pull each canonical cell's value from its first companion, then
    /// project as [`apply_symmetry`](Self::apply_symmetry) does.
    pub fn apply_symmetry_reverse(&mut self, symmetry_type: SymmetryType) {
        let cells = self.canonical_cells(symmetry_type);
        for (x, y) in cells {
            if let Some(&(px, py)) = self.symmetry_points(x, y, symmetry_type).first() {
                let value = self.get(px, py);
                self.set(x, y, value);
            }
        }
        self.apply_symmetry(symmetry_type);
    }

    fn project(&mut self, symmetry_type: SymmetryType) {
        if self.symmetry_settings().symmetry(symmetry_type) == Symmetry::None {
            return;
        }
        let cells = self.canonical_cells(symmetry_type);
        for (x, y) in cells {
            let value = self.get(x, y);
            for (px, py) in self.symmetry_points(x, y, symmetry_type) {
                self.set(px, py, value);
            }
        }
    }

    fn smooth_imperfect(&mut self, symmetry_type: SymmetryType) {
        if !self.symmetry_settings().symmetry(symmetry_type).is_perfect() && self.size() > 1 {
            self.blur(1);
        }
    }

    /// Whether every cell equals its companions.
    pub fn is_symmetric(&self, symmetry_type: SymmetryType) -> bool {
        let size = self.size();
        (0..size).all(|y| {
            (0..size).all(|x| {
                let value = self.get(x, y);
                self.symmetry_points(x, y, symmetry_type)
                    .into_iter()
                    .all(|(px, py)| self.get(px, py) == value)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn grid<T: MaskValue>(size: usize, symmetry: Symmetry) -> Grid<T> {
        Grid::new(size, SymmetrySettings::uniform(symmetry))
    }

    fn perfect_multi_point() -> Vec<Symmetry> {
        Symmetry::ALL
            .into_iter()
            .filter(|s| s.is_perfect() && s.num_sym_points() > 1)
            .collect()
    }

    #[test]
    fn test_point2_mirrors_through_center() {
        let mut g = grid::<bool>(8, Symmetry::Point2);
        g.set(1, 1, true);
        g.apply_symmetry(SymmetryType::Spawn);
        assert!(g.get(6, 6));
        assert_eq!(g.values().iter().filter(|&&v| v).count(), 2);
    }

    #[test]
    fn test_mirror_points() {
        let g = grid::<f32>(10, Symmetry::X);
        assert_eq!(g.symmetry_points(2, 3, SymmetryType::Spawn), vec![(7, 3)]);
        let g = grid::<f32>(10, Symmetry::Zx);
        assert_eq!(g.symmetry_points(2, 3, SymmetryType::Spawn), vec![(6, 7)]);
        let g = grid::<f32>(10, Symmetry::Xz);
        assert_eq!(g.symmetry_points(2, 3, SymmetryType::Spawn), vec![(3, 2)]);
    }

    #[test]
    fn test_quad_order_follows_team_symmetry() {
        let g: Grid<f32> = Grid::new(
            10,
            SymmetrySettings::new(Symmetry::Quad, Symmetry::Z, Symmetry::Quad),
        );
        assert_eq!(
            g.symmetry_points(1, 2, SymmetryType::Spawn),
            vec![(1, 7), (8, 2), (8, 7)]
        );
        let g = grid::<f32>(10, Symmetry::Quad);
        assert_eq!(
            g.symmetry_points(1, 2, SymmetryType::Spawn),
            vec![(8, 2), (1, 7), (8, 7)]
        );
    }

    #[test]
    fn test_point4_rotation_is_exact_on_cell_centers() {
        let g = grid::<f32>(8, Symmetry::Point4);
        let points = g.symmetry_points(1, 0, SymmetryType::Spawn);
        assert_eq!(points, vec![(6, 7), (7, 1), (0, 6)]);
    }

    #[test]
    fn test_point4_projection_keeps_isolated_cells() {
        let mut land = grid::<bool>(8, Symmetry::Point4);
        land.set(5, 6, true);
        land.apply_symmetry(SymmetryType::Spawn);
        assert_eq!(land.values().iter().filter(|&&v| v).count(), 4);
        assert!(land.get(5, 6));
        assert!(land.is_symmetric(SymmetryType::Spawn));

        let mut heights = grid::<f32>(8, Symmetry::Point4);
        heights.set(5, 6, 1.0);
        heights.apply_symmetry(SymmetryType::Spawn);
        assert_eq!(heights.get(5, 6), 1.0);
        assert_eq!(heights.values().iter().sum::<f32>(), 4.0);
    }

    #[test]
    fn test_out_of_bounds_points_are_kept() {
        let g = grid::<f32>(8, Symmetry::Point3);
        let all = g.geometry().symmetry_points_with_out_of_bounds(0, 0, SymmetryType::Spawn);
        let inside = g.symmetry_points(0, 0, SymmetryType::Spawn);
        assert_eq!(all.len(), 2);
        assert!(inside.len() < all.len());
    }

    #[test]
    fn test_canonical_regions_cover_grid_once() {
        for symmetry in perfect_multi_point() {
            for size in [7, 8] {
                let g = grid::<f32>(size, symmetry);
                let mut hits = vec![0usize; size * size];
                g.for_each_canonical(SymmetryType::Spawn, |x, y| {
                    hits[y * size + x] += 1;
                    for (px, py) in g.symmetry_points(x, y, SymmetryType::Spawn) {
                        if (px, py) != (x, y) {
                            hits[py * size + px] += 1;
                        }
                    }
                });
                assert!(
                    hits.iter().all(|&h| h >= 1),
                    "{symmetry:?} size {size} leaves cells uncovered"
                );
                // Each orbit is visited from exactly one representative.
                let representatives = g.canonical_cells(SymmetryType::Spawn);
                for &(x, y) in &representatives {
                    for (px, py) in g.symmetry_points(x, y, SymmetryType::Spawn) {
                        if (px, py) != (x, y) {
                            assert!(
                                !representatives.contains(&(px, py)),
                                "{symmetry:?} size {size}: ({x}, {y}) and ({px}, {py}) both canonical"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_rotational_wedge_is_nonempty() {
        for n in 3..=16 {
            let g = grid::<f32>(32, Symmetry::point(n).unwrap());
            assert!(!g.canonical_cells(SymmetryType::Spawn).is_empty(), "point{n}");
        }
    }

    #[test]
    fn test_reverse_pulls_companion_value() {
        let mut g = grid::<i32>(6, Symmetry::X);
        g.set(5, 2, 9);
        g.apply_symmetry_reverse(SymmetryType::Spawn);
        assert_eq!(g.get(0, 2), 9);
        assert_eq!(g.get(5, 2), 9);
    }

    #[test]
    fn test_apply_with_symmetry_reads_original_state() {
        let mut g = grid::<i32>(4, Symmetry::X);
        g.set(0, 0, 1);
        g.apply_with_symmetry(SymmetryType::Spawn, |grid, x, y| {
            grid.get_clamped(x as i64 - 1, y as i64) + 1
        });
        assert_eq!(g.get(0, 0), 2);
        assert_eq!(g.get(1, 0), 2);
        assert_eq!(g.get(3, 0), 2);
        assert!(g.is_symmetric(SymmetryType::Spawn));
    }

    proptest! {
        #[test]
        fn prop_apply_symmetry_round_trip(
            size in 2usize..24,
            seed_values in proptest::collection::vec(-100i32..100, 576),
            index in 0usize..8,
        ) {
            let symmetries = perfect_multi_point();
            let symmetry = symmetries[index % symmetries.len()];
            let mut g = Grid::<i32>::from_fn(size, SymmetrySettings::uniform(symmetry), |x, y| {
                seed_values[y * size + x]
            });
            g.apply_symmetry(SymmetryType::Spawn);
            prop_assert!(g.is_symmetric(SymmetryType::Spawn));
            for y in 0..size {
                for x in 0..size {
                    let value = g.get(x, y);
                    for (px, py) in g.symmetry_points(x, y, SymmetryType::Spawn) {
                        prop_assert_eq!(g.get(px, py), value);
                    }
                }
            }
        }
    }
}
