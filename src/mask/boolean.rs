//! Boolean masks: logic, conversions, random fills and paths.

use rand::Rng;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use super::core::Mask;
use super::grid::Grid;
use super::value::{Comparable, MaskValue};
use super::{BooleanMask, MaskError};
use crate::schema::SymmetryType;

const NEIGHBORS: [(i64, i64); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

impl Grid<bool> {
    /// Whether any in-bounds 4-neighbour holds a different value.
    pub fn is_edge(&self, x: usize, y: usize) -> bool {
        let value = self.get(x, y);
        NEIGHBORS.iter().any(|&(dx, dy)| {
            self.try_get(x as i64 + dx, y as i64 + dy)
                .is_some_and(|neighbor| neighbor != value)
        })
    }

    pub fn count(&self) -> usize {
        self.values().iter().filter(|&&v| v).count()
    }

    /// Keep only true cells that touch a false cell.
    pub fn outline(&mut self) {
        let source = self.clone();
        self.map_in_place(|x, y, value| value && source.is_edge(x, y));
    }

    /// Walk from `start` towards `end`, marking every visited cell.
    ///
    /// With probability `wander` a step goes in a random direction instead
    /// of towards the target.
    pub fn walk_path(
        &mut self,
        start: (i64, i64),
        end: (i64, i64),
        wander: f32,
        rng: &mut ChaCha8Rng,
    ) {
        let size = self.size() as i64;
        if size == 0 {
            return;
        }
        let clamp = |(x, y): (i64, i64)| (x.clamp(0, size - 1), y.clamp(0, size - 1));
        let end = clamp(end);
        let (mut x, mut y) = clamp(start);
        let wander = wander.clamp(0.0, 0.95);
        self.set(x as usize, y as usize, true);

        let max_steps = (size * size * 4) as usize;
        for _ in 0..max_steps {
            if (x, y) == end {
                break;
            }
            let (dx, dy) = if rng.r#gen::<f32>() < wander {
                NEIGHBORS[rng.gen_range(0..NEIGHBORS.len())]
            } else {
                let rx = end.0 - x;
                let ry = end.1 - y;
                let along_x = match rx.abs().cmp(&ry.abs()) {
                    std::cmp::Ordering::Greater => true,
                    std::cmp::Ordering::Less => false,
                    std::cmp::Ordering::Equal => rng.r#gen::<bool>(),
                };
                if along_x {
                    (rx.signum(), 0)
                } else {
                    (0, ry.signum())
                }
            };
            (x, y) = clamp((x + dx, y + dy));
            self.set(x as usize, y as usize, true);
        }
    }

    /// Random walkers starting at random cells.
    pub fn random_walk(&mut self, walkers: usize, steps: usize, rng: &mut ChaCha8Rng) {
        let size = self.size() as i64;
        if size == 0 {
            return;
        }
        for _ in 0..walkers {
            let mut x = rng.gen_range(0..size);
            let mut y = rng.gen_range(0..size);
            self.set(x as usize, y as usize, true);
            for _ in 0..steps {
                let (dx, dy) = NEIGHBORS[rng.gen_range(0..NEIGHBORS.len())];
                x = (x + dx).clamp(0, size - 1);
                y = (y + dy).clamp(0, size - 1);
                self.set(x as usize, y as usize, true);
            }
        }
    }
}

impl BooleanMask {
    /// True where `source >= threshold`.
    pub fn from_threshold<T: Comparable>(source: &Mask<T>, threshold: T) -> BooleanMask {
        Mask::derived(
            source,
            "from_threshold",
            format!("{}-threshold", source.name()),
            move |grid| grid.map(|v| v >= threshold),
        )
    }

    /// True where `min <= source <= max`.
    pub fn from_range<T: Comparable>(source: &Mask<T>, min: T, max: T) -> BooleanMask {
        Mask::derived(
            source,
            "from_range",
            format!("{}-range", source.name()),
            move |grid| grid.map(|v| v >= min && v <= max),
        )
    }

    pub fn invert(&mut self) -> &mut Self {
        self.enqueue("invert", |grid| grid.map_in_place(|_, _, v| !v))
    }

    pub fn and(&mut self, other: &BooleanMask) -> Result<&mut Self, MaskError> {
        self.enqueue_with("and", other, |grid, other| grid.zip_in_place(other, |a, b| a && b))
    }

    pub fn or(&mut self, other: &BooleanMask) -> Result<&mut Self, MaskError> {
        self.enqueue_with("or", other, |grid, other| grid.zip_in_place(other, |a, b| a || b))
    }

    pub fn xor(&mut self, other: &BooleanMask) -> Result<&mut Self, MaskError> {
        self.enqueue_with("xor", other, |grid, other| grid.zip_in_place(other, |a, b| a ^ b))
    }

    /// Clear every cell that is true in `other`.
    pub fn minus(&mut self, other: &BooleanMask) -> Result<&mut Self, MaskError> {
        self.enqueue_with("minus", other, |grid, other| grid.zip_in_place(other, |a, b| a && !b))
    }

    /// Number of true cells.
    pub fn count(&self) -> Result<usize, MaskError> {
        self.read(Grid::count)
    }

    pub fn outline(&mut self) -> &mut Self {
        self.enqueue("outline", Grid::outline)
    }

    /// Threshold blur: true where at least `density` of the box is true.
    pub fn blur_with_density(&mut self, radius: usize, density: f32) -> &mut Self {
        self.enqueue("blur_with_density", move |grid| {
            grid.blur_with_density(radius, density)
        })
    }

    /// Independent symmetric coin flips with probability `density`.
    pub fn randomize(&mut self, density: f32) -> Result<&mut Self, MaskError> {
        self.enqueue_random("randomize", move |grid, rng| {
            grid.apply_with_symmetry(SymmetryType::Spawn, |_, _, _| rng.r#gen::<f32>() < density);
        })
    }

    /// Clear everything outside the canonical region.
    pub fn limit_to_symmetry_region(&mut self, symmetry_type: SymmetryType) -> &mut Self {
        self.enqueue("limit_to_symmetry_region", move |grid| {
            let mut keep = Grid::<bool>::new(grid.size(), grid.symmetry_settings());
            grid.for_each_canonical(symmetry_type, |x, y| keep.set(x, y, true));
            grid.zip_in_place(&keep, |v, inside| v && inside);
        })
    }

    pub fn random_walk(&mut self, walkers: usize, steps: usize) -> Result<&mut Self, MaskError> {
        self.enqueue_random("random_walk", move |grid, rng| {
            grid.random_walk(walkers, steps, rng);
            grid.apply_symmetry(SymmetryType::Spawn);
        })
    }

    /// Mark a wandering path from `start` to `end`, then project it.
    pub fn path(
        &mut self,
        start: (usize, usize),
        end: (usize, usize),
        wander: f32,
    ) -> Result<&mut Self, MaskError> {
        self.enqueue_random("path", move |grid, rng| {
            grid.walk_path(
                (start.0 as i64, start.1 as i64),
                (end.0 as i64, end.1 as i64),
                wander,
                rng,
            );
            grid.apply_symmetry(SymmetryType::Spawn);
        })
    }

    /// Path from `start` to its first spawn symmetry companion.
    ///
    /// The companion may lie off the grid for imperfect rotations; the path
    /// then ends at the nearest in-bounds cell.
    pub fn connect_to_symmetry_partner(
        &mut self,
        start: (usize, usize),
        wander: f32,
    ) -> Result<&mut Self, MaskError> {
        let partner = self
            .geometry()
            .symmetry_points_with_out_of_bounds(start.0, start.1, SymmetryType::Spawn)
            .first()
            .copied()
            .unwrap_or((start.0 as i64, start.1 as i64));
        self.enqueue_random("connect_to_symmetry_partner", move |grid, rng| {
            grid.walk_path((start.0 as i64, start.1 as i64), partner, wander, rng);
            grid.apply_symmetry(SymmetryType::Spawn);
        })
    }

    /// Randomly chosen true cells at least `spacing` apart, companions
    /// included.
    pub fn random_coordinates(&self, spacing: f32) -> Result<Vec<(usize, usize)>, MaskError> {
        let seed = self
            .next_seed()
            .ok_or_else(|| MaskError::Unseeded(self.name().to_string()))?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.read(|grid| {
            let mut candidates: Vec<(usize, usize)> = grid
                .canonical_cells(SymmetryType::Spawn)
                .into_iter()
                .filter(|&(x, y)| grid.get(x, y))
                .collect();
            candidates.shuffle(&mut rng);

            let spacing2 = spacing * spacing;
            let far_enough = |chosen: &[(usize, usize)], (x, y): (usize, usize)| {
                chosen.iter().all(|&(cx, cy)| {
                    let dx = cx as f32 - x as f32;
                    let dy = cy as f32 - y as f32;
                    dx * dx + dy * dy >= spacing2
                })
            };

            let mut chosen = Vec::new();
            for candidate in candidates {
                let mut orbit = vec![candidate];
                orbit.extend(grid.symmetry_points(candidate.0, candidate.1, SymmetryType::Spawn));
                let fits = orbit
                    .iter()
                    .enumerate()
                    .all(|(i, &p)| far_enough(&chosen, p) && far_enough(&orbit[..i], p));
                if fits {
                    chosen.extend(orbit);
                }
            }
            chosen
        })
    }
}

impl<T: MaskValue> Mask<T> {
    /// Map a boolean mask onto two values: `high` where true, `low` elsewhere.
    pub fn from_boolean(source: &BooleanMask, low: T, high: T) -> Mask<T> {
        Mask::derived(
            source,
            "from_boolean",
            format!("{}-values", source.name()),
            move |grid| grid.map(|v| if v { high } else { low }),
        )
    }

    /// Boolean mask of cells equal to `value`.
    pub fn equal_to(&self, value: T) -> BooleanMask {
        Mask::derived(
            self,
            "equal_to",
            format!("{}-equal", self.name()),
            move |grid| grid.map(|v| v == value),
        )
    }
}
