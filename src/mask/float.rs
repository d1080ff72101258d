//! Float masks: noise, gradients, surface normals and brush stamping.

use glam::Vec3;
use noise::{NoiseFn, Perlin};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;

use super::grid::Grid;
use super::operations::stamp;
use super::{BooleanMask, FloatMask, MaskError};
use crate::brush::BrushLoader;
use crate::schema::SymmetryType;

impl Grid<f32> {
    /// Clamped height lookup.
    #[inline]
    fn height(&self, x: i64, y: i64) -> f32 {
        self.get_clamped(x, y)
    }

    /// Unit surface normal at `(x, y)` with `y` pointing up. `scale`
    /// exaggerates height differences.
    pub fn surface_normal(&self, x: i64, y: i64, scale: f32) -> Vec3 {
        Vec3::new(
            (self.height(x - 1, y) - self.height(x + 1, y)) * scale,
            2.0,
            (self.height(x, y - 1) - self.height(x, y + 1)) * scale,
        )
        .normalize()
    }

    /// Magnitude of the central-difference slope at every cell.
    pub fn gradient(&self) -> Grid<f32> {
        Grid::from_fn(self.size(), self.symmetry_settings(), |x, y| {
            let (x, y) = (x as i64, y as i64);
            let dx = self.height(x + 1, y) - self.height(x - 1, y);
            let dy = self.height(x, y + 1) - self.height(x, y - 1);
            (dx * dx + dy * dy).sqrt() / 2.0
        })
    }

    /// Stamp `brush` centered on `(x, y)` and on each spawn companion.
    fn stamp_symmetric(&mut self, brush: &Grid<f32>, x: usize, y: usize, intensity: f32, wrap_edges: bool) {
        let mut points = vec![(x, y)];
        points.extend(self.symmetry_points(x, y, SymmetryType::Spawn));
        for (px, py) in points {
            stamp(self, brush, px as i64, py as i64, true, wrap_edges, |a, b| {
                a + b * intensity
            });
        }
    }
}

/// Canonical spawn cells selected by `area`.
fn canonical_area_cells(area: &Grid<bool>) -> Vec<(usize, usize)> {
    area.canonical_cells(SymmetryType::Spawn)
        .into_iter()
        .filter(|&(x, y)| area.get(x, y))
        .collect()
}

fn resized(brush: &Grid<f32>, size: usize) -> Grid<f32> {
    let mut brush = brush.clone();
    brush.resample(size);
    brush
}

impl FloatMask {
    /// Add symmetric uniform noise in `[0, scale)`.
    pub fn add_white_noise(&mut self, scale: f32) -> Result<&mut Self, MaskError> {
        self.enqueue_random("add_white_noise", move |grid, rng| {
            grid.apply_with_symmetry(SymmetryType::Spawn, |grid, x, y| {
                grid.get(x, y) + rng.r#gen::<f32>() * scale
            });
        })
    }

    /// Add symmetric normally distributed noise.
    pub fn add_gaussian_noise(&mut self, std_dev: f32) -> Result<&mut Self, MaskError> {
        let normal = Normal::new(0.0f32, std_dev)
            .map_err(|e| MaskError::InvalidArgument(format!("gaussian noise: {e}")))?;
        self.enqueue_random("add_gaussian_noise", move |grid, rng| {
            grid.apply_with_symmetry(SymmetryType::Spawn, |grid, x, y| {
                grid.get(x, y) + rng.sample(normal)
            });
        })
    }

    /// Add Perlin noise with features roughly `resolution` cells wide,
    /// scaled to `[-scale, scale]`.
    pub fn add_perlin_noise(&mut self, resolution: usize, scale: f32) -> Result<&mut Self, MaskError> {
        if resolution == 0 {
            return Err(MaskError::InvalidArgument(
                "perlin resolution must be greater than zero".to_string(),
            ));
        }
        self.enqueue_random("add_perlin_noise", move |grid, rng| {
            let perlin = Perlin::new(rng.r#gen());
            let frequency = 1.0 / resolution as f64;
            grid.apply_with_symmetry(SymmetryType::Spawn, |grid, x, y| {
                let sample = perlin.get([x as f64 * frequency, y as f64 * frequency]);
                grid.get(x, y) + sample as f32 * scale
            });
        })
    }

    /// Slope magnitude of this mask.
    pub fn gradient(&self) -> FloatMask {
        FloatMask::derived(
            self,
            "gradient",
            format!("{}-gradient", self.name()),
            |grid| grid.gradient(),
        )
    }

    /// Replace every cell with its slope magnitude.
    pub fn to_gradient(&mut self) -> &mut Self {
        self.enqueue("to_gradient", |grid| *grid = grid.gradient())
    }

    /// Stamp `brush` once, centered on `(x, y)`.
    pub fn use_brush(
        &mut self,
        x: i64,
        y: i64,
        brush: &FloatMask,
        intensity: f32,
        wrap_edges: bool,
    ) -> Result<&mut Self, MaskError> {
        self.enqueue_reading("use_brush", brush, move |grid, brush, _| {
            stamp(grid, brush, x, y, true, wrap_edges, |a, b| a + b * intensity);
        })
    }

    /// Stamp `brush`, resized to `size`, at `uses` random cells of `area`
    /// and their spawn companions.
    pub fn use_brush_within_area(
        &mut self,
        area: &BooleanMask,
        brush: &FloatMask,
        size: usize,
        uses: usize,
        intensity: f32,
        wrap_edges: bool,
    ) -> Result<&mut Self, MaskError> {
        self.check_compatible(area)?;
        self.require_seed()?;
        self.enqueue_reading2("use_brush_within_area", area, brush, move |grid, area, brush, rng| {
            let Some(rng) = rng else { return };
            let brush = resized(brush, size);
            let cells = canonical_area_cells(area);
            if cells.is_empty() {
                return;
            }
            for _ in 0..uses {
                let (x, y) = cells[rng.gen_range(0..cells.len())];
                grid.stamp_symmetric(&brush, x, y, intensity, wrap_edges);
            }
        })
    }

    /// Like [`use_brush_within_area`](Self::use_brush_within_area) with a
    /// brush fetched from `loader`.
    #[allow(clippy::too_many_arguments)]
    pub fn use_named_brush_within_area(
        &mut self,
        area: &BooleanMask,
        loader: &dyn BrushLoader,
        name: &str,
        size: usize,
        uses: usize,
        intensity: f32,
        wrap_edges: bool,
    ) -> Result<&mut Self, MaskError> {
        let seed = self.next_seed().unwrap_or_default();
        let brush = loader.load_brush(name, size, seed)?;
        let brush = match self.pipeline() {
            Some(pipeline) => brush.in_pipeline(pipeline),
            None => brush,
        };
        self.use_brush_within_area(area, &brush, size, uses, intensity, wrap_edges)
    }

    /// Random walk of `steps` brush stamps starting at `start`, moving
    /// `step_size` cells in a random direction each time.
    pub fn use_brush_walk(
        &mut self,
        start: (usize, usize),
        brush: &FloatMask,
        size: usize,
        steps: usize,
        step_size: f32,
        intensity: f32,
    ) -> Result<&mut Self, MaskError> {
        self.require_seed()?;
        self.enqueue_reading("use_brush_walk", brush, move |grid, brush, rng| {
            let Some(rng) = rng else { return };
            walk_brush(grid, &resized(brush, size), start, steps, step_size, intensity, rng);
        })
    }
}

fn walk_brush(
    grid: &mut Grid<f32>,
    brush: &Grid<f32>,
    start: (usize, usize),
    steps: usize,
    step_size: f32,
    intensity: f32,
    rng: &mut ChaCha8Rng,
) {
    let size = grid.size();
    if size == 0 {
        return;
    }
    let max = (size - 1) as f32;
    let (mut x, mut y) = (start.0 as f32, start.1 as f32);
    for _ in 0..steps {
        let (cx, cy) = (x.round() as usize, y.round() as usize);
        grid.stamp_symmetric(brush, cx, cy, intensity, false);
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        x = (x + angle.cos() * step_size).clamp(0.0, max);
        y = (y + angle.sin() * step_size).clamp(0.0, max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::RadialBrushes;
    use crate::pipeline::PipelineContext;
    use crate::schema::{Symmetry, SymmetrySettings};

    fn settings(symmetry: Symmetry) -> SymmetrySettings {
        SymmetrySettings::uniform(symmetry)
    }

    #[test]
    fn test_white_noise_bounded_and_symmetric() {
        let mut mask = FloatMask::new(16, Some(3), settings(Symmetry::X), "noise");
        mask.add_white_noise(0.5).unwrap();
        let grid = mask.to_grid().unwrap();
        assert!(grid.values().iter().all(|&v| (0.0..0.5).contains(&v)));
        assert!(grid.is_symmetric(SymmetryType::Spawn));
    }

    #[test]
    fn test_gaussian_noise_rejects_bad_deviation() {
        let mut mask = FloatMask::new(4, Some(3), settings(Symmetry::None), "noise");
        assert!(matches!(
            mask.add_gaussian_noise(f32::NAN),
            Err(MaskError::InvalidArgument(_))
        ));
        mask.add_gaussian_noise(1.0).unwrap();
        assert!(mask.max().unwrap() != mask.min().unwrap());
    }

    #[test]
    fn test_perlin_is_deterministic() {
        let run = || {
            let mut mask = FloatMask::new(32, Some(12), settings(Symmetry::Quad), "perlin");
            mask.add_perlin_noise(8, 1.0).unwrap();
            mask.to_hash().unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_noise_requires_seed() {
        let mut mask = FloatMask::new(4, None, settings(Symmetry::None), "plain");
        assert!(matches!(mask.add_white_noise(1.0), Err(MaskError::Unseeded(_))));
        assert!(matches!(mask.add_perlin_noise(4, 1.0), Err(MaskError::Unseeded(_))));
    }

    #[test]
    fn test_gradient_of_ramp() {
        let mut ramp = FloatMask::new(5, None, settings(Symmetry::None), "ramp");
        ramp.fill_with(|x, _| x as f32 * 2.0);
        let slope = ramp.gradient();
        assert_eq!(slope.get(2, 2), 2.0);
        // Clamped lookups halve the difference at the border.
        assert_eq!(slope.get(0, 2), 1.0);
    }

    #[test]
    fn test_flat_surface_normal_points_up() {
        let grid = Grid::<f32>::filled(4, 3.0, settings(Symmetry::None));
        assert_eq!(grid.surface_normal(1, 1, 10.0), Vec3::Y);
    }

    #[test]
    fn test_use_brush_centered() {
        let mut terrain = FloatMask::new(16, None, settings(Symmetry::None), "terrain");
        let brush = RadialBrushes.load_brush("cone", 8, 0).unwrap();
        terrain.use_brush(8, 8, &brush, 2.0, false).unwrap();
        assert!(terrain.get(8, 8) > 1.5);
        assert_eq!(terrain.get(0, 0), 0.0);
    }

    #[test]
    fn test_brush_within_area_stays_near_area() {
        let mut area = BooleanMask::new(32, None, settings(Symmetry::Point2), "area");
        area.fill_rect(4, 4, 2, 2, true).apply_symmetry(SymmetryType::Spawn);
        let mut terrain = FloatMask::new(32, Some(6), settings(Symmetry::Point2), "terrain");
        terrain
            .use_named_brush_within_area(&area, &RadialBrushes, "dome", 6, 5, 1.0, false)
            .unwrap();
        assert!(terrain.get(5, 5) > 0.0);
        assert!(terrain.get(26, 26) > 0.0);
        assert_eq!(terrain.get(16, 16), 0.0);
    }

    #[test]
    fn test_unknown_named_brush_is_an_error() {
        let area = BooleanMask::new(8, None, settings(Symmetry::None), "area");
        let mut terrain = FloatMask::new(8, Some(1), settings(Symmetry::None), "terrain");
        assert!(matches!(
            terrain.use_named_brush_within_area(&area, &RadialBrushes, "nope", 4, 1, 1.0, false),
            Err(MaskError::Brush(_))
        ));
    }

    #[test]
    fn test_brush_walk_in_pipeline() {
        let pipeline = PipelineContext::new(2);
        let brush = RadialBrushes
            .load_brush("cone", 4, 0)
            .unwrap()
            .in_pipeline(&pipeline);
        let mut terrain = FloatMask::new(16, Some(2), settings(Symmetry::None), "terrain")
            .in_pipeline(&pipeline);
        terrain.use_brush_walk((8, 8), &brush, 4, 10, 1.5, 0.5).unwrap();
        pipeline.start().unwrap();
        assert!(terrain.sum().unwrap() > 0.0);
    }
}
