//! Droplet-based water erosion.
//!
//! Each droplet starts on a random cell and slides downhill, accelerated by
//! the surface normal and slowed by friction. On steep ground it picks up
//! material, on flat ground it drops part of what it carries. Droplets die
//! when they leave the map, or when they come to rest on flat ground.

use glam::Vec2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::grid::Grid;
use super::{FloatMask, MaskError};
use crate::schema::{DropletConfig, SymmetryType};

/// A single water droplet.
#[derive(Debug, Default)]
struct Droplet {
    position: Vec2,
    velocity: Vec2,
    sediment: f32,
}

impl Droplet {
    fn spawn(size: usize, rng: &mut ChaCha8Rng) -> Self {
        let size = size as f32;
        Self {
            position: Vec2::new(rng.gen_range(0.0..size), rng.gen_range(0.0..size)),
            ..Self::default()
        }
    }

    /// Cell the droplet currently sits on, if inside the grid.
    fn cell(&self, grid: &Grid<f32>) -> Option<(usize, usize)> {
        grid.contains_point(self.position)
            .then(|| (self.position.x as usize, self.position.y as usize))
    }
}

/// Simulate one droplet. Returns the number of steps it survived.
fn simulate_droplet(heights: &mut Grid<f32>, config: &DropletConfig, rng: &mut ChaCha8Rng) -> usize {
    let mut droplet = Droplet::spawn(heights.size(), rng);

    for step in 0..config.max_iterations {
        let offset = Vec2::new(
            (rng.r#gen::<f32>() * 2.0 - 1.0) * config.max_offset,
            (rng.r#gen::<f32>() * 2.0 - 1.0) * config.max_offset,
        );
        let sample = droplet.position + offset;
        let Some((cx, cy)) = droplet.cell(heights) else {
            return step;
        };
        if !heights.contains_point(sample) {
            return step;
        }

        let normal = heights.surface_normal(sample.x as i64, sample.y as i64, 1.0);
        if normal.y >= 1.0 && droplet.velocity.length() < 1.0 {
            return step;
        }

        let deposit = droplet.sediment * config.deposition_rate * normal.y;
        let ramp = (step as f32 * config.iteration_scale).min(1.0);
        let erosion = config.erosion_rate * (1.0 - normal.y) * ramp;

        heights.set(cx, cy, heights.get(cx, cy) + deposit - erosion);
        droplet.sediment += erosion - deposit;

        droplet.velocity =
            droplet.velocity * (1.0 - config.friction) + Vec2::new(normal.x, normal.z) * config.speed;
        droplet.position += droplet.velocity;
    }
    config.max_iterations
}

impl Grid<f32> {
    /// Run `config.num_drops` droplets over the grid.
    pub fn water_erosion(&mut self, config: &DropletConfig, rng: &mut ChaCha8Rng) {
        if self.size() == 0 {
            return;
        }
        let mut steps = 0usize;
        for _ in 0..config.num_drops {
            steps += simulate_droplet(self, config, rng);
        }
        log::debug!(
            "water erosion: {} droplets, {:.1} steps on average",
            config.num_drops,
            steps as f32 / config.num_drops.max(1) as f32
        );
    }
}

impl FloatMask {
    /// Droplet erosion followed by a spawn symmetry projection.
    pub fn water_erosion(&mut self, config: &DropletConfig) -> Result<&mut Self, MaskError> {
        config
            .validate()
            .map_err(|e| MaskError::InvalidArgument(e.to_string()))?;
        let config = config.clone();
        self.enqueue_random("water_erosion", move |grid, rng| {
            grid.water_erosion(&config, rng);
            grid.apply_symmetry(SymmetryType::Spawn);
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::schema::{Symmetry, SymmetrySettings};

    fn cone(size: usize, symmetry: Symmetry) -> FloatMask {
        let mut mask = FloatMask::new(size, Some(99), SymmetrySettings::uniform(symmetry), "cone");
        let center = size as f32 / 2.0;
        mask.fill_with(move |x, y| {
            let d = ((x as f32 - center).powi(2) + (y as f32 - center).powi(2)).sqrt();
            (center - d).max(0.0)
        });
        mask
    }

    #[test]
    fn test_flat_ground_is_untouched() {
        let mut grid = Grid::<f32>::filled(16, 1.0, SymmetrySettings::default());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        grid.water_erosion(&DropletConfig::default(), &mut rng);
        assert!(grid.values().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_erosion_changes_slopes() {
        let mut mask = cone(32, Symmetry::None);
        let before = mask.to_hash().unwrap();
        let total = mask.sum().unwrap();
        let config = DropletConfig {
            num_drops: 500,
            iteration_scale: 1.0,
            ..DropletConfig::default()
        };
        mask.water_erosion(&config).unwrap();
        assert_ne!(mask.to_hash().unwrap(), before);
        // Droplets that leave the map take their sediment with them.
        assert!(mask.sum().unwrap() <= total * (1.0 + 1e-4));
    }

    #[test]
    fn test_erosion_is_symmetric_and_deterministic() {
        let run = || {
            let mut mask = cone(32, Symmetry::Point2);
            mask.water_erosion(&DropletConfig { num_drops: 200, ..DropletConfig::default() })
                .unwrap();
            mask
        };
        let mask = run();
        assert!(mask.to_grid().unwrap().is_symmetric(SymmetryType::Spawn));
        assert_eq!(mask.to_hash().unwrap(), run().to_hash().unwrap());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut mask = cone(8, Symmetry::None);
        let config = DropletConfig { friction: 2.0, ..DropletConfig::default() };
        assert!(matches!(
            mask.water_erosion(&config),
            Err(MaskError::InvalidArgument(_))
        ));
    }
}
