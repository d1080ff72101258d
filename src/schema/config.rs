//! Configuration types for mask generation runs.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::SymmetrySettings;

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Top-level generation configuration.
///
/// Supplies the size, symmetry and root seed used to construct top-level
/// masks, plus the pipeline mode they run in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Grid edge length in cells.
    pub size: usize,
    /// Root seed. Every mask derives its own stream from it.
    pub seed: u64,
    /// Per-category symmetry.
    #[serde(default)]
    pub symmetry: SymmetrySettings,
    /// Run mask operations through the deferred pipeline.
    #[serde(default)]
    pub parallel: bool,
    /// Worker threads used once the pipeline is started.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Water erosion parameters.
    #[serde(default)]
    pub erosion: DropletConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            size: 256,
            seed: 0,
            symmetry: SymmetrySettings::default(),
            parallel: false,
            workers: default_workers(),
            erosion: DropletConfig::default(),
        }
    }
}

/// Droplet water erosion parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropletConfig {
    /// Number of droplets simulated.
    pub num_drops: usize,
    /// Maximum steps a single droplet takes.
    pub max_iterations: usize,
    /// Velocity damping per step (0.0-1.0).
    pub friction: f32,
    /// Acceleration taken from the surface normal.
    pub speed: f32,
    /// Material removed on steep ground.
    pub erosion_rate: f32,
    /// Fraction of carried sediment dropped on flat ground.
    pub deposition_rate: f32,
    /// Maximum random offset between the droplet and its sample point.
    pub max_offset: f32,
    /// Erosion ramp per step; erosion reaches full strength after `1 / iteration_scale` steps.
    pub iteration_scale: f32,
}

impl Default for DropletConfig {
    fn default() -> Self {
        Self {
            num_drops: 10_000,
            max_iterations: 100,
            friction: 0.25,
            speed: 0.1,
            erosion_rate: 0.05,
            deposition_rate: 0.1,
            max_offset: 0.0,
            iteration_scale: 0.01,
        }
    }
}

impl DropletConfig {
    /// Validate droplet parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.friction) {
            return Err(ConfigError::InvalidFriction(self.friction));
        }
        for (name, value) in [
            ("speed", self.speed),
            ("erosion_rate", self.erosion_rate),
            ("deposition_rate", self.deposition_rate),
            ("max_offset", self.max_offset),
            ("iteration_scale", self.iteration_scale),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDropletParameter { name, value });
            }
        }
        Ok(())
    }
}

impl GenerationConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GenerationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::InvalidSize);
        }
        if self.parallel && self.workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        self.erosion.validate()
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Grid size must be non-zero")]
    InvalidSize,
    #[error("Parallel generation needs at least one worker")]
    InvalidWorkers,
    #[error("Friction must be within 0.0-1.0, got {0}")]
    InvalidFriction(f32),
    #[error("Droplet parameter `{name}` must be finite and non-negative, got {value}")]
    InvalidDropletParameter { name: &'static str, value: f32 },
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::schema::Symmetry;

    #[test]
    fn test_default_is_valid() {
        GenerationConfig::default().validate().unwrap();
    }

    #[test]
    fn test_zero_size_rejected() {
        let config = GenerationConfig {
            size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSize)));
    }

    #[test]
    fn test_zero_workers_only_matters_in_parallel_mode() {
        let mut config = GenerationConfig {
            workers: 0,
            parallel: true,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidWorkers)));
        config.parallel = false;
        config.validate().unwrap();
    }

    #[test]
    fn test_droplet_ranges() {
        let mut erosion = DropletConfig {
            friction: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            erosion.validate(),
            Err(ConfigError::InvalidFriction(_))
        ));
        erosion.friction = 0.5;
        erosion.speed = -1.0;
        assert!(matches!(
            erosion.validate(),
            Err(ConfigError::InvalidDropletParameter { name: "speed", .. })
        ));
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let config = GenerationConfig::from_json_str(r#"{"size": 64, "seed": 7}"#).unwrap();
        assert_eq!(config.size, 64);
        assert_eq!(config.seed, 7);
        assert_eq!(config.symmetry, SymmetrySettings::default());
        assert!(!config.parallel);
        assert!(config.workers > 0);
        assert_eq!(config.erosion, DropletConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"size": 128, "seed": 3, "parallel": true, "workers": 2,
                "symmetry": {{"terrain": "QUAD", "team": "Z", "spawn": "POINT2"}}}}"#
        )
        .unwrap();

        let config = GenerationConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.size, 128);
        assert_eq!(config.workers, 2);
        assert_eq!(config.symmetry.terrain, Symmetry::Quad);
        assert_eq!(config.symmetry.team, Symmetry::Z);
    }

    #[test]
    fn test_invalid_json_reports_parse_error() {
        let result = GenerationConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
