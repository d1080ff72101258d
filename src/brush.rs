//! Brush stamps.
//!
//! Brushes are float masks stamped onto terrain. Loading them from assets is
//! left to the caller through [`BrushLoader`]; [`RadialBrushes`] generates a
//! small set of procedural shapes.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::mask::FloatMask;
use crate::schema::{Symmetry, SymmetrySettings};

/// Brush loading errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BrushError {
    #[error("Unknown brush: {0}")]
    Unknown(String),
    #[error("Brush size must be greater than zero")]
    InvalidSize,
}

/// Source of named brush stamps.
pub trait BrushLoader: Send + Sync {
    /// Load brush `name` resampled to `size`.
    fn load_brush(&self, name: &str, size: usize, seed: u64) -> Result<FloatMask, BrushError>;
}

/// Procedural radial brushes.
///
/// Known names: `"cone"` (linear falloff), `"dome"` (smooth falloff),
/// `"plateau"` (flat top with a steep rim) and `"crater"` (raised rim with a
/// sunken center). Every brush peaks at 1.0.
#[derive(Debug, Default, Clone, Copy)]
pub struct RadialBrushes;

impl RadialBrushes {
    pub const NAMES: [&'static str; 4] = ["cone", "dome", "plateau", "crater"];

    fn profile(name: &str) -> Option<fn(f32) -> f32> {
        let profile: fn(f32) -> f32 = match name {
            "cone" => |d| 1.0 - d,
            "dome" => |d| {
                let t = 1.0 - d * d;
                t * t
            },
            "plateau" => |d| if d < 0.6 { 1.0 } else { (1.0 - d) / 0.4 },
            "crater" => |d| {
                let rim = 1.0 - ((d - 0.7).abs() / 0.3).min(1.0);
                if d < 0.7 { 0.4 + 0.6 * rim } else { rim }
            },
            _ => return None,
        };
        Some(profile)
    }
}

impl BrushLoader for RadialBrushes {
    fn load_brush(&self, name: &str, size: usize, seed: u64) -> Result<FloatMask, BrushError> {
        if size == 0 {
            return Err(BrushError::InvalidSize);
        }
        let profile = Self::profile(name).ok_or_else(|| BrushError::Unknown(name.to_string()))?;

        // Slight per-seed roughness so repeated stamps do not look identical.
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let roughness: f32 = rng.gen_range(0.0..0.05);

        let half = size as f32 / 2.0;
        let mut brush = FloatMask::new(
            size,
            Some(seed),
            SymmetrySettings::uniform(Symmetry::None),
            format!("brush:{name}"),
        );
        brush.fill_with(move |x, y| {
            let dx = (x as f32 + 0.5 - half) / half;
            let dy = (y as f32 + 0.5 - half) / half;
            let d = (dx * dx + dy * dy).sqrt();
            if d >= 1.0 {
                0.0
            } else {
                (profile(d) * (1.0 - roughness * d)).clamp(0.0, 1.0)
            }
        });
        Ok(brush)
    }
}
