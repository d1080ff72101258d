//! Symmetry value types shared by every mask.

use serde::{Deserialize, Serialize};

/// Geometric equivalence rule applied to a mask.
///
/// `Point*` variants rotate about the grid center, `X`/`Z` mirror across the
/// vertical/horizontal midline, `Xz`/`Zx` mirror across a diagonal, and
/// `Quad`/`Diag` compose two axis (or two diagonal) reflections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Symmetry {
    #[default]
    None,
    X,
    Z,
    Xz,
    Zx,
    Quad,
    Diag,
    Point2,
    Point3,
    Point4,
    Point5,
    Point6,
    Point7,
    Point8,
    Point9,
    Point10,
    Point11,
    Point12,
    Point13,
    Point14,
    Point15,
    Point16,
}

impl Symmetry {
    /// Every symmetry, in declaration order.
    pub const ALL: [Symmetry; 22] = [
        Symmetry::None,
        Symmetry::X,
        Symmetry::Z,
        Symmetry::Xz,
        Symmetry::Zx,
        Symmetry::Quad,
        Symmetry::Diag,
        Symmetry::Point2,
        Symmetry::Point3,
        Symmetry::Point4,
        Symmetry::Point5,
        Symmetry::Point6,
        Symmetry::Point7,
        Symmetry::Point8,
        Symmetry::Point9,
        Symmetry::Point10,
        Symmetry::Point11,
        Symmetry::Point12,
        Symmetry::Point13,
        Symmetry::Point14,
        Symmetry::Point15,
        Symmetry::Point16,
    ];

    /// Rotational symmetry with `count` points, if `count` is in `2..=16`.
    pub fn point(count: usize) -> Option<Symmetry> {
        match count {
            2 => Some(Symmetry::Point2),
            3 => Some(Symmetry::Point3),
            4 => Some(Symmetry::Point4),
            5 => Some(Symmetry::Point5),
            6 => Some(Symmetry::Point6),
            7 => Some(Symmetry::Point7),
            8 => Some(Symmetry::Point8),
            9 => Some(Symmetry::Point9),
            10 => Some(Symmetry::Point10),
            11 => Some(Symmetry::Point11),
            12 => Some(Symmetry::Point12),
            13 => Some(Symmetry::Point13),
            14 => Some(Symmetry::Point14),
            15 => Some(Symmetry::Point15),
            16 => Some(Symmetry::Point16),
            _ => None,
        }
    }

    /// Number of cells in one symmetry orbit (the cell itself included).
    pub fn num_sym_points(self) -> usize {
        match self {
            Symmetry::None => 1,
            Symmetry::X | Symmetry::Z | Symmetry::Xz | Symmetry::Zx => 2,
            Symmetry::Quad | Symmetry::Diag => 4,
            Symmetry::Point2 => 2,
            Symmetry::Point3 => 3,
            Symmetry::Point4 => 4,
            Symmetry::Point5 => 5,
            Symmetry::Point6 => 6,
            Symmetry::Point7 => 7,
            Symmetry::Point8 => 8,
            Symmetry::Point9 => 9,
            Symmetry::Point10 => 10,
            Symmetry::Point11 => 11,
            Symmetry::Point12 => 12,
            Symmetry::Point13 => 13,
            Symmetry::Point14 => 14,
            Symmetry::Point15 => 15,
            Symmetry::Point16 => 16,
        }
    }

    /// Whether this is one of the `Point*` rotational symmetries.
    pub fn is_rotational(self) -> bool {
        matches!(
            self,
            Symmetry::Point2
                | Symmetry::Point3
                | Symmetry::Point4
                | Symmetry::Point5
                | Symmetry::Point6
                | Symmetry::Point7
                | Symmetry::Point8
                | Symmetry::Point9
                | Symmetry::Point10
                | Symmetry::Point11
                | Symmetry::Point12
                | Symmetry::Point13
                | Symmetry::Point14
                | Symmetry::Point15
                | Symmetry::Point16
        )
    }

    /// Perfect symmetries tile the grid exactly with their canonical region.
    ///
    /// Quarter turns map cell centres onto cell centres. Every other rotation
    /// with three or more points samples rotated positions on the integer
    /// grid, which leaves residual cells behind.
    pub fn is_perfect(self) -> bool {
        !self.is_rotational() || matches!(self, Symmetry::Point2 | Symmetry::Point4)
    }
}

/// Category a symmetry applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SymmetryType {
    Terrain,
    Team,
    Spawn,
}

/// Per-category symmetry configuration of a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SymmetrySettings {
    pub terrain: Symmetry,
    pub team: Symmetry,
    pub spawn: Symmetry,
}

impl SymmetrySettings {
    pub fn new(terrain: Symmetry, team: Symmetry, spawn: Symmetry) -> Self {
        Self {
            terrain,
            team,
            spawn,
        }
    }

    /// Same symmetry for all three categories.
    pub fn uniform(symmetry: Symmetry) -> Self {
        Self::new(symmetry, symmetry, symmetry)
    }

    /// Symmetry configured for a category.
    pub fn symmetry(&self, symmetry_type: SymmetryType) -> Symmetry {
        match symmetry_type {
            SymmetryType::Terrain => self.terrain,
            SymmetryType::Team => self.team,
            SymmetryType::Spawn => self.spawn,
        }
    }
}
