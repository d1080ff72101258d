//! Cell value capabilities.
//!
//! A mask is generic over its cell type. The traits here decide which
//! operation families apply: every [`MaskValue`] supports symmetry, resizing
//! and area averaging, [`Arithmetic`] values add the arithmetic family,
//! [`Comparable`] values add min/max/clamp, and [`NumberValue`] covers the
//! scalar numeric masks.

use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Sub};

use glam::{DVec2, DVec3, DVec4, Vec2, Vec3, Vec4};
use sha2::{Digest, Sha256};

/// Value stored in a mask cell.
pub trait MaskValue: Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    /// Accumulator used by summed-area tables and aggregates.
    type Sum: Copy + Default + PartialEq + Debug + Add<Output = Self::Sum> + Sub<Output = Self::Sum> + Send + Sync;

    fn to_sum(self) -> Self::Sum;

    /// Value representing `count` cells whose values add up to `sum`.
    fn from_average(sum: Self::Sum, count: usize) -> Self;

    /// Feed the canonical byte representation into a digest.
    fn digest(&self, hasher: &mut Sha256);
}

/// Values supporting the arithmetic operation family.
///
/// The checked operations return `None` when the result is not
/// representable. Floating point values never fail; integers fail on
/// overflow and on division by zero.
pub trait Arithmetic:
    MaskValue
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    fn checked_add(self, rhs: Self) -> Option<Self> {
        Some(self + rhs)
    }

    fn checked_sub(self, rhs: Self) -> Option<Self> {
        Some(self - rhs)
    }

    fn checked_mul(self, rhs: Self) -> Option<Self> {
        Some(self * rhs)
    }

    fn checked_div(self, rhs: Self) -> Option<Self> {
        Some(self / rhs)
    }
}

/// Totally ordered (apart from NaN) scalar values.
pub trait Comparable: MaskValue + PartialOrd {}

/// Scalar numeric values.
pub trait NumberValue: Arithmetic + Comparable {
    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
}

impl MaskValue for bool {
    type Sum = i64;

    fn to_sum(self) -> i64 {
        i64::from(self)
    }

    fn from_average(sum: i64, count: usize) -> bool {
        sum as f64 / count as f64 >= 0.5
    }

    fn digest(&self, hasher: &mut Sha256) {
        hasher.update([u8::from(*self)]);
    }
}

impl MaskValue for f32 {
    type Sum = f64;

    fn to_sum(self) -> f64 {
        f64::from(self)
    }

    fn from_average(sum: f64, count: usize) -> f32 {
        (sum / count as f64) as f32
    }

    fn digest(&self, hasher: &mut Sha256) {
        hasher.update(self.to_le_bytes());
    }
}

impl MaskValue for i32 {
    type Sum = i64;

    fn to_sum(self) -> i64 {
        i64::from(self)
    }

    fn from_average(sum: i64, count: usize) -> i32 {
        (sum as f64 / count as f64).round() as i32
    }

    fn digest(&self, hasher: &mut Sha256) {
        hasher.update(self.to_le_bytes());
    }
}

macro_rules! vector_value {
    ($vec:ty, $dvec:ty) => {
        impl MaskValue for $vec {
            type Sum = $dvec;

            fn to_sum(self) -> $dvec {
                self.as_dvec()
            }

            fn from_average(sum: $dvec, count: usize) -> $vec {
                (sum / count as f64).as_vec()
            }

            fn digest(&self, hasher: &mut Sha256) {
                for component in self.to_array() {
                    hasher.update(component.to_le_bytes());
                }
            }
        }

        impl Arithmetic for $vec {}
    };
}

// glam names the f64 conversions per dimension; alias them so the macro
// can stay dimension agnostic.
trait AsDouble<D> {
    fn as_dvec(self) -> D;
}

trait AsSingle<S> {
    fn as_vec(self) -> S;
}

impl AsDouble<DVec2> for Vec2 {
    fn as_dvec(self) -> DVec2 {
        self.as_dvec2()
    }
}

impl AsDouble<DVec3> for Vec3 {
    fn as_dvec(self) -> DVec3 {
        self.as_dvec3()
    }
}

impl AsDouble<DVec4> for Vec4 {
    fn as_dvec(self) -> DVec4 {
        self.as_dvec4()
    }
}

impl AsSingle<Vec2> for DVec2 {
    fn as_vec(self) -> Vec2 {
        self.as_vec2()
    }
}

impl AsSingle<Vec3> for DVec3 {
    fn as_vec(self) -> Vec3 {
        self.as_vec3()
    }
}

impl AsSingle<Vec4> for DVec4 {
    fn as_vec(self) -> Vec4 {
        self.as_vec4()
    }
}

vector_value!(Vec2, DVec2);
vector_value!(Vec3, DVec3);
vector_value!(Vec4, DVec4);

impl Arithmetic for f32 {}

impl Arithmetic for i32 {
    fn checked_add(self, rhs: i32) -> Option<i32> {
        i32::checked_add(self, rhs)
    }

    fn checked_sub(self, rhs: i32) -> Option<i32> {
        i32::checked_sub(self, rhs)
    }

    fn checked_mul(self, rhs: i32) -> Option<i32> {
        i32::checked_mul(self, rhs)
    }

    fn checked_div(self, rhs: i32) -> Option<i32> {
        i32::checked_div(self, rhs)
    }
}

impl Comparable for f32 {}
impl Comparable for i32 {}

impl NumberValue for f32 {
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn from_f64(value: f64) -> f32 {
        value as f32
    }
}

impl NumberValue for i32 {
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn from_f64(value: f64) -> i32 {
        value.round() as i32
    }
}
