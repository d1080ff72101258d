//! Arithmetic family: scalar, mask, area-restricted and offset variants,
//! plus aggregates.

use std::convert::Infallible;

use super::core::Mask;
use super::grid::Grid;
use super::value::{Arithmetic, MaskValue};
use super::{BooleanMask, MaskError};

macro_rules! arithmetic_ops {
    ($checked:ident, $scalar:ident, $mask:ident, $within:ident, $mask_within:ident) => {
        pub fn $scalar(&mut self, value: T) -> Result<&mut Self, MaskError> {
            let operation = stringify!($scalar);
            let name = self.name().to_string();
            self.try_enqueue(operation, move |grid| {
                grid.try_map_in_place(|_, _, v| checked(v.$checked(value), &name, operation))
            })
        }

        pub fn $mask(&mut self, other: &Mask<T>) -> Result<&mut Self, MaskError> {
            let operation = stringify!($mask);
            let name = self.name().to_string();
            self.try_enqueue_with(operation, other, move |grid, other| {
                grid.try_map_in_place(|x, y, v| {
                    checked(v.$checked(other.get(x, y)), &name, operation)
                })
            })
        }

        /// Scalar variant restricted to the cells selected by `area`.
        pub fn $within(&mut self, area: &BooleanMask, value: T) -> Result<&mut Self, MaskError> {
            let operation = stringify!($within);
            let name = self.name().to_string();
            self.try_enqueue_with(operation, area, move |grid, area| {
                grid.try_map_in_place(|x, y, v| {
                    if area.get(x, y) {
                        checked(v.$checked(value), &name, operation)
                    } else {
                        Ok(v)
                    }
                })
            })
        }

        /// Mask variant restricted to the cells selected by `area`.
        pub fn $mask_within(
            &mut self,
            area: &BooleanMask,
            other: &Mask<T>,
        ) -> Result<&mut Self, MaskError> {
            let operation = stringify!($mask_within);
            let name = self.name().to_string();
            self.try_enqueue_with2(operation, area, other, move |grid, area, other| {
                grid.try_map_in_place(|x, y, v| {
                    if area.get(x, y) {
                        checked(v.$checked(other.get(x, y)), &name, operation)
                    } else {
                        Ok(v)
                    }
                })
            })
        }
    };
}

/// Turn an unrepresentable result into an error.
fn checked<T>(result: Option<T>, mask: &str, operation: &'static str) -> Result<T, MaskError> {
    result.ok_or_else(|| MaskError::OutOfRange {
        mask: mask.to_string(),
        operation,
    })
}

impl<T: Arithmetic> Mask<T> {
    arithmetic_ops!(checked_add, add_scalar, add_mask, add_within, add_mask_within);
    arithmetic_ops!(checked_sub, subtract_scalar, subtract_mask, subtract_within, subtract_mask_within);
    arithmetic_ops!(checked_mul, multiply_scalar, multiply_mask, multiply_within, multiply_mask_within);
    arithmetic_ops!(checked_div, divide_scalar, divide_mask, divide_within, divide_mask_within);

    /// Add `other` with its origin placed at `(x_offset, y_offset)`.
    ///
    /// With `center` the offset addresses the center of `other` instead of
    /// its corner. Cells that land off the grid are dropped unless
    /// `wrap_edges` is set, in which case they wrap around.
    pub fn add_with_offset(
        &mut self,
        other: &Mask<T>,
        x_offset: i64,
        y_offset: i64,
        center: bool,
        wrap_edges: bool,
    ) -> Result<&mut Self, MaskError> {
        let name = self.name().to_string();
        self.try_enqueue_reading("add_with_offset", other, move |grid, other| {
            try_stamp(grid, other, x_offset, y_offset, center, wrap_edges, |a, b| {
                checked(a.checked_add(b), &name, "add_with_offset")
            })
        })
    }

    pub fn subtract_with_offset(
        &mut self,
        other: &Mask<T>,
        x_offset: i64,
        y_offset: i64,
        center: bool,
        wrap_edges: bool,
    ) -> Result<&mut Self, MaskError> {
        let name = self.name().to_string();
        self.try_enqueue_reading("subtract_with_offset", other, move |grid, other| {
            try_stamp(grid, other, x_offset, y_offset, center, wrap_edges, |a, b| {
                checked(a.checked_sub(b), &name, "subtract_with_offset")
            })
        })
    }
}

/// Combine `source` into `target` at an offset.
pub(crate) fn stamp<T: MaskValue>(
    target: &mut Grid<T>,
    source: &Grid<T>,
    x_offset: i64,
    y_offset: i64,
    center: bool,
    wrap_edges: bool,
    combine: impl Fn(T, T) -> T,
) {
    let Ok(()) = try_stamp(target, source, x_offset, y_offset, center, wrap_edges, |a, b| {
        Ok::<T, Infallible>(combine(a, b))
    });
}

/// Fallible [`stamp`]. Every touched cell is restored when `combine` fails.
pub(crate) fn try_stamp<T: MaskValue, E>(
    target: &mut Grid<T>,
    source: &Grid<T>,
    x_offset: i64,
    y_offset: i64,
    center: bool,
    wrap_edges: bool,
    combine: impl Fn(T, T) -> Result<T, E>,
) -> Result<(), E> {
    let size = target.size() as i64;
    if size == 0 {
        return Ok(());
    }
    let shift = if center { source.size() as i64 / 2 } else { 0 };
    let mut touched = Vec::new();
    for sy in 0..source.size() {
        for sx in 0..source.size() {
            let mut tx = sx as i64 + x_offset - shift;
            let mut ty = sy as i64 + y_offset - shift;
            if wrap_edges {
                tx = tx.rem_euclid(size);
                ty = ty.rem_euclid(size);
            } else if !target.in_bounds(tx, ty) {
                continue;
            }
            let (tx, ty) = (tx as usize, ty as usize);
            let before = target.get(tx, ty);
            match combine(before, source.get(sx, sy)) {
                Ok(value) => {
                    touched.push((tx, ty, before));
                    target.set(tx, ty, value);
                }
                Err(err) => {
                    for (x, y, value) in touched.into_iter().rev() {
                        target.set(x, y, value);
                    }
                    return Err(err);
                }
            }
        }
    }
    Ok(())
}

impl<T: MaskValue> Mask<T> {
    fn aggregate<R>(&self, f: impl FnOnce(&Grid<T>) -> R) -> Result<R, MaskError> {
        self.read(|grid| {
            if grid.size() == 0 {
                Err(MaskError::EmptyMask)
            } else {
                Ok(f(grid))
            }
        })?
    }

    /// Sum of every cell in the accumulator type.
    pub fn sum(&self) -> Result<T::Sum, MaskError> {
        self.aggregate(|grid| {
            grid.values()
                .iter()
                .fold(T::Sum::default(), |acc, &v| acc + v.to_sum())
        })
    }

    pub fn average(&self) -> Result<T, MaskError> {
        let count = self.size() * self.size();
        let sum = self.sum()?;
        Ok(T::from_average(sum, count))
    }
}
