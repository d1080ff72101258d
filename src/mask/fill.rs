//! Fill family. Cells outside the grid are skipped silently.

use super::core::Mask;
use super::value::MaskValue;
use super::{BooleanMask, MaskError};

impl<T: MaskValue> Mask<T> {
    pub fn fill(&mut self, value: T) -> &mut Self {
        self.enqueue("fill", move |grid| grid.fill(value))
    }

    pub fn fill_rect(&mut self, x: i64, y: i64, width: usize, height: usize, value: T) -> &mut Self {
        self.enqueue("fill_rect", move |grid| grid.fill_rect(x, y, width, height, value))
    }

    pub fn fill_circle(&mut self, x: f32, y: f32, radius: f32, value: T) -> &mut Self {
        self.enqueue("fill_circle", move |grid| grid.fill_circle(x, y, radius, value))
    }

    /// Fill a border of `width` cells.
    pub fn fill_edge(&mut self, width: usize, value: T) -> &mut Self {
        self.enqueue("fill_edge", move |grid| grid.fill_edge(width, value))
    }

    pub fn fill_coordinates(&mut self, coordinates: Vec<(usize, usize)>, value: T) -> &mut Self {
        self.enqueue("fill_coordinates", move |grid| {
            grid.fill_coordinates(&coordinates, value)
        })
    }

    /// Fill every cell from a function of its coordinate.
    pub fn fill_with(
        &mut self,
        f: impl Fn(usize, usize) -> T + Send + 'static,
    ) -> &mut Self {
        self.enqueue("fill_with", move |grid| grid.map_in_place(|x, y, _| f(x, y)))
    }

    /// Set every cell selected by `area` to `value`.
    pub fn set_to_value(&mut self, area: &BooleanMask, value: T) -> Result<&mut Self, MaskError> {
        self.enqueue_with("set_to_value", area, move |grid, area| {
            grid.zip_in_place(area, |v, selected| if selected { value } else { v })
        })
    }

    /// Copy `other` into every cell selected by `area`.
    pub fn set_to_mask(&mut self, area: &BooleanMask, other: &Mask<T>) -> Result<&mut Self, MaskError> {
        self.enqueue_with2("set_to_mask", area, other, |grid, area, other| {
            grid.map_in_place(|x, y, v| if area.get(x, y) { other.get(x, y) } else { v })
        })
    }
}
