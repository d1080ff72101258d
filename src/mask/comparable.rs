use super::core::Mask;
use super::value::Comparable;
use super::MaskError;

fn lesser<T: PartialOrd>(a: T, b: T) -> T {
    if b < a { b } else { a }
}

fn greater<T: PartialOrd>(a: T, b: T) -> T {
    if b > a { b } else { a }
}

impl<T: Comparable> Mask<T> {
    /// Raise every cell to at least `floor`.
    pub fn clamp_min(&mut self, floor: T) -> &mut Self {
        self.enqueue("clamp_min", move |grid| {
            grid.map_in_place(|_, _, v| greater(v, floor))
        })
    }

    /// Lower every cell to at most `ceiling`.
    pub fn clamp_max(&mut self, ceiling: T) -> &mut Self {
        self.enqueue("clamp_max", move |grid| {
            grid.map_in_place(|_, _, v| lesser(v, ceiling))
        })
    }

    pub fn clamp(&mut self, floor: T, ceiling: T) -> &mut Self {
        self.enqueue("clamp", move |grid| {
            grid.map_in_place(|_, _, v| lesser(greater(v, floor), ceiling))
        })
    }

    /// Reset cells below `limit` to the default value.
    pub fn threshold(&mut self, limit: T) -> &mut Self {
        self.enqueue("threshold", move |grid| {
            grid.map_in_place(|_, _, v| if v < limit { T::default() } else { v })
        })
    }

    /// Cell-wise minimum with another mask.
    pub fn min_mask(&mut self, other: &Mask<T>) -> Result<&mut Self, MaskError> {
        self.enqueue_with("min_mask", other, |grid, other| {
            grid.zip_in_place(other, lesser)
        })
    }

    /// Cell-wise maximum with another mask.
    pub fn max_mask(&mut self, other: &Mask<T>) -> Result<&mut Self, MaskError> {
        self.enqueue_with("max_mask", other, |grid, other| {
            grid.zip_in_place(other, greater)
        })
    }

    /// Smallest cell value.
    pub fn min(&self) -> Result<T, MaskError> {
        self.read(|grid| grid.values().iter().copied().reduce(lesser))?
            .ok_or(MaskError::EmptyMask)
    }

    /// Largest cell value.
    pub fn max(&self) -> Result<T, MaskError> {
        self.read(|grid| grid.values().iter().copied().reduce(greater))?
            .ok_or(MaskError::EmptyMask)
    }
}
