//! Exact Euclidean distance transform.
//!
//! Squared distances come from the lower envelope of parabolas rooted at
//! every source cell, computed along rows and then along columns. Runs in
//! linear time per line.

use super::grid::Grid;
use super::{BooleanMask, FloatMask, MaskError};

/// Stand-in for an infinite squared distance. Finite so that the envelope
/// intersections stay well defined.
const FAR: f64 = 1e20;

/// One-dimensional squared distance transform of `f` into `d`.
fn transform_line(f: &[f64], d: &mut [f64], v: &mut [usize], z: &mut [f64]) {
    let n = f.len();
    if n == 0 {
        return;
    }
    let mut k = 0;
    v[0] = 0;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;

    let intersection = |q: usize, p: usize| {
        let (qf, pf) = (q as f64, p as f64);
        ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * (qf - pf))
    };

    for q in 1..n {
        let mut s = intersection(q, v[k]);
        // z[0] is -inf, so this never pops past the first parabola.
        while s <= z[k] {
            k -= 1;
            s = intersection(q, v[k]);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;
    for (q, out) in d.iter_mut().enumerate() {
        let qf = q as f64;
        while z[k + 1] < qf {
            k += 1;
        }
        let p = v[k] as f64;
        *out = (qf - p) * (qf - p) + f[v[k]];
    }
}

impl Grid<bool> {
    /// Distance from every cell to the nearest true cell.
    ///
    /// True cells are 0. Without any true cell every distance is infinite.
    pub fn distance_field(&self) -> Grid<f32> {
        let size = self.size();
        if self.values().iter().all(|&v| !v) {
            return Grid::filled(size, f32::INFINITY, self.symmetry_settings());
        }

        let mut squared: Vec<f64> = self
            .values()
            .iter()
            .map(|&v| if v { 0.0 } else { FAR })
            .collect();

        let mut f = vec![0.0; size];
        let mut d = vec![0.0; size];
        let mut v = vec![0usize; size];
        let mut z = vec![0.0; size + 1];

        for y in 0..size {
            f.copy_from_slice(&squared[y * size..(y + 1) * size]);
            transform_line(&f, &mut d, &mut v, &mut z);
            squared[y * size..(y + 1) * size].copy_from_slice(&d);
        }
        for x in 0..size {
            for y in 0..size {
                f[y] = squared[y * size + x];
            }
            transform_line(&f, &mut d, &mut v, &mut z);
            for y in 0..size {
                squared[y * size + x] = d[y];
            }
        }

        Grid::from_fn(size, self.symmetry_settings(), |x, y| {
            squared[y * size + x].sqrt() as f32
        })
    }
}

impl BooleanMask {
    /// Float mask of distances to the nearest true cell.
    pub fn distance_field(&self) -> FloatMask {
        FloatMask::derived(
            self,
            "distance_field",
            format!("{}-distance", self.name()),
            |grid| grid.distance_field(),
        )
    }
}

impl FloatMask {
    /// Add `scale` times the distance to the nearest true cell of `sources`.
    pub fn add_distance(&mut self, sources: &BooleanMask, scale: f32) -> Result<&mut Self, MaskError> {
        self.enqueue_with("add_distance", sources, move |grid, sources| {
            let distances = sources.distance_field();
            grid.zip_in_place(&distances, |v, distance| v + distance * scale);
        })
    }
}
