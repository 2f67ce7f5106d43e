//! Sparse feature vectors.

use serde::{Deserialize, Serialize};

/// A sparse vector with strictly increasing indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    dimension: usize,
    indices: Vec<u32>,
    values: Vec<f64>,
}

impl SparseVector {
    /// An all-zero vector of the given width.
    pub fn zeros(dimension: usize) -> Self {
        SparseVector {
            dimension,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from `(index, value)` pairs in any order.
    ///
    /// Duplicate indices are summed and explicit zeros are dropped. Indices
    /// outside `dimension` are ignored.
    pub fn from_pairs(dimension: usize, mut pairs: Vec<(u32, f64)>) -> Self {
        pairs.sort_by_key(|(index, _)| *index);

        let mut indices: Vec<u32> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f64> = Vec::with_capacity(pairs.len());
        for (index, value) in pairs {
            if index as usize >= dimension {
                continue;
            }
            match indices.last() {
                Some(&last) if last == index => {
                    if let Some(v) = values.last_mut() {
                        *v += value;
                    }
                }
                _ => {
                    indices.push(index);
                    values.push(value);
                }
            }
        }

        let (indices, values) = indices
            .into_iter()
            .zip(values)
            .filter(|(_, v)| *v != 0.0)
            .unzip();

        SparseVector {
            dimension,
            indices,
            values,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_zero(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices
            .iter()
            .zip(&self.values)
            .map(|(&i, &v)| (i as usize, v))
    }

    /// Value at `index` (zero when absent).
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&(index as u32)) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Dot product with a dense weight slice.
    pub fn dot(&self, dense: &[f64]) -> f64 {
        self.iter()
            .map(|(i, v)| dense.get(i).copied().unwrap_or(0.0) * v)
            .sum()
    }

    /// `dense += scale * self`
    pub fn add_scaled_to(&self, dense: &mut [f64], scale: f64) {
        for (i, v) in self.iter() {
            if let Some(slot) = dense.get_mut(i) {
                *slot += scale * v;
            }
        }
    }

    pub fn squared_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }

    /// Scale to unit L2 norm; the zero vector is left unchanged.
    pub fn normalize_l2(&mut self) {
        let norm = self.squared_norm().sqrt();
        if norm > 0.0 {
            for v in &mut self.values {
                *v /= norm;
            }
        }
    }

    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dimension];
        for (i, v) in self.iter() {
            dense[i] = v;
        }
        dense
    }
}
