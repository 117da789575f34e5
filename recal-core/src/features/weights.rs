//! Dense classifier weight vector with a lazy scale factor
//!
//! L2 regularization multiplies the whole vector by `(1 - η·λ)` on every
//! step; representing that as a scalar multiplier turns an O(D) operation
//! into O(1). The logical value at feature `f` is `weights[f] * scale`.
//! The squared norm is tracked incrementally alongside every mutation.
//! When the scale risks numerical underflow it is folded into the array
//! and reset to 1.

use crate::features::SparseVector;
use crate::{FeatureId, Score};

/// Floor for the lazy scale factor. Scaling requests below this trigger a
/// materialization so the scale never collapses to zero or goes negative.
pub const MIN_SCALING_FACTOR: f32 = 1e-7;

/// Dense weight vector `w` with lazy scaling and cached squared norm.
#[derive(Debug, Clone)]
pub struct WeightVector {
    weights: Vec<f32>,
    scale: f64,
    squared_norm: f64,
}

impl WeightVector {
    /// An all-zero weight vector over `dimensions` features.
    pub fn new(dimensions: usize) -> Self {
        Self {
            weights: vec![0.0; dimensions],
            scale: 1.0,
            squared_norm: 0.0,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.weights.len()
    }

    /// Logical value of feature `f`, 0 for out-of-range features.
    pub fn value_at(&self, f: FeatureId) -> f32 {
        self.weights
            .get(f as usize)
            .map(|w| (*w as f64 * self.scale) as f32)
            .unwrap_or(0.0)
    }

    /// `w · x`, scaled. Features outside the vector's dimensions contribute
    /// nothing.
    pub fn inner_product(&self, x: &SparseVector) -> Score {
        let mut sum = 0.0f64;
        for (f, v) in x.iter() {
            if let Some(w) = self.weights.get(f as usize) {
                sum += *w as f64 * v as f64;
            }
        }
        (sum * self.scale) as Score
    }

    /// `w · (a - b)` via one lockstep walk over the two sorted feature
    /// lists. Equivalent to `inner_product(a) - inner_product(b)` up to
    /// floating error, without materializing `a - b`.
    pub fn inner_product_on_difference(&self, a: &SparseVector, b: &SparseVector) -> Score {
        let mut sum = 0.0f64;
        let (mut i, mut j) = (0, 0);
        while i < a.num_features() || j < b.num_features() {
            let a_feature = (i < a.num_features()).then(|| a.feature_at(i));
            let b_feature = (j < b.num_features()).then(|| b.feature_at(j));
            let (f, v) = match (a_feature, b_feature) {
                (Some(fa), Some(fb)) if fa == fb => {
                    let v = a.value_at(i) - b.value_at(j);
                    i += 1;
                    j += 1;
                    (fa, v)
                }
                (Some(fa), Some(fb)) if fa < fb => {
                    let v = a.value_at(i);
                    i += 1;
                    (fa, v)
                }
                (Some(_) | None, Some(fb)) => {
                    let v = -b.value_at(j);
                    j += 1;
                    (fb, v)
                }
                (Some(fa), None) => {
                    let v = a.value_at(i);
                    i += 1;
                    (fa, v)
                }
                (None, None) => unreachable!(),
            };
            if let Some(w) = self.weights.get(f as usize) {
                sum += *w as f64 * v as f64;
            }
        }
        (sum * self.scale) as Score
    }

    /// `w += c·x`, maintaining the squared norm incrementally:
    /// `‖w + c·x‖² = ‖w‖² + c²‖x‖² + 2c(w·x)`.
    pub fn add_vector(&mut self, x: &SparseVector, c: f32) {
        let mut inner_product = 0.0f64;
        for (f, v) in x.iter() {
            let scaled_value = v as f64 * c as f64;
            if let Some(w) = self.weights.get_mut(f as usize) {
                inner_product += *w as f64 * scaled_value;
                *w += (scaled_value / self.scale) as f32;
            }
        }
        self.squared_norm +=
            x.squared_norm() as f64 * c as f64 * c as f64 + 2.0 * self.scale * inner_product;
    }

    /// Multiply the logical vector by `c` in O(1) by scaling the lazy
    /// factor. If the factor would fall below [`MIN_SCALING_FACTOR`] the
    /// array is materialized first and the scale reset to 1.
    pub fn scale_by(&mut self, c: f32) {
        let c = c as f64;
        self.squared_norm *= c * c;
        if (self.scale * c).abs() < MIN_SCALING_FACTOR as f64 {
            self.scale_to_one();
        }
        if c == 0.0 {
            self.weights.fill(0.0);
            self.scale = 1.0;
        } else {
            self.scale *= c;
        }
    }

    /// Cached `‖w‖²`.
    pub fn squared_norm(&self) -> Score {
        self.squared_norm as Score
    }

    /// Fold the lazy scale into the array.
    fn scale_to_one(&mut self) {
        for w in &mut self.weights {
            *w = (*w as f64 * self.scale) as f32;
        }
        self.scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact_squared_norm(w: &WeightVector) -> f64 {
        (0..w.dimensions())
            .map(|f| w.value_at(f as FeatureId) as f64)
            .map(|v| v * v)
            .sum()
    }

    #[test]
    fn test_add_vector_tracks_norm() {
        let mut w = WeightVector::new(8);
        let x = SparseVector::parse("1 0:1 3:2 7:-0.5").unwrap();
        w.add_vector(&x, 0.5);
        w.add_vector(&x, -1.5);
        assert!((w.squared_norm() as f64 - exact_squared_norm(&w)).abs() < 1e-5);
    }

    #[test]
    fn test_scale_by_is_lazy() {
        let mut w = WeightVector::new(4);
        let x = SparseVector::parse("1 0:1 2:3").unwrap();
        w.add_vector(&x, 1.0);
        w.scale_by(0.5);
        assert!((w.value_at(0) - 0.5).abs() < 1e-6);
        assert!((w.value_at(2) - 1.5).abs() < 1e-6);
        assert!((w.squared_norm() as f64 - exact_squared_norm(&w)).abs() < 1e-5);
    }

    #[test]
    fn test_scale_underflow_materializes() {
        let mut w = WeightVector::new(2);
        let x = SparseVector::parse("1 0:1 1:1").unwrap();
        w.add_vector(&x, 1.0);
        for _ in 0..80 {
            w.scale_by(0.5);
        }
        // The logical value survives the repeated materializations even
        // though the naive product of scales would have underflowed f32.
        let expected = 0.5f64.powi(80);
        let got = w.value_at(0) as f64;
        assert!(got > 0.0);
        assert!((got - expected).abs() / expected < 1e-3);
    }

    #[test]
    fn test_scale_by_zero_clears() {
        let mut w = WeightVector::new(2);
        let x = SparseVector::parse("1 0:1 1:2").unwrap();
        w.add_vector(&x, 1.0);
        w.scale_by(0.0);
        assert_eq!(w.value_at(0), 0.0);
        assert_eq!(w.value_at(1), 0.0);
        assert_eq!(w.squared_norm(), 0.0);
    }

    #[test]
    fn test_inner_product_on_difference_matches() {
        let mut w = WeightVector::new(16);
        let basis = SparseVector::parse("1 0:0.3 2:-1 5:2 9:0.7 15:-0.2").unwrap();
        w.add_vector(&basis, 1.0);
        w.scale_by(0.9);

        let a = SparseVector::parse("1 0:1 5:2 9:1").unwrap();
        let b = SparseVector::parse("-1 2:3 5:1 15:4").unwrap();
        let direct = w.inner_product_on_difference(&a, &b);
        let expected = w.inner_product(&a) - w.inner_product(&b);
        assert!((direct - expected).abs() <= 1e-5 * expected.abs().max(1.0));
    }

    #[test]
    fn test_inner_product_ignores_out_of_range() {
        let mut w = WeightVector::new(2);
        let x = SparseVector::parse("1 0:1 1:1").unwrap();
        w.add_vector(&x, 2.0);
        let probe = SparseVector::parse("1 0:1 10:5").unwrap();
        assert!((w.inner_product(&probe) - 2.0).abs() < 1e-6);
    }
}
