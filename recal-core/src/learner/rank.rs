//! Pairwise (rank) stochastic step functions
//!
//! Each step takes a pair `(a, b)`, derives the pairwise label
//! `y = sign(y_a - y_b)`, and applies the analogous single-example update
//! to `w` via ±η-weighted additions of `a` and `b`. Inner products against
//! the pair go through `inner_product_on_difference` so `a - b` is never
//! materialized (except for ROMMA, which needs the difference's norm cache).

// Ported from sofia-ml (Apache-2.0), Copyright 2009 Google Inc.

use crate::features::{SparseVector, WeightVector};
use crate::learner::kernels::{
    l2_regularize, pegasos_projection, single_romma_step,
};

fn rank_label(y_a: f32, y_b: f32) -> f32 {
    if y_a > y_b {
        1.0
    } else if y_a < y_b {
        -1.0
    } else {
        0.0
    }
}

/// `‖a - b‖²` by a lockstep walk over the two sorted feature lists.
fn difference_squared_norm(a: &SparseVector, b: &SparseVector) -> f32 {
    let mut squared_norm = 0.0f32;
    let (mut i, mut j) = (0, 0);
    while i < a.num_features() || j < b.num_features() {
        let a_feature = (i < a.num_features()).then(|| a.feature_at(i));
        let b_feature = (j < b.num_features()).then(|| b.feature_at(j));
        match (a_feature, b_feature) {
            (Some(fa), Some(fb)) if fa == fb => {
                let d = a.value_at(i) - b.value_at(j);
                squared_norm += d * d;
                i += 1;
                j += 1;
            }
            (Some(fa), Some(fb)) if fa < fb => {
                squared_norm += a.value_at(i) * a.value_at(i);
                i += 1;
            }
            (Some(_) | None, Some(_)) => {
                squared_norm += b.value_at(j) * b.value_at(j);
                j += 1;
            }
            (Some(_), None) => {
                squared_norm += a.value_at(i) * a.value_at(i);
                i += 1;
            }
            (None, None) => unreachable!(),
        }
    }
    squared_norm
}

/// Pegasos hinge step on the pair difference, with projection.
pub fn single_pegasos_rank_step(
    a: &SparseVector,
    b: &SparseVector,
    eta: f32,
    lambda: f32,
    w: &mut WeightVector,
) -> bool {
    let y = rank_label(a.y(), b.y());
    let p = y * w.inner_product_on_difference(a, b);

    l2_regularize(eta, lambda, w);

    if p < 1.0 && y != 0.0 {
        w.add_vector(a, eta * y);
        w.add_vector(b, -eta * y);
    }

    pegasos_projection(lambda, w);
    p < 1.0 && y != 0.0
}

/// SGD-SVM hinge step on the pair difference, no projection.
pub fn single_sgd_svm_rank_step(
    a: &SparseVector,
    b: &SparseVector,
    eta: f32,
    lambda: f32,
    w: &mut WeightVector,
) -> bool {
    let y = rank_label(a.y(), b.y());
    let p = y * w.inner_product_on_difference(a, b);

    l2_regularize(eta, lambda, w);

    if p < 1.0 && y != 0.0 {
        w.add_vector(a, eta * y);
        w.add_vector(b, -eta * y);
    }

    p < 1.0 && y != 0.0
}

/// Margin perceptron step on the pair difference.
pub fn single_margin_perceptron_rank_step(
    a: &SparseVector,
    b: &SparseVector,
    eta: f32,
    c: f32,
    w: &mut WeightVector,
) -> bool {
    let y = rank_label(a.y(), b.y());
    if y * w.inner_product_on_difference(a, b) <= c {
        w.add_vector(a, eta);
        w.add_vector(b, -eta);
        true
    } else {
        false
    }
}

/// Passive-aggressive step on the pair difference; the step size divides by
/// `‖a - b‖²`, computed without materializing the difference.
pub fn single_passive_aggressive_rank_step(
    a: &SparseVector,
    b: &SparseVector,
    lambda: f32,
    max_step: f32,
    w: &mut WeightVector,
) -> bool {
    let y = rank_label(a.y(), b.y());
    let p = 1.0 - y * w.inner_product_on_difference(a, b);
    let stepped = p > 0.0 && y != 0.0;
    if stepped {
        let step = (p / difference_squared_norm(a, b)).min(max_step);
        w.add_vector(a, step * y);
        w.add_vector(b, -step * y);
    }

    if lambda > 0.0 {
        pegasos_projection(lambda, w);
    }
    stepped
}

/// Logistic step on the pair difference with projection. `labels`
/// optionally overrides the pair labels (the ROC loop samples from
/// pre-partitioned positive/negative pools and passes `(1, -1)`).
pub fn single_pegasos_logreg_rank_step(
    a: &SparseVector,
    b: &SparseVector,
    eta: f32,
    lambda: f32,
    w: &mut WeightVector,
    labels: Option<(f32, f32)>,
) -> bool {
    let (y_a, y_b) = labels.unwrap_or((a.y(), b.y()));
    let y = rank_label(y_a, y_b);
    let loss = y / (1.0 + (y * w.inner_product_on_difference(a, b)).exp());
    l2_regularize(eta, lambda, w);

    w.add_vector(a, eta * loss);
    w.add_vector(b, -eta * loss);

    pegasos_projection(lambda, w);
    true
}

/// Logistic step on the pair difference, no projection.
pub fn single_logreg_rank_step(
    a: &SparseVector,
    b: &SparseVector,
    eta: f32,
    lambda: f32,
    w: &mut WeightVector,
) -> bool {
    let y = rank_label(a.y(), b.y());
    let loss = y / (1.0 + (y * w.inner_product_on_difference(a, b)).exp());
    l2_regularize(eta, lambda, w);

    w.add_vector(a, eta * loss);
    w.add_vector(b, -eta * loss);
    true
}

/// Least-mean-squares step on the pair difference; the target is the label
/// gap `y_a - y_b` rather than its sign.
pub fn single_least_mean_squares_rank_step(
    a: &SparseVector,
    b: &SparseVector,
    eta: f32,
    lambda: f32,
    w: &mut WeightVector,
) -> bool {
    let y = a.y() - b.y();
    let loss = y - w.inner_product_on_difference(a, b);

    l2_regularize(eta, lambda, w);
    w.add_vector(a, eta * loss);
    w.add_vector(b, -eta * loss);
    pegasos_projection(lambda, w);
    true
}

/// ROMMA step on the materialized pair difference. The closed form needs
/// the difference's cached squared norm, so this is the one rank step that
/// builds the difference vector.
pub fn single_romma_rank_step(a: &SparseVector, b: &SparseVector, w: &mut WeightVector) -> bool {
    let y = rank_label(a.y(), b.y());
    if y == 0.0 {
        return false;
    }
    let x_diff = SparseVector::difference(a, b, y);
    single_romma_step(&x_diff, w)
}

/// Pegasos rank step plus a squared-loss pull of a tied pair toward zero
/// margin: the prediction on `tied_a - tied_b` should ideally be 0.
pub fn single_pegasos_rank_with_ties_step(
    rank_a: &SparseVector,
    rank_b: &SparseVector,
    tied_a: &SparseVector,
    tied_b: &SparseVector,
    eta: f32,
    lambda: f32,
    w: &mut WeightVector,
) -> bool {
    let rank_y = rank_label(rank_a.y(), rank_b.y());
    let rank_p = rank_y * w.inner_product_on_difference(rank_a, rank_b);
    let tied_p = w.inner_product_on_difference(tied_a, tied_b);

    l2_regularize(eta, lambda, w);

    if rank_p < 1.0 && rank_y != 0.0 {
        w.add_vector(rank_a, eta * rank_y);
        w.add_vector(rank_b, -eta * rank_y);
    }

    if tied_a.y() == tied_b.y() {
        w.add_vector(tied_a, eta * (0.0 - tied_p));
        w.add_vector(tied_b, -eta * (0.0 - tied_p));
    }

    pegasos_projection(lambda, w);
    true
}
