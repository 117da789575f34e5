//! Applying a trained model to examples

// Ported from sofia-ml (Apache-2.0), Copyright 2009 Google Inc.

use crate::features::{SparseVector, WeightVector};
use crate::Score;

/// Raw margin `w · x`.
pub fn svm_prediction(x: &SparseVector, w: &WeightVector) -> Score {
    w.inner_product(x)
}

/// `σ(w · x)`, the probability of the positive class.
pub fn logistic_prediction(x: &SparseVector, w: &WeightVector) -> Score {
    let p = w.inner_product(x);
    p.exp() / (1.0 + p.exp())
}

/// Margins for every example, in dataset order.
pub fn svm_predictions_on(examples: &[SparseVector], w: &WeightVector) -> Vec<Score> {
    examples.iter().map(|x| svm_prediction(x, w)).collect()
}

/// Positive-class probabilities for every example, in dataset order.
pub fn logistic_predictions_on(examples: &[SparseVector], w: &WeightVector) -> Vec<Score> {
    examples.iter().map(|x| logistic_prediction(x, w)).collect()
}

/// The SVM objective: `(λ/2)‖w‖²` plus mean hinge loss over the examples.
pub fn svm_objective(examples: &[SparseVector], w: &WeightVector, lambda: f32) -> Score {
    let mut objective = w.squared_norm() * lambda / 2.0;
    for x in examples {
        let loss = 1.0 - svm_prediction(x, w) * x.y();
        if loss > 0.0 {
            objective += loss / examples.len() as f32;
        }
    }
    objective
}
