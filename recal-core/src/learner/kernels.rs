//! Single-example stochastic step functions
//!
//! Each step takes the example, its hyperparameters, and the weight vector,
//! and returns whether the step was non-trivial. Regularization and the
//! Pegasos ball projection are the shared primitives at the bottom.

// Ported from sofia-ml (Apache-2.0), Copyright 2009 Google Inc.

use crate::features::{MIN_SCALING_FACTOR, SparseVector, WeightVector};

/// Guard against division by near-zero quantities in the ROMMA closed form.
const ROMMA_GUARD: f32 = 1e-10;

/// Hinge-loss SVM step with L2 regularization and Pegasos projection.
pub fn single_pegasos_step(x: &SparseVector, eta: f32, lambda: f32, w: &mut WeightVector) -> bool {
    let p = x.y() * w.inner_product(x);

    l2_regularize(eta, lambda, w);
    if p < 1.0 && x.y() != 0.0 {
        w.add_vector(x, eta * x.y());
    }

    pegasos_projection(lambda, w);
    p < 1.0 && x.y() != 0.0
}

/// Hinge-loss SVM step with L2 regularization, no projection.
pub fn single_sgd_svm_step(x: &SparseVector, eta: f32, lambda: f32, w: &mut WeightVector) -> bool {
    let p = x.y() * w.inner_product(x);

    l2_regularize(eta, lambda, w);
    if p < 1.0 && x.y() != 0.0 {
        w.add_vector(x, eta * x.y());
    }

    p < 1.0 && x.y() != 0.0
}

/// Perceptron step taken whenever the functional margin is at most `c`.
pub fn single_margin_perceptron_step(
    x: &SparseVector,
    eta: f32,
    c: f32,
    w: &mut WeightVector,
) -> bool {
    if x.y() * w.inner_product(x) <= c {
        w.add_vector(x, eta * x.y());
        true
    } else {
        false
    }
}

/// Passive-aggressive step: closed-form step size `(1 - y·w·x)/‖x‖²`
/// capped at `max_step`, projected onto the Pegasos ball when `λ > 0`.
pub fn single_passive_aggressive_step(
    x: &SparseVector,
    lambda: f32,
    max_step: f32,
    w: &mut WeightVector,
) -> bool {
    let p = 1.0 - x.y() * w.inner_product(x);
    let stepped = p > 0.0 && x.y() != 0.0;
    if stepped {
        let step = (p / x.squared_norm()).min(max_step);
        w.add_vector(x, step * x.y());
    }

    if lambda > 0.0 {
        pegasos_projection(lambda, w);
    }
    stepped
}

/// Logistic regression step with L2 regularization and Pegasos projection.
pub fn single_pegasos_logreg_step(
    x: &SparseVector,
    eta: f32,
    lambda: f32,
    w: &mut WeightVector,
) -> bool {
    let loss = x.y() / (1.0 + (x.y() * w.inner_product(x)).exp());

    l2_regularize(eta, lambda, w);
    w.add_vector(x, eta * loss);
    pegasos_projection(lambda, w);
    true
}

/// Logistic regression step with L2 regularization, no projection.
pub fn single_logreg_step(x: &SparseVector, eta: f32, lambda: f32, w: &mut WeightVector) -> bool {
    let loss = x.y() / (1.0 + (x.y() * w.inner_product(x)).exp());

    l2_regularize(eta, lambda, w);
    w.add_vector(x, eta * loss);
    true
}

/// Least-mean-squares regression step with L2 regularization and Pegasos
/// projection.
pub fn single_least_mean_squares_step(
    x: &SparseVector,
    eta: f32,
    lambda: f32,
    w: &mut WeightVector,
) -> bool {
    let loss = x.y() - w.inner_product(x);
    l2_regularize(eta, lambda, w);
    w.add_vector(x, eta * loss);
    true
}

/// ROMMA step. Scales `w` and adds `x` by the closed-form coefficients; a
/// no-op (returning `false`) when the example already has margin ≥ 1.
pub fn single_romma_step(x: &SparseVector, w: &mut WeightVector) -> bool {
    let wx = w.inner_product(x);
    let p = x.y() * wx;

    if p < 1.0 && x.y() != 0.0 {
        let xx = x.squared_norm();
        let ww = w.squared_norm();
        let c = ((xx * ww) - p + ROMMA_GUARD) / ((xx * ww) - (wx * wx) + ROMMA_GUARD);
        let d = (ww * (x.y() - wx) + ROMMA_GUARD) / ((xx * ww) - (wx * wx) + ROMMA_GUARD);

        // Examples of extremely low magnitude can drive c negative.
        if c >= 0.0 {
            w.scale_by(c);
            w.add_vector(x, d);
        }
    }

    p < 1.0 && x.y() != 0.0
}

/// Multiply `w` by `1 - η·λ`, clamped at [`MIN_SCALING_FACTOR`] so the
/// scale never goes to zero or negative when `η·λ ≥ 1`.
pub fn l2_regularize(eta: f32, lambda: f32, w: &mut WeightVector) {
    let scaling_factor = 1.0 - eta * lambda;
    w.scale_by(scaling_factor.max(MIN_SCALING_FACTOR));
}

/// Lazy batched regularization: apply `(1 - η·λ)` raised to the number of
/// skipped steps in one scaling, clamped at [`MIN_SCALING_FACTOR`].
pub fn l2_regularize_several_steps(
    eta: f32,
    lambda: f32,
    effective_steps: f32,
    w: &mut WeightVector,
) {
    let base = (1.0 - eta * lambda).max(MIN_SCALING_FACTOR);
    let scaling_factor = base.powf(effective_steps);
    w.scale_by(scaling_factor.max(MIN_SCALING_FACTOR));
}

/// Project `w` onto the ball of radius `1/√λ`: scale by `1/√(λ‖w‖²)` when
/// that factor is below 1, otherwise leave `w` alone.
pub fn pegasos_projection(lambda: f32, w: &mut WeightVector) {
    let projection_val = 1.0 / (lambda * w.squared_norm()).sqrt();
    if projection_val < 1.0 {
        w.scale_by(projection_val);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FeatureId;

    fn dense(w: &WeightVector) -> Vec<f32> {
        (0..w.dimensions() as FeatureId).map(|f| w.value_at(f)).collect()
    }

    #[test]
    fn test_l2_regularize_shrinks_norm() {
        for (eta, lambda) in [(0.1, 0.5), (0.5, 1.0), (0.02, 0.0001)] {
            let mut w = WeightVector::new(4);
            w.add_vector(&SparseVector::parse("1 0:1 2:-2").unwrap(), 1.0);
            let before = w.squared_norm();
            l2_regularize(eta, lambda, &mut w);
            assert!(w.squared_norm() <= before + 1e-6, "eta={eta} lambda={lambda}");
        }
    }

    #[test]
    fn test_l2_regularize_clamps_large_eta_lambda() {
        let mut w = WeightVector::new(2);
        w.add_vector(&SparseVector::parse("1 0:1").unwrap(), 1.0);
        // eta * lambda > 1 would flip the sign without the clamp.
        l2_regularize(2.0, 1.0, &mut w);
        assert!(w.value_at(0) > 0.0);
    }

    #[test]
    fn test_l2_regularize_several_steps_is_powered() {
        let mut batched = WeightVector::new(2);
        let mut looped = WeightVector::new(2);
        let x = SparseVector::parse("1 0:1 1:1").unwrap();
        batched.add_vector(&x, 1.0);
        looped.add_vector(&x, 1.0);

        l2_regularize_several_steps(0.1, 0.5, 3.0, &mut batched);
        for _ in 0..3 {
            l2_regularize(0.1, 0.5, &mut looped);
        }
        assert!((batched.value_at(0) - looped.value_at(0)).abs() < 1e-6);
    }

    #[test]
    fn test_pegasos_projection_bounds_norm() {
        let lambda = 0.1;
        let mut w = WeightVector::new(4);
        w.add_vector(&SparseVector::parse("1 0:10 1:10 3:10").unwrap(), 1.0);
        pegasos_projection(lambda, &mut w);
        assert!(w.squared_norm() <= 1.0 / lambda + 1e-4);
    }

    #[test]
    fn test_pegasos_projection_noop_inside_ball() {
        let lambda = 0.1;
        let mut w = WeightVector::new(2);
        w.add_vector(&SparseVector::parse("1 0:0.5").unwrap(), 1.0);
        let before = dense(&w);
        pegasos_projection(lambda, &mut w);
        assert_eq!(dense(&w), before);
    }

    #[test]
    fn test_romma_noop_on_satisfied_margin() {
        let mut w = WeightVector::new(2);
        w.add_vector(&SparseVector::parse("1 0:2").unwrap(), 1.0);
        let before = dense(&w);
        let x = SparseVector::parse("1 0:1").unwrap();
        // y * w.x = 2 >= 1: no step.
        assert!(!single_romma_step(&x, &mut w));
        assert_eq!(dense(&w), before);
    }

    #[test]
    fn test_romma_steps_on_violation() {
        let mut w = WeightVector::new(2);
        w.add_vector(&SparseVector::parse("1 0:0.1 1:1").unwrap(), 1.0);
        let x = SparseVector::parse("1 0:1").unwrap();
        assert!(single_romma_step(&x, &mut w));
        assert!(w.inner_product(&x) > 0.1);
    }

    #[test]
    fn test_margin_perceptron_respects_margin() {
        let mut w = WeightVector::new(2);
        let x = SparseVector::parse("1 0:1").unwrap();
        assert!(single_margin_perceptron_step(&x, 0.5, 0.0, &mut w));
        assert!((w.value_at(0) - 0.5).abs() < 1e-6);
        // Margin now 0.5 > c = 0: no further step.
        assert!(!single_margin_perceptron_step(&x, 0.5, 0.0, &mut w));
    }

    #[test]
    fn test_passive_aggressive_caps_step() {
        let mut w = WeightVector::new(2);
        let x = SparseVector::parse("1 0:1").unwrap();
        assert!(single_passive_aggressive_step(&x, 0.0, 0.25, &mut w));
        // Uncapped step would be 1.0; the cap keeps it at 0.25.
        assert!((w.value_at(0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_pegasos_step_direction() {
        let mut w = WeightVector::new(3);
        let pos = SparseVector::parse("1 0:1 2:1").unwrap();
        let neg = SparseVector::parse("-1 1:1").unwrap();
        for _ in 0..20 {
            single_pegasos_step(&pos, 0.1, 0.01, &mut w);
            single_pegasos_step(&neg, 0.1, 0.01, &mut w);
        }
        assert!(w.inner_product(&pos) > 0.0);
        assert!(w.inner_product(&neg) < 0.0);
    }

    #[test]
    fn test_logreg_moves_toward_label() {
        let mut w = WeightVector::new(2);
        let x = SparseVector::parse("1 0:1").unwrap();
        single_logreg_step(&x, 0.5, 0.0, &mut w);
        assert!(w.value_at(0) > 0.0);
    }

    #[test]
    fn test_lms_tracks_target() {
        let mut w = WeightVector::new(2);
        let x = SparseVector::parse("0.5 0:1").unwrap();
        for _ in 0..200 {
            single_least_mean_squares_step(&x, 0.1, 0.0, &mut w);
        }
        assert!((w.inner_product(&x) - 0.5).abs() < 1e-2);
    }
}
