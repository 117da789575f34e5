//! Stochastic training drivers
//!
//! The loops sample examples with a caller-supplied generator (each engine
//! instance owns its own seeded rng; nothing here touches process-global
//! state) and dispatch to a kernel through a match over the closed
//! [`LearnerType`] enum.

use rand::Rng;

use crate::features::{SparseVector, WeightVector};
use crate::learner::kernels::{
    single_least_mean_squares_step, single_logreg_step, single_margin_perceptron_step,
    single_passive_aggressive_step, single_pegasos_logreg_step, single_pegasos_step,
    single_romma_step, single_sgd_svm_step,
};
use crate::learner::rank::{
    single_least_mean_squares_rank_step, single_logreg_rank_step,
    single_margin_perceptron_rank_step, single_passive_aggressive_rank_step,
    single_pegasos_logreg_rank_step, single_pegasos_rank_step, single_romma_rank_step,
    single_sgd_svm_rank_step,
};
use crate::learner::{EtaType, LearnerType};

/// Step size for iteration `i` (1-based).
pub fn get_eta(eta_type: EtaType, lambda: f32, i: usize) -> f32 {
    match eta_type {
        EtaType::Basic => 10.0 / (i as f32 + 10.0),
        EtaType::Pegasos => 1.0 / (lambda * i as f32),
        EtaType::Constant => 0.02,
    }
}

/// One single-example step of the given kernel.
pub fn one_learner_step(
    learner_type: LearnerType,
    x: &SparseVector,
    eta: f32,
    c: f32,
    lambda: f32,
    w: &mut WeightVector,
) -> bool {
    match learner_type {
        LearnerType::Pegasos => single_pegasos_step(x, eta, lambda, w),
        LearnerType::MarginPerceptron => single_margin_perceptron_step(x, eta, c, w),
        LearnerType::PassiveAggressive => single_passive_aggressive_step(x, lambda, c, w),
        LearnerType::LogRegPegasos => single_pegasos_logreg_step(x, eta, lambda, w),
        LearnerType::LogReg => single_logreg_step(x, eta, lambda, w),
        LearnerType::LmsRegression => single_least_mean_squares_step(x, eta, lambda, w),
        LearnerType::SgdSvm => single_sgd_svm_step(x, eta, lambda, w),
        LearnerType::Romma => single_romma_step(x, w),
    }
}

/// One pairwise step of the given kernel. `labels` overrides the pair
/// labels where the kernel supports it (logistic-Pegasos); the other
/// kernels read labels off the vectors.
#[allow(clippy::too_many_arguments)]
pub fn one_learner_rank_step(
    learner_type: LearnerType,
    a: &SparseVector,
    b: &SparseVector,
    eta: f32,
    c: f32,
    lambda: f32,
    w: &mut WeightVector,
    labels: Option<(f32, f32)>,
) -> bool {
    match learner_type {
        LearnerType::Pegasos => single_pegasos_rank_step(a, b, eta, lambda, w),
        LearnerType::MarginPerceptron => single_margin_perceptron_rank_step(a, b, eta, c, w),
        LearnerType::PassiveAggressive => single_passive_aggressive_rank_step(a, b, lambda, c, w),
        LearnerType::LogRegPegasos => {
            single_pegasos_logreg_rank_step(a, b, eta, lambda, w, labels)
        }
        LearnerType::LogReg => single_logreg_rank_step(a, b, eta, lambda, w),
        LearnerType::LmsRegression => single_least_mean_squares_rank_step(a, b, eta, lambda, w),
        LearnerType::SgdSvm => single_sgd_svm_rank_step(a, b, eta, lambda, w),
        LearnerType::Romma => single_romma_rank_step(a, b, w),
    }
}

/// Uniform stochastic loop: one random example per iteration.
#[allow(clippy::too_many_arguments)]
pub fn stochastic_outer_loop(
    examples: &[SparseVector],
    learner_type: LearnerType,
    eta_type: EtaType,
    lambda: f32,
    c: f32,
    num_iters: usize,
    w: &mut WeightVector,
    rng: &mut impl Rng,
) {
    if examples.is_empty() {
        return;
    }
    for i in 1..=num_iters {
        let x = &examples[rng.gen_range(0..examples.len())];
        let eta = get_eta(eta_type, lambda, i);
        one_learner_step(learner_type, x, eta, c, lambda, w);
    }
}

/// Class-balanced loop: pre-partition the examples so sampling one positive
/// and one negative per iteration is O(1), then take one gradient step on
/// each.
#[allow(clippy::too_many_arguments)]
pub fn balanced_stochastic_outer_loop(
    examples: &[SparseVector],
    learner_type: LearnerType,
    eta_type: EtaType,
    lambda: f32,
    c: f32,
    num_iters: usize,
    w: &mut WeightVector,
    rng: &mut impl Rng,
) {
    let mut positives: Vec<usize> = Vec::new();
    let mut negatives: Vec<usize> = Vec::new();
    for (i, x) in examples.iter().enumerate() {
        if x.y() > 0.0 {
            positives.push(i);
        } else {
            negatives.push(i);
        }
    }
    if positives.is_empty() || negatives.is_empty() {
        log::debug!(
            "balanced loop needs both classes ({} positives, {} negatives); skipping",
            positives.len(),
            negatives.len()
        );
        return;
    }

    for i in 1..=num_iters {
        let eta = get_eta(eta_type, lambda, i);

        let pos_x = &examples[positives[rng.gen_range(0..positives.len())]];
        one_learner_step(learner_type, pos_x, eta, c, lambda, w);

        let neg_x = &examples[negatives[rng.gen_range(0..negatives.len())]];
        one_learner_step(learner_type, neg_x, eta, c, lambda, w);
    }
}

/// Pairwise ROC loop: one (positive, negative) pair per iteration, each
/// drawn uniformly from its pool. The pools carry no labels of their own,
/// so the pairwise label override is fixed at `(1, -1)`.
#[allow(clippy::too_many_arguments)]
pub fn stochastic_roc_loop(
    positives: &[&SparseVector],
    negatives: &[&SparseVector],
    learner_type: LearnerType,
    eta_type: EtaType,
    lambda: f32,
    c: f32,
    num_iters: usize,
    w: &mut WeightVector,
    rng: &mut impl Rng,
) {
    if positives.is_empty() || negatives.is_empty() {
        log::debug!(
            "roc loop needs both pools ({} positives, {} negatives); skipping",
            positives.len(),
            negatives.len()
        );
        return;
    }
    for i in 1..=num_iters {
        let eta = get_eta(eta_type, lambda, i);
        let pos_x = positives[rng.gen_range(0..positives.len())];
        let neg_x = negatives[rng.gen_range(0..negatives.len())];
        one_learner_rank_step(
            learner_type,
            pos_x,
            neg_x,
            eta,
            c,
            lambda,
            w,
            Some((1.0, -1.0)),
        );
    }
}

/// Mixed loop: a pairwise step with probability `rank_step_probability`,
/// otherwise a uniform classification step.
#[allow(clippy::too_many_arguments)]
pub fn stochastic_classification_and_roc_loop(
    examples: &[SparseVector],
    learner_type: LearnerType,
    eta_type: EtaType,
    lambda: f32,
    c: f32,
    rank_step_probability: f32,
    num_iters: usize,
    w: &mut WeightVector,
    rng: &mut impl Rng,
) {
    let mut positives: Vec<usize> = Vec::new();
    let mut negatives: Vec<usize> = Vec::new();
    for (i, x) in examples.iter().enumerate() {
        if x.y() > 0.0 {
            positives.push(i);
        } else {
            negatives.push(i);
        }
    }
    if positives.is_empty() || negatives.is_empty() {
        log::debug!(
            "mixed loop needs both classes ({} positives, {} negatives); skipping",
            positives.len(),
            negatives.len()
        );
        return;
    }

    for i in 1..=num_iters {
        let eta = get_eta(eta_type, lambda, i);
        if rng.gen::<f32>() < rank_step_probability {
            let pos_x = &examples[positives[rng.gen_range(0..positives.len())]];
            let neg_x = &examples[negatives[rng.gen_range(0..negatives.len())]];
            one_learner_rank_step(learner_type, pos_x, neg_x, eta, c, lambda, w, None);
        } else {
            let x = &examples[rng.gen_range(0..examples.len())];
            one_learner_step(learner_type, x, eta, c, lambda, w);
        }
    }
}
