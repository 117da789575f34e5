//! Single-step SGD learner kernels and stochastic training loops
//!
//! Every kernel is a pure function of `(example, weight vector,
//! hyperparameters)`: it mutates `w` in place and reports whether the step
//! changed `w` non-trivially. Kernels are synchronous and single-threaded
//! with respect to `w`; parallelism lives entirely in the scoring layer.

mod kernels;
mod loops;
mod predict;
mod rank;

pub use kernels::{
    l2_regularize, l2_regularize_several_steps, pegasos_projection, single_logreg_step,
    single_least_mean_squares_step, single_margin_perceptron_step,
    single_passive_aggressive_step, single_pegasos_logreg_step, single_pegasos_step,
    single_romma_step, single_sgd_svm_step,
};
pub use loops::{
    balanced_stochastic_outer_loop, get_eta, one_learner_rank_step, one_learner_step,
    stochastic_classification_and_roc_loop, stochastic_outer_loop, stochastic_roc_loop,
};
pub use predict::{
    logistic_prediction, logistic_predictions_on, svm_objective, svm_prediction,
    svm_predictions_on,
};
pub use rank::{
    single_logreg_rank_step, single_least_mean_squares_rank_step,
    single_margin_perceptron_rank_step, single_passive_aggressive_rank_step,
    single_pegasos_logreg_rank_step, single_pegasos_rank_step,
    single_pegasos_rank_with_ties_step, single_romma_rank_step, single_sgd_svm_rank_step,
};

use serde::{Deserialize, Serialize};

/// The family of single-step learners. A closed enum: adding a kernel adds
/// one variant and one dispatch arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LearnerType {
    /// SVM with L2 regularization and Pegasos ball projection
    Pegasos,
    /// Pegasos without the projection
    SgdSvm,
    /// Perceptron with margin `c`, no regularization
    MarginPerceptron,
    /// Closed-form step bounded by `c`, projected when `λ > 0`
    PassiveAggressive,
    /// Logistic regression with L2 regularization and Pegasos projection
    LogRegPegasos,
    /// Logistic regression without the projection
    LogReg,
    /// Least-mean-squares regression
    LmsRegression,
    /// Relaxed Online Maximum Margin Algorithm
    Romma,
}

/// Step-size schedule for the stochastic loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EtaType {
    /// `10 / (i + 10)`
    Basic,
    /// `1 / (λ·i)`
    Pegasos,
    /// `0.02`
    Constant,
}
