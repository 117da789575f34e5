//! recal - a high-recall continuous active learning (CAL) engine
//!
//! Drives iterative retrieval over a corpus of sparse feature vectors:
//! - Linear classifiers trained by single-pass stochastic gradient steps
//!   (Pegasos, SGD-SVM, passive-aggressive, ROMMA, logistic regression, ...)
//! - Parallel top-k scoring of the unjudged corpus on a fixed worker pool
//! - A train / score / dispense / judge state machine (`Bmi`), with a
//!   paragraph-granularity variant and a recall-targeting scalable variant
//!   (`BmiParaScal`)
//!
//! The corpus and paragraph mapping are immutable after construction and
//! shared across threads without synchronization; all mutable session state
//! lives behind a single mutex inside the engine.

pub mod dataset;
pub mod engine;
pub mod error;
pub mod features;
pub mod learner;

// Re-exports from dataset
pub use dataset::{Dataset, ParagraphDataset};

// Re-exports from engine
pub use engine::{
    Bmi, BmiConfig, BmiPara, BmiParaScal, ScoreCollector, ScoringView, TrainingMode, score_top_k,
};

// Re-exports from error
pub use error::{Error, Result};

// Re-exports from features
pub use features::{MIN_SCALING_FACTOR, SparseVector, WeightVector};

// Re-exports from learner
pub use learner::{EtaType, LearnerType, one_learner_rank_step, one_learner_step};

/// Feature identifier within a sparse vector (ascending within a vector)
pub type FeatureId = u32;
/// Position of a document within its `Dataset`
pub type DocIndex = usize;
/// Position of a paragraph within its `ParagraphDataset`
pub type ParaIndex = usize;
/// Classifier score
pub type Score = f32;
