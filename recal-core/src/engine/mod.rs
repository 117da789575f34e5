//! The CAL state machine: train → score → dispense → judge → repeat
//!
//! `Bmi` is the core loop over a document corpus; instantiated over a
//! `ParagraphDataset` it scores at paragraph granularity and deduplicates
//! batches by parent document. `BmiParaScal` layers the recall-targeting
//! policy (growing batch, doubling target, proportional sampling) on top.
//!
//! All mutable session state sits behind one `parking_lot::Mutex`; the
//! corpus is immutable and shared with the scoring workers without
//! synchronization.

mod bmi;
mod para;
mod scal;
mod scoring;
#[cfg(test)]
mod tests;

pub use bmi::Bmi;
pub use para::BmiPara;
pub use scal::BmiParaScal;
pub use scoring::{ScoreCollector, score_top_k};

use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, ParagraphDataset};
use crate::error::{Error, Result};
use crate::features::SparseVector;
use crate::learner::{EtaType, LearnerType};
use crate::{DocIndex, ParaIndex};

/// A scorable collection: either the documents themselves or their
/// paragraphs, with a total back-reference onto the document range.
pub trait ScoringView: Send + Sync {
    fn size(&self) -> usize;
    fn vector_at(&self, i: ParaIndex) -> &SparseVector;
    /// Parent document of entry `i`; the identity for document granularity.
    fn parent_of(&self, i: ParaIndex) -> DocIndex;
    /// One past the highest feature id in the collection.
    fn dimensions(&self) -> usize;
}

impl ScoringView for Dataset {
    fn size(&self) -> usize {
        Dataset::size(self)
    }

    fn vector_at(&self, i: ParaIndex) -> &SparseVector {
        Dataset::vector_at(self, i)
    }

    fn parent_of(&self, i: ParaIndex) -> DocIndex {
        i
    }

    fn dimensions(&self) -> usize {
        Dataset::dimensions(self)
    }
}

impl ScoringView for ParagraphDataset {
    fn size(&self) -> usize {
        ParagraphDataset::size(self)
    }

    fn vector_at(&self, i: ParaIndex) -> &SparseVector {
        ParagraphDataset::vector_at(self, i)
    }

    fn parent_of(&self, i: ParaIndex) -> DocIndex {
        self.translate_index(i)
    }

    fn dimensions(&self) -> usize {
        self.dataset().dimensions()
    }
}

/// How the per-iteration training driver samples examples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TrainingMode {
    /// Uniform sampling over the assembled training set
    Uniform,
    /// One positive and one negative step per iteration
    Balanced,
    /// Pairwise (positive, negative) rank steps
    Roc,
    /// Rank step with the given probability, classification step otherwise
    Mixed { rank_step_probability: f32 },
}

/// Engine configuration. Plain struct with `Default`; override fields with
/// struct update syntax or the `with_*` setters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BmiConfig {
    /// Scoring worker count
    pub num_threads: usize,
    /// SGD steps per training iteration
    pub training_iterations: usize,
    /// Initial batch size (`B`); also the judgment count between iterations
    pub judgments_per_iteration: usize,
    pub learner: LearnerType,
    pub eta: EtaType,
    pub mode: TrainingMode,
    /// L2 regularization strength
    pub lambda: f32,
    /// Margin (perceptron) or maximum step (passive-aggressive)
    pub c: f32,
    /// Seed for the per-instance generator
    pub seed: u64,
    /// Reserved; the engine is synchronous
    pub async_mode: bool,
}

impl Default for BmiConfig {
    fn default() -> Self {
        Self {
            num_threads: 8,
            training_iterations: 1000,
            judgments_per_iteration: 100,
            learner: LearnerType::LogRegPegasos,
            eta: EtaType::Pegasos,
            mode: TrainingMode::Roc,
            lambda: 1e-4,
            c: 1.0,
            seed: 42,
            async_mode: false,
        }
    }
}

impl BmiConfig {
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_training_iterations(mut self, training_iterations: usize) -> Self {
        self.training_iterations = training_iterations;
        self
    }

    pub fn with_judgments_per_iteration(mut self, judgments_per_iteration: usize) -> Self {
        self.judgments_per_iteration = judgments_per_iteration;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_threads == 0 {
            return Err(Error::Config("num_threads must be at least 1".to_string()));
        }
        if self.training_iterations == 0 {
            return Err(Error::Config(
                "training_iterations must be at least 1".to_string(),
            ));
        }
        if self.judgments_per_iteration == 0 {
            return Err(Error::Config(
                "judgments_per_iteration must be at least 1".to_string(),
            ));
        }
        if self.lambda < 0.0 {
            return Err(Error::Config("lambda must be non-negative".to_string()));
        }
        if self.eta == EtaType::Pegasos && self.lambda <= 0.0 {
            return Err(Error::Config(
                "the pegasos eta schedule requires lambda > 0".to_string(),
            ));
        }
        if let TrainingMode::Mixed {
            rank_step_probability,
        } = self.mode
        {
            if !(0.0..=1.0).contains(&rank_step_probability) {
                return Err(Error::Config(
                    "rank_step_probability must be within [0, 1]".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(BmiConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_threads_rejected() {
        let config = BmiConfig::default().with_num_threads(0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_pegasos_eta_needs_lambda() {
        let config = BmiConfig {
            lambda: 0.0,
            eta: EtaType::Pegasos,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
