//! Core CAL loop
//!
//! One instance drives a retrieval session: it trains a fresh linear
//! classifier on the accumulated judgments, scores the unjudged corpus on
//! the worker pool, and dispenses the next batch for assessment. All
//! session state (`judgments`, `training_cache`, `judgment_queue`, the
//! weight vector, counters, rng) lives in `BmiState` behind a single
//! mutex. `record_judgment_batch` is the only call that may block its
//! caller for the duration of an iteration; `get_next_batch` takes the
//! lock briefly and copies ids out.

use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::dataset::Dataset;
use crate::engine::scoring::score_top_k;
use crate::engine::{BmiConfig, ScoringView, TrainingMode};
use crate::error::Result;
use crate::features::{SparseVector, WeightVector};
use crate::learner::{
    balanced_stochastic_outer_loop, stochastic_classification_and_roc_loop, stochastic_outer_loop,
    stochastic_roc_loop,
};
use crate::{DocIndex, FeatureId, ParaIndex};

/// Random unjudged documents drawn as presumed negatives per iteration.
const NEGATIVE_SAMPLE_SIZE: usize = 100;

/// Headroom multiplier on the top-k heaps so that parent-document
/// deduplication still fills the batch when one document's paragraphs
/// cluster at the top of the ranking.
const DEDUP_OVERSAMPLE: usize = 2;

/// Judgment value for documents assigned to the current batch.
pub(super) const ASSIGNED: i32 = 0;
/// Judgment value for documents excluded by the scalable variant's
/// sampling. Exclusion only; never a training label.
pub(super) const EXCLUDED: i32 = -2;

/// Mutable session state, guarded by the judgment-list mutex.
pub(super) struct BmiState {
    /// document index → {-2 excluded, -1 negative, 0 assigned, +1 positive}
    pub(super) judgments: FxHashMap<DocIndex, i32>,
    /// Judgments received since the last training iteration
    pub(super) training_cache: FxHashMap<DocIndex, i32>,
    /// The batch currently being dispensed, as view (paragraph) indices
    pub(super) judgment_queue: Vec<ParaIndex>,
    pub(super) weights: WeightVector,
    /// Current batch size `B`
    pub(super) batch_size: usize,
    /// Assessor judgments accepted so far
    pub(super) total_judgments: usize,
    /// Judgment count at which the next iteration fires
    pub(super) next_iteration_target: usize,
    /// Recall goal `N` (scalable variant)
    pub(super) recall_goal: usize,
    /// Running target `T` (scalable variant)
    pub(super) target: usize,
    /// Relevant documents found `R` (scalable variant)
    pub(super) relevant_found: usize,
    pub(super) rng: StdRng,
}

/// The train → score → dispense → judge loop, generic over the scoring
/// granularity: documents themselves, or paragraphs with parent-document
/// deduplication.
pub struct Bmi<V: ScoringView> {
    pub(super) config: BmiConfig,
    seed_vector: SparseVector,
    pub(super) documents: Arc<Dataset>,
    pub(super) view: Arc<V>,
    dimensions: usize,
    pub(super) state: Mutex<BmiState>,
}

impl Bmi<Dataset> {
    /// Create a document-granularity engine seeded with a query vector and
    /// immediately run the initial training iteration.
    pub fn new(
        seed_vector: SparseVector,
        documents: Arc<Dataset>,
        config: BmiConfig,
    ) -> Result<Self> {
        let view = Arc::clone(&documents);
        let bmi = Self::construct(seed_vector, documents, view, config)?;
        bmi.perform_iteration();
        Ok(bmi)
    }
}

impl<V: ScoringView> Bmi<V> {
    pub(super) fn construct(
        seed_vector: SparseVector,
        documents: Arc<Dataset>,
        view: Arc<V>,
        config: BmiConfig,
    ) -> Result<Self> {
        config.validate()?;
        let dimensions = documents
            .dimensions()
            .max(view.dimensions())
            .max(seed_vector.max_dimension());
        let state = BmiState {
            judgments: FxHashMap::default(),
            training_cache: FxHashMap::default(),
            judgment_queue: Vec::new(),
            weights: WeightVector::new(dimensions),
            batch_size: config.judgments_per_iteration,
            total_judgments: 0,
            next_iteration_target: 0,
            recall_goal: 0,
            target: 0,
            relevant_found: 0,
            rng: StdRng::seed_from_u64(config.seed),
        };
        Ok(Self {
            config,
            seed_vector,
            documents,
            view,
            dimensions,
            state: Mutex::new(state),
        })
    }

    /// Document ids of the batch currently awaiting judgment.
    pub fn get_next_batch(&self) -> Vec<String> {
        let state = self.state.lock();
        state
            .judgment_queue
            .iter()
            .map(|&p| {
                self.documents
                    .vector_at(self.view.parent_of(p))
                    .doc_id()
                    .to_string()
            })
            .collect()
    }

    /// Ingest assessor labels for the most recently dispensed batch (or any
    /// subset), in list order. Unknown document ids are silently dropped.
    /// Runs the next training iteration synchronously once the accepted
    /// judgment count reaches the iteration target.
    pub fn record_judgment_batch(&self, judgments: &[(String, i32)]) {
        let mut state = self.state.lock();
        for (doc_id, label) in judgments {
            let Some(doc) = self.documents.index_of(doc_id) else {
                debug!("ignoring judgment for unknown document '{doc_id}'");
                continue;
            };
            state.training_cache.insert(doc, *label);
            state.total_judgments += 1;
            if let Some(pos) = state
                .judgment_queue
                .iter()
                .rposition(|&p| self.view.parent_of(p) == doc)
            {
                state.judgment_queue.remove(pos);
            }
        }

        if state.total_judgments >= state.next_iteration_target {
            self.perform_iteration_locked(&mut state);
        }
    }

    /// Snapshot of the most recently trained weight vector.
    pub fn weights(&self) -> WeightVector {
        self.state.lock().weights.clone()
    }

    pub(super) fn perform_iteration(&self) {
        let mut state = self.state.lock();
        self.perform_iteration_locked(&mut state);
    }

    fn perform_iteration_locked(&self, state: &mut BmiState) {
        let batch_size = state.batch_size;
        let batch = self.perform_training_iteration(state, batch_size);
        for &p in &batch {
            state.judgments.insert(self.view.parent_of(p), ASSIGNED);
        }
        state.judgment_queue = batch;
        state.next_iteration_target += self.config.judgments_per_iteration;
    }

    /// One full train-and-score pass: fold cached judgments, assemble the
    /// training set, fit a fresh weight vector, and return the top-`k`
    /// unjudged view indices (deduplicated by parent document). The caller
    /// decides how the batch enters the queue.
    pub(super) fn perform_training_iteration(
        &self,
        state: &mut BmiState,
        k: usize,
    ) -> Vec<ParaIndex> {
        // Fold the cache into the judgment map: positive labels become +1,
        // anything else -1.
        for (doc, label) in state.training_cache.drain() {
            state.judgments.insert(doc, if label > 0 { 1 } else { -1 });
        }

        // Synthetic positive: the mean of all positively-judged documents,
        // or the seed query while no positives exist.
        let mut feature_sums: FxHashMap<FeatureId, f32> = FxHashMap::default();
        let mut positive_count = 0usize;
        for (&doc, &label) in &state.judgments {
            if label == 1 {
                positive_count += 1;
                for (f, v) in self.documents.vector_at(doc).iter() {
                    *feature_sums.entry(f).or_insert(0.0) += v;
                }
            }
        }
        let synthetic_positive = if positive_count > 0 {
            SparseVector::from_features(
                "",
                1.0,
                feature_sums
                    .into_iter()
                    .map(|(f, v)| (f, v / positive_count as f32))
                    .collect(),
            )
        } else {
            self.seed_vector.with_label(1.0)
        };

        // Negatives: every explicitly-judged negative, plus random unjudged
        // documents presumed negative.
        let mut negatives: Vec<SparseVector> = state
            .judgments
            .iter()
            .filter(|&(_, &label)| label == -1)
            .map(|(&doc, _)| self.documents.vector_at(doc).with_label(-1.0))
            .collect();
        let explicit_negatives = negatives.len();
        for _ in 0..NEGATIVE_SAMPLE_SIZE {
            let doc = state.rng.gen_range(0..self.documents.size());
            if !state.judgments.contains_key(&doc) {
                negatives.push(self.documents.vector_at(doc).with_label(-1.0));
            }
        }
        debug!(
            "training iteration: {} judged positives, {} explicit + {} sampled negatives",
            positive_count,
            explicit_negatives,
            negatives.len() - explicit_negatives
        );

        // Fit a fresh classifier on the assembled set.
        let mut weights = WeightVector::new(self.dimensions);
        let config = &self.config;
        match config.mode {
            TrainingMode::Roc => {
                let positives = [&synthetic_positive];
                let negative_refs: Vec<&SparseVector> = negatives.iter().collect();
                stochastic_roc_loop(
                    &positives,
                    &negative_refs,
                    config.learner,
                    config.eta,
                    config.lambda,
                    config.c,
                    config.training_iterations,
                    &mut weights,
                    &mut state.rng,
                );
            }
            TrainingMode::Uniform | TrainingMode::Balanced | TrainingMode::Mixed { .. } => {
                let mut examples = Vec::with_capacity(negatives.len() + 1);
                examples.push(synthetic_positive);
                examples.append(&mut negatives);
                match config.mode {
                    TrainingMode::Uniform => stochastic_outer_loop(
                        &examples,
                        config.learner,
                        config.eta,
                        config.lambda,
                        config.c,
                        config.training_iterations,
                        &mut weights,
                        &mut state.rng,
                    ),
                    TrainingMode::Balanced => balanced_stochastic_outer_loop(
                        &examples,
                        config.learner,
                        config.eta,
                        config.lambda,
                        config.c,
                        config.training_iterations,
                        &mut weights,
                        &mut state.rng,
                    ),
                    TrainingMode::Mixed {
                        rank_step_probability,
                    } => stochastic_classification_and_roc_loop(
                        &examples,
                        config.learner,
                        config.eta,
                        config.lambda,
                        config.c,
                        rank_step_probability,
                        config.training_iterations,
                        &mut weights,
                        &mut state.rng,
                    ),
                    TrainingMode::Roc => unreachable!(),
                }
            }
        }

        // Score everything whose parent document is unjudged; keep the top
        // k, one entry per parent.
        let view = self.view.as_ref();
        let judgments = &state.judgments;
        let ranked = score_top_k(
            view,
            &weights,
            k.saturating_mul(DEDUP_OVERSAMPLE),
            config.num_threads,
            |p| judgments.contains_key(&view.parent_of(p)),
        );

        let mut batch = Vec::with_capacity(k.min(ranked.len()));
        let mut seen_parents = FxHashSet::default();
        for (p, _) in ranked {
            if seen_parents.insert(view.parent_of(p)) {
                batch.push(p);
                if batch.len() == k {
                    break;
                }
            }
        }

        state.weights = weights;
        batch
    }
}
