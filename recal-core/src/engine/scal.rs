//! Scalable paragraph CAL with a recall target
//!
//! Layers an adaptive policy over the paragraph engine: the engine aims at
//! a recall goal `N` by judging only a proportional sample of each ranked
//! batch. The running target `T` starts at `N` and doubles whenever the
//! relevant-found count `R` reaches it; the batch size `B` grows by
//! `ceil(B/10)` on every refresh, so each iteration scans a larger pool of
//! candidates while surfacing `ceil(B·N/T)` of them. Non-sampled batch
//! members are marked excluded and never scored again, but contribute
//! nothing to training.

use std::sync::Arc;

use log::{debug, info};
use rand::seq::SliceRandom;

use crate::dataset::{Dataset, ParagraphDataset};
use crate::engine::bmi::{ASSIGNED, BmiState, EXCLUDED};
use crate::engine::{Bmi, BmiConfig, ScoringView};
use crate::error::{Error, Result};
use crate::features::SparseVector;

/// Paragraph CAL with the doubling-target / growing-batch sampling policy.
pub struct BmiParaScal {
    pub(super) inner: Bmi<ParagraphDataset>,
}

impl BmiParaScal {
    /// Create the scalable engine. `recall_goal` is `N`, the number of
    /// relevant documents the session aims to find. The initial iteration
    /// dispenses a full (unsampled) batch; sampling starts with the first
    /// refresh.
    pub fn new(
        seed_vector: SparseVector,
        documents: Arc<Dataset>,
        paragraphs: Arc<ParagraphDataset>,
        recall_goal: usize,
        config: BmiConfig,
    ) -> Result<Self> {
        if recall_goal == 0 {
            return Err(Error::Config("recall goal must be at least 1".to_string()));
        }
        let inner = Bmi::with_paragraphs(seed_vector, documents, paragraphs, config)?;
        {
            let mut state = inner.state.lock();
            state.recall_goal = recall_goal;
            state.target = recall_goal;
            state.relevant_found = 0;
            state.batch_size += state.batch_size.div_ceil(10);
        }
        Ok(Self { inner })
    }

    /// Document ids of the batch currently awaiting judgment.
    pub fn get_next_batch(&self) -> Vec<String> {
        self.inner.get_next_batch()
    }

    /// Ingest assessor labels in list order; unknown document ids are
    /// silently dropped. Once the queue empties, refreshes: doubles `T` if
    /// `R` reached it, retrains at the grown batch size, and queues a
    /// `ceil(B·N/T)`-sized uniform sample of the ranked batch.
    pub fn record_judgment_batch(&self, judgments: &[(String, i32)]) {
        let mut state = self.inner.state.lock();
        for (doc_id, label) in judgments {
            let Some(doc) = self.inner.documents.index_of(doc_id) else {
                debug!("ignoring judgment for unknown document '{doc_id}'");
                continue;
            };
            state.training_cache.insert(doc, *label);
            state.total_judgments += 1;
            if let Some(pos) = state
                .judgment_queue
                .iter()
                .rposition(|&p| self.inner.view.parent_of(p) == doc)
            {
                state.judgment_queue.remove(pos);
                if *label > 0 {
                    state.relevant_found += 1;
                }
            }
        }

        if state.judgment_queue.is_empty() {
            self.refresh(&mut state);
        }
    }

    fn refresh(&self, state: &mut BmiState) {
        info!("Refreshing");
        info!("R = {}", state.relevant_found);
        if state.relevant_found >= state.target {
            state.target *= 2;
            info!("Doubling T to {}", state.target);
        }
        info!("Batch Size = {}", state.batch_size);

        let batch_size = state.batch_size;
        let mut batch = self.inner.perform_training_iteration(state, batch_size);

        let sample_size = (batch_size * state.recall_goal).div_ceil(state.target);
        info!("Sampling {} documents", sample_size);
        batch.shuffle(&mut state.rng);
        for (i, &p) in batch.iter().enumerate() {
            let parent = self.inner.view.parent_of(p);
            if i < sample_size {
                state.judgments.insert(parent, ASSIGNED);
                state.judgment_queue.push(p);
            } else {
                state.judgments.insert(parent, EXCLUDED);
            }
        }
        state.batch_size = batch_size + batch_size.div_ceil(10);
    }

    /// Relevant documents found so far (`R`).
    pub fn relevant_found(&self) -> usize {
        self.inner.state.lock().relevant_found
    }

    /// Current recall target (`T`).
    pub fn target(&self) -> usize {
        self.inner.state.lock().target
    }

    /// Batch size for the next refresh (`B`).
    pub fn batch_size(&self) -> usize {
        self.inner.state.lock().batch_size
    }
}
