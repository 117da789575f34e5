//! Paragraph-granularity CAL
//!
//! Scores at paragraph granularity and judges at document granularity: the
//! top-k heap holds paragraph indices, batches carry at most one paragraph
//! per parent document, and incoming judgments resolve back to whichever
//! matching paragraph is still queued.

use std::sync::Arc;

use crate::dataset::{Dataset, ParagraphDataset};
use crate::engine::{Bmi, BmiConfig};
use crate::error::{Error, Result};
use crate::features::SparseVector;

/// Document-level CAL driven by best-paragraph scores.
pub type BmiPara = Bmi<ParagraphDataset>;

impl Bmi<ParagraphDataset> {
    /// Create a paragraph-granularity engine and run the initial training
    /// iteration. The paragraph dataset must map into `documents`.
    pub fn with_paragraphs(
        seed_vector: SparseVector,
        documents: Arc<Dataset>,
        paragraphs: Arc<ParagraphDataset>,
        config: BmiConfig,
    ) -> Result<Self> {
        let out_of_range = (0..paragraphs.size())
            .any(|p| paragraphs.translate_index(p) >= documents.size());
        if out_of_range {
            return Err(Error::Config(
                "paragraph dataset maps outside the document corpus".to_string(),
            ));
        }
        let bmi = Self::construct(seed_vector, documents, paragraphs, config)?;
        bmi.perform_iteration();
        Ok(bmi)
    }
}
