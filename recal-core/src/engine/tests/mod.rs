
use std::sync::Arc;

use crate::dataset::{Dataset, ParagraphDataset};
use crate::engine::BmiConfig;
use crate::features::SparseVector;

/// Four documents over three features, from the scoring scenario:
/// d0 = {1:1}, d1 = {2:1}, d2 = {1:1, 2:1}, d3 = {3:1}.
pub(super) fn tiny_corpus() -> Arc<Dataset> {
    Arc::new(
        Dataset::new(vec![
            SparseVector::from_features("d0", 0.0, vec![(1, 1.0)]),
            SparseVector::from_features("d1", 0.0, vec![(2, 1.0)]),
            SparseVector::from_features("d2", 0.0, vec![(1, 1.0), (2, 1.0)]),
            SparseVector::from_features("d3", 0.0, vec![(3, 1.0)]),
        ])
        .unwrap(),
    )
}

pub(super) fn seed_query() -> SparseVector {
    SparseVector::from_features("seed", 1.0, vec![(1, 1.0)])
}

/// A corpus of `n` documents with one distinguishing feature each, plus a
/// shared topic feature on the even-indexed ones, mapped 1:1 to paragraphs.
pub(super) fn topical_corpus(n: usize) -> (Arc<Dataset>, Arc<ParagraphDataset>) {
    let mut docs = Vec::with_capacity(n);
    let mut paras = Vec::with_capacity(n);
    let mut mapping = Vec::with_capacity(n);
    for i in 0..n {
        let mut features = vec![(10 + i as u32, 1.0)];
        if i % 2 == 0 {
            features.push((1, 1.0));
        }
        docs.push(SparseVector::from_features(format!("d{i}"), 0.0, features.clone()));
        paras.push(SparseVector::from_features(format!("p{i}"), 0.0, features));
        mapping.push((format!("p{i}"), format!("d{i}")));
    }
    let documents = Arc::new(Dataset::new(docs).unwrap());
    let paragraphs = Arc::new(
        ParagraphDataset::new(Dataset::new(paras).unwrap(), &documents, &mapping).unwrap(),
    );
    (documents, paragraphs)
}

/// Surface the engine's refresh diagnostics when a test runs with
/// `RUST_LOG` set. Safe to call from every test; only the first init wins.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(super) fn test_config() -> BmiConfig {
    init_logging();
    BmiConfig::default()
        .with_num_threads(2)
        .with_training_iterations(200)
        .with_judgments_per_iteration(1)
}
