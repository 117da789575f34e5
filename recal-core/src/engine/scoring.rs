//! Parallel top-k scoring over a fixed worker pool
//!
//! The corpus range is partitioned into contiguous chunks, one per worker;
//! each worker scores its chunk into a thread-local bounded min-heap and
//! the heaps are merged after the joins. Ties in score are broken by
//! ascending index, so the result is deterministic for any thread count.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::engine::ScoringView;
use crate::features::WeightVector;
use crate::{ParaIndex, Score};

/// Entry for the top-k min-heap.
#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    index: ParaIndex,
    score: Score,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.index == other.index
    }
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: the weakest entry (lowest score, then highest index)
        // sits on top for O(log k) eviction.
        other
            .score
            .partial_cmp(&self.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Bounded collector for the k highest-scoring indices.
pub struct ScoreCollector {
    heap: BinaryHeap<HeapEntry>,
    k: usize,
}

impl ScoreCollector {
    pub fn new(k: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(k.saturating_add(1)),
            k,
        }
    }

    /// Offer an entry; it is kept iff it beats the current weakest
    /// (score first, lower index on ties).
    pub fn insert(&mut self, index: ParaIndex, score: Score) {
        if self.k == 0 {
            return;
        }
        let entry = HeapEntry { index, score };
        if self.heap.len() < self.k {
            self.heap.push(entry);
        } else if let Some(&weakest) = self.heap.peek() {
            if entry.cmp(&weakest) == Ordering::Less {
                self.heap.pop();
                self.heap.push(entry);
            }
        }
    }

    /// Fold another collector's entries into this one.
    pub fn merge(&mut self, other: ScoreCollector) {
        for entry in other.heap {
            self.insert(entry.index, entry.score);
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Consume into `(index, score)` pairs, best first; ties in score come
    /// out in ascending index order.
    pub fn into_sorted(self) -> Vec<(ParaIndex, Score)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|e| (e.index, e.score))
            .collect()
    }
}

/// Score every non-skipped entry of `view` against `w` and return the top
/// `k` as `(index, score)`, best first. The range `0..view.size()` is
/// partitioned across `num_threads` scoped worker threads.
pub fn score_top_k<V, F>(
    view: &V,
    w: &WeightVector,
    k: usize,
    num_threads: usize,
    skip: F,
) -> Vec<(ParaIndex, Score)>
where
    V: ScoringView + ?Sized,
    F: Fn(ParaIndex) -> bool + Sync,
{
    let size = view.size();
    if size == 0 || k == 0 {
        return Vec::new();
    }

    let threads = num_threads.clamp(1, size);
    let chunk = size.div_ceil(threads);
    let skip = &skip;

    let collectors: Vec<ScoreCollector> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let start = t * chunk;
                let end = ((t + 1) * chunk).min(size);
                scope.spawn(move || {
                    let mut collector = ScoreCollector::new(k);
                    for i in start..end {
                        if skip(i) {
                            continue;
                        }
                        collector.insert(i, w.inner_product(view.vector_at(i)));
                    }
                    collector
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("scoring worker panicked"))
            .collect()
    });

    let mut merged = ScoreCollector::new(k);
    for collector in collectors {
        merged.merge(collector);
    }
    merged.into_sorted()
}
