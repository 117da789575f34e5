//! Immutable corpora of sparse vectors
//!
//! A `Dataset` is populated once at startup and read-only thereafter, so it
//! is shared by the scoring workers without synchronization. Lookup is O(1)
//! in both directions: external string id → index via an `FxHashMap`,
//! index → vector via the backing `Vec`.

mod paragraph;

pub use paragraph::ParagraphDataset;

use std::io::BufRead;

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::features::SparseVector;
use crate::DocIndex;

/// An append-once ordered collection of sparse vectors keyed by external
/// string id.
#[derive(Debug)]
pub struct Dataset {
    vectors: Vec<SparseVector>,
    index: FxHashMap<String, DocIndex>,
    dimensions: usize,
}

impl Dataset {
    /// Build a dataset from vectors that already carry their document ids.
    /// Ids must be unique; the dataset must be non-empty.
    pub fn new(vectors: Vec<SparseVector>) -> Result<Self> {
        if vectors.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let mut index = FxHashMap::default();
        index.reserve(vectors.len());
        let mut dimensions = 0;
        for (i, vector) in vectors.iter().enumerate() {
            if index.insert(vector.doc_id().to_string(), i).is_some() {
                return Err(Error::DuplicateDocument(vector.doc_id().to_string()));
            }
            dimensions = dimensions.max(vector.max_dimension());
        }
        Ok(Self {
            vectors,
            index,
            dimensions,
        })
    }

    /// Parse a corpus from `<label> <fid>:<val> ...` lines. Blank lines are
    /// ignored; anything else that fails to parse is `BadFormat` carrying
    /// the 1-based line number. Examples are parsed in parallel and receive
    /// their running ordinal (as a string) for a document id.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let lines: Vec<String> = reader.lines().collect::<std::io::Result<_>>()?;
        let examples: Vec<(usize, &str)> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| (i, line.as_str()))
            .collect();

        let vectors: Vec<SparseVector> = examples
            .par_iter()
            .enumerate()
            .map(|(ordinal, &(line_no, line))| {
                SparseVector::parse_with_id(ordinal.to_string(), line).map_err(|e| match e {
                    Error::BadFormat { reason, .. } => Error::BadFormat {
                        line: line_no + 1,
                        reason,
                    },
                    other => other,
                })
            })
            .collect::<Result<_>>()?;

        Self::new(vectors)
    }

    /// Number of vectors.
    pub fn size(&self) -> usize {
        self.vectors.len()
    }

    /// Index of the document with this external id, if present.
    pub fn index_of(&self, doc_id: &str) -> Option<DocIndex> {
        self.index.get(doc_id).copied()
    }

    pub fn vector_at(&self, i: DocIndex) -> &SparseVector {
        &self.vectors[i]
    }

    pub fn vectors(&self) -> &[SparseVector] {
        &self.vectors
    }

    /// One past the highest feature id seen across the corpus.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_from_reader_skips_blank_lines() {
        let text = "1 1:1 3:2\n\n-1 2:0.5\n";
        let dataset = Dataset::from_reader(Cursor::new(text)).unwrap();
        assert_eq!(dataset.size(), 2);
        assert_eq!(dataset.index_of("0"), Some(0));
        assert_eq!(dataset.index_of("1"), Some(1));
        assert_eq!(dataset.index_of("2"), None);
        assert_eq!(dataset.dimensions(), 4);
    }

    #[test]
    fn test_from_reader_reports_line_number() {
        let text = "1 1:1\n-1 3:bad\n";
        let err = Dataset::from_reader(Cursor::new(text)).unwrap_err();
        match err {
            Error::BadFormat { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_new_rejects_duplicate_ids() {
        let vectors = vec![
            SparseVector::from_features("a", 1.0, vec![(1, 1.0)]),
            SparseVector::from_features("a", -1.0, vec![(2, 1.0)]),
        ];
        assert!(matches!(
            Dataset::new(vectors),
            Err(Error::DuplicateDocument(_))
        ));
    }

    #[test]
    fn test_new_rejects_empty() {
        assert!(matches!(Dataset::new(Vec::new()), Err(Error::EmptyDataset)));
    }
}
