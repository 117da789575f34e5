//! Paragraph corpus with parent-document back-references
//!
//! Paragraphs and documents are kept in two read-only datasets; the
//! paragraph→document relation is an index-valued array, total over the
//! paragraph range.

use std::io::BufRead;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::features::SparseVector;
use crate::{DocIndex, ParaIndex};

/// A dataset of paragraphs plus a total map `paragraph index → parent
/// document index`.
#[derive(Debug)]
pub struct ParagraphDataset {
    paragraphs: Dataset,
    doc_index: Vec<DocIndex>,
}

impl ParagraphDataset {
    /// Build from an explicit `(paragraph_id, document_id)` mapping. The
    /// mapping must cover every paragraph exactly once and reference only
    /// known ids; violations are `BadFormat` with the 1-based entry number.
    pub fn new(
        paragraphs: Dataset,
        documents: &Dataset,
        mapping: &[(String, String)],
    ) -> Result<Self> {
        const UNMAPPED: usize = usize::MAX;
        let mut doc_index = vec![UNMAPPED; paragraphs.size()];

        for (entry, (para_id, doc_id)) in mapping.iter().enumerate() {
            let line = entry + 1;
            let pi = paragraphs.index_of(para_id).ok_or_else(|| Error::BadFormat {
                line,
                reason: format!("unknown paragraph id '{para_id}'"),
            })?;
            let di = documents.index_of(doc_id).ok_or_else(|| Error::BadFormat {
                line,
                reason: format!("unknown document id '{doc_id}'"),
            })?;
            if doc_index[pi] != UNMAPPED {
                return Err(Error::BadFormat {
                    line,
                    reason: format!("paragraph '{para_id}' mapped twice"),
                });
            }
            doc_index[pi] = di;
        }

        if let Some(pi) = doc_index.iter().position(|&d| d == UNMAPPED) {
            return Err(Error::BadFormat {
                line: 0,
                reason: format!(
                    "paragraph '{}' has no document mapping",
                    paragraphs.vector_at(pi).doc_id()
                ),
            });
        }

        Ok(Self {
            paragraphs,
            doc_index,
        })
    }

    /// Parse a two-column `paragraph_id document_id` mapping, one line per
    /// paragraph, blank lines ignored.
    pub fn from_mapping_reader(
        paragraphs: Dataset,
        documents: &Dataset,
        reader: impl BufRead,
    ) -> Result<Self> {
        let mut mapping = Vec::with_capacity(paragraphs.size());
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut columns = trimmed.split_whitespace();
            match (columns.next(), columns.next(), columns.next()) {
                (Some(para_id), Some(doc_id), None) => {
                    mapping.push((para_id.to_string(), doc_id.to_string()));
                }
                _ => {
                    return Err(Error::BadFormat {
                        line: i + 1,
                        reason: "expected two columns: paragraph id, document id".to_string(),
                    });
                }
            }
        }
        Self::new(paragraphs, documents, &mapping)
    }

    /// Parent document index of a paragraph. Total over `0..size()`.
    pub fn translate_index(&self, para: ParaIndex) -> DocIndex {
        self.doc_index[para]
    }

    pub fn size(&self) -> usize {
        self.paragraphs.size()
    }

    pub fn vector_at(&self, i: ParaIndex) -> &SparseVector {
        self.paragraphs.vector_at(i)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.paragraphs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn documents() -> Dataset {
        Dataset::new(vec![
            SparseVector::from_features("d0", 0.0, vec![(1, 1.0)]),
            SparseVector::from_features("d1", 0.0, vec![(2, 1.0)]),
        ])
        .unwrap()
    }

    fn paragraphs() -> Dataset {
        Dataset::new(vec![
            SparseVector::from_features("p0", 0.0, vec![(1, 1.0)]),
            SparseVector::from_features("p1", 0.0, vec![(1, 0.5)]),
            SparseVector::from_features("p2", 0.0, vec![(2, 1.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_mapping_translation_is_total() {
        let mapping = "p0 d0\np1 d0\np2 d1\n";
        let ds =
            ParagraphDataset::from_mapping_reader(paragraphs(), &documents(), Cursor::new(mapping))
                .unwrap();
        assert_eq!(ds.size(), 3);
        assert_eq!(ds.translate_index(0), 0);
        assert_eq!(ds.translate_index(1), 0);
        assert_eq!(ds.translate_index(2), 1);
    }

    #[test]
    fn test_mapping_rejects_missing_paragraph() {
        let mapping = "p0 d0\np2 d1\n";
        let err =
            ParagraphDataset::from_mapping_reader(paragraphs(), &documents(), Cursor::new(mapping))
                .unwrap_err();
        assert!(matches!(err, Error::BadFormat { .. }));
    }

    #[test]
    fn test_mapping_rejects_unknown_document() {
        let err = ParagraphDataset::new(
            paragraphs(),
            &documents(),
            &[
                ("p0".into(), "d0".into()),
                ("p1".into(), "dX".into()),
                ("p2".into(), "d1".into()),
            ],
        )
        .unwrap_err();
        match err {
            Error::BadFormat { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mapping_rejects_duplicates() {
        let err = ParagraphDataset::new(
            paragraphs(),
            &documents(),
            &[
                ("p0".into(), "d0".into()),
                ("p0".into(), "d1".into()),
                ("p2".into(), "d1".into()),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::BadFormat { line: 2, .. }));
    }
}
