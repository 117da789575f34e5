//! Immutable sparse feature vectors
//!
//! A vector is a label plus an ascending-feature-id list of
//! `(feature_id, value)` pairs. The squared norm is computed once at
//! construction and cached. Pairwise operations (signed difference,
//! inner products against a weight vector) walk the two sorted feature
//! lists in lockstep, O(|a| + |b|), without materializing intermediates.

use crate::error::{Error, Result};
use crate::{FeatureId, Score};

/// An immutable sparse feature vector with a label and a document id.
///
/// Feature ids are strictly increasing. The label `y` is ±1/0 for
/// classification or an arbitrary float for regression.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    doc_id: String,
    y: f32,
    features: Vec<(FeatureId, f32)>,
    squared_norm: f32,
}

impl SparseVector {
    /// Build a vector from unordered features. Pairs are sorted by feature
    /// id and duplicate ids are merged by summing their values.
    pub fn from_features(
        doc_id: impl Into<String>,
        y: f32,
        mut features: Vec<(FeatureId, f32)>,
    ) -> Self {
        features.sort_unstable_by_key(|(f, _)| *f);
        let mut merged: Vec<(FeatureId, f32)> = Vec::with_capacity(features.len());
        for (f, v) in features {
            match merged.last_mut() {
                Some((last, acc)) if *last == f => *acc += v,
                _ => merged.push((f, v)),
            }
        }
        let squared_norm = merged.iter().map(|(_, v)| v * v).sum();
        Self {
            doc_id: doc_id.into(),
            y,
            features: merged,
            squared_norm,
        }
    }

    /// Parse a `<label> <fid>:<val> ...` line. Feature ids must be strictly
    /// increasing; violations and malformed pairs are `BadFormat`. The line
    /// number in the returned error is 0; callers parsing whole files
    /// rewrite it.
    pub fn parse(line: &str) -> Result<Self> {
        let mut tokens = line.split_whitespace();
        let label = tokens
            .next()
            .ok_or_else(|| bad_format("empty example line"))?;
        let y: f32 = label
            .parse()
            .map_err(|_| bad_format(&format!("invalid label '{label}'")))?;

        let mut features: Vec<(FeatureId, f32)> = Vec::new();
        for token in tokens {
            let (fid, value) = token
                .split_once(':')
                .ok_or_else(|| bad_format(&format!("expected fid:value, got '{token}'")))?;
            let fid: FeatureId = fid
                .parse()
                .map_err(|_| bad_format(&format!("invalid feature id '{fid}'")))?;
            let value: f32 = value
                .parse()
                .map_err(|_| bad_format(&format!("invalid feature value '{value}'")))?;
            if let Some(&(last, _)) = features.last() {
                if fid <= last {
                    return Err(bad_format(&format!(
                        "feature ids must be strictly increasing, {fid} after {last}"
                    )));
                }
            }
            features.push((fid, value));
        }

        let squared_norm = features.iter().map(|(_, v)| v * v).sum();
        Ok(Self {
            doc_id: String::new(),
            y,
            features,
            squared_norm,
        })
    }

    /// Parse a line and attach an external document id.
    pub fn parse_with_id(doc_id: impl Into<String>, line: &str) -> Result<Self> {
        let mut vector = Self::parse(line)?;
        vector.doc_id = doc_id.into();
        Ok(vector)
    }

    /// Canonical serialization, the inverse of [`SparseVector::parse`] for
    /// canonically-formatted input.
    pub fn to_line(&self) -> String {
        let mut line = format!("{}", self.y);
        for (f, v) in &self.features {
            line.push_str(&format!(" {f}:{v}"));
        }
        line
    }

    /// The signed difference `a - b` with label `y`, built by a single merge
    /// walk over the two sorted feature lists.
    pub fn difference(a: &SparseVector, b: &SparseVector, y: f32) -> SparseVector {
        let mut features = Vec::with_capacity(a.features.len() + b.features.len());
        let (mut i, mut j) = (0, 0);
        while i < a.features.len() || j < b.features.len() {
            let a_feature = a.features.get(i).map(|(f, _)| *f);
            let b_feature = b.features.get(j).map(|(f, _)| *f);
            match (a_feature, b_feature) {
                (Some(fa), Some(fb)) if fa == fb => {
                    features.push((fa, a.features[i].1 - b.features[j].1));
                    i += 1;
                    j += 1;
                }
                (Some(fa), Some(fb)) if fa < fb => {
                    features.push((fa, a.features[i].1));
                    i += 1;
                }
                (Some(_), Some(fb)) => {
                    features.push((fb, -b.features[j].1));
                    j += 1;
                }
                (Some(fa), None) => {
                    features.push((fa, a.features[i].1));
                    i += 1;
                }
                (None, Some(fb)) => {
                    features.push((fb, -b.features[j].1));
                    j += 1;
                }
                (None, None) => unreachable!(),
            }
        }
        let squared_norm = features.iter().map(|(_, v)| v * v).sum();
        SparseVector {
            doc_id: String::new(),
            y,
            features,
            squared_norm,
        }
    }

    /// A copy of this vector carrying a different label.
    pub fn with_label(&self, y: f32) -> SparseVector {
        SparseVector { y, ..self.clone() }
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    pub fn feature_at(&self, i: usize) -> FeatureId {
        self.features[i].0
    }

    pub fn value_at(&self, i: usize) -> f32 {
        self.features[i].1
    }

    /// Iterate `(feature_id, value)` pairs in ascending feature order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, f32)> + '_ {
        self.features.iter().copied()
    }

    /// Cached `Σ v²`.
    pub fn squared_norm(&self) -> Score {
        self.squared_norm
    }

    /// One past the highest feature id, or 0 for an empty vector.
    pub fn max_dimension(&self) -> usize {
        self.features.last().map(|(f, _)| *f as usize + 1).unwrap_or(0)
    }
}

fn bad_format(reason: &str) -> Error {
    Error::BadFormat {
        line: 0,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        let line = "1 2:0.5 7:1.25 9:3";
        let vector = SparseVector::parse(line).unwrap();
        assert_eq!(vector.y(), 1.0);
        assert_eq!(vector.num_features(), 3);
        assert_eq!(vector.feature_at(1), 7);
        assert_eq!(vector.value_at(1), 1.25);
        assert_eq!(vector.to_line(), line);
    }

    #[test]
    fn test_parse_rejects_descending_features() {
        let err = SparseVector::parse("1 5:1 3:1").unwrap_err();
        assert!(matches!(err, Error::BadFormat { .. }));
    }

    #[test]
    fn test_parse_rejects_malformed_pair() {
        assert!(SparseVector::parse("1 5").is_err());
        assert!(SparseVector::parse("1 a:1").is_err());
        assert!(SparseVector::parse("x 1:1").is_err());
        assert!(SparseVector::parse("").is_err());
    }

    #[test]
    fn test_squared_norm_cached() {
        let vector = SparseVector::parse("-1 1:3 4:4").unwrap();
        assert!((vector.squared_norm() - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_difference_merges_both_sides() {
        let a = SparseVector::parse("1 1:2 3:1").unwrap();
        let b = SparseVector::parse("-1 2:4 3:0.5").unwrap();
        let d = SparseVector::difference(&a, &b, 1.0);
        let features: Vec<_> = d.iter().collect();
        assert_eq!(features, vec![(1, 2.0), (2, -4.0), (3, 0.5)]);
        assert_eq!(d.y(), 1.0);
    }

    #[test]
    fn test_from_features_sorts_and_merges() {
        let v = SparseVector::from_features("d1", 1.0, vec![(5, 1.0), (2, 2.0), (5, 0.5)]);
        let features: Vec<_> = v.iter().collect();
        assert_eq!(features, vec![(2, 2.0), (5, 1.5)]);
        assert_eq!(v.doc_id(), "d1");
        assert_eq!(v.max_dimension(), 6);
    }
}
