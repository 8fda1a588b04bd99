//! Text features: tokenization, sparse vectors, and TF-IDF
//!
//! Content items arrive with precomputed TF-IDF vectors; this module owns the
//! vector type, the cosine math, and a small fit/transform model so the
//! ingestion side (and tests) can produce those vectors in a shared space.
//! Terms outside the fitted vocabulary contribute zero everywhere.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::model::TopicWeight;

/// Minimal English stop-word list. Enough to keep titles and topic strings
/// from matching on glue words.
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "have",
        "how", "in", "is", "it", "its", "of", "on", "or", "that", "the", "this", "to", "was",
        "what", "when", "where", "which", "will", "with", "you", "your",
    ]
    .into_iter()
    .collect()
});

/// Lowercase, split on non-alphanumeric boundaries, drop stop words and
/// one-character fragments.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2 && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Sparse term -> weight vector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector(pub HashMap<String, f64>);

impl SparseVector {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        // Iterate the smaller side
        let (small, large) = if self.0.len() <= other.0.len() {
            (&self.0, &other.0)
        } else {
            (&other.0, &self.0)
        };
        small
            .iter()
            .filter_map(|(term, w)| large.get(term).map(|v| w * v))
            .sum()
    }

    pub fn norm(&self) -> f64 {
        self.0.values().map(|w| w * w).sum::<f64>().sqrt()
    }

    /// Cosine similarity; 0.0 when either vector is empty or zero-length
    pub fn cosine(&self, other: &SparseVector) -> f64 {
        let denom = self.norm() * other.norm();
        if denom == 0.0 {
            return 0.0;
        }
        (self.dot(other) / denom).clamp(0.0, 1.0)
    }

    /// Scale to unit L2 length in place. No-op for the zero vector.
    pub fn normalize(&mut self) {
        let n = self.norm();
        if n > 0.0 {
            for w in self.0.values_mut() {
                *w /= n;
            }
        }
    }
}

impl FromIterator<(String, f64)> for SparseVector {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// TF-IDF vocabulary and document frequencies, fitted over an ingestion corpus
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TfidfModel {
    /// term -> smoothed inverse document frequency
    idf: HashMap<String, f64>,
    documents: usize,
}

impl TfidfModel {
    /// Fit vocabulary and IDF over a corpus of raw documents.
    /// Smoothed IDF: ln((1 + N) / (1 + df)) + 1.
    pub fn fit<S: AsRef<str>>(corpus: &[S]) -> Self {
        let mut df: HashMap<String, usize> = HashMap::new();
        for doc in corpus {
            let unique: HashSet<String> = tokenize(doc.as_ref()).into_iter().collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }
        let n = corpus.len();
        let idf = df
            .into_iter()
            .map(|(term, count)| {
                let v = ((1.0 + n as f64) / (1.0 + count as f64)).ln() + 1.0;
                (term, v)
            })
            .collect();
        Self { idf, documents: n }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// Transform one document into an L2-normalized TF-IDF vector over the
    /// fitted vocabulary. Out-of-vocabulary terms are dropped.
    pub fn transform(&self, text: &str) -> SparseVector {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return SparseVector::new();
        }
        let total = tokens.len() as f64;
        let mut tf: HashMap<String, f64> = HashMap::new();
        for token in tokens {
            if self.idf.contains_key(&token) {
                *tf.entry(token).or_insert(0.0) += 1.0;
            }
        }
        let mut vec: SparseVector = tf
            .into_iter()
            .map(|(term, count)| {
                let idf = self.idf.get(&term).copied().unwrap_or(0.0);
                (term, (count / total) * idf)
            })
            .collect();
        vec.normalize();
        vec
    }

    /// Build the synthetic interest vector for a user: topic strings are
    /// treated as one pseudo-document, each token accumulating its topic's
    /// weight, projected through the fitted IDF so it shares the content
    /// feature space.
    pub fn interest_vector(&self, interests: &[TopicWeight]) -> SparseVector {
        let mut acc: HashMap<String, f64> = HashMap::new();
        for interest in interests {
            if interest.weight <= 0.0 {
                continue;
            }
            for token in tokenize(&interest.topic) {
                if let Some(idf) = self.idf.get(&token) {
                    *acc.entry(token).or_insert(0.0) += interest.weight * idf;
                }
            }
        }
        let mut vec = SparseVector(acc);
        vec.normalize();
        vec
    }
}
