//! Similarity Engine
//!
//! Scores one content item against one user's interest set, blending TF-IDF
//! cosine similarity with weighted tag overlap. Output is always in [0, 1].

use crate::config::SimilarityConfig;
use crate::model::{ContentItem, TopicWeight};
use crate::text::SparseVector;

/// Breakdown of a relevance computation, kept so the hybrid scorer can
/// attribute the dominant signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Relevance {
    pub score: f64,
    pub text: f64,
    pub tag: f64,
}

/// Content-to-interest similarity scoring
#[derive(Debug, Clone, Default)]
pub struct SimilarityEngine {
    config: SimilarityConfig,
}

impl SimilarityEngine {
    pub fn new(config: SimilarityConfig) -> Self {
        Self { config }
    }

    /// Cosine between the item's TF-IDF vector and the user's synthetic
    /// interest vector. Empty or zero-length content text scores 0.
    pub fn text_similarity(&self, item: &ContentItem, interest_vec: &SparseVector) -> f64 {
        item.features.cosine(interest_vec)
    }

    /// Fraction of the item's tags matching a user topic (case-insensitive
    /// exact string), each match weighted by the topic's weight and
    /// normalized by the user's total weight.
    pub fn tag_overlap(&self, tags: &[String], interests: &[TopicWeight]) -> f64 {
        if tags.is_empty() {
            return 0.0;
        }
        let total_weight: f64 = interests.iter().map(|t| t.weight).sum();
        if total_weight <= 0.0 {
            return 0.0;
        }
        let matched: f64 = tags
            .iter()
            .map(|tag| {
                let tag = tag.to_lowercase();
                interests
                    .iter()
                    .find(|t| t.topic.to_lowercase() == tag)
                    .map(|t| t.weight)
                    .unwrap_or(0.0)
            })
            .sum();
        (matched / (total_weight * tags.len() as f64)).clamp(0.0, 1.0)
    }

    /// Blended relevance with the configured text/tag split.
    pub fn relevance(
        &self,
        item: &ContentItem,
        interest_vec: &SparseVector,
        interests: &[TopicWeight],
    ) -> Relevance {
        self.relevance_with_split(item, interest_vec, interests, self.config.tag_weight)
    }

    /// Blended relevance with an explicit tag share (the hybrid scorer shifts
    /// the split toward tags on cold start).
    ///
    /// Empty interest set scores 0 for every item; an item with no text
    /// features falls back entirely onto tag overlap.
    pub fn relevance_with_split(
        &self,
        item: &ContentItem,
        interest_vec: &SparseVector,
        interests: &[TopicWeight],
        tag_split: f64,
    ) -> Relevance {
        if interests.is_empty() || interests.iter().all(|t| t.weight <= 0.0) {
            return Relevance::default();
        }

        let tag = self.tag_overlap(&item.tags, interests);
        if item.features.is_empty() {
            return Relevance {
                score: tag,
                text: 0.0,
                tag,
            };
        }

        let text = self.text_similarity(item, interest_vec);
        let score = ((1.0 - tag_split) * text + tag_split * tag).clamp(0.0, 1.0);
        Relevance { score, text, tag }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InterestSource;
    use crate::text::TfidfModel;
    use chrono::Utc;

    fn item(tags: &[&str], features: SparseVector) -> ContentItem {
        ContentItem {
            id: "c1".to_string(),
            title: "test".to_string(),
            url: "https://example.com/1".to_string(),
            source_type: "rss".to_string(),
            author: None,
            published_at: Utc::now(),
            summary: None,
            content_type: "article".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            features,
        }
    }

    fn interests(entries: &[(&str, f64)]) -> Vec<TopicWeight> {
        entries
            .iter()
            .map(|(t, w)| TopicWeight::new(*t, *w, InterestSource::Manual))
            .collect()
    }

    #[test]
    fn test_tag_overlap_weighted_by_topic_weight() {
        let engine = SimilarityEngine::default();
        // Spec scenario: interests {ai: 5, ethics: 2}, item tagged
        // {ai, philosophy}. Only "ai" matches, so the overlap is the ai
        // share of total weight averaged over both tags: (5/7) / 2.
        let interests = interests(&[("ai", 5.0), ("ethics", 2.0)]);
        let overlap = engine.tag_overlap(
            &["ai".to_string(), "philosophy".to_string()],
            &interests,
        );
        assert!((overlap - 0.5 * (5.0 / 7.0)).abs() < 1e-9);
    }

    #[test]
    fn test_tag_overlap_case_insensitive() {
        let engine = SimilarityEngine::default();
        let interests = interests(&[("Rust", 1.0)]);
        let overlap = engine.tag_overlap(&["rust".to_string()], &interests);
        assert!((overlap - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_interest_set_scores_zero() {
        let engine = SimilarityEngine::default();
        let model = TfidfModel::fit(&["ai research"]);
        let item = item(&["ai"], model.transform("ai research"));
        let rel = engine.relevance(&item, &SparseVector::new(), &[]);
        assert_eq!(rel.score, 0.0);
    }

    #[test]
    fn test_empty_text_falls_back_to_tags() {
        let engine = SimilarityEngine::default();
        let interests = interests(&[("ai", 1.0)]);
        let item = item(&["ai"], SparseVector::new());
        let model = TfidfModel::fit(&["ai research"]);
        let interest_vec = model.interest_vector(&interests);

        let rel = engine.relevance(&item, &interest_vec, &interests);
        assert_eq!(rel.text, 0.0);
        // Full weight on tag overlap, not scaled by the 0.4 tag share
        assert!((rel.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_relevance_blends_text_and_tags() {
        let engine = SimilarityEngine::default();
        let model = TfidfModel::fit(&["quantum computing breakthrough", "gardening tips"]);
        let interests = interests(&[("quantum computing", 1.0)]);
        let interest_vec = model.interest_vector(&interests);
        let item = item(
            &["physics"],
            model.transform("quantum computing breakthrough"),
        );

        let rel = engine.relevance(&item, &interest_vec, &interests);
        assert!(rel.text > 0.0);
        assert_eq!(rel.tag, 0.0);
        assert!((rel.score - 0.6 * rel.text).abs() < 1e-9);
        assert!(rel.score <= 1.0);
    }

    #[test]
    fn test_cold_start_split_favors_tags() {
        let engine = SimilarityEngine::default();
        let model = TfidfModel::fit(&["ai research", "gardening tips"]);
        let interests = interests(&[("ai", 1.0)]);
        let interest_vec = model.interest_vector(&interests);
        let item = item(&["ai"], model.transform("gardening tips"));

        let default_split = engine.relevance(&item, &interest_vec, &interests);
        let cold = engine.relevance_with_split(&item, &interest_vec, &interests, 0.7);
        assert!(cold.score > default_split.score);
    }
}
