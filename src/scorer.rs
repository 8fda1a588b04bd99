//! Hybrid Scorer
//!
//! Blends text/tag similarity, collaborative affinity, and a graph-boost
//! term into one ranked list per user. Per-candidate scoring is an
//! order-independent parallel map (rayon); determinism comes from the final
//! sort: score descending, then newer publish timestamp, then content id.
//!
//! A configurable fraction of returned slots is reserved for novelty-driven
//! picks so discovery content is not crowded out by exploitative ranking.
//! Long-running calls honor a caller-specified deadline by returning the
//! already-scored prefix flagged as truncated.

use rayon::prelude::*;
use std::collections::HashSet;
use std::time::Instant;
use tracing::debug;

use crate::collaborative::CollaborativeModel;
use crate::config::ScoringConfig;
use crate::model::{
    Algorithm, Bridge, ContentId, ContentItem, Recommendations, ScoredContent, TopicWeight,
};
use crate::similarity::SimilarityEngine;
use crate::text::SparseVector;

/// Candidates scored between deadline checks
const SCORING_CHUNK: usize = 64;

/// Read-only user state shared across the per-candidate scoring map
pub struct ScoringContext<'a> {
    pub user_id: &'a str,
    pub interests: &'a [TopicWeight],
    pub interest_vec: &'a SparseVector,
    pub collaborative: &'a CollaborativeModel,
    /// Current bridges for this user, strongest first
    pub bridges: &'a [Bridge],
    /// Content the user has already interacted with; never recommended
    pub exclude: &'a HashSet<ContentId>,
}

#[derive(Debug, Clone)]
struct CandidateScore {
    content_id: ContentId,
    score: f64,
    algorithm: Algorithm,
    graph_boost: f64,
    published_at: chrono::DateTime<chrono::Utc>,
}

/// Blends the per-candidate signals into a ranked, deduplicated list
#[derive(Debug, Clone, Default)]
pub struct HybridScorer {
    similarity: SimilarityEngine,
    config: ScoringConfig,
}

impl HybridScorer {
    pub fn new(similarity: SimilarityEngine, config: ScoringConfig) -> Self {
        Self { similarity, config }
    }

    /// Score and rank a candidate pool for one user, up to `count` items.
    ///
    /// Items the user has interacted with are dropped, duplicates are
    /// deduplicated by id, and if `deadline` expires mid-scoring the ranked
    /// prefix is returned with `truncated = true`.
    pub fn rank(
        &self,
        ctx: &ScoringContext<'_>,
        candidates: &[ContentItem],
        count: usize,
        deadline: Option<Instant>,
    ) -> Recommendations {
        let mut seen: HashSet<&str> = HashSet::new();
        let pool: Vec<&ContentItem> = candidates
            .iter()
            .filter(|item| !ctx.exclude.contains(&item.id))
            .filter(|item| seen.insert(item.id.as_str()))
            .collect();

        let mut scored: Vec<CandidateScore> = Vec::with_capacity(pool.len());
        let mut truncated = false;
        for chunk in pool.chunks(SCORING_CHUNK) {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    truncated = true;
                    break;
                }
            }
            scored.extend(
                chunk
                    .par_iter()
                    .map(|item| self.score_candidate(ctx, item))
                    .collect::<Vec<_>>(),
            );
        }

        sort_deterministic(&mut scored);
        let items = self.apply_exploration(scored, count);

        debug!(
            user_id = ctx.user_id,
            candidates = pool.len(),
            returned = items.len(),
            truncated,
            "ranked recommendations"
        );

        Recommendations { items, truncated }
    }

    /// Combine the three signals for one candidate. Pure with respect to
    /// shared state, so the map over candidates is embarrassingly parallel.
    fn score_candidate(&self, ctx: &ScoringContext<'_>, item: &ContentItem) -> CandidateScore {
        let affinity = ctx.collaborative.affinity(&ctx.user_id.to_string(), &item.id);
        let graph_boost = self.graph_boost(ctx.bridges, &item.tags);

        let weights = &self.config;
        let (relevance, score, collab_contrib, sim_weight) = match affinity {
            Some(affinity) => {
                let relevance =
                    self.similarity
                        .relevance(item, ctx.interest_vec, ctx.interests);
                let score = weights.similarity_weight * relevance.score
                    + weights.collaborative_weight * affinity
                    + weights.graph_weight * graph_boost;
                (
                    relevance,
                    score,
                    weights.collaborative_weight * affinity,
                    weights.similarity_weight,
                )
            }
            None => {
                // Missing signal: similarity absorbs the collaborative
                // weight and its internal split shifts toward tags
                let relevance = self.similarity.relevance_with_split(
                    item,
                    ctx.interest_vec,
                    ctx.interests,
                    weights.cold_start_tag_split,
                );
                let sim_weight = weights.similarity_weight + weights.collaborative_weight;
                let score = sim_weight * relevance.score + weights.graph_weight * graph_boost;
                (relevance, score, 0.0, sim_weight)
            }
        };

        let algorithm = self.label(
            sim_weight * relevance.score,
            relevance.text,
            relevance.tag,
            collab_contrib,
            weights.graph_weight * graph_boost,
            score,
        );

        CandidateScore {
            content_id: item.id.clone(),
            score: score.clamp(0.0, 1.0),
            algorithm,
            graph_boost,
            published_at: item.published_at,
        }
    }

    /// Highest applicable bridge score for an item: full score when the tags
    /// cover both endpoints, half when they cover one endpoint plus an
    /// intermediate topic on the bridge path.
    fn graph_boost(&self, bridges: &[Bridge], tags: &[String]) -> f64 {
        if bridges.is_empty() || tags.is_empty() {
            return 0.0;
        }
        let tag_set: HashSet<String> = tags.iter().map(|t| t.to_lowercase()).collect();
        let mut boost: f64 = 0.0;
        for bridge in bridges {
            let endpoints = usize::from(tag_set.contains(&bridge.topic_a))
                + usize::from(tag_set.contains(&bridge.topic_b));
            let candidate = match endpoints {
                2 => bridge.score,
                1 => {
                    let path_hit = bridge.path[1..bridge.path.len().saturating_sub(1)]
                        .iter()
                        .any(|topic| tag_set.contains(topic));
                    if path_hit {
                        bridge.score * 0.5
                    } else {
                        0.0
                    }
                }
                _ => 0.0,
            };
            boost = boost.max(candidate);
        }
        boost.clamp(0.0, 1.0)
    }

    /// Attribute the dominant contributing signal, or Hybrid when no single
    /// signal clears the dominance ratio.
    fn label(
        &self,
        sim_contrib: f64,
        text: f64,
        tag: f64,
        collab_contrib: f64,
        graph_contrib: f64,
        total: f64,
    ) -> Algorithm {
        if total <= 0.0 {
            return Algorithm::Hybrid;
        }
        let threshold = self.config.dominance_ratio * total;
        let max = sim_contrib.max(collab_contrib).max(graph_contrib);
        if max < threshold {
            return Algorithm::Hybrid;
        }
        if max == collab_contrib {
            Algorithm::Collaborative
        } else if max == graph_contrib {
            Algorithm::GraphBoost
        } else if text >= tag {
            Algorithm::TextSimilarity
        } else {
            Algorithm::TagOverlap
        }
    }

    /// Reserve the tail of the result for the strongest graph-boost picks
    /// not already selected on raw score. Fully deterministic.
    fn apply_exploration(
        &self,
        scored: Vec<CandidateScore>,
        count: usize,
    ) -> Vec<ScoredContent> {
        if count == 0 || scored.is_empty() {
            return Vec::new();
        }
        let reserve = ((count as f64) * self.config.exploration_fraction).ceil() as usize;
        let exploit = count.saturating_sub(reserve.min(count));

        let mut result: Vec<ScoredContent> = scored
            .iter()
            .take(exploit)
            .map(|c| ScoredContent {
                content_id: c.content_id.clone(),
                score: c.score,
                algorithm: c.algorithm,
            })
            .collect();

        // Discovery picks from the remainder, by novelty boost
        let mut remainder: Vec<&CandidateScore> = scored.iter().skip(exploit).collect();
        remainder.sort_by(|a, b| {
            b.graph_boost
                .partial_cmp(&a.graph_boost)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.published_at.cmp(&a.published_at))
                .then_with(|| a.content_id.cmp(&b.content_id))
        });

        let mut chosen: HashSet<String> = result.iter().map(|c| c.content_id.clone()).collect();
        for candidate in remainder.iter().filter(|c| c.graph_boost > 0.0) {
            if result.len() >= count {
                break;
            }
            if chosen.insert(candidate.content_id.clone()) {
                result.push(ScoredContent {
                    content_id: candidate.content_id.clone(),
                    score: candidate.score,
                    algorithm: Algorithm::Exploration,
                });
            }
        }

        // Backfill unused discovery slots from the raw ranking
        for candidate in scored.iter().skip(exploit) {
            if result.len() >= count {
                break;
            }
            if chosen.insert(candidate.content_id.clone()) {
                result.push(ScoredContent {
                    content_id: candidate.content_id.clone(),
                    score: candidate.score,
                    algorithm: candidate.algorithm,
                });
            }
        }

        result
    }
}

fn sort_deterministic(scored: &mut [CandidateScore]) {
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.published_at.cmp(&a.published_at))
            .then_with(|| a.content_id.cmp(&b.content_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollaborativeConfig;
    use crate::model::{InterestSource, TopicWeight};
    use crate::text::TfidfModel;
    use chrono::{Duration, Utc};
    use std::time::Duration as StdDuration;

    fn item(id: &str, tags: &[&str], text: &str, model: &TfidfModel, age_hours: i64) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            title: text.to_string(),
            url: format!("https://example.com/{}", id),
            source_type: "rss".to_string(),
            author: None,
            published_at: Utc::now() - Duration::hours(age_hours),
            summary: None,
            content_type: "article".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            features: model.transform(text),
        }
    }

    fn interests(entries: &[(&str, f64)]) -> Vec<TopicWeight> {
        entries
            .iter()
            .map(|(t, w)| TopicWeight::new(*t, *w, InterestSource::Manual))
            .collect()
    }

    struct Fixture {
        interests: Vec<TopicWeight>,
        interest_vec: SparseVector,
        collaborative: CollaborativeModel,
        bridges: Vec<Bridge>,
        exclude: HashSet<ContentId>,
    }

    impl Fixture {
        fn new(model: &TfidfModel, interests_in: Vec<TopicWeight>) -> Self {
            Self {
                interest_vec: model.interest_vector(&interests_in),
                interests: interests_in,
                collaborative: CollaborativeModel::build(&[], CollaborativeConfig::default()),
                bridges: Vec::new(),
                exclude: HashSet::new(),
            }
        }

        fn ctx(&self) -> ScoringContext<'_> {
            ScoringContext {
                user_id: "u1",
                interests: &self.interests,
                interest_vec: &self.interest_vec,
                collaborative: &self.collaborative,
                bridges: &self.bridges,
                exclude: &self.exclude,
            }
        }
    }

    fn scorer() -> HybridScorer {
        HybridScorer::default()
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let model = TfidfModel::fit(&["ai research", "cooking recipes", "space travel"]);
        let fixture = Fixture::new(&model, interests(&[("ai", 2.0), ("space", 1.0)]));
        let candidates = vec![
            item("c1", &["ai"], "ai research", &model, 1),
            item("c2", &["cooking"], "cooking recipes", &model, 2),
            item("c3", &["space"], "space travel", &model, 3),
        ];

        let first = scorer().rank(&fixture.ctx(), &candidates, 10, None);
        let second = scorer().rank(&fixture.ctx(), &candidates, 10, None);
        let ids = |r: &Recommendations| {
            r.items
                .iter()
                .map(|i| i.content_id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn test_interacted_items_excluded() {
        let model = TfidfModel::fit(&["ai research"]);
        let mut fixture = Fixture::new(&model, interests(&[("ai", 1.0)]));
        fixture.exclude.insert("c1".to_string());
        let candidates = vec![
            item("c1", &["ai"], "ai research", &model, 1),
            item("c2", &["ai"], "ai research", &model, 2),
        ];

        let result = scorer().rank(&fixture.ctx(), &candidates, 10, None);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].content_id, "c2");
    }

    #[test]
    fn test_duplicates_removed_and_count_capped() {
        let model = TfidfModel::fit(&["ai research"]);
        let fixture = Fixture::new(&model, interests(&[("ai", 1.0)]));
        let candidates = vec![
            item("c1", &["ai"], "ai research", &model, 1),
            item("c1", &["ai"], "ai research", &model, 1),
            item("c2", &["ai"], "ai research", &model, 2),
            item("c3", &["ai"], "ai research", &model, 3),
        ];

        let result = scorer().rank(&fixture.ctx(), &candidates, 2, None);
        assert_eq!(result.items.len(), 2);
        let ids: HashSet<_> = result.items.iter().map(|i| i.content_id.as_str()).collect();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_ties_broken_by_recency_then_id() {
        let model = TfidfModel::fit(&["ai research"]);
        let fixture = Fixture::new(&model, interests(&[("ai", 1.0)]));
        // Identical content, different ages and ids
        let candidates = vec![
            item("b", &["ai"], "ai research", &model, 5),
            item("a", &["ai"], "ai research", &model, 5),
            item("c", &["ai"], "ai research", &model, 1),
        ];

        let result = scorer().rank(&fixture.ctx(), &candidates, 10, None);
        let ids: Vec<&str> = result.items.iter().map(|i| i.content_id.as_str()).collect();
        // Newest first, then id ascending among equal timestamps
        assert_eq!(ids[0], "c");
        assert_eq!(&ids[1..], &["a", "b"]);
    }

    #[test]
    fn test_expired_deadline_returns_truncated() {
        let model = TfidfModel::fit(&["ai research"]);
        let fixture = Fixture::new(&model, interests(&[("ai", 1.0)]));
        let candidates = vec![item("c1", &["ai"], "ai research", &model, 1)];

        let deadline = Instant::now() - StdDuration::from_millis(1);
        let result = scorer().rank(&fixture.ctx(), &candidates, 10, Some(deadline));
        assert!(result.truncated);
        assert!(result.items.is_empty());
    }

    #[test]
    fn test_exploration_slot_reserved_for_graph_boost() {
        let model = TfidfModel::fit(&["ai research", "bio art essay"]);
        let mut fixture = Fixture::new(&model, interests(&[("ai", 5.0)]));
        fixture.bridges = vec![Bridge {
            topic_a: "art".to_string(),
            topic_b: "biology".to_string(),
            novelty: 1.0,
            path_strength: 0.8,
            score: 0.8,
            path: vec!["art".to_string(), "design".to_string(), "biology".to_string()],
            supporting_content: Vec::new(),
        }];

        // Strong exploit candidates plus one low-scoring bridge item
        let mut candidates: Vec<ContentItem> = (0..9)
            .map(|i| item(&format!("ai{}", i), &["ai"], "ai research", &model, i))
            .collect();
        candidates.push(item("bridge", &["art", "biology"], "bio art essay", &model, 1));

        let result = scorer().rank(&fixture.ctx(), &candidates, 10, None);
        let bridge_pick = result
            .items
            .iter()
            .find(|i| i.content_id == "bridge")
            .expect("bridge item should occupy a discovery slot");
        assert_eq!(bridge_pick.algorithm, Algorithm::Exploration);
    }

    #[test]
    fn test_graph_boost_requires_endpoint_coverage() {
        let scorer = scorer();
        let bridge = Bridge {
            topic_a: "art".to_string(),
            topic_b: "biology".to_string(),
            novelty: 1.0,
            path_strength: 0.5,
            score: 0.5,
            path: vec!["art".to_string(), "design".to_string(), "biology".to_string()],
            supporting_content: Vec::new(),
        };
        let bridges = vec![bridge];

        let both = scorer.graph_boost(&bridges, &["art".to_string(), "biology".to_string()]);
        assert!((both - 0.5).abs() < 1e-9);

        let one_plus_path = scorer.graph_boost(&bridges, &["art".to_string(), "design".to_string()]);
        assert!((one_plus_path - 0.25).abs() < 1e-9);

        let unrelated = scorer.graph_boost(&bridges, &["cooking".to_string()]);
        assert_eq!(unrelated, 0.0);
    }

    #[test]
    fn test_scores_stay_in_unit_interval() {
        let model = TfidfModel::fit(&["ai research"]);
        let fixture = Fixture::new(&model, interests(&[("ai", 100.0)]));
        let candidates = vec![item("c1", &["ai"], "ai research", &model, 1)];

        let result = scorer().rank(&fixture.ctx(), &candidates, 10, None);
        for item in &result.items {
            assert!((0.0..=1.0).contains(&item.score));
        }
    }
}
