//! Recommendation engine facade
//!
//! Wires the interest store, content index, interaction log, interest graph,
//! and scoring pipeline together behind the three public operations:
//! `recommend`, `record_feedback`, and `find_bridges`, plus onboarding.
//!
//! Scoring is CPU-bound (rayon over candidates), so it runs inside
//! `spawn_blocking` and never stalls the async runtime.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::collaborative::CollaborativeModel;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::feedback::FeedbackUpdater;
use crate::graph::{BridgeParams, InterestGraph};
use crate::metrics::{PerformanceTimer, RecommendationMetrics};
use crate::model::{
    Bridge, ContentId, ContentItem, InteractionType, InterestSource, RecommendationRecord,
    Recommendations, TopicWeight, UserId,
};
use crate::scorer::{HybridScorer, ScoringContext};
use crate::similarity::SimilarityEngine;
use crate::store::{ContentIndex, InteractionLog, InterestStore, MemoryStore};
use crate::text::TfidfModel;

/// Latency above which a recommendation request is logged as slow
const SLOW_REQUEST_MS: u64 = 200;

/// The hybrid recommendation engine.
///
/// Storage is injected behind traits; [`RecommendationEngine::in_memory`]
/// wires everything to a single [`MemoryStore`].
pub struct RecommendationEngine {
    interests: Arc<dyn InterestStore>,
    content: Arc<dyn ContentIndex>,
    log: Arc<dyn InteractionLog>,
    graph: Arc<InterestGraph>,
    updater: FeedbackUpdater,
    config: EngineConfig,
}

impl RecommendationEngine {
    pub fn new(
        interests: Arc<dyn InterestStore>,
        content: Arc<dyn ContentIndex>,
        log: Arc<dyn InteractionLog>,
        config: EngineConfig,
    ) -> Self {
        let graph = Arc::new(InterestGraph::new());
        let updater = FeedbackUpdater::new(
            interests.clone(),
            content.clone(),
            log.clone(),
            graph.clone(),
            config.graph.clone(),
        );
        Self {
            interests,
            content,
            log,
            graph,
            updater,
            config,
        }
    }

    /// Engine backed entirely by one in-memory store
    pub fn in_memory(config: EngineConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(store.clone(), store.clone(), store, config)
    }

    pub fn graph(&self) -> &Arc<InterestGraph> {
        &self.graph
    }

    /// Seed a new user's interest set from onboarding topic picks.
    ///
    /// Each topic starts at weight 1.0, and the picked topics co-occur in the
    /// interest graph.
    pub async fn onboard(&self, user_id: &UserId, topics: &[&str]) -> Result<Vec<TopicWeight>> {
        if topics.is_empty() {
            return Err(Error::validation("onboarding requires at least one topic"));
        }
        for topic in topics {
            if topic.trim().is_empty() {
                return Err(Error::validation("onboarding topics must be non-empty"));
            }
        }

        for topic in topics {
            self.interests
                .set_interest(user_id, topic, 1.0, InterestSource::Onboarding)
                .await?;
        }
        self.graph.link_topics(topics, self.config.graph.edge_increment);

        info!(
            user_id = user_id.as_str(),
            topics = topics.len(),
            "user onboarded"
        );
        self.interests.interests(user_id).await
    }

    /// Add or replace a content item in the index
    pub async fn add_content(&self, item: ContentItem) -> Result<()> {
        if item.id.is_empty() {
            return Err(Error::validation("content id must be non-empty"));
        }
        self.content.upsert(item).await
    }

    /// Rank a candidate pool for one user.
    ///
    /// A user with no interests gets an empty result, not an error. When
    /// `timeout` expires mid-scoring, the already-scored prefix is ranked and
    /// returned with `truncated` set. Served items are recorded for later
    /// click attribution.
    pub async fn recommend(
        &self,
        user_id: &UserId,
        candidate_ids: &[ContentId],
        count: usize,
        timeout: Option<Duration>,
    ) -> Result<Recommendations> {
        let timer = PerformanceTimer::new("recommend");
        let deadline = timeout.map(|t| Instant::now() + t);

        let interests = self.interests.interests(user_id).await?;
        if interests.iter().all(|t| t.weight <= 0.0) {
            debug!(user_id = user_id.as_str(), "no interests, empty result");
            return Ok(Recommendations {
                items: Vec::new(),
                truncated: false,
            });
        }

        let candidates = self.content.get_many(candidate_ids).await?;
        let exclude = self.log.interacted_content(user_id).await?;
        let events = self.log.all_events().await?;
        let collaborative = CollaborativeModel::build(&events, self.config.collaborative.clone());
        let bridges = self.graph.find_bridges(
            &interests,
            BridgeParams {
                known_threshold: self.config.graph.known_threshold,
                max_hops: self.config.graph.max_hops,
                min_novelty: 0.0,
            },
        );

        let result = self
            .score_blocking(
                user_id.clone(),
                interests,
                candidates,
                collaborative,
                bridges,
                exclude,
                count,
                deadline,
            )
            .await?;

        let mut metrics = RecommendationMetrics::default();
        metrics.user_id = user_id.clone();
        metrics.candidates_considered = candidate_ids.len();
        metrics.observe(&result);
        metrics.total_duration_ms = timer.elapsed_ms();
        debug!(
            user_id = user_id.as_str(),
            returned = metrics.recommendations_returned,
            avg_score = metrics.avg_score,
            truncated = metrics.truncated,
            "recommendation request complete"
        );

        let served_at = chrono::Utc::now();
        let records: Vec<RecommendationRecord> = result
            .items
            .iter()
            .map(|item| RecommendationRecord {
                user_id: user_id.clone(),
                content_id: item.content_id.clone(),
                score: item.score,
                algorithm: item.algorithm,
                served_at,
                clicked: false,
            })
            .collect();
        if !records.is_empty() {
            self.log.record_served(records).await?;
        }

        timer.log_if_slow(SLOW_REQUEST_MS);
        Ok(result)
    }

    /// Record one feedback event: append to the log, fold the deltas into the
    /// user's interests, strengthen the graph on positive signals, and mark
    /// the served recommendation clicked.
    ///
    /// `interaction` is the wire-format name ("view", "like", "dislike",
    /// "share", "bookmark"); anything else is rejected before any mutation.
    pub async fn record_feedback(
        &self,
        user_id: &UserId,
        content_id: &ContentId,
        interaction: &str,
        duration_ms: Option<i64>,
    ) -> Result<Vec<TopicWeight>> {
        let interaction: InteractionType = interaction.parse()?;
        let updated = self
            .updater
            .apply(user_id, content_id, interaction, duration_ms)
            .await?;
        self.log.mark_clicked(user_id, content_id).await?;
        Ok(updated)
    }

    /// Surface novel topic bridges for one user, strongest first, with
    /// supporting content attached.
    ///
    /// `max_hops` is capped by the configured bound. Fewer than two distinct
    /// weighted topics cannot bridge; the result is empty, not an error.
    pub async fn find_bridges(
        &self,
        user_id: &UserId,
        max_hops: usize,
        min_novelty: f64,
    ) -> Result<Vec<Bridge>> {
        let timer = PerformanceTimer::new("find_bridges");
        let interests = self.interests.interests(user_id).await?;

        let mut bridges = self.graph.find_bridges(
            &interests,
            BridgeParams {
                known_threshold: self.config.graph.known_threshold,
                max_hops: max_hops.clamp(2, self.config.graph.max_hops),
                min_novelty,
            },
        );

        for bridge in &mut bridges {
            bridge.supporting_content = self
                .content
                .items_with_both_tags(&bridge.topic_a, &bridge.topic_b)
                .await?;
        }

        timer.log_if_slow(SLOW_REQUEST_MS);
        Ok(bridges)
    }

    /// Run the CPU-bound ranking off the async runtime
    #[allow(clippy::too_many_arguments)]
    async fn score_blocking(
        &self,
        user_id: UserId,
        interests: Vec<TopicWeight>,
        candidates: Vec<ContentItem>,
        collaborative: CollaborativeModel,
        bridges: Vec<Bridge>,
        exclude: HashSet<ContentId>,
        count: usize,
        deadline: Option<Instant>,
    ) -> Result<Recommendations> {
        let scorer = HybridScorer::new(
            SimilarityEngine::new(self.config.similarity.clone()),
            self.config.scoring.clone(),
        );

        let result = tokio::task::spawn_blocking(move || {
            // Fit over the candidate corpus so the interest vector shares the
            // items' term space; items missing precomputed features get them
            // derived here
            let corpus: Vec<String> = candidates
                .iter()
                .map(|item| match &item.summary {
                    Some(summary) => format!("{} {}", item.title, summary),
                    None => item.title.clone(),
                })
                .collect();
            let model = TfidfModel::fit(&corpus);
            let interest_vec = model.interest_vector(&interests);

            let candidates: Vec<ContentItem> = candidates
                .into_iter()
                .enumerate()
                .map(|(i, mut item)| {
                    if item.features.is_empty() {
                        item.features = model.transform(&corpus[i]);
                    }
                    item
                })
                .collect();

            let ctx = ScoringContext {
                user_id: &user_id,
                interests: &interests,
                interest_vec: &interest_vec,
                collaborative: &collaborative,
                bridges: &bridges,
                exclude: &exclude,
            };
            scorer.rank(&ctx, &candidates, count, deadline)
        })
        .await
        .map_err(|e| anyhow::anyhow!("scoring task failed: {}", e))?;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::SparseVector;
    use chrono::Utc;

    fn item(id: &str, title: &str, tags: &[&str]) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            title: title.to_string(),
            url: format!("https://example.com/{}", id),
            source_type: "rss".to_string(),
            author: None,
            published_at: Utc::now(),
            summary: None,
            content_type: "article".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            features: SparseVector::new(),
        }
    }

    fn engine() -> RecommendationEngine {
        RecommendationEngine::in_memory(EngineConfig::default())
    }

    #[tokio::test]
    async fn test_user_without_interests_gets_empty_result() {
        let engine = engine();
        engine
            .add_content(item("c1", "ai research", &["ai"]))
            .await
            .unwrap();

        let result = engine
            .recommend(&"nobody".to_string(), &["c1".to_string()], 10, None)
            .await
            .unwrap();
        assert!(result.items.is_empty());
        assert!(!result.truncated);
    }

    #[tokio::test]
    async fn test_onboard_then_recommend() {
        let engine = engine();
        let user = "u1".to_string();
        engine.onboard(&user, &["ai", "ethics"]).await.unwrap();
        engine
            .add_content(item("c1", "ai research breakthrough", &["ai"]))
            .await
            .unwrap();
        engine
            .add_content(item("c2", "gardening tips", &["gardening"]))
            .await
            .unwrap();

        let result = engine
            .recommend(&user, &["c1".to_string(), "c2".to_string()], 10, None)
            .await
            .unwrap();
        assert!(!result.items.is_empty());
        assert_eq!(result.items[0].content_id, "c1");
    }

    #[tokio::test]
    async fn test_onboarding_links_picked_topics() {
        let engine = engine();
        let user = "u1".to_string();
        engine.onboard(&user, &["ai", "ethics"]).await.unwrap();
        assert!((engine.graph().strength("ai", "ethics") - 0.05).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_onboard_rejects_empty_topic_list() {
        let engine = engine();
        assert!(engine.onboard(&"u1".to_string(), &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_interaction_type_rejected() {
        let engine = engine();
        let err = engine
            .record_feedback(&"u1".to_string(), &"c1".to_string(), "purchase", None)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_missing_candidates_are_skipped() {
        let engine = engine();
        let user = "u1".to_string();
        engine.onboard(&user, &["ai"]).await.unwrap();
        engine
            .add_content(item("c1", "ai research", &["ai"]))
            .await
            .unwrap();

        let result = engine
            .recommend(&user, &["c1".to_string(), "ghost".to_string()], 10, None)
            .await
            .unwrap();
        assert_eq!(result.items.len(), 1);
    }
}
