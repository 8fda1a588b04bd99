//! Feedback Updater
//!
//! Turns one interaction event into interest-weight deltas and graph edge
//! updates. Validation happens before any mutation, so a rejected event
//! leaves interests, the event log, and the graph untouched. The multi-topic
//! weight update for one event is applied atomically by the interest store.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{interest_delta, GraphConfig};
use crate::error::{Error, Result};
use crate::graph::InterestGraph;
use crate::model::{
    ContentId, InteractionEvent, InteractionType, InterestDelta, InterestSource, TopicWeight,
    UserId,
};
use crate::store::{ContentIndex, InteractionLog, InterestStore};

/// Applies feedback events to the interest store, interaction log, and
/// interest graph.
pub struct FeedbackUpdater {
    interests: Arc<dyn InterestStore>,
    content: Arc<dyn ContentIndex>,
    log: Arc<dyn InteractionLog>,
    graph: Arc<InterestGraph>,
    config: GraphConfig,
}

impl FeedbackUpdater {
    pub fn new(
        interests: Arc<dyn InterestStore>,
        content: Arc<dyn ContentIndex>,
        log: Arc<dyn InteractionLog>,
        graph: Arc<InterestGraph>,
        config: GraphConfig,
    ) -> Self {
        Self {
            interests,
            content,
            log,
            graph,
            config,
        }
    }

    /// Record one interaction and fold it into the user's interest weights.
    ///
    /// Returns the user's updated interest set. Unknown content or a negative
    /// duration is rejected before anything is written. Replaying the same
    /// event applies the same deltas again; idempotence is the caller's
    /// concern.
    pub async fn apply(
        &self,
        user_id: &UserId,
        content_id: &ContentId,
        interaction: InteractionType,
        duration_ms: Option<i64>,
    ) -> Result<Vec<TopicWeight>> {
        if let Some(duration) = duration_ms {
            if duration < 0 {
                return Err(Error::validation(format!(
                    "duration_ms must be non-negative, got {}",
                    duration
                )));
            }
        }

        let item = self
            .content
            .get(content_id)
            .await?
            .ok_or_else(|| Error::not_found("content", content_id.clone()))?;

        let delta = interest_delta(interaction);
        let deltas: Vec<InterestDelta> = item
            .tags
            .iter()
            .map(|tag| InterestDelta {
                topic: tag.clone(),
                delta,
                source: InterestSource::Passive,
            })
            .collect();

        self.log
            .append(InteractionEvent::new(
                user_id.clone(),
                content_id.clone(),
                interaction,
                duration_ms,
            ))
            .await?;

        let updated = self.interests.apply_deltas(user_id, &deltas).await?;

        // Co-occurring tags reinforce each other only on positive signals
        if interaction.is_positive() && item.tags.len() >= 2 {
            let tags: Vec<&str> = item.tags.iter().map(String::as_str).collect();
            self.graph.link_topics(&tags, self.config.edge_increment);
        }

        if interaction == InteractionType::Dislike {
            warn!(
                user_id = user_id.as_str(),
                content_id = content_id.as_str(),
                "negative feedback recorded"
            );
        }

        debug!(
            user_id = user_id.as_str(),
            content_id = content_id.as_str(),
            interaction = %interaction,
            tags = item.tags.len(),
            "feedback applied"
        );

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContentItem;
    use crate::store::MemoryStore;
    use crate::text::SparseVector;
    use chrono::Utc;

    fn item(id: &str, tags: &[&str]) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            title: id.to_string(),
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

    async fn fixture() -> (Arc<MemoryStore>, Arc<InterestGraph>, FeedbackUpdater) {
        let store = Arc::new(MemoryStore::new());
        let graph = Arc::new(InterestGraph::new());
        let updater = FeedbackUpdater::new(
            store.clone(),
            store.clone(),
            store.clone(),
            graph.clone(),
            GraphConfig::default(),
        );
        (store, graph, updater)
    }

    #[tokio::test]
    async fn test_like_bumps_every_tag() {
        let (store, _, updater) = fixture().await;
        store.upsert(item("c1", &["ai", "ethics"])).await.unwrap();
        let user = "u1".to_string();
        store
            .set_interest(&user, "ai", 5.0, InterestSource::Manual)
            .await
            .unwrap();

        let updated = updater
            .apply(&user, &"c1".to_string(), InteractionType::Like, None)
            .await
            .unwrap();

        let ai = updated.iter().find(|t| t.topic == "ai").unwrap();
        assert!((ai.weight - 5.3).abs() < 1e-9);
        let ethics = updated.iter().find(|t| t.topic == "ethics").unwrap();
        assert!((ethics.weight - 0.3).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_positive_feedback_strengthens_graph_edge() {
        let (store, graph, updater) = fixture().await;
        store.upsert(item("c1", &["ai", "ethics"])).await.unwrap();

        updater
            .apply(
                &"u1".to_string(),
                &"c1".to_string(),
                InteractionType::Like,
                None,
            )
            .await
            .unwrap();

        assert!((graph.strength("ai", "ethics") - 0.05).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_view_and_dislike_leave_graph_alone() {
        let (store, graph, updater) = fixture().await;
        store.upsert(item("c1", &["ai", "ethics"])).await.unwrap();

        for interaction in [InteractionType::View, InteractionType::Dislike] {
            updater
                .apply(&"u1".to_string(), &"c1".to_string(), interaction, None)
                .await
                .unwrap();
        }

        assert_eq!(graph.strength("ai", "ethics"), 0.0);
    }

    #[tokio::test]
    async fn test_dislike_floors_at_zero() {
        let (store, _, updater) = fixture().await;
        store.upsert(item("c1", &["boxing"])).await.unwrap();
        let user = "u1".to_string();
        store
            .set_interest(&user, "boxing", 0.1, InterestSource::Passive)
            .await
            .unwrap();

        let updated = updater
            .apply(&user, &"c1".to_string(), InteractionType::Dislike, None)
            .await
            .unwrap();

        let boxing = updated.iter().find(|t| t.topic == "boxing").unwrap();
        assert_eq!(boxing.weight, 0.0);
    }

    #[tokio::test]
    async fn test_unknown_content_rejected_without_mutation() {
        let (store, graph, updater) = fixture().await;
        let user = "u1".to_string();

        let err = updater
            .apply(&user, &"missing".to_string(), InteractionType::Like, None)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");

        assert!(store.events_for_user(&user).await.unwrap().is_empty());
        assert!(store.interests(&user).await.unwrap().is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[tokio::test]
    async fn test_negative_duration_rejected() {
        let (store, _, updater) = fixture().await;
        store.upsert(item("c1", &["ai"])).await.unwrap();
        let user = "u1".to_string();

        let err = updater
            .apply(&user, &"c1".to_string(), InteractionType::View, Some(-5))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "BAD_REQUEST");
        assert!(store.events_for_user(&user).await.unwrap().is_empty());
    }
}
