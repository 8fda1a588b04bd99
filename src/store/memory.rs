//! In-memory storage backend
//!
//! Default backend for tests and single-process deployments. Interest state
//! is sharded per user behind its own mutex, so feedback for one user is
//! serialized while different users update in parallel. Content and the
//! interaction log sit behind read-write locks; scoring only takes read
//! guards.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::error::Result;
use crate::model::{
    ContentId, ContentItem, InteractionEvent, InterestDelta, InterestSource,
    RecommendationRecord, TopicWeight, UserId,
};

use super::{ContentIndex, InteractionLog, InterestStore};

type UserInterests = Arc<Mutex<HashMap<String, TopicWeight>>>;

/// In-memory implementation of all three storage traits
#[derive(Debug, Default)]
pub struct MemoryStore {
    interests: RwLock<HashMap<UserId, UserInterests>>,
    content: RwLock<HashMap<ContentId, ContentItem>>,
    events: RwLock<Vec<InteractionEvent>>,
    served: RwLock<Vec<RecommendationRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the per-user interest shard
    async fn user_shard(&self, user_id: &UserId) -> UserInterests {
        {
            let map = self.interests.read().await;
            if let Some(shard) = map.get(user_id) {
                return Arc::clone(shard);
            }
        }
        let mut map = self.interests.write().await;
        Arc::clone(map.entry(user_id.clone()).or_default())
    }
}

#[async_trait]
impl InterestStore for MemoryStore {
    async fn interests(&self, user_id: &UserId) -> Result<Vec<TopicWeight>> {
        let map = self.interests.read().await;
        match map.get(user_id) {
            Some(shard) => {
                let shard = shard.lock().await;
                let mut out: Vec<TopicWeight> = shard.values().cloned().collect();
                // Stable order for deterministic downstream iteration
                out.sort_by(|a, b| a.topic.cmp(&b.topic));
                Ok(out)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn apply_deltas(
        &self,
        user_id: &UserId,
        deltas: &[InterestDelta],
    ) -> Result<Vec<TopicWeight>> {
        let shard = self.user_shard(user_id).await;
        let mut interests = shard.lock().await;
        for delta in deltas {
            let key = delta.topic.to_lowercase();
            match interests.get_mut(&key) {
                Some(entry) => {
                    entry.weight = (entry.weight + delta.delta).max(0.0);
                    entry.updated_at = Utc::now();
                }
                None if delta.delta > 0.0 => {
                    interests.insert(
                        key.clone(),
                        TopicWeight::new(key, delta.delta, delta.source),
                    );
                }
                // Negative delta on an unknown topic has nothing to decrease
                None => {}
            }
        }
        let mut out: Vec<TopicWeight> = interests.values().cloned().collect();
        out.sort_by(|a, b| a.topic.cmp(&b.topic));
        Ok(out)
    }

    async fn set_interest(
        &self,
        user_id: &UserId,
        topic: &str,
        weight: f64,
        source: InterestSource,
    ) -> Result<()> {
        let shard = self.user_shard(user_id).await;
        let mut interests = shard.lock().await;
        let key = topic.to_lowercase();
        match interests.get_mut(&key) {
            Some(entry) => {
                entry.weight = weight.max(0.0);
                entry.source = source;
                entry.updated_at = Utc::now();
            }
            None => {
                interests.insert(key.clone(), TopicWeight::new(key, weight, source));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ContentIndex for MemoryStore {
    async fn get(&self, content_id: &ContentId) -> Result<Option<ContentItem>> {
        Ok(self.content.read().await.get(content_id).cloned())
    }

    async fn get_many(&self, content_ids: &[ContentId]) -> Result<Vec<ContentItem>> {
        let content = self.content.read().await;
        Ok(content_ids
            .iter()
            .filter_map(|id| content.get(id).cloned())
            .collect())
    }

    async fn items_with_both_tags(&self, topic_a: &str, topic_b: &str) -> Result<Vec<ContentId>> {
        let (a, b) = (topic_a.to_lowercase(), topic_b.to_lowercase());
        let content = self.content.read().await;
        let mut out: Vec<ContentId> = content
            .values()
            .filter(|item| {
                let tags: HashSet<String> =
                    item.tags.iter().map(|t| t.to_lowercase()).collect();
                tags.contains(&a) && tags.contains(&b)
            })
            .map(|item| item.id.clone())
            .collect();
        out.sort();
        Ok(out)
    }

    async fn upsert(&self, item: ContentItem) -> Result<()> {
        self.content.write().await.insert(item.id.clone(), item);
        Ok(())
    }
}

#[async_trait]
impl InteractionLog for MemoryStore {
    async fn append(&self, event: InteractionEvent) -> Result<()> {
        self.events.write().await.push(event);
        Ok(())
    }

    async fn events_for_user(&self, user_id: &UserId) -> Result<Vec<InteractionEvent>> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .filter(|e| &e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn all_events(&self) -> Result<Vec<InteractionEvent>> {
        Ok(self.events.read().await.clone())
    }

    async fn interacted_content(&self, user_id: &UserId) -> Result<HashSet<ContentId>> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .filter(|e| &e.user_id == user_id)
            .map(|e| e.content_id.clone())
            .collect())
    }

    async fn record_served(&self, records: Vec<RecommendationRecord>) -> Result<()> {
        self.served.write().await.extend(records);
        Ok(())
    }

    async fn mark_clicked(&self, user_id: &UserId, content_id: &ContentId) -> Result<()> {
        let mut served = self.served.write().await;
        if let Some(record) = served
            .iter_mut()
            .rev()
            .find(|r| &r.user_id == user_id && &r.content_id == content_id && !r.clicked)
        {
            record.clicked = true;
        }
        Ok(())
    }
}
