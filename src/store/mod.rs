//! Storage seams for the engine
//!
//! The engine holds no hidden process-wide state: interest weights, content,
//! and the interaction log live behind these traits and are injected as
//! handles. Implementations must provide atomic per-key read-modify-write;
//! a failed write never leaves a multi-topic update partially applied.
//! Storage failures surface as the retryable `Error::Storage` variant; the
//! engine performs no internal retries.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use std::collections::HashSet;

use crate::error::Result;
use crate::model::{
    ContentId, ContentItem, InteractionEvent, InterestDelta, InterestSource,
    RecommendationRecord, TopicWeight, UserId,
};

/// Per-user weighted topic state.
///
/// Writes to one user must be serialized (single-writer-per-user); writes to
/// different users may proceed fully in parallel.
#[async_trait]
pub trait InterestStore: Send + Sync {
    /// All interests for a user. Unknown users have an empty set.
    async fn interests(&self, user_id: &UserId) -> Result<Vec<TopicWeight>>;

    /// Apply the full multi-topic update for one feedback event atomically.
    ///
    /// Per delta: an existing (user, topic) entry merges, flooring the new
    /// weight at zero; a missing entry is created at the floored value only
    /// when the delta is positive. Returns the updated interest set.
    async fn apply_deltas(
        &self,
        user_id: &UserId,
        deltas: &[InterestDelta],
    ) -> Result<Vec<TopicWeight>>;

    /// Merge-set a single interest (onboarding and manual edits). Never
    /// duplicates a (user, topic) pair.
    async fn set_interest(
        &self,
        user_id: &UserId,
        topic: &str,
        weight: f64,
        source: InterestSource,
    ) -> Result<()>;
}

/// Read-mostly content and tag data, owned by the ingestion layer.
#[async_trait]
pub trait ContentIndex: Send + Sync {
    async fn get(&self, content_id: &ContentId) -> Result<Option<ContentItem>>;

    async fn get_many(&self, content_ids: &[ContentId]) -> Result<Vec<ContentItem>>;

    /// Content whose tag set covers both topics (case-insensitive); used as
    /// supporting evidence for bridges.
    async fn items_with_both_tags(&self, topic_a: &str, topic_b: &str) -> Result<Vec<ContentId>>;

    /// Insert a new item, or reassign tags on an existing one (the only
    /// permitted mutation after ingest).
    async fn upsert(&self, item: ContentItem) -> Result<()>;
}

/// Append-only interaction log plus serving records.
#[async_trait]
pub trait InteractionLog: Send + Sync {
    /// Append one event. Events are never mutated or deduplicated here;
    /// replayed duplicates double-apply downstream by design.
    async fn append(&self, event: InteractionEvent) -> Result<()>;

    async fn events_for_user(&self, user_id: &UserId) -> Result<Vec<InteractionEvent>>;

    /// Full log, input to the collaborative signal builder.
    async fn all_events(&self) -> Result<Vec<InteractionEvent>>;

    /// Content ids the user has interacted with in any way.
    async fn interacted_content(&self, user_id: &UserId) -> Result<HashSet<ContentId>>;

    /// Write-once serving records for a recommendation response.
    async fn record_served(&self, records: Vec<RecommendationRecord>) -> Result<()>;

    /// Flip the matching served record's clicked flag false -> true, at most
    /// once. A feedback event with no matching record is not an error.
    async fn mark_clicked(&self, user_id: &UserId, content_id: &ContentId) -> Result<()>;
}
