//! Domain model for the Gator engine
//!
//! Users carry a weighted topic set, content items carry tags and precomputed
//! TF-IDF features, and interactions are an append-only event log. These types
//! cross the API boundary as JSON, so everything public derives serde.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;
use crate::text::SparseVector;

/// User identifier. Opaque to the engine; assigned by the auth layer.
pub type UserId = String;

/// Content identifier. Assigned by the ingestion layer, deduplicated by URL
/// before reaching the engine.
pub type ContentId = String;

/// Where an interest weight came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestSource {
    /// User added the topic explicitly
    Manual,
    /// Learned from interaction feedback
    Passive,
    /// Seeded during onboarding
    Onboarding,
}

/// One weighted topic in a user's interest set.
///
/// Invariant: at most one entry per (user, topic) pair; updates merge into
/// the existing entry rather than duplicating it. Weight never goes negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicWeight {
    pub topic: String,
    pub weight: f64,
    pub source: InterestSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TopicWeight {
    pub fn new(topic: impl Into<String>, weight: f64, source: InterestSource) -> Self {
        let now = Utc::now();
        Self {
            topic: topic.into(),
            weight: weight.max(0.0),
            source,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A signed adjustment to one user-topic weight, applied atomically as part
/// of the full multi-topic update for a single feedback event.
#[derive(Debug, Clone)]
pub struct InterestDelta {
    pub topic: String,
    pub delta: f64,
    pub source: InterestSource,
}

/// A normalized content record as produced by the ingestion layer.
///
/// Immutable once ingested, except for tag reassignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,
    pub title: String,
    /// Canonical URL, unique upstream
    pub url: String,
    pub source_type: String,
    pub author: Option<String>,
    pub published_at: DateTime<Utc>,
    pub summary: Option<String>,
    pub content_type: String,
    /// Assigned tags, lowercase
    pub tags: Vec<String>,
    /// Precomputed TF-IDF feature vector (sparse term -> weight)
    pub features: SparseVector,
}

/// Interaction types the engine accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    View,
    Like,
    Dislike,
    Share,
    Bookmark,
}

impl InteractionType {
    /// Positive interactions drive graph edge strengthening; views and
    /// dislikes do not.
    pub fn is_positive(self) -> bool {
        matches!(self, Self::Like | Self::Bookmark | Self::Share)
    }
}

impl std::fmt::Display for InteractionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InteractionType::View => "view",
            InteractionType::Like => "like",
            InteractionType::Dislike => "dislike",
            InteractionType::Share => "share",
            InteractionType::Bookmark => "bookmark",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for InteractionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Self::View),
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            "share" => Ok(Self::Share),
            "bookmark" => Ok(Self::Bookmark),
            other => Err(Error::validation(format!(
                "unknown interaction type: {}",
                other
            ))),
        }
    }
}

/// One append-only interaction event. Never mutated after append; drives
/// both interest-weight updates and collaborative signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub user_id: UserId,
    pub content_id: ContentId,
    pub interaction_type: InteractionType,
    pub duration_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl InteractionEvent {
    pub fn new(
        user_id: impl Into<UserId>,
        content_id: impl Into<ContentId>,
        interaction_type: InteractionType,
        duration_ms: Option<i64>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            content_id: content_id.into(),
            interaction_type,
            duration_ms,
            created_at: Utc::now(),
        }
    }
}

/// Which signal produced a recommendation. Closed set so the scorer's
/// contribution sources are exhaustively known at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// TF-IDF text similarity dominated
    TextSimilarity,
    /// Tag-overlap similarity dominated
    TagOverlap,
    /// Collaborative affinity dominated
    Collaborative,
    /// Graph bridge boost dominated
    GraphBoost,
    /// Reserved discovery slot, selected by novelty rather than raw score
    Exploration,
    /// Blended score with no single dominant signal
    Hybrid,
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Algorithm::TextSimilarity => "text_similarity",
            Algorithm::TagOverlap => "tag_overlap",
            Algorithm::Collaborative => "collaborative",
            Algorithm::GraphBoost => "graph_boost",
            Algorithm::Exploration => "exploration",
            Algorithm::Hybrid => "hybrid",
        };
        write!(f, "{}", s)
    }
}

/// A scored, ranked recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredContent {
    pub content_id: ContentId,
    pub score: f64,
    pub algorithm: Algorithm,
}

/// Serving-time record of a recommendation. Write-once; `clicked` flips
/// false -> true at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub user_id: UserId,
    pub content_id: ContentId,
    pub score: f64,
    pub algorithm: Algorithm,
    pub served_at: DateTime<Utc>,
    pub clicked: bool,
}

/// The result of a scoring call. `truncated` is set when a caller-specified
/// deadline expired and only the already-scored prefix was ranked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendations {
    pub items: Vec<ScoredContent>,
    pub truncated: bool,
}

/// A novel cross-topic connection surfaced for discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bridge {
    /// Endpoints in alphabetical order for determinism
    pub topic_a: String,
    pub topic_b: String,
    /// 1 - direct edge strength (1.0 when no direct edge exists)
    pub novelty: f64,
    /// Product of edge strengths along the best shortest path
    pub path_strength: f64,
    /// novelty * path_strength, the ranking key
    pub score: f64,
    /// Topics along the connecting path, endpoints included
    pub path: Vec<String>,
    /// Content items whose tags cover both endpoints
    pub supporting_content: Vec<ContentId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_type_roundtrip() {
        for t in [
            InteractionType::View,
            InteractionType::Like,
            InteractionType::Dislike,
            InteractionType::Share,
            InteractionType::Bookmark,
        ] {
            let parsed: InteractionType = t.to_string().parse().unwrap();
            assert_eq!(parsed, t);
        }
        assert!("purchase".parse::<InteractionType>().is_err());
    }

    #[test]
    fn test_positive_interactions() {
        assert!(InteractionType::Like.is_positive());
        assert!(InteractionType::Bookmark.is_positive());
        assert!(InteractionType::Share.is_positive());
        assert!(!InteractionType::View.is_positive());
        assert!(!InteractionType::Dislike.is_positive());
    }

    #[test]
    fn test_topic_weight_floors_at_zero() {
        let tw = TopicWeight::new("rust", -0.5, InterestSource::Passive);
        assert_eq!(tw.weight, 0.0);
    }
}
