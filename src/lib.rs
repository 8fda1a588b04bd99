//! Gator recommendation engine library crate
//!
//! A hybrid recommendation and interest-graph engine: TF-IDF and tag
//! similarity, collaborative co-interaction signals, and novel topic bridge
//! discovery blended into one ranked feed per user.

pub mod collaborative;
pub mod config;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod graph;
pub mod metrics;
pub mod model;
pub mod scorer;
pub mod similarity;
pub mod store;
pub mod text;

// Re-export commonly used types
pub use collaborative::CollaborativeModel;
pub use config::EngineConfig;
pub use engine::RecommendationEngine;
pub use error::{Error, Result};
pub use feedback::FeedbackUpdater;
pub use graph::{BridgeParams, InterestGraph};
pub use model::{
    Algorithm, Bridge, ContentId, ContentItem, InteractionEvent, InteractionType, InterestSource,
    Recommendations, ScoredContent, TopicWeight, UserId,
};
pub use scorer::HybridScorer;
pub use similarity::SimilarityEngine;
pub use store::{ContentIndex, InteractionLog, InterestStore, MemoryStore};
pub use text::{SparseVector, TfidfModel};
