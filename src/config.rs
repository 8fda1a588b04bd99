//! Configuration for the Gator engine
//!
//! Strongly-typed configuration with environment variable overrides and
//! validation. Every heuristic constant in the scoring pipeline lives here:
//! the increments, ratios, and thresholds are tuning values subject to
//! empirical adjustment, not fixed contracts.
//!
//! # Example
//! ```no_run
//! use gator::EngineConfig;
//! let config = EngineConfig::from_env().expect("failed to load config");
//! println!("known threshold: {}", config.graph.known_threshold);
//! ```

use crate::error::{Error, Result};
use crate::model::InteractionType;

/// Main engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub similarity: SimilarityConfig,
    pub collaborative: CollaborativeConfig,
    pub graph: GraphConfig,
    pub scoring: ScoringConfig,
}

/// Similarity Engine weights (text vs tag blend)
#[derive(Debug, Clone)]
pub struct SimilarityConfig {
    /// Weight of TF-IDF cosine similarity in the relevance blend
    pub text_weight: f64,
    /// Weight of tag-overlap similarity in the relevance blend
    pub tag_weight: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            text_weight: 0.6,
            tag_weight: 0.4,
        }
    }
}

/// Collaborative Signal Builder configuration
#[derive(Debug, Clone)]
pub struct CollaborativeConfig {
    /// Below this many distinct interactions the signal is treated as
    /// missing (cold start), not defaulted to zero
    pub min_interactions: usize,
    /// Minimum item-item Jaccard overlap for two items to count as related
    pub min_relation: f64,
}

impl Default for CollaborativeConfig {
    fn default() -> Self {
        Self {
            min_interactions: 3,
            min_relation: 0.0,
        }
    }
}

/// Interest Graph and bridge discovery configuration
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Strength added per co-occurrence observation
    pub edge_increment: f64,
    /// Direct edge strength at or above which a pair is "known" and
    /// excluded from bridge discovery
    pub known_threshold: f64,
    /// Maximum path length for bridge discovery
    pub max_hops: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            edge_increment: 0.05,
            known_threshold: 0.3,
            max_hops: 3,
        }
    }
}

/// Hybrid Scorer blend weights and policies
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Weight of the similarity signal in the hybrid blend
    pub similarity_weight: f64,
    /// Weight of the collaborative signal, when available
    pub collaborative_weight: f64,
    /// Weight of the graph-boost signal
    pub graph_weight: f64,
    /// Tag share of the similarity blend when the collaborative signal is
    /// missing; the text share is its complement. Cold-start ranking leans
    /// on tags because interest topics are tag-shaped.
    pub cold_start_tag_split: f64,
    /// Fraction of returned slots reserved for novelty-driven picks
    pub exploration_fraction: f64,
    /// A single signal must contribute at least this share of the final
    /// score to claim the algorithm label; otherwise the label is Hybrid
    pub dominance_ratio: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            similarity_weight: 0.5,
            collaborative_weight: 0.3,
            graph_weight: 0.2,
            cold_start_tag_split: 0.7,
            exploration_fraction: 0.15,
            dominance_ratio: 0.6,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        // Ignore a missing .env file; explicit env vars still apply
        dotenvy::dotenv().ok();

        let config = Self {
            similarity: SimilarityConfig {
                text_weight: get_env_parsed("SIM_TEXT_WEIGHT", 0.6),
                tag_weight: get_env_parsed("SIM_TAG_WEIGHT", 0.4),
            },
            collaborative: CollaborativeConfig {
                min_interactions: get_env_parsed("COLLAB_MIN_INTERACTIONS", 3),
                min_relation: get_env_parsed("COLLAB_MIN_RELATION", 0.0),
            },
            graph: GraphConfig {
                edge_increment: get_env_parsed("GRAPH_EDGE_INCREMENT", 0.05),
                known_threshold: get_env_parsed("GRAPH_KNOWN_THRESHOLD", 0.3),
                max_hops: get_env_parsed("GRAPH_MAX_HOPS", 3),
            },
            scoring: ScoringConfig {
                similarity_weight: get_env_parsed("SCORE_SIMILARITY_WEIGHT", 0.5),
                collaborative_weight: get_env_parsed("SCORE_COLLABORATIVE_WEIGHT", 0.3),
                graph_weight: get_env_parsed("SCORE_GRAPH_WEIGHT", 0.2),
                cold_start_tag_split: get_env_parsed("SCORE_COLD_START_TAG_SPLIT", 0.7),
                exploration_fraction: get_env_parsed("SCORE_EXPLORATION_FRACTION", 0.15),
                dominance_ratio: get_env_parsed("SCORE_DOMINANCE_RATIO", 0.6),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate ranges and blend invariants
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("SIM_TEXT_WEIGHT", self.similarity.text_weight),
            ("SIM_TAG_WEIGHT", self.similarity.tag_weight),
            ("SCORE_SIMILARITY_WEIGHT", self.scoring.similarity_weight),
            (
                "SCORE_COLLABORATIVE_WEIGHT",
                self.scoring.collaborative_weight,
            ),
            ("SCORE_GRAPH_WEIGHT", self.scoring.graph_weight),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig {
                    key,
                    message: format!("must be within [0, 1], got {}", value).into(),
                });
            }
        }

        let sim_sum = self.similarity.text_weight + self.similarity.tag_weight;
        if (sim_sum - 1.0).abs() > 1e-6 {
            return Err(Error::InvalidConfig {
                key: "SIM_TEXT_WEIGHT",
                message: format!("text + tag weights must sum to 1.0, got {}", sim_sum).into(),
            });
        }

        let blend_sum = self.scoring.similarity_weight
            + self.scoring.collaborative_weight
            + self.scoring.graph_weight;
        if (blend_sum - 1.0).abs() > 1e-6 {
            return Err(Error::InvalidConfig {
                key: "SCORE_SIMILARITY_WEIGHT",
                message: format!("blend weights must sum to 1.0, got {}", blend_sum).into(),
            });
        }

        if !(0.0..=1.0).contains(&self.scoring.exploration_fraction) {
            return Err(Error::InvalidConfig {
                key: "SCORE_EXPLORATION_FRACTION",
                message: "must be within [0, 1]".into(),
            });
        }

        if !(0.0..=1.0).contains(&self.graph.known_threshold) {
            return Err(Error::InvalidConfig {
                key: "GRAPH_KNOWN_THRESHOLD",
                message: "must be within [0, 1]".into(),
            });
        }

        if self.graph.edge_increment <= 0.0 || self.graph.edge_increment > 1.0 {
            return Err(Error::InvalidConfig {
                key: "GRAPH_EDGE_INCREMENT",
                message: "must be within (0, 1]".into(),
            });
        }

        if self.graph.max_hops < 2 {
            return Err(Error::InvalidConfig {
                key: "GRAPH_MAX_HOPS",
                message: "bridges require at least one intermediate topic".into(),
            });
        }

        Ok(())
    }
}

/// Per-interaction-type interest weight delta (spec'd feedback constants)
pub fn interest_delta(interaction: InteractionType) -> f64 {
    match interaction {
        InteractionType::Like => 0.3,
        InteractionType::Bookmark => 0.2,
        InteractionType::Share => 0.15,
        InteractionType::View => 0.05,
        InteractionType::Dislike => -0.3,
    }
}

/// Per-interaction-type implicit rating for collaborative filtering
pub fn implicit_rating(interaction: InteractionType) -> f64 {
    match interaction {
        InteractionType::Like => 1.0,
        InteractionType::Bookmark => 0.7,
        InteractionType::Share => 0.5,
        InteractionType::View => 0.2,
        InteractionType::Dislike => -1.0,
    }
}

/// Get and parse environment variable, falling back to a default
fn get_env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
