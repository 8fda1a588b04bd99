//! Metrics and performance monitoring
//!
//! Per-request metrics for recommendation quality and latency. These
//! utilities are used for monitoring and debugging recommendation quality.

#![allow(dead_code)] // Metrics are used selectively during profiling

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

use crate::model::{Algorithm, Recommendations};

/// Metrics for a single recommendation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationMetrics {
    pub user_id: String,
    pub request_id: String,
    pub timestamp: i64,

    // Performance
    pub total_duration_ms: u64,
    pub scoring_duration_ms: u64,
    pub truncated: bool,

    // Quality
    pub candidates_considered: usize,
    pub recommendations_returned: usize,
    pub avg_score: f64,
    /// algorithm label -> count
    pub algorithm_distribution: HashMap<String, usize>,
    pub exploration_count: usize,
}

impl Default for RecommendationMetrics {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            request_id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().timestamp(),
            total_duration_ms: 0,
            scoring_duration_ms: 0,
            truncated: false,
            candidates_considered: 0,
            recommendations_returned: 0,
            avg_score: 0.0,
            algorithm_distribution: HashMap::new(),
            exploration_count: 0,
        }
    }
}

impl RecommendationMetrics {
    /// Fold a finished ranking into the quality fields
    pub fn observe(&mut self, result: &Recommendations) {
        self.recommendations_returned = result.items.len();
        self.truncated = result.truncated;
        if !result.items.is_empty() {
            self.avg_score =
                result.items.iter().map(|i| i.score).sum::<f64>() / result.items.len() as f64;
        }
        for item in &result.items {
            *self
                .algorithm_distribution
                .entry(item.algorithm.to_string())
                .or_insert(0) += 1;
            if item.algorithm == Algorithm::Exploration {
                self.exploration_count += 1;
            }
        }
    }
}

/// Performance timer for tracking operation duration
pub struct PerformanceTimer {
    start: Instant,
    label: String,
}

impl PerformanceTimer {
    pub fn new(label: &str) -> Self {
        Self {
            start: Instant::now(),
            label: label.to_string(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn log_if_slow(&self, threshold_ms: u64) {
        let elapsed = self.elapsed_ms();
        if elapsed > threshold_ms {
            tracing::warn!(
                "slow operation: {} took {}ms (threshold: {}ms)",
                self.label,
                elapsed,
                threshold_ms
            );
        }
    }
}

impl Drop for PerformanceTimer {
    fn drop(&mut self) {
        tracing::debug!("{} completed in {}ms", self.label, self.elapsed_ms());
    }
}

/// Recommendation quality heuristics for monitoring dashboards
pub struct QualityAnalyzer;

impl QualityAnalyzer {
    /// Tag diversity of a result set (0-1, higher is better): unique tags
    /// relative to a budget of three tags per recommendation.
    pub fn diversity_score(unique_tags: usize, total_recommendations: usize) -> f64 {
        if total_recommendations == 0 {
            return 0.0;
        }
        (unique_tags as f64 / (total_recommendations as f64 * 3.0)).min(1.0)
    }

    /// Share of recommendations attributed to a personalized signal rather
    /// than discovery or an indistinct blend.
    pub fn personalization_ratio(metrics: &RecommendationMetrics) -> f64 {
        if metrics.recommendations_returned == 0 {
            return 0.0;
        }
        let personalized: usize = metrics
            .algorithm_distribution
            .iter()
            .filter(|(label, _)| {
                label.as_str() != Algorithm::Exploration.to_string()
                    && label.as_str() != Algorithm::Hybrid.to_string()
            })
            .map(|(_, count)| count)
            .sum();
        (personalized as f64 / metrics.recommendations_returned as f64).min(1.0)
    }

    /// Flag quality problems in a finished request
    pub fn detect_issues(metrics: &RecommendationMetrics) -> Vec<String> {
        let mut issues = Vec::new();

        if metrics.total_duration_ms > 200 {
            issues.push(format!("slow response: {}ms", metrics.total_duration_ms));
        }
        if metrics.truncated {
            issues.push("truncated by deadline".to_string());
        }

        let exploration_ratio = metrics.exploration_count as f64
            / metrics.recommendations_returned.max(1) as f64;
        if exploration_ratio > 0.5 {
            issues.push(format!(
                "high exploration ratio: {:.0}%",
                exploration_ratio * 100.0
            ));
        }

        if metrics.recommendations_returned > 0 && metrics.avg_score < 0.1 {
            issues.push(format!("low avg score: {:.2}", metrics.avg_score));
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScoredContent;

    #[test]
    fn test_observe_aggregates_scores_and_labels() {
        let mut metrics = RecommendationMetrics::default();
        metrics.observe(&Recommendations {
            items: vec![
                ScoredContent {
                    content_id: "a".to_string(),
                    score: 0.8,
                    algorithm: Algorithm::TagOverlap,
                },
                ScoredContent {
                    content_id: "b".to_string(),
                    score: 0.4,
                    algorithm: Algorithm::Exploration,
                },
            ],
            truncated: false,
        });

        assert_eq!(metrics.recommendations_returned, 2);
        assert!((metrics.avg_score - 0.6).abs() < 1e-9);
        assert_eq!(metrics.exploration_count, 1);
        assert_eq!(metrics.algorithm_distribution["tag_overlap"], 1);
    }

    #[test]
    fn test_quality_helpers() {
        assert_eq!(QualityAnalyzer::diversity_score(30, 10), 1.0);
        assert!(QualityAnalyzer::diversity_score(3, 10) < 0.2);
        assert_eq!(QualityAnalyzer::diversity_score(5, 0), 0.0);

        let mut metrics = RecommendationMetrics::default();
        metrics.recommendations_returned = 4;
        metrics.algorithm_distribution.insert("tag_overlap".to_string(), 2);
        metrics.algorithm_distribution.insert("exploration".to_string(), 1);
        metrics.algorithm_distribution.insert("hybrid".to_string(), 1);
        assert!((QualityAnalyzer::personalization_ratio(&metrics) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_detect_issues() {
        let mut metrics = RecommendationMetrics::default();
        metrics.recommendations_returned = 10;
        metrics.total_duration_ms = 250;
        metrics.exploration_count = 8;
        metrics.avg_score = 0.05;

        let issues = QualityAnalyzer::detect_issues(&metrics);
        assert!(issues.iter().any(|i| i.contains("slow response")));
        assert!(issues.iter().any(|i| i.contains("high exploration")));
        assert!(issues.iter().any(|i| i.contains("low avg score")));
    }

    #[test]
    fn test_observe_empty_result() {
        let mut metrics = RecommendationMetrics::default();
        metrics.observe(&Recommendations {
            items: Vec::new(),
            truncated: true,
        });
        assert_eq!(metrics.avg_score, 0.0);
        assert!(metrics.truncated);
    }
}
