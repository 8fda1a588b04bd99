//! Collaborative Signal Builder
//!
//! Derives user-item affinity from other users' interaction patterns via
//! item-item co-interaction. Ratings are implicit (like +1.0, bookmark +0.7,
//! share +0.5, view +0.2, dislike -1.0), summed and clamped per (user, item).
//! Two items are related when overlapping users rated both positively
//! (Jaccard of the positive-rater sets).
//!
//! Cold start is a missing signal, not a zero: below the interaction minimum,
//! or for candidates with no co-interaction neighbors, `affinity` returns
//! `None` and the hybrid blend redistributes its weight.

use std::collections::{HashMap, HashSet};

use crate::config::{implicit_rating, CollaborativeConfig};
use crate::model::{ContentId, InteractionEvent, UserId};

/// Precomputed rating matrix and positive-rater sets, rebuilt from the
/// interaction log per scoring cycle.
#[derive(Debug, Default)]
pub struct CollaborativeModel {
    config: CollaborativeConfig,
    /// user -> item -> clamped implicit rating
    ratings: HashMap<UserId, HashMap<ContentId, f64>>,
    /// item -> users who rated it positively
    positive_raters: HashMap<ContentId, HashSet<UserId>>,
}

impl CollaborativeModel {
    /// Build the model from the full interaction log.
    pub fn build(events: &[InteractionEvent], config: CollaborativeConfig) -> Self {
        let mut ratings: HashMap<UserId, HashMap<ContentId, f64>> = HashMap::new();
        for event in events {
            let entry = ratings
                .entry(event.user_id.clone())
                .or_default()
                .entry(event.content_id.clone())
                .or_insert(0.0);
            *entry = (*entry + implicit_rating(event.interaction_type)).clamp(-1.0, 1.0);
        }

        let mut positive_raters: HashMap<ContentId, HashSet<UserId>> = HashMap::new();
        for (user, items) in &ratings {
            for (item, rating) in items {
                if *rating > 0.0 {
                    positive_raters
                        .entry(item.clone())
                        .or_default()
                        .insert(user.clone());
                }
            }
        }

        Self {
            config,
            ratings,
            positive_raters,
        }
    }

    /// Clamped implicit rating, if the user has interacted with the item
    pub fn rating(&self, user_id: &UserId, content_id: &ContentId) -> Option<f64> {
        self.ratings.get(user_id)?.get(content_id).copied()
    }

    /// Number of distinct items the user has interacted with
    pub fn interaction_count(&self, user_id: &UserId) -> usize {
        self.ratings.get(user_id).map(|m| m.len()).unwrap_or(0)
    }

    /// Item-item relation strength: Jaccard overlap of positive-rater sets
    pub fn relation(&self, item_a: &ContentId, item_b: &ContentId) -> f64 {
        let (Some(raters_a), Some(raters_b)) = (
            self.positive_raters.get(item_a),
            self.positive_raters.get(item_b),
        ) else {
            return 0.0;
        };
        let intersection = raters_a.intersection(raters_b).count();
        let union = raters_a.union(raters_b).count();
        if union == 0 {
            0.0
        } else {
            intersection as f64 / union as f64
        }
    }

    /// Affinity of a user for a candidate item, derived from the user's
    /// positive ratings on items related to the candidate.
    ///
    /// `None` means the signal is missing (cold-start user or a candidate
    /// with no co-interaction neighbors) and must be excluded from the
    /// hybrid blend rather than defaulted to zero.
    pub fn affinity(&self, user_id: &UserId, candidate: &ContentId) -> Option<f64> {
        if self.interaction_count(user_id) < self.config.min_interactions {
            return None;
        }
        let user_ratings = self.ratings.get(user_id)?;

        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        for (item, rating) in user_ratings {
            if item == candidate || *rating <= 0.0 {
                continue;
            }
            let relation = self.relation(candidate, item);
            if relation > self.config.min_relation && relation > 0.0 {
                weighted_sum += rating * relation;
                weight_total += relation;
            }
        }

        if weight_total == 0.0 {
            return None;
        }
        Some((weighted_sum / weight_total).clamp(0.0, 1.0))
    }
}
