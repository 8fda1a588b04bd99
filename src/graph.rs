//! Interest Graph and bridge discovery
//!
//! Topic-to-topic relationship strengths, built up from co-occurrence: two
//! topics held by the same user, or two tags on the same content item. Edges
//! are symmetric, live in [0, 1], and only ever grow (saturating add, not
//! idempotent: repeated co-occurrence legitimately strengthens an edge).
//!
//! Bridge discovery surfaces pairs of a user's topics that are weakly
//! connected directly but reachable through intermediates within a bounded
//! hop count, ranked by novelty x path strength.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::model::{Bridge, TopicWeight};

/// Parameters for one bridge discovery query
#[derive(Debug, Clone, Copy)]
pub struct BridgeParams {
    /// Direct strength at or above which a pair is already known
    pub known_threshold: f64,
    /// Maximum path length through intermediates
    pub max_hops: usize,
    /// Minimum novelty (1 - direct strength) for a pair to qualify
    pub min_novelty: f64,
}

/// Undirected edge snapshot, for callers that want the raw graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub topic_a: String,
    pub topic_b: String,
    pub strength: f64,
}

/// Shared mutable topic graph. All writes go through the single guarded
/// increment-and-saturate below; concurrent readers never block each other.
#[derive(Debug, Default)]
pub struct InterestGraph {
    /// Symmetric adjacency: topic -> neighbor -> strength
    adjacency: RwLock<HashMap<String, HashMap<String, f64>>>,
}

impl InterestGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strengthen the edge between two topics, saturating at 1.0.
    /// Self-pairs are ignored. Topics are compared case-insensitively.
    pub fn strengthen(&self, topic_a: &str, topic_b: &str, increment: f64) {
        let a = topic_a.to_lowercase();
        let b = topic_b.to_lowercase();
        if a == b || increment <= 0.0 {
            return;
        }
        let mut adjacency = self.adjacency.write().unwrap_or_else(|e| e.into_inner());
        let current = adjacency
            .get(&a)
            .and_then(|n| n.get(&b))
            .copied()
            .unwrap_or(0.0);
        let updated = (current + increment).min(1.0);
        adjacency
            .entry(a.clone())
            .or_default()
            .insert(b.clone(), updated);
        adjacency.entry(b).or_default().insert(a, updated);
    }

    /// Direct edge strength; 0.0 for pairs never seen together (not an error)
    pub fn strength(&self, topic_a: &str, topic_b: &str) -> f64 {
        let a = topic_a.to_lowercase();
        let b = topic_b.to_lowercase();
        let adjacency = self.adjacency.read().unwrap_or_else(|e| e.into_inner());
        adjacency
            .get(&a)
            .and_then(|n| n.get(&b))
            .copied()
            .unwrap_or(0.0)
    }

    /// Neighbors of a topic with their edge strengths, strongest first
    pub fn neighbors(&self, topic: &str) -> Vec<(String, f64)> {
        let adjacency = self.adjacency.read().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<(String, f64)> = adjacency
            .get(&topic.to_lowercase())
            .map(|n| n.iter().map(|(t, s)| (t.clone(), *s)).collect())
            .unwrap_or_default();
        out.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        out
    }

    /// Strengthen every pair in one user's interest set (co-occurrence rule)
    pub fn link_interests(&self, interests: &[TopicWeight], increment: f64) {
        let topics: Vec<&str> = interests.iter().map(|t| t.topic.as_str()).collect();
        self.link_topics(&topics, increment);
    }

    /// Strengthen every pair among a set of co-occurring topics or tags
    pub fn link_topics(&self, topics: &[&str], increment: f64) {
        for (i, a) in topics.iter().enumerate() {
            for b in topics.iter().skip(i + 1) {
                self.strengthen(a, b, increment);
            }
        }
    }

    /// Total number of undirected edges
    pub fn edge_count(&self) -> usize {
        let adjacency = self.adjacency.read().unwrap_or_else(|e| e.into_inner());
        adjacency.values().map(|n| n.len()).sum::<usize>() / 2
    }

    /// Snapshot of all edges, deterministic order
    pub fn edges(&self) -> Vec<GraphEdge> {
        let adjacency = self.adjacency.read().unwrap_or_else(|e| e.into_inner());
        let mut out = Vec::new();
        for (a, neighbors) in adjacency.iter() {
            for (b, strength) in neighbors.iter() {
                if a < b {
                    out.push(GraphEdge {
                        topic_a: a.clone(),
                        topic_b: b.clone(),
                        strength: *strength,
                    });
                }
            }
        }
        out.sort_by(|x, y| (&x.topic_a, &x.topic_b).cmp(&(&y.topic_a, &y.topic_b)));
        out
    }

    /// Find novel bridges among a user's interest topics.
    ///
    /// Considers every unordered pair (A, B) of distinct topics whose direct
    /// edge is below the known threshold, and searches for a path through
    /// intermediate topics within the hop bound. Supporting content is
    /// attached by the caller. Returns an empty list when nothing qualifies.
    pub fn find_bridges(&self, interests: &[TopicWeight], params: BridgeParams) -> Vec<Bridge> {
        let mut topics: Vec<String> = interests
            .iter()
            .filter(|t| t.weight > 0.0)
            .map(|t| t.topic.to_lowercase())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        topics.sort();

        let adjacency = self.adjacency.read().unwrap_or_else(|e| e.into_inner());
        let mut bridges = Vec::new();

        for (i, a) in topics.iter().enumerate() {
            for b in topics.iter().skip(i + 1) {
                let direct = adjacency
                    .get(a)
                    .and_then(|n| n.get(b))
                    .copied()
                    .unwrap_or(0.0);
                if direct >= params.known_threshold {
                    continue;
                }
                let novelty = 1.0 - direct;
                if novelty < params.min_novelty {
                    continue;
                }
                if let Some((path, path_strength)) =
                    best_indirect_path(&adjacency, a, b, params.max_hops)
                {
                    bridges.push(Bridge {
                        topic_a: a.clone(),
                        topic_b: b.clone(),
                        novelty,
                        path_strength,
                        score: novelty * path_strength,
                        path,
                        supporting_content: Vec::new(),
                    });
                }
            }
        }

        bridges.sort_by(|x, y| {
            y.score
                .partial_cmp(&x.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| (&x.topic_a, &x.topic_b).cmp(&(&y.topic_a, &y.topic_b)))
        });
        bridges
    }
}

/// Layered BFS from `start` to `goal` that never takes the direct edge.
///
/// Tracks, per node, the best edge-strength product achievable at the minimal
/// depth reaching it. Returns the best path at the first depth that reaches
/// the goal, so the result is a maximum-strength shortest path with at least
/// one intermediate topic.
fn best_indirect_path(
    adjacency: &HashMap<String, HashMap<String, f64>>,
    start: &str,
    goal: &str,
    max_hops: usize,
) -> Option<(Vec<String>, f64)> {
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(start.to_string());

    // node -> (best product, path from start)
    let mut frontier: HashMap<String, (f64, Vec<String>)> = HashMap::new();
    frontier.insert(start.to_string(), (1.0, vec![start.to_string()]));

    for depth in 1..=max_hops {
        let mut next: HashMap<String, (f64, Vec<String>)> = HashMap::new();
        for (node, (product, path)) in &frontier {
            let Some(neighbors) = adjacency.get(node) else {
                continue;
            };
            for (neighbor, strength) in neighbors {
                // The direct edge does not make a bridge
                if depth == 1 && neighbor == goal {
                    continue;
                }
                if visited.contains(neighbor) && neighbor != goal {
                    continue;
                }
                let candidate = product * strength;
                let better = next
                    .get(neighbor)
                    .map(|(p, existing)| {
                        candidate > *p
                            || (candidate == *p
                                && path.as_slice() < &existing[..existing.len() - 1])
                    })
                    .unwrap_or(true);
                if better {
                    let mut new_path = path.clone();
                    new_path.push(neighbor.clone());
                    next.insert(neighbor.clone(), (candidate, new_path));
                }
            }
        }
        if let Some((product, path)) = next.get(goal) {
            return Some((path.clone(), *product));
        }
        for node in next.keys() {
            visited.insert(node.clone());
        }
        frontier = next;
        if frontier.is_empty() {
            return None;
        }
    }
    None
}
