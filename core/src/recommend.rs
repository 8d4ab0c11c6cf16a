//! Friend-of-friend recommendations.
//!
//! Candidates for a user are the friends of their friends, minus the user
//! and anyone already a direct friend. Scoring is either the raw mutual-friend
//! count or a weighted blend of mutual count and interest similarity.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;
use tracing::trace;

use crate::graph::{GraphStore, UserId};

/// Weight of each mutual friend in the default weighted score.
pub const MUTUAL_WEIGHT: f64 = 1.0;

/// Weight of interest similarity in the default weighted score.
pub const INTEREST_WEIGHT: f64 = 2.0;

/// Scores closer than this are treated as tied and ordered by ID.
pub const SCORE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutualRecommendation {
    pub user_id: UserId,
    pub mutual_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightedRecommendation {
    pub user_id: UserId,
    pub score: f64,
}

/// Jaccard similarity `|A ∩ B| / |A ∪ B|`; 0 when both sets are empty.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let common = a.intersection(b).count();
    let union = a.len() + b.len() - common;
    if union == 0 {
        0.0
    } else {
        common as f64 / union as f64
    }
}

/// Count mutual friends per candidate. Empty for unknown users.
fn mutual_counts(store: &GraphStore, user: UserId) -> BTreeMap<UserId, usize> {
    let mut counts = BTreeMap::new();
    if !store.contains_user(user) {
        return counts;
    }

    let adj = store.adjacency();
    let friends: HashSet<UserId> = adj.neighbors(user).collect();

    for &friend in &friends {
        for candidate in adj.neighbors(friend) {
            if candidate == user || friends.contains(&candidate) {
                continue;
            }
            *counts.entry(candidate).or_insert(0) += 1;
        }
    }

    counts
}

/// Recommend friends-of-friends ranked by number of mutual friends.
///
/// Ordered by mutual count (descending), then user ID (ascending), truncated
/// to `top_k`.
pub fn recommend_by_mutual(
    store: &GraphStore,
    user: UserId,
    top_k: usize,
) -> Vec<MutualRecommendation> {
    trace!(user, top_k, "recommend_by_mutual");
    let mut results: Vec<MutualRecommendation> = mutual_counts(store, user)
        .into_iter()
        .map(|(user_id, mutual_count)| MutualRecommendation {
            user_id,
            mutual_count,
        })
        .collect();

    results.sort_by(|a, b| {
        b.mutual_count
            .cmp(&a.mutual_count)
            .then(a.user_id.cmp(&b.user_id))
    });
    results.truncate(top_k);
    results
}

/// Recommend friends-of-friends by the default blended score:
/// `MUTUAL_WEIGHT * mutual + INTEREST_WEIGHT * jaccard(user, candidate)`.
pub fn recommend_weighted(
    store: &GraphStore,
    user: UserId,
    top_k: usize,
) -> Vec<WeightedRecommendation> {
    let empty = BTreeSet::new();
    let user_interests = store.interests(user).unwrap_or(&empty);

    recommend_weighted_with(store, user, top_k, |candidate, mutual| {
        let candidate_interests = store.interests(candidate).unwrap_or(&empty);
        MUTUAL_WEIGHT * mutual as f64
            + INTEREST_WEIGHT * jaccard(user_interests, candidate_interests)
    })
}

/// Recommend friends-of-friends scored by `score_fn(candidate, mutual_count)`.
///
/// Ordered by score (descending), then user ID (ascending), truncated to
/// `top_k`. Scores are compared at `SCORE_EPSILON` resolution, so near-equal
/// scores fall back to ID order.
pub fn recommend_weighted_with<F>(
    store: &GraphStore,
    user: UserId,
    top_k: usize,
    score_fn: F,
) -> Vec<WeightedRecommendation>
where
    F: Fn(UserId, usize) -> f64,
{
    trace!(user, top_k, "recommend_weighted");
    let mut results: Vec<WeightedRecommendation> = mutual_counts(store, user)
        .into_iter()
        .map(|(user_id, mutual)| WeightedRecommendation {
            user_id,
            score: score_fn(user_id, mutual),
        })
        .collect();

    results.sort_by(compare_weighted);
    results.truncate(top_k);
    results
}

/// Snap a score to its `SCORE_EPSILON` bucket. NaN sorts below every number.
fn score_bucket(score: f64) -> i64 {
    if score.is_nan() {
        i64::MIN
    } else {
        // `as` saturates, so infinities land on the extremes
        (score / SCORE_EPSILON).round() as i64
    }
}

fn compare_weighted(a: &WeightedRecommendation, b: &WeightedRecommendation) -> Ordering {
    score_bucket(b.score)
        .cmp(&score_bucket(a.score))
        .then(a.user_id.cmp(&b.user_id))
}

/// Friends shared by `a` and `b`, ascending.
pub fn mutual_friends(store: &GraphStore, a: UserId, b: UserId) -> Vec<UserId> {
    let theirs: HashSet<UserId> = store.friends(b).into_iter().collect();
    store
        .friends(a)
        .into_iter()
        .filter(|f| theirs.contains(f))
        .collect()
}

/// Interests held by both `a` and `b`, sorted.
pub fn shared_interests(store: &GraphStore, a: UserId, b: UserId) -> Vec<String> {
    match (store.interests(a), store.interests(b)) {
        (Some(ia), Some(ib)) => ia.intersection(ib).cloned().collect(),
        _ => Vec::new(),
    }
}
