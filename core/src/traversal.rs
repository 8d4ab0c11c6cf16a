use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;
use tracing::trace;

use crate::graph::{GraphStore, UserId};
use crate::recommend::jaccard;

/// Degree information for a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegreeResult {
    pub user_id: UserId,
    pub degree: usize,
}

/// A user found during a BFS neighborhood walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Neighbor {
    pub user_id: UserId,
    pub distance: u32,
}

/// Shortest path from `src` to `dst` by friendship hops (BFS, unweighted).
///
/// Returns None if either user is unknown or no path exists. The path
/// includes both endpoints; `src == dst` yields `[src]`.
///
/// Neighbors are expanded in ascending ID order, so among equal-length paths
/// the one through the first-discovered parent wins, identically on every run.
pub fn shortest_path(store: &GraphStore, src: UserId, dst: UserId) -> Option<Vec<UserId>> {
    trace!(src, dst, "shortest_path");
    if !store.contains_user(src) || !store.contains_user(dst) {
        return None;
    }
    if src == dst {
        return Some(vec![src]);
    }

    let adj = store.adjacency();

    // BFS with parent tracking: node → parent. The start node is its own parent.
    let mut parent: HashMap<UserId, UserId> = HashMap::new();
    let mut queue: VecDeque<UserId> = VecDeque::new();
    parent.insert(src, src);
    queue.push_back(src);

    while let Some(current) = queue.pop_front() {
        for next in adj.neighbors(current) {
            if parent.contains_key(&next) {
                continue;
            }
            parent.insert(next, current);
            if next == dst {
                return Some(reconstruct_path(&parent, src, dst));
            }
            queue.push_back(next);
        }
    }

    None
}

/// Walk parent pointers from `dst` back to `src`.
fn reconstruct_path(parent: &HashMap<UserId, UserId>, src: UserId, dst: UserId) -> Vec<UserId> {
    let mut path = vec![dst];
    let mut current = dst;
    while current != src {
        current = parent[&current];
        path.push(current);
    }
    path.reverse();
    path
}

/// Partition all users into connected components.
///
/// Each component is sorted ascending; components are ordered by their
/// smallest member. Isolated users form singleton components.
pub fn connected_components(store: &GraphStore) -> Vec<Vec<UserId>> {
    trace!("connected_components");
    let adj = store.adjacency();
    let mut seen: HashSet<UserId> = HashSet::with_capacity(adj.user_count());
    let mut components = Vec::new();

    for seed in adj.users() {
        if !seen.insert(seed) {
            continue;
        }

        let mut component = Vec::new();
        let mut queue = VecDeque::from([seed]);
        while let Some(current) = queue.pop_front() {
            component.push(current);
            for next in adj.neighbors(current) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        component.sort_unstable();
        components.push(component);
    }

    components
}

/// The user with the most friends; ties go to the smallest ID.
///
/// None only when the store has no users.
pub fn influencer_by_degree(store: &GraphStore) -> Option<UserId> {
    trace!("influencer_by_degree");
    let adj = store.adjacency();
    let mut best: Option<(UserId, usize)> = None;

    // Ascending iteration: a later user must strictly beat the current best.
    for (id, friends) in adj.iter() {
        match best {
            Some((_, degree)) if friends.len() <= degree => {}
            _ => best = Some((id, friends.len())),
        }
    }

    best.map(|(id, _)| id)
}

/// The user whose interests overlap most, on average, with everyone else.
///
/// For each user, averages the Jaccard similarity against every other user.
/// Pairs where both interest sets are empty are skipped entirely; a user with
/// no scored pair averages 0. Ties keep the first user in ascending-ID order.
///
/// Quadratic in the number of users.
pub fn influencer_by_interest_overlap(store: &GraphStore) -> Option<UserId> {
    trace!("influencer_by_interest_overlap");
    let users: Vec<_> = store.users().collect();
    let mut best: Option<(UserId, f64)> = None;

    for user in &users {
        let mut total = 0.0;
        let mut pairs = 0usize;
        for other in &users {
            if other.id == user.id {
                continue;
            }
            if user.interests.is_empty() && other.interests.is_empty() {
                continue;
            }
            total += jaccard(&user.interests, &other.interests);
            pairs += 1;
        }
        let average = if pairs == 0 { 0.0 } else { total / pairs as f64 };

        match best {
            Some((_, score)) if average <= score => {}
            _ => best = Some((user.id, average)),
        }
    }

    best.map(|(id, _)| id)
}

/// Users ranked by number of friends.
///
/// If `top_n` is 0, returns all users. Otherwise returns the top N by degree
/// (descending). Ties are broken by user ID (ascending).
pub fn degree_ranking(store: &GraphStore, top_n: usize) -> Vec<DegreeResult> {
    let adj = store.adjacency();
    let mut results: Vec<DegreeResult> = adj
        .iter()
        .map(|(user_id, friends)| DegreeResult {
            user_id,
            degree: friends.len(),
        })
        .collect();

    results.sort_by(|a, b| b.degree.cmp(&a.degree).then(a.user_id.cmp(&b.user_id)));

    if top_n > 0 && top_n < results.len() {
        results.truncate(top_n);
    }

    results
}

/// Everyone reachable from `start` within `max_depth` friendship hops.
///
/// Excludes `start` itself. Each user appears once, at their minimum
/// distance; results are ordered by distance, then ID.
pub fn neighborhood(store: &GraphStore, start: UserId, max_depth: u32) -> Vec<Neighbor> {
    if !store.contains_user(start) {
        return Vec::new();
    }

    let adj = store.adjacency();
    let mut visited: HashMap<UserId, u32> = HashMap::new();
    let mut queue: VecDeque<(UserId, u32)> = VecDeque::new();
    visited.insert(start, 0);
    queue.push_back((start, 0));

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        for next in adj.neighbors(current) {
            if !visited.contains_key(&next) {
                visited.insert(next, depth + 1);
                queue.push_back((next, depth + 1));
            }
        }
    }

    let mut neighbors: Vec<Neighbor> = visited
        .into_iter()
        .filter(|&(id, _)| id != start)
        .map(|(user_id, distance)| Neighbor { user_id, distance })
        .collect();
    neighbors.sort_by_key(|n| (n.distance, n.user_id));
    neighbors
}
