use std::collections::BTreeSet;

use proptest::prelude::*;
use social_graph_core::{
    connected_components, influencer_by_degree, jaccard, recommend_by_mutual, recommend_weighted,
    shortest_path, GraphStore, PrefixIndex, UserId,
};

const UNREACHABLE: u32 = u32::MAX;

fn build(n: u64, edges: &[(u64, u64)]) -> GraphStore {
    let mut g = GraphStore::new();
    for i in 1..=n {
        g.add_user(format!("user{i}"));
    }
    for &(a, b) in edges {
        let (a, b) = (a % n + 1, b % n + 1);
        if a != b {
            g.add_friend(a, b).unwrap();
        }
    }
    g
}

fn graph_strategy() -> impl Strategy<Value = GraphStore> {
    (1u64..12).prop_flat_map(|n| {
        prop::collection::vec((0..n, 0..n), 0..30).prop_map(move |edges| build(n, &edges))
    })
}

/// All-pairs hop distances by Floyd–Warshall, indexed by `id - 1`.
fn reference_distances(g: &GraphStore) -> Vec<Vec<u32>> {
    let n = g.user_count();
    let mut dist = vec![vec![UNREACHABLE; n]; n];
    for id in g.list_all_users() {
        let i = (id - 1) as usize;
        dist[i][i] = 0;
        for f in g.friends(id) {
            dist[i][(f - 1) as usize] = 1;
        }
    }
    for k in 0..n {
        for i in 0..n {
            for j in 0..n {
                if dist[i][k] != UNREACHABLE && dist[k][j] != UNREACHABLE {
                    let through = dist[i][k] + dist[k][j];
                    if through < dist[i][j] {
                        dist[i][j] = through;
                    }
                }
            }
        }
    }
    dist
}

fn interest_set() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[a-e]", 0..5)
}

proptest! {
    #[test]
    fn prop_friendship_symmetric(g in graph_strategy()) {
        for a in g.list_all_users() {
            prop_assert!(!g.friends(a).contains(&a));
            for b in g.friends(a) {
                prop_assert!(g.friends(b).contains(&a));
            }
        }
    }

    #[test]
    fn prop_add_friend_idempotent(g in graph_strategy(), a in 0u64..12, b in 0u64..12) {
        let n = g.user_count() as u64;
        let (a, b) = (a % n + 1, b % n + 1);
        prop_assume!(a != b);

        let mut once = g.clone();
        once.add_friend(a, b).unwrap();
        let mut twice = once.clone();
        prop_assert_eq!(twice.add_friend(a, b), Ok(false));
        prop_assert_eq!(once.adjacency(), twice.adjacency());
    }

    #[test]
    fn prop_remove_user_cleans_neighbors(g in graph_strategy(), x in 0u64..12) {
        let mut g = g;
        let x = x % g.user_count() as u64 + 1;
        g.remove_user(x).unwrap();
        for id in g.list_all_users() {
            prop_assert!(!g.friends(id).contains(&x));
        }
        prop_assert!(!g.adjacency().contains(x));
    }

    #[test]
    fn prop_shortest_path_is_optimal(g in graph_strategy()) {
        let dist = reference_distances(&g);
        for src in g.list_all_users() {
            for dst in g.list_all_users() {
                let expected = dist[(src - 1) as usize][(dst - 1) as usize];
                match shortest_path(&g, src, dst) {
                    Some(path) => {
                        prop_assert_eq!((path.len() - 1) as u32, expected);
                        prop_assert_eq!(path[0], src);
                        prop_assert_eq!(*path.last().unwrap(), dst);
                        for hop in path.windows(2) {
                            prop_assert!(g.friends(hop[0]).contains(&hop[1]));
                        }
                    }
                    None => {
                        prop_assert_eq!(expected, UNREACHABLE);
                    }
                }
            }
        }
    }

    #[test]
    fn prop_components_partition_users(g in graph_strategy()) {
        let components = connected_components(&g);
        let mut all: Vec<UserId> = components.iter().flatten().copied().collect();
        all.sort_unstable();
        prop_assert_eq!(all, g.list_all_users());

        let minimums: Vec<UserId> = components.iter().map(|c| c[0]).collect();
        let mut sorted = minimums.clone();
        sorted.sort_unstable();
        prop_assert_eq!(minimums, sorted);

        for component in &components {
            for &member in component {
                for friend in g.friends(member) {
                    prop_assert!(component.contains(&friend));
                }
            }
        }
    }

    #[test]
    fn prop_jaccard_bounded(a in interest_set(), b in interest_set()) {
        let j = jaccard(&a, &b);
        prop_assert!((0.0..=1.0).contains(&j));
        prop_assert_eq!(j, jaccard(&b, &a));
        if a.is_empty() && b.is_empty() {
            prop_assert_eq!(j, 0.0);
        }
    }

    #[test]
    fn prop_recommendations_exclude_self_and_friends(g in graph_strategy()) {
        for user in g.list_all_users() {
            let friends = g.friends(user);
            for rec in recommend_by_mutual(&g, user, 100) {
                prop_assert_ne!(rec.user_id, user);
                prop_assert!(!friends.contains(&rec.user_id));
                prop_assert!(rec.mutual_count >= 1);
            }
            for rec in recommend_weighted(&g, user, 100) {
                prop_assert_ne!(rec.user_id, user);
                prop_assert!(!friends.contains(&rec.user_id));
            }
        }
    }

    #[test]
    fn prop_trie_covers_all_users(names in prop::collection::vec("[a-c]{0,4}", 0..20)) {
        let mut g = GraphStore::new();
        for name in &names {
            g.add_user(name.as_str());
        }
        // Remove a few so the rebuild has something to forget
        for id in g.list_all_users().into_iter().step_by(3) {
            g.remove_user(id).unwrap();
        }

        let mut index = PrefixIndex::new();
        index.insert_username("stale", 999);
        index.rebuild_from_store(&g);

        let mut suggested = index.suggest_by_prefix("", usize::MAX);
        suggested.sort_unstable();
        prop_assert_eq!(suggested, g.list_all_users());
    }
}

#[test]
fn test_end_to_end_scenario() {
    let mut g = GraphStore::new();
    assert_eq!(g.add_user("Alice"), 1);
    assert_eq!(g.add_user("Bob"), 2);
    assert_eq!(g.add_user("Carol"), 3);
    g.add_friend(1, 2).unwrap();
    g.add_friend(2, 3).unwrap();

    assert_eq!(shortest_path(&g, 1, 3), Some(vec![1, 2, 3]));
    assert_eq!(connected_components(&g), vec![vec![1, 2, 3]]);
    assert_eq!(influencer_by_degree(&g), Some(2));
}

#[test]
fn test_recommendation_scenario() {
    let mut g = GraphStore::new();
    for name in ["Alice", "Bob", "Carol"] {
        g.add_user(name);
    }
    g.add_friend(1, 2).unwrap();
    g.add_friend(2, 3).unwrap();
    let dave = g.add_user("Dave");
    g.add_friend(1, dave).unwrap();

    let recs = recommend_by_mutual(&g, 1, 5);
    let carol = recs.iter().find(|r| r.user_id == 3).unwrap();
    assert_eq!(carol.mutual_count, 1);
    assert!(recs.iter().all(|r| r.user_id != 2 && r.user_id != dave));
}
