//! Read-only renderings of a store: Graphviz DOT and JSON views.

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;
use social_graph_core::{
    mutual_friends, shared_interests, GraphStore, MutualRecommendation, UserId,
    WeightedRecommendation,
};

use crate::persistence::PersistError;

/// Render the friendship graph as an undirected Graphviz graph.
///
/// Double quotes in names become single quotes so labels stay well-formed.
pub fn to_dot(store: &GraphStore) -> String {
    let mut out = String::from("graph SocialNetwork {\n");
    for user in store.users() {
        let label = user.name.replace('"', "'");
        let _ = writeln!(out, "  {} [label=\"{}\"];", user.id, label);
    }
    for (id, friends) in store.adjacency().iter() {
        for &friend in friends.range(id + 1..) {
            let _ = writeln!(out, "  {id} -- {friend};");
        }
    }
    out.push_str("}\n");
    out
}

pub fn write_dot(store: &GraphStore, path: &Path) -> Result<(), PersistError> {
    std::fs::write(path, to_dot(store)).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserInfo {
    pub id: UserId,
    pub name: String,
    pub friends: Vec<UserId>,
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutualRow {
    pub id: UserId,
    pub name: String,
    pub score: usize,
}

/// A weighted recommendation with the evidence behind its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightedRow {
    pub id: UserId,
    pub name: String,
    pub score: f64,
    pub mutuals: usize,
    pub shared_interests: Vec<String>,
}

fn name_of(store: &GraphStore, id: UserId) -> String {
    store.user(id).map(|u| u.name.clone()).unwrap_or_default()
}

pub fn user_info(store: &GraphStore, id: UserId) -> Option<UserInfo> {
    let user = store.user(id)?;
    Some(UserInfo {
        id,
        name: user.name.clone(),
        friends: store.friends(id),
        interests: user.interests.iter().cloned().collect(),
    })
}

pub fn user_list(store: &GraphStore) -> Vec<UserSummary> {
    store
        .users()
        .map(|u| UserSummary {
            id: u.id,
            name: u.name.clone(),
        })
        .collect()
}

/// Summaries for `ids` in the given order, skipping unknown users.
pub fn summaries(store: &GraphStore, ids: &[UserId]) -> Vec<UserSummary> {
    ids.iter()
        .filter_map(|&id| {
            store.user(id).map(|u| UserSummary {
                id,
                name: u.name.clone(),
            })
        })
        .collect()
}

pub fn mutual_rows(store: &GraphStore, recs: &[MutualRecommendation]) -> Vec<MutualRow> {
    recs.iter()
        .map(|r| MutualRow {
            id: r.user_id,
            name: name_of(store, r.user_id),
            score: r.mutual_count,
        })
        .collect()
}

pub fn weighted_rows(
    store: &GraphStore,
    user: UserId,
    recs: &[WeightedRecommendation],
) -> Vec<WeightedRow> {
    recs.iter()
        .map(|r| WeightedRow {
            id: r.user_id,
            name: name_of(store, r.user_id),
            score: r.score,
            mutuals: mutual_friends(store, user, r.user_id).len(),
            shared_interests: shared_interests(store, user, r.user_id),
        })
        .collect()
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use social_graph_core::{recommend_by_mutual, recommend_weighted};

    fn sample() -> GraphStore {
        let mut g = GraphStore::new();
        g.add_user("Alice");
        g.add_user("Bob \"the\" Builder");
        g.add_user("Carol");
        g.add_friend(1, 2).unwrap();
        g.add_friend(2, 3).unwrap();
        g.add_interests(1, ["music", "go"]);
        g.add_interests(3, ["music"]);
        g
    }

    #[test]
    fn test_dot_output() {
        let dot = to_dot(&sample());
        let expected = "graph SocialNetwork {\n  \
                        1 [label=\"Alice\"];\n  \
                        2 [label=\"Bob 'the' Builder\"];\n  \
                        3 [label=\"Carol\"];\n  \
                        1 -- 2;\n  \
                        2 -- 3;\n\
                        }\n";
        assert_eq!(dot, expected);
    }

    #[test]
    fn test_write_dot_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.dot");
        write_dot(&sample(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("graph SocialNetwork {"));
    }

    #[test]
    fn test_user_info_json() {
        let g = sample();
        let info = user_info(&g, 1).unwrap();
        assert_eq!(info.friends, vec![2]);
        assert_eq!(info.interests, vec!["go", "music"]);

        let value: serde_json::Value = serde_json::from_str(&to_json(&info).unwrap()).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["name"], "Alice");
        assert_eq!(value["interests"][1], "music");
        assert!(user_info(&g, 42).is_none());
    }

    #[test]
    fn test_weighted_rows_explain_score() {
        let g = sample();
        let recs = recommend_weighted(&g, 1, 5);
        let rows = weighted_rows(&g, 1, &recs);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 3);
        assert_eq!(rows[0].mutuals, 1);
        assert_eq!(rows[0].shared_interests, vec!["music"]);
        assert!((rows[0].score - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_mutual_rows_and_summaries() {
        let g = sample();
        let rows = mutual_rows(&g, &recommend_by_mutual(&g, 1, 5));
        assert_eq!(
            rows,
            vec![MutualRow {
                id: 3,
                name: "Carol".into(),
                score: 1
            }]
        );
        let list = summaries(&g, &[3, 99, 1]);
        assert_eq!(list.iter().map(|s| s.id).collect::<Vec<_>>(), vec![3, 1]);
        assert_eq!(user_list(&g).len(), 3);
    }
}
