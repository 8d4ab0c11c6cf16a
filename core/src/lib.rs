//! social-graph-core: In-memory social graph engine.
//!
//! A pure Rust library that maintains users, symmetric friendships and
//! interest tags, and provides BFS shortest paths, connected components,
//! influencer detection, friend-of-friend recommendations and a username
//! prefix index. No I/O: persistence and front ends live in other crates
//! and only go through the `GraphStore` / `PrefixIndex` surface.
//!
//! Every analytic copies the adjacency structure before running
//! (`GraphStore::adjacency`). That O(V + E) copy per call is the known scaling
//! limit of this crate; it targets small and medium in-memory graphs.

mod error;
mod graph;
mod prefix;
mod recommend;
mod traversal;

pub use error::{GraphError, Result};
pub use graph::{
    normalize_interest, AdjacencySnapshot, GraphStore, User, UserId, FIRST_USER_ID,
    MAX_FIXED_USER_ID,
};
pub use prefix::PrefixIndex;
pub use recommend::{
    jaccard, mutual_friends, recommend_by_mutual, recommend_weighted, recommend_weighted_with,
    shared_interests, MutualRecommendation, WeightedRecommendation, INTEREST_WEIGHT,
    MUTUAL_WEIGHT, SCORE_EPSILON,
};
pub use traversal::{
    connected_components, degree_ranking, influencer_by_degree, influencer_by_interest_overlap,
    neighborhood, shortest_path, DegreeResult, Neighbor,
};
