use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::error::{GraphError, Result};

/// User identifier. Valid IDs start at 1; 0 is never assigned.
pub type UserId = u64;

/// First ID handed out by a fresh (or cleared) store.
pub const FIRST_USER_ID: UserId = 1;

/// Highest ID accepted by `add_user_with_id`. The headroom above it keeps the
/// auto-assign counter from ever overflowing.
pub const MAX_FIXED_USER_ID: UserId = i64::MAX as UserId;

/// A user and their interest tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Lower-cased, trimmed, never empty.
    pub interests: BTreeSet<String>,
}

impl User {
    fn new(id: UserId, name: String) -> Self {
        Self {
            id,
            name,
            interests: BTreeSet::new(),
        }
    }
}

/// Normalize an interest tag for storage and comparison.
///
/// Returns None for text that is empty after trimming.
pub fn normalize_interest(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Point-in-time copy of the friendship graph.
///
/// Sorted maps and sets so every algorithm walking it sees users and
/// neighbors in ascending ID order, independent of hashing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencySnapshot {
    adj: BTreeMap<UserId, BTreeSet<UserId>>,
}

impl AdjacencySnapshot {
    /// All users in the snapshot, ascending.
    pub fn users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.adj.keys().copied()
    }

    /// Neighbors of `id`, ascending. Empty for unknown users.
    pub fn neighbors(&self, id: UserId) -> impl Iterator<Item = UserId> + '_ {
        self.adj.get(&id).into_iter().flatten().copied()
    }

    pub fn contains(&self, id: UserId) -> bool {
        self.adj.contains_key(&id)
    }

    pub fn degree(&self, id: UserId) -> usize {
        self.adj.get(&id).map_or(0, |n| n.len())
    }

    pub fn are_friends(&self, a: UserId, b: UserId) -> bool {
        self.adj.get(&a).is_some_and(|n| n.contains(&b))
    }

    pub fn user_count(&self) -> usize {
        self.adj.len()
    }

    /// Undirected edge count (each friendship counted once).
    pub fn edge_count(&self) -> usize {
        self.adj.values().map(|n| n.len()).sum::<usize>() / 2
    }

    pub fn iter(&self) -> impl Iterator<Item = (UserId, &BTreeSet<UserId>)> {
        self.adj.iter().map(|(&id, n)| (id, n))
    }
}

/// In-memory social graph: users, symmetric friendships and interests.
///
/// The only component that mutates graph state. Every user has an adjacency
/// entry (possibly empty); `a` lists `b` as a friend iff `b` lists `a`.
#[derive(Debug, Clone)]
pub struct GraphStore {
    users: HashMap<UserId, User>,
    adjacency: HashMap<UserId, HashSet<UserId>>,
    next_id: UserId,
    /// Bumped whenever the user set changes, so derived indexes can detect staleness.
    generation: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
            adjacency: HashMap::new(),
            next_id: FIRST_USER_ID,
            generation: 0,
        }
    }

    /// Pre-allocate for a known number of users.
    pub fn with_capacity(user_count: usize) -> Self {
        Self {
            users: HashMap::with_capacity(user_count),
            adjacency: HashMap::with_capacity(user_count),
            next_id: FIRST_USER_ID,
            generation: 0,
        }
    }

    /// Add a user under the next free ID. IDs are never reused.
    pub fn add_user(&mut self, name: impl Into<String>) -> UserId {
        let id = self.next_id;
        self.next_id += 1;
        self.insert_user(id, name.into());
        id
    }

    /// Add a user under a caller-chosen ID (restoring saved data).
    ///
    /// Advances the auto-assign counter past `id` so later `add_user` calls
    /// cannot collide with it.
    pub fn add_user_with_id(&mut self, name: impl Into<String>, id: UserId) -> Result<()> {
        if id < FIRST_USER_ID {
            return Err(GraphError::InvalidArgument(format!(
                "user id must be positive, got {id}"
            )));
        }
        if self.users.contains_key(&id) {
            return Err(GraphError::InvalidArgument(format!(
                "user id {id} is already in use"
            )));
        }
        if id > MAX_FIXED_USER_ID {
            return Err(GraphError::InvalidArgument(format!(
                "user id {id} exceeds the maximum {MAX_FIXED_USER_ID}"
            )));
        }
        self.insert_user(id, name.into());
        if id >= self.next_id {
            self.next_id = id + 1;
        }
        Ok(())
    }

    fn insert_user(&mut self, id: UserId, name: String) {
        debug!(user_id = id, name = %name, "added user");
        self.users.insert(id, User::new(id, name));
        self.adjacency.entry(id).or_default();
        self.generation += 1;
    }

    /// Remove a user, detaching them from every friend first.
    ///
    /// Returns the removed user; their interests go with them.
    pub fn remove_user(&mut self, id: UserId) -> Result<User> {
        let user = self.users.remove(&id).ok_or(GraphError::NotFound(id))?;
        if let Some(friends) = self.adjacency.remove(&id) {
            for friend in friends {
                if let Some(set) = self.adjacency.get_mut(&friend) {
                    set.remove(&id);
                }
            }
        }
        self.generation += 1;
        debug!(user_id = id, "removed user");
        Ok(user)
    }

    /// Create the friendship `a -- b`.
    ///
    /// Returns `Ok(true)` if a new edge was created, `Ok(false)` if the two
    /// were already friends.
    pub fn add_friend(&mut self, a: UserId, b: UserId) -> Result<bool> {
        if a == b {
            return Err(GraphError::InvalidArgument(format!(
                "user {a} cannot befriend themselves"
            )));
        }
        self.require(a)?;
        self.require(b)?;

        let inserted_a = self.adjacency.entry(a).or_default().insert(b);
        let inserted_b = self.adjacency.entry(b).or_default().insert(a);
        let created = inserted_a || inserted_b;
        if created {
            debug!(a, b, "added friendship");
        }
        Ok(created)
    }

    /// Remove the friendship `a -- b`. Returns whether an edge existed.
    pub fn remove_friend(&mut self, a: UserId, b: UserId) -> Result<bool> {
        self.require(a)?;
        self.require(b)?;

        let removed_a = self.adjacency.get_mut(&a).is_some_and(|n| n.remove(&b));
        let removed_b = self.adjacency.get_mut(&b).is_some_and(|n| n.remove(&a));
        let removed = removed_a || removed_b;
        if removed {
            debug!(a, b, "removed friendship");
        }
        Ok(removed)
    }

    /// Tag a user with an interest.
    ///
    /// Unknown users and blank text are silently ignored. Returns true only
    /// when a new interest was stored.
    pub fn add_interest(&mut self, id: UserId, text: &str) -> bool {
        let Some(interest) = normalize_interest(text) else {
            return false;
        };
        match self.users.get_mut(&id) {
            Some(user) => user.interests.insert(interest),
            None => {
                debug!(user_id = id, "ignoring interest for unknown user");
                false
            }
        }
    }

    /// Tag a user with several interests. Returns how many were new.
    pub fn add_interests<I, S>(&mut self, id: UserId, interests: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        interests
            .into_iter()
            .filter(|text| self.add_interest(id, text.as_ref()))
            .count()
    }

    fn require(&self, id: UserId) -> Result<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(GraphError::NotFound(id))
        }
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn contains_user(&self, id: UserId) -> bool {
        self.users.contains_key(&id)
    }

    pub fn interests(&self, id: UserId) -> Option<&BTreeSet<String>> {
        self.users.get(&id).map(|u| &u.interests)
    }

    /// Friends of `id`, ascending. Empty for unknown users.
    pub fn friends(&self, id: UserId) -> Vec<UserId> {
        let mut friends: Vec<UserId> = self
            .adjacency
            .get(&id)
            .map(|n| n.iter().copied().collect())
            .unwrap_or_default();
        friends.sort_unstable();
        friends
    }

    /// Every user ID, ascending.
    pub fn list_all_users(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.users.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Every user, ascending by ID.
    pub fn users(&self) -> impl Iterator<Item = &User> {
        let mut users: Vec<&User> = self.users.values().collect();
        users.sort_unstable_by_key(|u| u.id);
        users.into_iter()
    }

    /// Lowest ID whose display name is exactly `name`.
    pub fn find_by_name(&self, name: &str) -> Option<UserId> {
        self.users
            .values()
            .filter(|u| u.name == name)
            .map(|u| u.id)
            .min()
    }

    /// Copy the whole adjacency structure.
    ///
    /// Costs O(V + E) per call; analytics work against the copy so they never
    /// observe a half-applied mutation.
    pub fn adjacency(&self) -> AdjacencySnapshot {
        AdjacencySnapshot {
            adj: self
                .adjacency
                .iter()
                .map(|(&id, friends)| (id, friends.iter().copied().collect()))
                .collect(),
        }
    }

    /// Drop all users and friendships and restart ID assignment at 1.
    pub fn clear(&mut self) {
        self.users.clear();
        self.adjacency.clear();
        self.next_id = FIRST_USER_ID;
        self.generation += 1;
        debug!("cleared graph store");
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn friendship_count(&self) -> usize {
        self.adjacency.values().map(|n| n.len()).sum::<usize>() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// The ID the next `add_user` call will assign.
    pub fn next_id(&self) -> UserId {
        self.next_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Approximate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        use std::mem::size_of;

        let users_mem: usize = self
            .users
            .values()
            .map(|u| {
                size_of::<UserId>()
                    + size_of::<User>()
                    + u.name.len()
                    + u.interests.iter().map(|i| i.len() + 24).sum::<usize>()
            })
            .sum();
        let adj_mem: usize = self
            .adjacency
            .values()
            .map(|n| size_of::<UserId>() + 48 + n.len() * size_of::<UserId>())
            .sum();

        users_mem + adj_mem
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
