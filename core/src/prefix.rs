use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::graph::{GraphStore, UserId};

/// One trie node. Owns its children outright.
#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<char, TrieNode>,
    /// Every user whose name has the path to this node as a prefix.
    ids: Vec<UserId>,
    /// A full name ends here.
    terminal: bool,
}

/// Username autocomplete index.
///
/// Derived from a `GraphStore` and disposable: `rebuild_from_store` makes it
/// exactly consistent with the store. `insert_username` is incremental and
/// has no delete counterpart, so removals and renames need a rebuild.
#[derive(Debug, Default)]
pub struct PrefixIndex {
    root: TrieNode,
    names: HashMap<UserId, String>,
    /// Store generation this index mirrors. None until first synced.
    synced_generation: Option<u64>,
}

impl PrefixIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over every user currently in `store`.
    pub fn from_store(store: &GraphStore) -> Self {
        let mut index = Self::new();
        index.rebuild_from_store(store);
        index
    }

    /// Add `name` for `id`, tagging the root and every node along the path.
    pub fn insert_username(&mut self, name: &str, id: UserId) {
        let mut node = &mut self.root;
        node.ids.push(id);
        for ch in name.chars() {
            node = node.children.entry(ch).or_default();
            node.ids.push(id);
        }
        node.terminal = true;
        self.names.insert(id, name.to_string());
    }

    /// Record that the index reflects `store` as of now.
    ///
    /// Call after an `insert_username` that mirrors a store `add_user`, so the
    /// index does not look stale.
    pub fn mark_synced(&mut self, store: &GraphStore) {
        self.synced_generation = Some(store.generation());
    }

    /// Up to `k` user IDs whose name starts with `prefix`, ordered by name.
    ///
    /// Exact, case-sensitive match; no fuzzy fallback. Users sharing a name
    /// are ordered by ID. The empty prefix matches every indexed user.
    pub fn suggest_by_prefix(&self, prefix: &str, k: usize) -> Vec<UserId> {
        let mut node = &self.root;
        for ch in prefix.chars() {
            match node.children.get(&ch) {
                Some(next) => node = next,
                None => return Vec::new(),
            }
        }

        let mut seen = HashSet::with_capacity(node.ids.len());
        let mut candidates: Vec<UserId> = node
            .ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        candidates.sort_by(|a, b| {
            self.display_name(*a)
                .cmp(self.display_name(*b))
                .then(a.cmp(b))
        });
        candidates.truncate(k);
        candidates
    }

    /// Whether a full indexed name equals `name` exactly.
    pub fn contains_name(&self, name: &str) -> bool {
        let mut node = &self.root;
        for ch in name.chars() {
            match node.children.get(&ch) {
                Some(next) => node = next,
                None => return false,
            }
        }
        node.terminal
    }

    /// Discard the trie and re-insert every user in ascending ID order.
    pub fn rebuild_from_store(&mut self, store: &GraphStore) {
        self.clear();
        for user in store.users() {
            self.insert_username(&user.name, user.id);
        }
        self.mark_synced(store);
        debug!(
            users = self.names.len(),
            generation = store.generation(),
            "rebuilt prefix index"
        );
    }

    /// True when the store's user set changed since the last sync.
    pub fn is_stale(&self, store: &GraphStore) -> bool {
        self.synced_generation != Some(store.generation())
    }

    pub fn synced_generation(&self) -> Option<u64> {
        self.synced_generation
    }

    pub fn display_name(&self, id: UserId) -> &str {
        self.names.get(&id).map(|s| s.as_str()).unwrap_or("")
    }

    pub fn clear(&mut self) {
        self.root = TrieNode::default();
        self.names.clear();
        self.synced_generation = None;
    }

    /// Number of distinct users indexed.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
