use std::path::{Path, PathBuf};

use social_graph_core::{GraphStore, PrefixIndex, Result as GraphResult, User, UserId};
use tracing::{debug, info};

use crate::persistence::{self, PersistError};
use crate::settings::Settings;
use crate::status::StatusReport;

/// One graph plus its derived prefix index, owned by whoever drives it.
///
/// All mutations go through here so the index stays in step: additions are
/// inserted incrementally, removals and reloads trigger a full rebuild.
pub struct Session {
    store: GraphStore,
    index: PrefixIndex,
    settings: Settings,
    /// File the current graph was last loaded from or saved to.
    data_file: Option<PathBuf>,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        let store = GraphStore::new();
        let index = PrefixIndex::from_store(&store);
        Self {
            store,
            index,
            settings,
            data_file: None,
        }
    }

    /// Wrap an existing store, indexing its users.
    pub fn with_store(store: GraphStore, settings: Settings) -> Self {
        let index = PrefixIndex::from_store(&store);
        Self {
            store,
            index,
            settings,
            data_file: None,
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn index(&self) -> &PrefixIndex {
        &self.index
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn data_file(&self) -> Option<&Path> {
        self.data_file.as_deref()
    }

    pub fn add_user(&mut self, name: &str) -> UserId {
        let id = self.store.add_user(name);
        self.index_new_user(name, id);
        id
    }

    pub fn add_user_with_id(&mut self, name: &str, id: UserId) -> GraphResult<()> {
        self.store.add_user_with_id(name, id)?;
        self.index_new_user(name, id);
        Ok(())
    }

    fn index_new_user(&mut self, name: &str, id: UserId) {
        // Only an index that was in step before this insert stays in step after it.
        let was_fresh = self.index.synced_generation() == Some(self.store.generation() - 1);
        self.index.insert_username(name, id);
        if was_fresh {
            self.index.mark_synced(&self.store);
        }
    }

    pub fn remove_user(&mut self, id: UserId) -> GraphResult<User> {
        let user = self.store.remove_user(id)?;
        self.index.rebuild_from_store(&self.store);
        Ok(user)
    }

    pub fn add_friend(&mut self, a: UserId, b: UserId) -> GraphResult<bool> {
        self.store.add_friend(a, b)
    }

    pub fn remove_friend(&mut self, a: UserId, b: UserId) -> GraphResult<bool> {
        self.store.remove_friend(a, b)
    }

    /// Add comma-separated interests. Unknown users are a silent no-op.
    pub fn add_interests_csv(&mut self, id: UserId, csv: &str) -> usize {
        self.store.add_interests(id, split_interests(csv))
    }

    /// Username suggestions, rebuilding a stale index first when
    /// `auto_reindex` is set.
    pub fn suggest(&mut self, prefix: &str, k: usize) -> Vec<UserId> {
        if self.settings.auto_reindex && self.index.is_stale(&self.store) {
            debug!("prefix index stale, rebuilding");
            self.index.rebuild_from_store(&self.store);
        }
        self.index.suggest_by_prefix(prefix, k)
    }

    pub fn rebuild_index(&mut self) {
        self.index.rebuild_from_store(&self.store);
    }

    /// Replace the graph with the contents of `path`.
    ///
    /// Parses into a fresh store first; on error the current graph is kept.
    pub fn load(&mut self, path: &Path) -> Result<(), PersistError> {
        let store = persistence::load_from_file(path)?;
        self.store = store;
        self.index.rebuild_from_store(&self.store);
        self.data_file = Some(path.to_path_buf());
        info!(path = %path.display(), "session graph replaced");
        Ok(())
    }

    pub fn save(&mut self, path: &Path) -> Result<(), PersistError> {
        persistence::save_to_file(&self.store, path)?;
        self.data_file = Some(path.to_path_buf());
        Ok(())
    }

    /// Save to the current data file, if there is one.
    pub fn autosave(&mut self) -> Result<bool, PersistError> {
        if !self.settings.autosave {
            return Ok(false);
        }
        let Some(path) = self.data_file.clone().or_else(|| self.settings.data_file.clone()) else {
            return Ok(false);
        };
        self.save(&path)?;
        Ok(true)
    }

    pub fn status(&self) -> StatusReport {
        StatusReport::collect(self)
    }
}

/// Split a comma-separated interest list, trimming and dropping blanks.
pub fn split_interests(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
