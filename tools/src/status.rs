use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use social_graph_core::UserId;

use crate::session::Session;

/// Snapshot of session health for the `status` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub user_count: usize,
    pub friendship_count: usize,
    pub next_id: UserId,
    pub generation: u64,
    pub index_generation: Option<u64>,
    pub index_users: usize,
    pub index_stale: bool,
    pub memory_bytes: usize,
    pub data_file: Option<PathBuf>,
}

impl StatusReport {
    pub fn collect(session: &Session) -> Self {
        let store = session.store();
        let index = session.index();
        Self {
            user_count: store.user_count(),
            friendship_count: store.friendship_count(),
            next_id: store.next_id(),
            generation: store.generation(),
            index_generation: index.synced_generation(),
            index_users: index.len(),
            index_stale: index.is_stale(store),
            memory_bytes: store.memory_usage(),
            data_file: session.data_file().map(|p| p.to_path_buf()),
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index_state = if self.index_stale { "stale" } else { "fresh" };
        writeln!(f, "users:        {}", self.user_count)?;
        writeln!(f, "friendships:  {}", self.friendship_count)?;
        writeln!(f, "next id:      {}", self.next_id)?;
        writeln!(f, "generation:   {}", self.generation)?;
        writeln!(f, "index:        {} ({} users)", index_state, self.index_users)?;
        writeln!(f, "memory:       ~{:.1}KB", self.memory_bytes as f64 / 1024.0)?;
        match &self.data_file {
            Some(path) => write!(f, "data file:    {}", path.display()),
            None => write!(f, "data file:    (none)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    #[test]
    fn test_status_counts() {
        let mut s = Session::new(Settings::default());
        let a = s.add_user("a");
        let b = s.add_user("b");
        s.add_friend(a, b).unwrap();

        let report = s.status();
        assert_eq!(report.user_count, 2);
        assert_eq!(report.friendship_count, 1);
        assert_eq!(report.next_id, 3);
        assert_eq!(report.index_users, 2);
        assert!(!report.index_stale);
        assert!(report.data_file.is_none());
    }

    #[test]
    fn test_status_display() {
        let s = Session::new(Settings::default());
        let text = s.status().to_string();
        assert!(text.contains("users:        0"));
        assert!(text.contains("index:        fresh (0 users)"));
        assert!(text.ends_with("(none)"));
    }
}
