//! Line-oriented save format.
//!
//! ```text
//! USERS <count>
//! <id>|<name>
//! EDGES
//! <a> <b>
//! INTERESTS
//! <id>|<interest>|<interest>...
//! ```
//!
//! `|`, `\`, CR and LF inside names and interests are backslash-escaped.
//! Each friendship is written once, smaller ID first. The `INTERESTS` section
//! is optional when loading, so name-only files still load.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use social_graph_core::{GraphError, GraphStore, UserId};
use thiserror::Error;
use tracing::{info, warn};

pub const USERS_TAG: &str = "USERS";
pub const EDGES_TAG: &str = "EDGES";
pub const INTERESTS_TAG: &str = "INTERESTS";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("line {line}: {source}")]
    Graph {
        line: usize,
        #[source]
        source: GraphError,
    },
}

fn malformed(line: usize, message: impl Into<String>) -> PersistError {
    PersistError::Malformed {
        line,
        message: message.into(),
    }
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '|' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

pub fn unescape(s: &str) -> String {
    split_escaped(s).join("|")
}

/// Split on unescaped `|`, unescaping each field.
fn split_escaped(s: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in s.chars() {
        if escaped {
            current.push(match c {
                'n' => '\n',
                'r' => '\r',
                other => other,
            });
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '|' {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    fields.push(current);
    fields
}

/// Render the whole store in the save format.
pub fn to_text(store: &GraphStore) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{} {}", USERS_TAG, store.user_count());
    for user in store.users() {
        let _ = writeln!(out, "{}|{}", user.id, escape(&user.name));
    }

    let _ = writeln!(out, "{EDGES_TAG}");
    for (id, friends) in store.adjacency().iter() {
        for &friend in friends.range(id + 1..) {
            let _ = writeln!(out, "{id} {friend}");
        }
    }

    let _ = writeln!(out, "{INTERESTS_TAG}");
    for user in store.users().filter(|u| !u.interests.is_empty()) {
        let _ = write!(out, "{}", user.id);
        for interest in &user.interests {
            let _ = write!(out, "|{}", escape(interest));
        }
        out.push('\n');
    }

    out
}

#[derive(PartialEq)]
enum Section {
    Edges,
    Interests,
}

/// Parse the save format into a fresh store.
///
/// Structural problems (header, user section, `EDGES` marker) fail the whole
/// load. Unparseable edge or interest lines, and edges that the store
/// rejects, are skipped with a warning.
pub fn parse_graph(text: &str) -> Result<GraphStore, PersistError> {
    let mut lines = text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .enumerate()
        .map(|(i, l)| (i + 1, l));

    let (line_no, header) = lines.next().ok_or_else(|| malformed(1, "empty input"))?;
    let mut parts = header.split_whitespace();
    if parts.next() != Some(USERS_TAG) {
        return Err(malformed(line_no, format!("expected '{USERS_TAG} <count>'")));
    }
    let user_count: usize = parts
        .next()
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| malformed(line_no, "invalid user count"))?;

    // The header is untrusted; never reserve more than the file could hold.
    let mut store = GraphStore::with_capacity(user_count.min(text.lines().count()));
    for expected in 0..user_count {
        let (line_no, line) = lines.next().ok_or_else(|| {
            malformed(
                line_no + expected + 1,
                format!("expected {user_count} users, found {expected}"),
            )
        })?;
        let (id, name) = line
            .split_once('|')
            .ok_or_else(|| malformed(line_no, "expected '<id>|<name>'"))?;
        let id: UserId = id
            .trim()
            .parse()
            .map_err(|_| malformed(line_no, format!("invalid user id '{id}'")))?;
        store
            .add_user_with_id(unescape(name), id)
            .map_err(|source| PersistError::Graph {
                line: line_no,
                source,
            })?;
    }

    match lines.next() {
        Some((_, EDGES_TAG)) => {}
        Some((line_no, _)) => return Err(malformed(line_no, format!("expected '{EDGES_TAG}'"))),
        None => return Err(malformed(user_count + 2, format!("missing '{EDGES_TAG}'"))),
    }

    let mut section = Section::Edges;
    for (line_no, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        if line == INTERESTS_TAG && section == Section::Edges {
            section = Section::Interests;
            continue;
        }
        match section {
            Section::Edges => load_edge(&mut store, line_no, line),
            Section::Interests => load_interests(&mut store, line_no, line),
        }
    }

    Ok(store)
}

fn load_edge(store: &mut GraphStore, line_no: usize, line: &str) {
    let mut parts = line.split_whitespace().map(|p| p.parse::<UserId>());
    let (Some(Ok(a)), Some(Ok(b))) = (parts.next(), parts.next()) else {
        warn!(line = line_no, "skipping malformed edge line");
        return;
    };
    if let Err(e) = store.add_friend(a, b) {
        warn!(line = line_no, error = %e, "skipping edge");
    }
}

fn load_interests(store: &mut GraphStore, line_no: usize, line: &str) {
    let mut fields = split_escaped(line).into_iter();
    let Some(Ok(id)) = fields.next().map(|f| f.trim().parse::<UserId>()) else {
        warn!(line = line_no, "skipping malformed interest line");
        return;
    };
    if !store.contains_user(id) {
        warn!(line = line_no, user_id = id, "skipping interests for unknown user");
        return;
    }
    store.add_interests(id, fields);
}

pub fn save_to_file(store: &GraphStore, path: &Path) -> Result<(), PersistError> {
    fs::write(path, to_text(store)).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        users = store.user_count(),
        friendships = store.friendship_count(),
        "saved graph"
    );
    Ok(())
}

pub fn load_from_file(path: &Path) -> Result<GraphStore, PersistError> {
    let text = fs::read_to_string(path).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let store = parse_graph(&text)?;
    info!(
        path = %path.display(),
        users = store.user_count(),
        friendships = store.friendship_count(),
        "loaded graph"
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GraphStore {
        let mut g = GraphStore::new();
        g.add_user("Alice");
        g.add_user("Bob|Builder");
        g.add_user("C\\arol");
        g.add_friend(1, 2).unwrap();
        g.add_friend(3, 2).unwrap();
        g.add_interests(1, ["Rust", "chess"]);
        g.add_interest(3, "a|b");
        g
    }

    #[test]
    fn test_escape_unescape() {
        assert_eq!(escape("a|b\\c"), "a\\|b\\\\c");
        assert_eq!(unescape("a\\|b\\\\c"), "a|b\\c");
        assert_eq!(unescape(&escape("line\nbreak\r")), "line\nbreak\r");
    }

    #[test]
    fn test_text_layout() {
        let text = to_text(&sample());
        let expected = "USERS 3\n\
                        1|Alice\n\
                        2|Bob\\|Builder\n\
                        3|C\\\\arol\n\
                        EDGES\n\
                        1 2\n\
                        2 3\n\
                        INTERESTS\n\
                        1|chess|rust\n\
                        3|a\\|b\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_reload_preserves_graph() {
        let original = sample();
        let restored = parse_graph(&to_text(&original)).unwrap();
        assert_eq!(restored.adjacency(), original.adjacency());
        let names: Vec<_> = restored.users().map(|u| u.name.clone()).collect();
        assert_eq!(names, vec!["Alice", "Bob|Builder", "C\\arol"]);
        assert_eq!(restored.interests(3), original.interests(3));
        assert_eq!(restored.next_id(), 4);
    }

    #[test]
    fn test_fixed_ids_restored() {
        let text = "USERS 2\n7|x\n3|y\nEDGES\n3 7\n";
        let g = parse_graph(text).unwrap();
        assert_eq!(g.list_all_users(), vec![3, 7]);
        assert_eq!(g.friends(7), vec![3]);
        assert_eq!(g.next_id(), 8);
    }

    #[test]
    fn test_name_only_file_without_interests() {
        let g = parse_graph("USERS 1\n1|solo\nEDGES\n").unwrap();
        assert_eq!(g.user_count(), 1);
        assert!(g.interests(1).unwrap().is_empty());
    }

    #[test]
    fn test_bad_header() {
        assert!(matches!(
            parse_graph("PEOPLE 2\n"),
            Err(PersistError::Malformed { line: 1, .. })
        ));
        assert!(matches!(
            parse_graph("USERS many\n"),
            Err(PersistError::Malformed { line: 1, .. })
        ));
        assert!(matches!(parse_graph(""), Err(PersistError::Malformed { .. })));
    }

    #[test]
    fn test_short_user_section() {
        assert!(matches!(
            parse_graph("USERS 3\n1|a\n2|b\n"),
            Err(PersistError::Malformed { .. })
        ));
    }

    #[test]
    fn test_oversized_user_count() {
        let err = parse_graph("USERS 18446744073709551615\n1|a\n").unwrap_err();
        match err {
            PersistError::Malformed { line, message } => {
                assert_eq!(line, 3);
                assert!(message.ends_with("found 1"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_user_id_past_ceiling() {
        assert!(matches!(
            parse_graph("USERS 1\n18446744073709551615|max\nEDGES\n"),
            Err(PersistError::Graph { line: 2, .. })
        ));
    }

    #[test]
    fn test_bad_user_lines() {
        assert!(matches!(
            parse_graph("USERS 1\nnobar\nEDGES\n"),
            Err(PersistError::Malformed { line: 2, .. })
        ));
        assert!(matches!(
            parse_graph("USERS 1\nx|a\nEDGES\n"),
            Err(PersistError::Malformed { line: 2, .. })
        ));
        assert!(matches!(
            parse_graph("USERS 2\n1|a\n1|b\nEDGES\n"),
            Err(PersistError::Graph { line: 3, .. })
        ));
        assert!(matches!(
            parse_graph("USERS 1\n0|zero\nEDGES\n"),
            Err(PersistError::Graph { line: 2, .. })
        ));
    }

    #[test]
    fn test_missing_edges_marker() {
        assert!(matches!(
            parse_graph("USERS 1\n1|a\nFRIENDS\n"),
            Err(PersistError::Malformed { line: 3, .. })
        ));
        assert!(matches!(
            parse_graph("USERS 1\n1|a\n"),
            Err(PersistError::Malformed { .. })
        ));
    }

    #[test]
    fn test_bad_edges_skipped() {
        let text = "USERS 3\n1|a\n2|b\n3|c\n\
                    EDGES\n1 2\nnot an edge\n2 2\n3 99\n\n2 3\n\
                    INTERESTS\n1|Go\nzz|bad\n42|orphan\n";
        let g = parse_graph(text).unwrap();
        assert_eq!(g.friendship_count(), 2);
        assert_eq!(g.friends(2), vec![1, 3]);
        assert!(g.interests(1).unwrap().contains("go"));
    }

    #[test]
    fn test_windows_line_endings() {
        let g = parse_graph("USERS 1\r\n1|a\r\nEDGES\r\n").unwrap();
        assert_eq!(g.user(1).unwrap().name, "a");
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.txt");
        save_to_file(&sample(), &path).unwrap();
        let loaded = load_from_file(&path).unwrap();
        assert_eq!(loaded.user_count(), 3);
        assert_eq!(loaded.friendship_count(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from_file(&dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, PersistError::Io { .. }));
    }
}
