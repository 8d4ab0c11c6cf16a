use anyhow::{anyhow, Context};
use serde::Serialize;
use serde_json::json;
use social_graph_core::{
    connected_components, degree_ranking, influencer_by_degree, influencer_by_interest_overlap,
    neighborhood, recommend_by_mutual, recommend_weighted, shortest_path, GraphError, UserId,
};
use tracing::warn;

use crate::command::{Command, HELP};
use crate::export;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Result of running one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Output(String),
    Quit,
}

/// Line-oriented front end over a `Session`.
pub struct Shell {
    session: Session,
    format: OutputFormat,
}

impl Shell {
    pub fn new(session: Session, format: OutputFormat) -> Self {
        Self { session, format }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Parse and run one line. Errors are rendered as `error: ...` output.
    pub fn execute_line(&mut self, line: &str) -> Outcome {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Outcome::Output(String::new()),
            Err(e) => return Outcome::Output(format!("error: {e}")),
        };

        let mutation = command.is_mutation();
        match self.execute(command) {
            Ok(Some(text)) => {
                if mutation {
                    if let Err(e) = self.session.autosave() {
                        warn!(error = %e, "autosave failed");
                    }
                }
                Outcome::Output(text)
            }
            Ok(None) => Outcome::Quit,
            Err(e) => Outcome::Output(format!("error: {e:#}")),
        }
    }

    fn output<T: Serialize>(&self, value: &T, human: impl FnOnce(&T) -> String) -> anyhow::Result<String> {
        match self.format {
            OutputFormat::Json => Ok(export::to_json(value)?),
            OutputFormat::Human => Ok(human(value)),
        }
    }

    fn name(&self, id: UserId) -> &str {
        self.session
            .store()
            .user(id)
            .map(|u| u.name.as_str())
            .unwrap_or("?")
    }

    /// Run a parsed command. Ok(None) means quit.
    pub fn execute(&mut self, command: Command) -> anyhow::Result<Option<String>> {
        let settings = self.session.settings().clone();

        let text = match command {
            Command::AddUser { name } => {
                let id = self.session.add_user(&name);
                self.output(&json!({ "id": id, "name": name }), |_| {
                    format!("Added user {name} with ID {id}")
                })?
            }
            Command::AddUserWithId { id, name } => {
                self.session.add_user_with_id(&name, id)?;
                self.output(&json!({ "id": id, "name": name }), |_| {
                    format!("Added user {name} with ID {id}")
                })?
            }
            Command::RemoveUser { id } => {
                let user = self.session.remove_user(id)?;
                self.output(&json!({ "removed": id }), |_| {
                    format!("Removed user {} ({})", id, user.name)
                })?
            }
            Command::AddFriend { a, b } => {
                let created = self.session.add_friend(a, b)?;
                self.output(&json!({ "created": created }), |_| {
                    if created {
                        "Friendship added.".to_string()
                    } else {
                        "Already friends.".to_string()
                    }
                })?
            }
            Command::RemoveFriend { a, b } => {
                let removed = self.session.remove_friend(a, b)?;
                self.output(&json!({ "removed": removed }), |_| {
                    if removed {
                        "Friendship removed.".to_string()
                    } else {
                        "Not friends.".to_string()
                    }
                })?
            }
            Command::AddInterests { id, csv } => {
                let added = self.session.add_interests_csv(id, &csv);
                self.output(&json!({ "added": added }), |_| format!("Added {added} interest(s)."))?
            }
            Command::ShowInterests { id } => {
                let interests: Vec<String> = self
                    .session
                    .store()
                    .interests(id)
                    .ok_or(GraphError::NotFound(id))?
                    .iter()
                    .cloned()
                    .collect();
                self.output(&interests, |list| {
                    if list.is_empty() {
                        "(no interests)".to_string()
                    } else {
                        list.join(", ")
                    }
                })?
            }
            Command::Info { id } => {
                let info =
                    export::user_info(self.session.store(), id).ok_or(GraphError::NotFound(id))?;
                self.output(&info, |info| {
                    format!(
                        "User({}, {}) Friends: {}\nInterests: {}",
                        info.id,
                        info.name,
                        join_ids(&info.friends, " "),
                        info.interests.join(", ")
                    )
                })?
            }
            Command::List => {
                let users = export::user_list(self.session.store());
                self.output(&users, |users| {
                    users
                        .iter()
                        .map(|u| format!("{} {}", u.id, u.name))
                        .collect::<Vec<_>>()
                        .join("\n")
                })?
            }
            Command::Recommend { id, top_k } => {
                let store = self.session.store();
                let recs = recommend_by_mutual(store, id, top_k.unwrap_or(settings.default_top_k));
                let rows = export::mutual_rows(store, &recs);
                self.output(&rows, |rows| {
                    if rows.is_empty() {
                        return GraphError::NoResult("no recommendations found").to_string();
                    }
                    rows.iter()
                        .map(|r| format!("User {} {} (mutuals={})", r.id, r.name, r.score))
                        .collect::<Vec<_>>()
                        .join("\n")
                })?
            }
            Command::Weighted { id, top_k } => {
                let store = self.session.store();
                let recs = recommend_weighted(store, id, top_k.unwrap_or(settings.default_top_k));
                let rows = export::weighted_rows(store, id, &recs);
                self.output(&rows, |rows| {
                    if rows.is_empty() {
                        return GraphError::NoResult("no recommendations found").to_string();
                    }
                    rows.iter()
                        .map(|r| {
                            format!(
                                "User {} {} score={:.2} mutuals={} shared=[{}]",
                                r.id,
                                r.name,
                                r.score,
                                r.mutuals,
                                r.shared_interests.join(", ")
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                })?
            }
            Command::Path { from, to } => {
                let path = shortest_path(self.session.store(), from, to).unwrap_or_default();
                self.output(&json!({ "path": path }), |_| {
                    if path.is_empty() {
                        GraphError::NoResult("no path found").to_string()
                    } else {
                        join_ids(&path, " -> ")
                    }
                })?
            }
            Command::Components => {
                let components = connected_components(self.session.store());
                self.output(&components, |components| {
                    components
                        .iter()
                        .enumerate()
                        .map(|(i, c)| format!("Community {}: {}", i + 1, join_ids(c, " ")))
                        .collect::<Vec<_>>()
                        .join("\n")
                })?
            }
            Command::Influencer => {
                let store = self.session.store();
                let found = influencer_by_degree(store);
                self.output(&json!({ "influencer": found }), |_| match found {
                    Some(id) => format!(
                        "Influencer: {} ({}, {} friends)",
                        id,
                        self.name(id),
                        store.friends(id).len()
                    ),
                    None => GraphError::NoResult("no users").to_string(),
                })?
            }
            Command::InterestInfluencer => {
                let found = influencer_by_interest_overlap(self.session.store());
                self.output(&json!({ "influencer": found }), |_| match found {
                    Some(id) => format!("Interest influencer: {} ({})", id, self.name(id)),
                    None => GraphError::NoResult("no users").to_string(),
                })?
            }
            Command::Degrees { top_n } => {
                let ranking = degree_ranking(self.session.store(), top_n);
                self.output(&ranking, |ranking| {
                    ranking
                        .iter()
                        .map(|d| format!("{} {} {}", d.user_id, self.name(d.user_id), d.degree))
                        .collect::<Vec<_>>()
                        .join("\n")
                })?
            }
            Command::Neighborhood { id, depth } => {
                if !self.session.store().contains_user(id) {
                    return Err(GraphError::NotFound(id).into());
                }
                let found = neighborhood(self.session.store(), id, depth);
                self.output(&found, |found| {
                    found
                        .iter()
                        .map(|n| format!("{} {} {}", n.distance, n.user_id, self.name(n.user_id)))
                        .collect::<Vec<_>>()
                        .join("\n")
                })?
            }
            Command::Suggest { prefix, k } => {
                let ids = self.session.suggest(&prefix, k.unwrap_or(settings.suggest_limit));
                let found = export::summaries(self.session.store(), &ids);
                let exact = !prefix.is_empty() && self.session.index().contains_name(&prefix);
                self.output(&found, |found| {
                    if found.is_empty() {
                        return GraphError::NoResult("no matching usernames").to_string();
                    }
                    found
                        .iter()
                        .map(|u| {
                            if exact && u.name == prefix {
                                format!("{} {} (exact)", u.id, u.name)
                            } else {
                                format!("{} {}", u.id, u.name)
                            }
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                })?
            }
            Command::Save { path } => {
                let path = path
                    .or_else(|| self.session.data_file().map(|p| p.to_path_buf()))
                    .or(settings.data_file)
                    .ok_or_else(|| anyhow!("no file given and no data file configured"))?;
                self.session.save(&path)?;
                format!("Saved to {}", path.display())
            }
            Command::Load { path } => {
                self.session
                    .load(&path)
                    .with_context(|| format!("loading {}", path.display()))?;
                format!(
                    "Loaded {} users from {}",
                    self.session.store().user_count(),
                    path.display()
                )
            }
            Command::ExportDot { path } => {
                export::write_dot(self.session.store(), &path)?;
                format!("Exported DOT to {}", path.display())
            }
            Command::Status => {
                let report = self.session.status();
                self.output(&report, |r| r.to_string())?
            }
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(None),
        };

        Ok(Some(text))
    }
}

fn join_ids(ids: &[UserId], sep: &str) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn shell(format: OutputFormat) -> Shell {
        Shell::new(Session::new(Settings::default()), format)
    }

    fn run(shell: &mut Shell, line: &str) -> String {
        match shell.execute_line(line) {
            Outcome::Output(text) => text,
            Outcome::Quit => panic!("unexpected quit"),
        }
    }

    fn seeded(format: OutputFormat) -> Shell {
        let mut sh = shell(format);
        for line in [
            "add-user Alice",
            "add-user Bob",
            "add-user Carol",
            "add-friend 1 2",
            "add-friend 2 3",
        ] {
            sh.execute_line(line);
        }
        sh
    }

    #[test]
    fn test_add_user_output() {
        let mut sh = shell(OutputFormat::Human);
        assert_eq!(run(&mut sh, "add-user Alice"), "Added user Alice with ID 1");
        assert_eq!(run(&mut sh, "add-user-id 9 Zed"), "Added user Zed with ID 9");
        assert!(run(&mut sh, "add-user-id 9 Again").starts_with("error: invalid argument"));
    }

    #[test]
    fn test_analytics_human() {
        let mut sh = seeded(OutputFormat::Human);
        assert_eq!(run(&mut sh, "path 1 3"), "1 -> 2 -> 3");
        assert_eq!(run(&mut sh, "components"), "Community 1: 1 2 3");
        assert_eq!(run(&mut sh, "influencer"), "Influencer: 2 (Bob, 2 friends)");
        assert_eq!(run(&mut sh, "recommend 1"), "User 3 Carol (mutuals=1)");
        assert_eq!(run(&mut sh, "degrees 1"), "2 Bob 2");
        assert_eq!(run(&mut sh, "neighborhood 1 1"), "1 2 Bob");
    }

    #[test]
    fn test_no_result_messages() {
        let mut sh = seeded(OutputFormat::Human);
        run(&mut sh, "add-user Dave");
        assert_eq!(run(&mut sh, "path 1 4"), "no result: no path found");
        assert_eq!(run(&mut sh, "recommend 4"), "no result: no recommendations found");
        assert_eq!(run(&mut sh, "suggest Q"), "no result: no matching usernames");
    }

    #[test]
    fn test_errors_rendered() {
        let mut sh = seeded(OutputFormat::Human);
        assert_eq!(run(&mut sh, "add-friend 1 1").split(':').next(), Some("error"));
        assert_eq!(run(&mut sh, "info 99"), "error: user 99 not found");
        assert_eq!(run(&mut sh, "frobnicate"), "error: unknown command 'frobnicate' (try 'help')");
        assert_eq!(run(&mut sh, "neighborhood 99 2"), "error: user 99 not found");
    }

    #[test]
    fn test_interests_and_weighted() {
        let mut sh = seeded(OutputFormat::Human);
        assert_eq!(run(&mut sh, "interests 1 Music, Go"), "Added 2 interest(s).");
        run(&mut sh, "interests 3 music");
        assert_eq!(run(&mut sh, "show-interests 1"), "go, music");
        assert_eq!(run(&mut sh, "interests 42 chess"), "Added 0 interest(s).");
        assert_eq!(
            run(&mut sh, "weighted 1"),
            "User 3 Carol score=2.00 mutuals=1 shared=[music]"
        );
        assert_eq!(run(&mut sh, "interest-influencer"), "Interest influencer: 1 (Alice)");
    }

    #[test]
    fn test_suggest_after_removal() {
        let mut sh = shell(OutputFormat::Human);
        run(&mut sh, "add-user alice");
        run(&mut sh, "add-user alan");
        assert_eq!(run(&mut sh, "suggest al"), "2 alan\n1 alice");
        assert_eq!(run(&mut sh, "remove-user 2"), "Removed user 2 (alan)");
        assert_eq!(run(&mut sh, "suggest al"), "1 alice");
    }

    #[test]
    fn test_suggest_marks_exact_name() {
        let mut sh = shell(OutputFormat::Human);
        run(&mut sh, "add-user ann");
        run(&mut sh, "add-user anna");
        assert_eq!(run(&mut sh, "suggest ann"), "1 ann (exact)\n2 anna");
        assert_eq!(run(&mut sh, "suggest an"), "1 ann\n2 anna");
    }

    #[test]
    fn test_json_output() {
        let mut sh = seeded(OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&run(&mut sh, "path 1 3")).unwrap();
        assert_eq!(value["path"], json!([1, 2, 3]));

        let value: serde_json::Value = serde_json::from_str(&run(&mut sh, "components")).unwrap();
        assert_eq!(value, json!([[1, 2, 3]]));

        let value: serde_json::Value = serde_json::from_str(&run(&mut sh, "recommend 1")).unwrap();
        assert_eq!(value[0]["id"], 3);
        assert_eq!(value[0]["score"], 1);

        let value: serde_json::Value = serde_json::from_str(&run(&mut sh, "status")).unwrap();
        assert_eq!(value["user_count"], 3);
    }

    #[test]
    fn test_save_load_export() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("net.txt");
        let dot = dir.path().join("net.dot");

        let mut sh = seeded(OutputFormat::Human);
        assert!(run(&mut sh, "save").starts_with("error: no file given"));
        assert!(run(&mut sh, &format!("save {}", data.display())).starts_with("Saved to"));
        assert!(run(&mut sh, &format!("export-dot {}", dot.display())).starts_with("Exported"));
        assert!(std::fs::read_to_string(&dot).unwrap().contains("1 -- 2;"));

        let mut fresh = shell(OutputFormat::Human);
        assert_eq!(
            run(&mut fresh, &format!("load {}", data.display())),
            format!("Loaded 3 users from {}", data.display())
        );
        assert_eq!(run(&mut fresh, "path 3 1"), "3 -> 2 -> 1");
        // Save without argument reuses the loaded file
        assert!(run(&mut fresh, "save").starts_with("Saved to"));
    }

    #[test]
    fn test_autosave_after_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("auto.txt");
        let settings = Settings {
            autosave: true,
            data_file: Some(data.clone()),
            ..Settings::default()
        };
        let mut sh = Shell::new(Session::new(settings), OutputFormat::Human);
        run(&mut sh, "add-user Solo");
        let saved = std::fs::read_to_string(&data).unwrap();
        assert!(saved.starts_with("USERS 1\n1|Solo\n"));
    }

    #[test]
    fn test_quit_and_blank() {
        let mut sh = shell(OutputFormat::Human);
        assert_eq!(sh.execute_line(""), Outcome::Output(String::new()));
        assert_eq!(sh.execute_line("quit"), Outcome::Quit);
    }
}
