use std::path::PathBuf;

use social_graph_core::UserId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("{param} must be a positive integer, got '{value}'")]
    InvalidNumber { param: &'static str, value: String },
}

/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddUser { name: String },
    AddUserWithId { id: UserId, name: String },
    RemoveUser { id: UserId },
    AddFriend { a: UserId, b: UserId },
    RemoveFriend { a: UserId, b: UserId },
    AddInterests { id: UserId, csv: String },
    ShowInterests { id: UserId },
    Info { id: UserId },
    List,
    Recommend { id: UserId, top_k: Option<usize> },
    Weighted { id: UserId, top_k: Option<usize> },
    Path { from: UserId, to: UserId },
    Components,
    Influencer,
    InterestInfluencer,
    Degrees { top_n: usize },
    Neighborhood { id: UserId, depth: u32 },
    Suggest { prefix: String, k: Option<usize> },
    Save { path: Option<PathBuf> },
    Load { path: PathBuf },
    ExportDot { path: PathBuf },
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  add-user NAME                 add a user, print the new id
  add-user-id ID NAME           add a user under a fixed id
  remove-user ID                remove a user and their friendships
  add-friend A B                befriend two users
  remove-friend A B             end a friendship
  interests ID A, B, ...        add comma-separated interests
  show-interests ID             list a user's interests
  info ID                       show a user's friends and interests
  list                          list all users
  recommend ID [K]              friends-of-friends by mutual count
  weighted ID [K]               friends-of-friends by mutual count + interests
  path A B                      shortest friendship path
  components                    connected communities
  influencer                    user with the most friends
  interest-influencer           user with the highest average interest overlap
  degrees [N]                   users ranked by friend count (0 = all)
  neighborhood ID DEPTH         users within DEPTH hops
  suggest PREFIX [K]            usernames starting with PREFIX
  save [FILE]                   save to FILE or the current data file
  load FILE                     replace the graph with FILE
  export-dot FILE               write a Graphviz file
  status                        graph and index summary
  help                          this text
  quit                          exit";

fn parse_id(param: &'static str, value: &str) -> Result<UserId, CommandError> {
    match value.parse::<UserId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(CommandError::InvalidNumber {
            param,
            value: value.to_string(),
        }),
    }
}

fn parse_count(param: &'static str, value: &str) -> Result<usize, CommandError> {
    value.parse().map_err(|_| CommandError::InvalidNumber {
        param,
        value: value.to_string(),
    })
}

fn optional_count(param: &'static str, value: Option<&str>) -> Result<Option<usize>, CommandError> {
    value.map(|v| parse_count(param, v)).transpose()
}

/// Split off the first whitespace-delimited word.
fn next_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(pos) => (&input[..pos], input[pos..].trim_start()),
        None => (input, ""),
    }
}

impl Command {
    /// Parse one input line. Returns Ok(None) for blank lines and `#` comments.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (verb, rest) = next_word(line);
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match verb {
            "add-user" => {
                if rest.is_empty() {
                    return Err(CommandError::Usage("add-user NAME"));
                }
                Command::AddUser {
                    name: rest.to_string(),
                }
            }
            "add-user-id" => {
                let (id, name) = next_word(rest);
                if id.is_empty() || name.is_empty() {
                    return Err(CommandError::Usage("add-user-id ID NAME"));
                }
                Command::AddUserWithId {
                    id: parse_id("ID", id)?,
                    name: name.to_string(),
                }
            }
            "remove-user" => match args.as_slice() {
                [id] => Command::RemoveUser {
                    id: parse_id("ID", id)?,
                },
                _ => return Err(CommandError::Usage("remove-user ID")),
            },
            "add-friend" => match args.as_slice() {
                [a, b] => Command::AddFriend {
                    a: parse_id("A", a)?,
                    b: parse_id("B", b)?,
                },
                _ => return Err(CommandError::Usage("add-friend A B")),
            },
            "remove-friend" => match args.as_slice() {
                [a, b] => Command::RemoveFriend {
                    a: parse_id("A", a)?,
                    b: parse_id("B", b)?,
                },
                _ => return Err(CommandError::Usage("remove-friend A B")),
            },
            "interests" => {
                let (id, csv) = next_word(rest);
                if id.is_empty() || csv.is_empty() {
                    return Err(CommandError::Usage("interests ID A, B, ..."));
                }
                Command::AddInterests {
                    id: parse_id("ID", id)?,
                    csv: csv.to_string(),
                }
            }
            "show-interests" => match args.as_slice() {
                [id] => Command::ShowInterests {
                    id: parse_id("ID", id)?,
                },
                _ => return Err(CommandError::Usage("show-interests ID")),
            },
            "info" => match args.as_slice() {
                [id] => Command::Info {
                    id: parse_id("ID", id)?,
                },
                _ => return Err(CommandError::Usage("info ID")),
            },
            "list" => Command::List,
            "recommend" | "weighted" => {
                let (id, k) = match args.as_slice() {
                    [id] => (*id, None),
                    [id, k] => (*id, Some(*k)),
                    _ if verb == "recommend" => return Err(CommandError::Usage("recommend ID [K]")),
                    _ => return Err(CommandError::Usage("weighted ID [K]")),
                };
                let id = parse_id("ID", id)?;
                let top_k = optional_count("K", k)?;
                if verb == "recommend" {
                    Command::Recommend { id, top_k }
                } else {
                    Command::Weighted { id, top_k }
                }
            }
            "path" => match args.as_slice() {
                [a, b] => Command::Path {
                    from: parse_id("A", a)?,
                    to: parse_id("B", b)?,
                },
                _ => return Err(CommandError::Usage("path A B")),
            },
            "components" => Command::Components,
            "influencer" => Command::Influencer,
            "interest-influencer" => Command::InterestInfluencer,
            "degrees" => match args.as_slice() {
                [] => Command::Degrees { top_n: 0 },
                [n] => Command::Degrees {
                    top_n: parse_count("N", n)?,
                },
                _ => return Err(CommandError::Usage("degrees [N]")),
            },
            "neighborhood" => match args.as_slice() {
                [id, depth] => Command::Neighborhood {
                    id: parse_id("ID", id)?,
                    depth: depth.parse().map_err(|_| CommandError::InvalidNumber {
                        param: "DEPTH",
                        value: depth.to_string(),
                    })?,
                },
                _ => return Err(CommandError::Usage("neighborhood ID DEPTH")),
            },
            "suggest" => match args.as_slice() {
                [] => Command::Suggest {
                    prefix: String::new(),
                    k: None,
                },
                [prefix] => Command::Suggest {
                    prefix: prefix.to_string(),
                    k: None,
                },
                [prefix, k] => Command::Suggest {
                    prefix: prefix.to_string(),
                    k: Some(parse_count("K", k)?),
                },
                _ => return Err(CommandError::Usage("suggest PREFIX [K]")),
            },
            "save" => Command::Save {
                path: (!rest.is_empty()).then(|| PathBuf::from(rest)),
            },
            "load" => {
                if rest.is_empty() {
                    return Err(CommandError::Usage("load FILE"));
                }
                Command::Load {
                    path: PathBuf::from(rest),
                }
            }
            "export-dot" => {
                if rest.is_empty() {
                    return Err(CommandError::Usage("export-dot FILE"));
                }
                Command::ExportDot {
                    path: PathBuf::from(rest),
                }
            }
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }

    /// Whether running this command can change the graph.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::AddUser { .. }
                | Command::AddUserWithId { .. }
                | Command::RemoveUser { .. }
                | Command::AddFriend { .. }
                | Command::RemoveFriend { .. }
                | Command::AddInterests { .. }
        )
    }
}
