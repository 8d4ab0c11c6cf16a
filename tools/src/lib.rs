//! social-graph-tools: everything around the in-memory engine that touches
//! the outside world.
//!
//! `Session` owns a `GraphStore` and its `PrefixIndex` and keeps them in step.
//! `persistence` reads and writes the line-oriented text format, `export`
//! renders DOT and JSON views, and `shell` drives a session from text
//! commands (the `social-graph` binary).

pub mod command;
pub mod export;
pub mod persistence;
pub mod session;
pub mod settings;
pub mod shell;
pub mod status;

pub use command::{Command, CommandError};
pub use persistence::{load_from_file, save_to_file, PersistError};
pub use session::Session;
pub use settings::{Settings, SettingsError};
pub use shell::{Outcome, OutputFormat, Shell};
pub use status::StatusReport;
