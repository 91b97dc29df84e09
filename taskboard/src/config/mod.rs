//! Configuration for the `taskboard` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskboard/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use url::Url;

use taskboard_proto::envelope::DEFAULT_PAGE_SIZE;
use taskboard_proto::filter::TaskFilter;
use taskboard_proto::{ProjectId, SectionId, TaskId, TaskPriority, TaskStatus, UserId};

use crate::api::http::DEFAULT_BASE_URL;
use crate::board::{BoardOptions, MutationOrdering, StatusBinding};

/// Project shown when none is configured.
pub const DEFAULT_PROJECT: &str = "proj-1";

/// Request timeout when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// The API base URL is not a valid absolute URL.
    #[error("invalid API URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    api: ApiFileConfig,
    board: BoardFileConfig,
}

/// `[api]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ApiFileConfig {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    page_size: Option<usize>,
}

/// `[board]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct BoardFileConfig {
    project: Option<String>,
    data_source: Option<DataSource>,
    mutation_ordering: Option<MutationOrdering>,
    /// `[board.status_bindings]`: section id = status.
    status_bindings: HashMap<SectionId, TaskStatus>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Where the board reads and persists tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// The REST backend at `api_url`.
    #[default]
    Remote,
    /// An in-process collaborator seeded with demo data.
    Demo,
}

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST backend.
    pub api_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    pub data_source: DataSource,
    /// Project whose board is loaded.
    pub project: ProjectId,
    /// Store options (page size, ordering, status bindings).
    pub board: BoardOptions,
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an
    /// error. Otherwise the default path
    /// (`~/.config/taskboard/config.toml`) is tried and silently ignored if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed,
    /// or if the resolved API URL is invalid.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    /// Priority: CLI > file > default. Separated from `load()` so it can be
    /// tested without touching the filesystem.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Result<Self, ConfigError> {
        let raw_url = cli
            .api_url
            .as_deref()
            .or(file.api.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL);
        let api_url = Url::parse(raw_url).map_err(|source| ConfigError::InvalidUrl {
            url: raw_url.to_string(),
            source,
        })?;

        let data_source = if cli.demo {
            DataSource::Demo
        } else {
            file.board.data_source.unwrap_or_default()
        };

        let project = cli
            .project
            .clone()
            .or_else(|| file.board.project.clone())
            .unwrap_or_else(|| DEFAULT_PROJECT.to_string());

        let board = BoardOptions {
            page_size: file.api.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1),
            ordering: file.board.mutation_ordering.unwrap_or_default(),
            status_binding: file
                .board
                .status_bindings
                .iter()
                .map(|(section, status)| (section.clone(), *status))
                .collect::<StatusBinding>(),
        };

        Ok(Self {
            api_url,
            timeout: Duration::from_secs(file.api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            data_source,
            project: ProjectId::new(project),
            board,
        })
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Kanban task board client")]
pub struct CliArgs {
    /// Base URL of the REST backend.
    #[arg(long, env = "TASKBOARD_API_URL")]
    pub api_url: Option<String>,

    /// Use built-in demo data instead of the backend.
    #[arg(long)]
    pub demo: bool,

    /// Project whose board to load.
    #[arg(short, long, env = "TASKBOARD_PROJECT")]
    pub project: Option<String>,

    /// Path to config file (default: `~/.config/taskboard/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKBOARD_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskboard.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// What to do; prints the board when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Board operations available from the command line.
#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the board, optionally filtered.
    Show(ShowArgs),

    /// Move a task to another section.
    Move {
        task: TaskId,
        from: SectionId,
        to: SectionId,
        /// Position in the destination section (clamped).
        #[arg(default_value_t = 0)]
        index: usize,
    },

    /// Reorder a task within its section.
    Reorder {
        section: SectionId,
        task: TaskId,
        index: usize,
    },

    /// Set a task's status.
    Status {
        task: TaskId,
        status: TaskStatus,
        /// Section the task sits in.
        section: SectionId,
    },

    /// Create a task at the end of a section.
    Create {
        section: SectionId,
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value = "medium")]
        priority: TaskPriority,
        #[arg(long, default_value = "todo")]
        status: TaskStatus,
    },

    /// Change a task's fields.
    Update {
        task: TaskId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<TaskPriority>,
        #[arg(long, conflicts_with = "unassign")]
        assignee: Option<UserId>,
        /// Clear the assignee.
        #[arg(long)]
        unassign: bool,
    },

    /// Delete a task.
    Delete { task: TaskId, section: SectionId },
}

/// Filter flags of `show`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ShowArgs {
    #[arg(long, value_delimiter = ',')]
    pub status: Vec<TaskStatus>,
    #[arg(long, value_delimiter = ',')]
    pub priority: Vec<TaskPriority>,
    #[arg(long, value_delimiter = ',')]
    pub assignee: Vec<UserId>,
    #[arg(long = "tag", value_delimiter = ',')]
    pub tags: Vec<String>,
    /// Earliest due date (YYYY-MM-DD).
    #[arg(long)]
    pub due_from: Option<NaiveDate>,
    /// Latest due date (YYYY-MM-DD).
    #[arg(long)]
    pub due_to: Option<NaiveDate>,
    /// Text to look for in title or description.
    #[arg(long)]
    pub search: Option<String>,
}

impl ShowArgs {
    #[must_use]
    pub fn filter(&self) -> TaskFilter {
        TaskFilter {
            status: self.status.clone(),
            priority: self.priority.clone(),
            assignee_id: self.assignee.clone(),
            project_id: Vec::new(),
            tags: self.tags.clone(),
            due_date_from: self.due_from,
            due_date_to: self.due_to,
            search: self.search.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = config_dir.join("taskboard").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
