//! `taskboard`: command-line kanban board.
//!
//! Loads a project's board from the REST backend (or from built-in demo
//! data), runs one board operation, waits for it to settle, and prints the
//! resulting board. Configuration via CLI flags, environment variables, or
//! config file (`~/.config/taskboard/config.toml`).
//!
//! ```bash
//! # Offline demo data
//! cargo run --bin taskboard -- --demo show --status todo,in_progress
//!
//! # Against the mock backend
//! cargo run --bin taskboard-server &
//! cargo run --bin taskboard -- move task-4 sec-1-2 sec-1-3 0
//! ```

use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use taskboard::api::TaskApi;
use taskboard::api::http::HttpTaskApi;
use taskboard::api::memory::InMemoryTaskApi;
use taskboard::board::BoardStore;
use taskboard::config::{CliArgs, ClientConfig, Command, DataSource, ShowArgs};
use taskboard::render;
use taskboard_proto::filter::TaskFilter;
use taskboard_proto::{NewTask, TaskPatch};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Logs go to a file so stdout only carries the board.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!(
        source = ?config.data_source,
        project = %config.project,
        url = %config.api_url,
        "taskboard starting"
    );

    let command = cli.command.unwrap_or_else(|| Command::Show(ShowArgs::default()));
    match config.data_source {
        DataSource::Demo => {
            let store = BoardStore::with_options(InMemoryTaskApi::demo(), config.board.clone());
            run(&store, &config, command).await
        }
        DataSource::Remote => match HttpTaskApi::new(config.api_url.clone(), config.timeout) {
            Ok(api) => {
                let store = BoardStore::with_options(api, config.board.clone());
                run(&store, &config, command).await
            }
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        },
    }
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskboard.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Loads the board, applies `command`, and prints the result.
async fn run<A: TaskApi + 'static>(
    store: &BoardStore<A>,
    config: &ClientConfig,
    command: Command,
) -> ExitCode {
    store.load_sections(&config.project).await;
    let loaded = store.snapshot();
    if loaded.partition.sections().is_empty()
        && let Some(err) = &loaded.error
    {
        eprintln!("error: {}", err.message());
        return ExitCode::FAILURE;
    }

    let mut filter = TaskFilter::default();
    match command {
        Command::Show(args) => filter = args.filter(),
        Command::Move {
            task,
            from,
            to,
            index,
        } => store.move_task(&task, &from, &to, index).settled().await,
        Command::Reorder {
            section,
            task,
            index,
        } => store.update_task_order(&section, &task, index).settled().await,
        Command::Status {
            task,
            status,
            section,
        } => store.update_task_status(&task, status, &section).settled().await,
        Command::Create {
            section,
            title,
            description,
            priority,
            status,
        } => {
            let mut new_task = NewTask::new(title).with_priority(priority).with_status(status);
            if let Some(description) = description {
                new_task = new_task.with_description(description);
            }
            if let Some(task) = store.create_task(new_task, &section).await {
                println!("created {}", task.id);
            }
        }
        Command::Update {
            task,
            title,
            description,
            priority,
            assignee,
            unassign,
        } => {
            let patch = TaskPatch {
                title,
                description,
                priority,
                assignee_id: if unassign { Some(None) } else { assignee.map(Some) },
                ..TaskPatch::default()
            };
            store.update_task(&task, patch).await;
        }
        Command::Delete { task, section } => store.delete_task(&task, &section).settled().await,
    }

    let state = store.snapshot();
    let view = if filter.is_empty() {
        state.partition
    } else {
        state.partition.filtered(&filter)
    };
    let mut stdout = io::stdout().lock();
    if let Err(e) = render::write_board(&mut stdout, &view).and_then(|()| stdout.flush()) {
        tracing::error!(error = %e, "failed to print board");
        return ExitCode::FAILURE;
    }

    match state.error {
        Some(err) => {
            eprintln!("error: {}", err.message());
            ExitCode::FAILURE
        }
        None => ExitCode::SUCCESS,
    }
}
