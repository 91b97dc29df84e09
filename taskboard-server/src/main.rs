//! Task board mock server.
//!
//! # Usage
//!
//! ```bash
//! # Serve the demo projects on 127.0.0.1:8080
//! cargo run --bin taskboard-server
//!
//! # Start empty on a custom address
//! cargo run --bin taskboard-server -- --bind 0.0.0.0:9000 --no-seed
//! ```

use std::sync::Arc;

use clap::Parser;
use taskboard_proto::ledger::Ledger;
use taskboard_server::config::{ServerCliArgs, ServerConfig};
use taskboard_server::routes;
use taskboard_server::store::TaskStore;

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let store = if config.seed_demo {
        TaskStore::demo()
    } else {
        TaskStore::new(Ledger::new())
    };
    let store = Arc::new(store.with_max_page_size(config.max_page_size));

    tracing::info!(addr = %config.bind_addr, seeded = config.seed_demo, "starting task board server");

    match routes::start_server_with_state(&config.bind_addr, store).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "task board server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "task board server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start task board server");
            std::process::exit(1);
        }
    }
}
