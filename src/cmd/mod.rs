//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module    | Commands handled                         |
//! |-----------|------------------------------------------|
//! | `session` | `Start`, `Resume`, `Show`, `Sessions`    |
//! | `chat`    | `Chat`                                   |
//! | `config`  | `Config`                                 |

pub mod chat;
pub mod config;
pub mod session;

pub use chat::cmd_chat;
pub use config::cmd_config;
pub use session::{cmd_resume, cmd_sessions, cmd_show, cmd_start};

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;

use stayloop::checkpoint::{CheckpointStore, FileStore, MemoryStore};
use stayloop::config::{Config, StoreBackend};
use stayloop::extract::GeminiExtractor;
use stayloop::workflow::{Outcome, WorkflowEngine};

/// Wire the engine from resolved configuration.
pub fn build_engine(config: &Config) -> Result<WorkflowEngine> {
    let store: Arc<dyn CheckpointStore> = match config.toml.store.backend {
        StoreBackend::File => Arc::new(FileStore::new(config.sessions_dir())),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };
    let extractor = GeminiExtractor::new(&config.toml.extractor, config.api_key())
        .context("Failed to set up the extraction client")?;
    if !extractor.is_configured() {
        tracing::warn!("GOOGLE_API_KEY is not set; extraction will fail until it is provided");
    }

    Ok(WorkflowEngine::new(store, Arc::new(extractor))
        .with_gate(config.toml.review.to_gate())
        .with_display(config.toml.display.to_display_options())
        .with_max_iterations(config.toml.workflow.max_iterations))
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Print an outcome in the configured output format.
pub fn print_outcome(config: &Config, outcome: &Outcome) -> Result<()> {
    if config.json {
        print_json(outcome)
    } else {
        print!("{}", stayloop::ui::render_outcome(outcome));
        Ok(())
    }
}
