//! One-shot session commands: `start`, `resume`, `show`, `sessions`.

use anyhow::{Result, bail};
use console::style;

use stayloop::config::{Config, StoreBackend};
use stayloop::ui;

use super::{build_engine, print_json, print_outcome};

const EXTRACTING: &str = "Extracting booking details...";

pub async fn cmd_start(config: &Config, session: Option<String>, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        bail!("The booking request must not be empty");
    }
    let engine = build_engine(config)?;

    let spinner = ui::spinner(EXTRACTING, !config.json);
    let outcome = engine.start(session, text).await;
    spinner.finish_and_clear();
    let outcome = outcome?;

    print_outcome(config, &outcome)?;
    if !config.json {
        if config.toml.store.backend == StoreBackend::Memory {
            println!(
                "{}",
                style("Note: the memory store is in use; this session ends with the process.")
                    .yellow()
            );
        } else if !outcome.is_finished() {
            println!(
                "{}",
                style(format!(
                    "Reply with: stayloop resume {} <reply>",
                    outcome.session_id()
                ))
                .dim()
            );
        }
    }
    Ok(())
}

pub async fn cmd_resume(config: &Config, session: &str, reply: &str) -> Result<()> {
    let engine = build_engine(config)?;

    let spinner = ui::spinner(EXTRACTING, !config.json);
    let outcome = engine.resume(session, reply).await;
    spinner.finish_and_clear();

    print_outcome(config, &outcome?)
}

pub async fn cmd_show(config: &Config, session: &str) -> Result<()> {
    let engine = build_engine(config)?;
    let outcome = engine.current(session).await?;
    print_outcome(config, &outcome)
}

pub async fn cmd_sessions(config: &Config) -> Result<()> {
    let engine = build_engine(config)?;
    let sessions = engine.sessions().await?;

    if config.json {
        let rows: Vec<_> = sessions
            .iter()
            .map(|cp| {
                serde_json::json!({
                    "session_id": cp.session_id,
                    "node": cp.node,
                    "status": cp.state.status,
                    "iteration_count": cp.state.iteration_count,
                    "updated_at": cp.updated_at,
                })
            })
            .collect();
        print_json(&rows)
    } else {
        print!("{}", ui::render_sessions(&sessions));
        Ok(())
    }
}
