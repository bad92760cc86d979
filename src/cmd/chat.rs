//! Interactive review loop: `stayloop chat`.

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, theme::ColorfulTheme};

use stayloop::config::Config;
use stayloop::errors::WorkflowError;
use stayloop::ui;
use stayloop::workflow::Outcome;

use super::{build_engine, print_outcome};

/// Replies that leave the loop with the session still suspended.
const QUIT_WORDS: [&str; 3] = ["quit", "exit", "/q"];

fn prompt(label: &str) -> Result<String> {
    Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(label)
        .interact_text()
        .context("Failed to read input")
}

fn is_quit(reply: &str) -> bool {
    let reply = reply.trim().to_lowercase();
    QUIT_WORDS.contains(&reply.as_str())
}

pub async fn cmd_chat(config: &Config, text: Option<String>, session: Option<String>) -> Result<()> {
    let engine = build_engine(config)?;

    let existing = match &session {
        Some(id) => match engine.current(id).await {
            Ok(outcome) => Some(outcome),
            Err(WorkflowError::SessionNotFound { .. }) => None,
            Err(e) => return Err(e.into()),
        },
        None => None,
    };

    let mut outcome = match existing {
        Some(outcome) => outcome,
        None => {
            let text = match text {
                Some(t) if !t.trim().is_empty() => t,
                _ => prompt("Where and when would you like to stay?")?,
            };
            let spinner = ui::spinner("Extracting booking details...", !config.json);
            let result = engine.start(session, text).await;
            spinner.finish_and_clear();
            result?
        }
    };

    loop {
        print_outcome(config, &outcome)?;
        let Outcome::Suspended(payload) = &outcome else {
            return Ok(());
        };

        let reply = prompt("Your reply")?;
        if is_quit(&reply) {
            println!(
                "{}",
                style(format!(
                    "Session {} saved. Continue with: stayloop chat --session {}",
                    payload.session_id, payload.session_id
                ))
                .dim()
            );
            return Ok(());
        }

        let spinner = ui::spinner("Processing reply...", !config.json);
        let next = engine.resume(&payload.session_id, &reply).await;
        spinner.finish_and_clear();
        outcome = next?;
    }
}
