use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use stayloop::config::Config;

mod cmd;

#[derive(Parser)]
#[command(name = "stayloop")]
#[command(version, about = "Hotel booking intake with human review")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print machine-readable JSON instead of the rendered view
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory for sessions and stayloop.toml (default: platform data dir)
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    /// Path to a stayloop.toml to use instead of the one in the state dir
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a session from a free-text booking request
    Start {
        /// The request, e.g. "hotel in Ubud, 20-25 June 2025, 2 guests"
        #[arg(required = true)]
        text: Vec<String>,
        /// Session id to use (generated if omitted)
        #[arg(long)]
        session: Option<String>,
    },
    /// Answer the review of a suspended session
    Resume {
        session: String,
        /// "agree", "done", or a correction
        #[arg(required = true)]
        reply: Vec<String>,
    },
    /// Show the current state of a session
    Show { session: String },
    /// List sessions, most recent first
    Sessions,
    /// Interactive review loop in the terminal
    Chat {
        /// Initial request (prompted for if omitted)
        text: Vec<String>,
        /// Continue an existing session, or start one with this id
        #[arg(long)]
        session: Option<String>,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default stayloop.toml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    stayloop::logging::init(cli.verbose);

    let config =
        Config::load(cli.state_dir.clone(), cli.config.clone())?.with_output(cli.verbose, cli.json);

    match cli.command {
        Commands::Start { text, session } => {
            cmd::cmd_start(&config, session, &text.join(" ")).await?
        }
        Commands::Resume { session, reply } => {
            cmd::cmd_resume(&config, &session, &reply.join(" ")).await?
        }
        Commands::Show { session } => cmd::cmd_show(&config, &session).await?,
        Commands::Sessions => cmd::cmd_sessions(&config).await?,
        Commands::Chat { text, session } => {
            let text = (!text.is_empty()).then(|| text.join(" "));
            cmd::cmd_chat(&config, text, session).await?
        }
        Commands::Config { command } => cmd::cmd_config(&config, command)?,
    }

    Ok(())
}
