//! Configuration for the intake workflow.
//!
//! Values are layered: `stayloop.toml` → environment → CLI flags. The
//! resolved [`Config`] is passed explicitly to whatever needs it.
//!
//! # Configuration File Format
//!
//! ```toml
//! [extractor]
//! model = "gemini-2.5-flash"
//! api_base = "https://generativelanguage.googleapis.com/v1beta"
//! temperature = 0.3
//! max_output_tokens = 1000
//! timeout_secs = 60
//!
//! [review]
//! affirm = ["agree", "ok", "correct"]
//! finish = ["done", "proceed"]
//!
//! [store]
//! backend = "file"
//! dir = "/var/lib/stayloop/sessions"
//!
//! [display]
//! currency = "Rp"
//! thousands_separator = "."
//!
//! [workflow]
//! max_iterations = 10
//! ```
//!
//! Environment: `GOOGLE_API_KEY`, `STAYLOOP_MODEL`, `STAYLOOP_STATE_DIR`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::display::DisplayOptions;
use crate::review::{ReviewGate, Vocabulary, gate};

pub const CONFIG_FILE: &str = "stayloop.toml";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const ENV_API_KEY: &str = "GOOGLE_API_KEY";
pub const ENV_MODEL: &str = "STAYLOOP_MODEL";
pub const ENV_STATE_DIR: &str = "STAYLOOP_STATE_DIR";

/// Extraction collaborator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorSection {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Prefer `GOOGLE_API_KEY` over storing the key here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_temperature() -> f64 {
    0.3
}

fn default_max_output_tokens() -> u32 {
    1000
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ExtractorSection {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_api_base(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

/// Reply vocabularies for the review gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSection {
    #[serde(default = "gate::default_affirm")]
    pub affirm: Vec<String>,
    #[serde(default = "gate::default_finish")]
    pub finish: Vec<String>,
}

impl Default for ReviewSection {
    fn default() -> Self {
        Self {
            affirm: gate::default_affirm(),
            finish: gate::default_finish(),
        }
    }
}

impl ReviewSection {
    pub fn to_gate(&self) -> ReviewGate {
        ReviewGate::new(Vocabulary::new(self.affirm.clone(), self.finish.clone()))
    }
}

/// Checkpoint backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Memory,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::File => write!(f, "file"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Session directory for the file backend (default: `<state dir>/sessions`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySection {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_thousands_separator")]
    pub thousands_separator: String,
}

fn default_currency() -> String {
    "Rp".to_string()
}

fn default_thousands_separator() -> String {
    ".".to_string()
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            thousands_separator: default_thousands_separator(),
        }
    }
}

impl DisplaySection {
    pub fn to_display_options(&self) -> DisplayOptions {
        DisplayOptions {
            currency: self.currency.clone(),
            thousands_separator: self.thousands_separator.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSection {
    /// Extraction passes after which a further loop ends the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,
}

/// Parsed `stayloop.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StayloopToml {
    #[serde(default)]
    pub extractor: ExtractorSection,
    #[serde(default)]
    pub review: ReviewSection,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub display: DisplaySection,
    #[serde(default)]
    pub workflow: WorkflowSection,
}

impl StayloopToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse stayloop.toml")
    }

    /// Load `stayloop.toml` from `state_dir`, or defaults if it does not exist.
    pub fn load_or_default(state_dir: &Path) -> Result<Self> {
        let path = state_dir.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize stayloop.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply environment overrides. `lookup` is `std::env::var` in production.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty(ENV_API_KEY) {
            self.extractor.api_key = Some(key);
        }
        if let Some(model) = non_empty(ENV_MODEL) {
            self.extractor.model = model;
        }
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.review.affirm.iter().all(|w| w.trim().is_empty()) {
            warnings.push("[review] affirm list is empty: replies can never confirm data".into());
        }
        if self.review.finish.iter().all(|w| w.trim().is_empty()) {
            warnings.push("[review] finish list is empty: replies can never end gathering".into());
        }

        let affirm: HashSet<String> = self
            .review
            .affirm
            .iter()
            .map(|w| w.trim().to_lowercase())
            .collect();
        let mut overlap: Vec<&String> = self
            .review
            .finish
            .iter()
            .filter(|w| affirm.contains(&w.trim().to_lowercase()))
            .collect();
        overlap.sort();
        if !overlap.is_empty() {
            warnings.push(format!(
                "[review] words in both affirm and finish are treated as affirm: {}",
                overlap
                    .iter()
                    .map(|w| w.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        if !(0.0..=2.0).contains(&self.extractor.temperature) {
            warnings.push(format!(
                "[extractor] temperature {} is outside 0.0-2.0",
                self.extractor.temperature
            ));
        }
        if self.extractor.timeout_secs == 0 {
            warnings.push("[extractor] timeout_secs = 0 makes every request time out".into());
        }
        if self.workflow.max_iterations == Some(0) {
            warnings.push(
                "[workflow] max_iterations = 0 ends every session at its first review".into(),
            );
        }

        warnings
    }
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    /// Where `stayloop.toml` was (or would be) read from
    pub config_path: PathBuf,
    pub toml: StayloopToml,
    pub verbose: bool,
    pub json: bool,
}

impl Config {
    /// Resolve configuration from CLI flags and the process environment.
    pub fn load(state_dir: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<Self> {
        Self::load_with(state_dir, config_path, |key| std::env::var(key).ok())
    }

    /// Like [`Config::load`] with an explicit environment lookup.
    pub fn load_with(
        state_dir: Option<PathBuf>,
        config_path: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let state_dir = resolve_state_dir(state_dir, &lookup)?;

        let (config_path, mut toml) = match config_path {
            Some(path) => {
                let toml = StayloopToml::load(&path)?;
                (path, toml)
            }
            None => (
                state_dir.join(CONFIG_FILE),
                StayloopToml::load_or_default(&state_dir)?,
            ),
        };
        toml.apply_env(&lookup);

        Ok(Self {
            state_dir,
            config_path,
            toml,
            verbose: false,
            json: false,
        })
    }

    pub fn with_output(mut self, verbose: bool, json: bool) -> Self {
        self.verbose = verbose;
        self.json = json;
        self
    }

    /// Directory holding session checkpoints for the file backend.
    pub fn sessions_dir(&self) -> PathBuf {
        match &self.toml.store.dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.state_dir.join(dir),
            None => self.state_dir.join("sessions"),
        }
    }

    pub fn api_key(&self) -> Option<String> {
        self.toml.extractor.api_key.clone()
    }

    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.toml.validate();
        if self.api_key().is_none() {
            warnings.push(format!(
                "{} is not set: every extraction will fail until it is provided",
                ENV_API_KEY
            ));
        }
        warnings
    }
}

/// CLI flag → `STAYLOOP_STATE_DIR` → platform data dir → `./.stayloop`.
fn resolve_state_dir(
    cli: Option<PathBuf>,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<PathBuf> {
    if let Some(dir) = cli {
        return Ok(dir);
    }
    if let Some(dir) = lookup(ENV_STATE_DIR).filter(|d| !d.trim().is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(data) = dirs::data_local_dir() {
        return Ok(data.join("stayloop"));
    }
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    Ok(cwd.join(".stayloop"))
}
