//! Terminal rendering for the CLI.

pub mod icons;
pub mod progress;
pub mod render;

pub use progress::spinner;
pub use render::{render_finished, render_outcome, render_payload, render_sessions};
