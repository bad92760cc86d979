use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while a collaborator call is in flight.
///
/// Hidden when `enabled` is false so `--json` output stays clean.
pub fn spinner(message: &str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_spinner_is_hidden() {
        let bar = spinner("Extracting", false);
        assert!(bar.is_hidden());
        bar.finish_and_clear();
    }
}
