//! # Output Configuration
//!
//! Decides whether progress and summary lines use emoji markers or plain
//! ASCII markers. No colour styling is applied; the decision only swaps the
//! marker glyphs.
//!
//! The `--color=always|never|auto` flag wins. In auto mode the usual
//! environment conventions are honoured:
//! - `NO_COLOR` set (any value) disables markers (https://no-color.org/)
//! - `CLICOLOR=0` disables, `CLICOLOR_FORCE=1` forces
//! - `TERM=dumb` disables
//! - otherwise `console` decides from the terminal's capabilities

use std::env;

/// Output configuration for progress and summary lines.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether emoji markers should be used.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from the environment and the value of
    /// the `--color` flag.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Plain ASCII markers regardless of environment.
    pub fn plain() -> Self {
        Self { use_color: false }
    }

    /// Emoji markers regardless of environment.
    #[cfg(test)]
    pub fn fancy() -> Self {
        Self { use_color: true }
    }

    /// The marker that opens a line of the given tone.
    pub fn marker(&self, tone: Tone) -> &'static str {
        match tone {
            Tone::Success => emoji(self, "✅", "[OK]"),
            Tone::Warning => emoji(self, "⚠️ ", "[WARN]"),
        }
    }
}

/// How a status line should read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Warning,
}

/// Returns `emoji_str` when markers are enabled, `plain` otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}
