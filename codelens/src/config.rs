//! User configuration for codelens.
//!
//! Read once at startup from `$XDG_CONFIG_HOME/codelens/config.toml` (falling back
//! to `~/.config/codelens/config.toml`). Every key is optional. A missing file
//! means defaults; a file that fails to parse is logged and also means defaults,
//! so a typo never prevents startup.

use std::path::PathBuf;
use std::time::Duration;

use codelens_core::progress::ProgressPlan;
use codelens_core::session::{ControllerOptions, DEFAULT_MAX_RETRIES};
use codelens_core::validate::ValidationLimits;
use serde::Deserialize;

/// Environment variable overriding `api_base_url`.
pub const API_BASE_URL_ENV: &str = "CODELENS_API_BASE_URL";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the analysis service, e.g. `http://localhost:8000`.
    pub api_base_url: String,
    /// Built-in theme name: `catppuccin-mocha` or `dark`.
    pub theme: String,
    /// Quiet window before an edit triggers re-analysis.
    pub debounce_ms: u64,
    /// Bound on submit + connect + first message.
    pub result_timeout_secs: u64,
    /// Retries offered after a failure before the affordance is hidden.
    pub max_retries: u32,
    pub max_code_chars: usize,
    pub max_code_lines: usize,
    pub history_limit: usize,
    /// Re-analyse automatically once editing goes quiet.
    pub auto_analyze: bool,
}

impl Default for Config {
    fn default() -> Self {
        let limits = ValidationLimits::default();
        Self {
            api_base_url: "http://localhost:8000".to_owned(),
            theme: "catppuccin-mocha".to_owned(),
            debounce_ms: 1_000,
            result_timeout_secs: 120,
            max_retries: DEFAULT_MAX_RETRIES,
            max_code_chars: limits.max_chars,
            max_code_lines: limits.max_lines,
            history_limit: codelens_core::db::HISTORY_CAP,
            auto_analyze: true,
        }
    }
}

impl Config {
    /// Parses a config file body. Unknown keys are ignored.
    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Loads the config file and applies environment overrides.
    pub fn load() -> Self {
        let path = config_path();
        let mut config = match std::fs::read_to_string(&path) {
            Ok(raw) => Self::parse(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "config parse error; using defaults");
                Self::default()
            }),
            Err(_) => {
                tracing::debug!(path = %path.display(), "no config file; using defaults");
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Applies environment overrides looked up through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(API_BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_owned();
        }
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.max(1))
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            result_timeout: Duration::from_secs(self.result_timeout_secs.max(1)),
            limits: ValidationLimits {
                max_chars: self.max_code_chars,
                max_lines: self.max_code_lines,
            },
            plan: ProgressPlan::standard(),
        }
    }
}

/// Returns the path to the codelens config file.
///
/// Prefers `$XDG_CONFIG_HOME/codelens/config.toml`; falls back to
/// `~/.config/codelens/config.toml` when the env var is absent.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("codelens").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::parse(
            "api_base_url = \"https://lens.example.com\"\ndebounce_ms = 400\nauto_analyze = false\n",
        )
        .unwrap();
        assert_eq!(config.api_base_url, "https://lens.example.com");
        assert_eq!(config.debounce_window(), Duration::from_millis(400));
        assert!(!config.auto_analyze);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.theme, "catppuccin-mocha");
    }

    #[test]
    fn wrong_types_fail_to_parse() {
        assert!(Config::parse("debounce_ms = \"soon\"").is_err());
    }

    #[test]
    fn env_overrides_the_base_url() {
        let mut config = Config::default();
        config.apply_env(|key| (key == API_BASE_URL_ENV).then(|| " http://10.0.0.2:9000 ".to_owned()));
        assert_eq!(config.api_base_url, "http://10.0.0.2:9000");

        config.apply_env(|_| Some("   ".to_owned()));
        assert_eq!(config.api_base_url, "http://10.0.0.2:9000");
    }

    #[test]
    fn controller_options_carry_the_limits() {
        let config = Config::parse("max_code_chars = 10\nresult_timeout_secs = 30").unwrap();
        let options = config.controller_options();
        assert_eq!(options.limits.max_chars, 10);
        assert_eq!(options.limits.max_lines, 2_000);
        assert_eq!(options.result_timeout, Duration::from_secs(30));
    }
}
