use crate::paths::{config_dir, expand_tilde};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_SESSION_NAME: &str = "claude-auto";
pub const DEFAULT_COMMAND: &str = "claude";
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 20;
pub const DEFAULT_AUTO_PROMPT_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_HISTORY_LINES: usize = 100;
pub const DEFAULT_READY_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_AUTO_PROMPT: &str = "\
- Keep working through the implementation plans under docs/features/ as a checklist
- Follow best practices for the codebase
- Tick off checklist items as they are completed
- Keep going until every test and lint check passes
- Push regularly
- When every checklist item is done, move the document to docs/closed/";

pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Seconds between pane scans.
    #[serde(default = "Config::default_check_interval")]
    pub check_interval: u64,

    /// Minimum seconds of quiet before the auto-prompt is sent again.
    #[serde(default = "Config::default_auto_prompt_interval")]
    pub auto_prompt_interval: u64,

    /// Instruction typed into the assistant when it goes idle. Multiple lines
    /// are sent as one line joined by spaces. For example:
    /// ```toml
    /// auto_prompt = """
    /// - Continue with the next unchecked item in TODO.md
    /// - Run the tests before moving on
    /// """
    /// ```
    #[serde(default = "Config::default_auto_prompt")]
    pub auto_prompt: String,

    /// The tmux session the assistant runs in.
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Session name (default: "claude-auto"). Any existing session with this
    /// name is killed on startup.
    #[serde(default = "SessionConfig::default_name")]
    pub name: String,

    /// Command typed into the new session to launch the assistant
    /// (default: "claude").
    #[serde(default = "SessionConfig::default_command")]
    pub command: String,

    /// Working directory for the session. Supports `~`. Defaults to the
    /// directory autopilot was started from.
    pub start_dir: Option<String>,

    /// Lines of scrollback captured on each scan (default: 100).
    #[serde(default = "SessionConfig::default_history_lines")]
    pub history_lines: usize,

    /// Seconds to wait for the assistant to show its input box after launch
    /// (default: 10). Startup continues either way.
    #[serde(default = "SessionConfig::default_ready_timeout")]
    pub ready_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            check_interval: Self::default_check_interval(),
            auto_prompt_interval: Self::default_auto_prompt_interval(),
            auto_prompt: Self::default_auto_prompt(),
            session: SessionConfig::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            command: Self::default_command(),
            start_dir: None,
            history_lines: Self::default_history_lines(),
            ready_timeout: Self::default_ready_timeout(),
        }
    }
}

impl Config {
    fn default_check_interval() -> u64 {
        DEFAULT_CHECK_INTERVAL_SECS
    }
    fn default_auto_prompt_interval() -> u64 {
        DEFAULT_AUTO_PROMPT_INTERVAL_SECS
    }
    fn default_auto_prompt() -> String {
        DEFAULT_AUTO_PROMPT.to_string()
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval)
    }

    pub fn auto_prompt_interval(&self) -> Duration {
        Duration::from_secs(self.auto_prompt_interval)
    }

    pub fn validate(&self) -> Result<()> {
        if self.check_interval == 0 {
            bail!("check_interval must be at least 1 second");
        }
        if self.auto_prompt_interval == 0 {
            bail!("auto_prompt_interval must be at least 1 second");
        }
        if self.auto_prompt.trim().is_empty() {
            bail!("auto_prompt must not be empty");
        }
        if self.session.name.trim().is_empty() {
            bail!("session.name must not be empty");
        }
        if self.session.name.contains(['.', ':']) {
            bail!(
                "session.name '{}' must not contain '.' or ':' (tmux target separators)",
                self.session.name
            );
        }
        if self.session.history_lines == 0 {
            bail!("session.history_lines must be at least 1");
        }
        Ok(())
    }
}

impl SessionConfig {
    fn default_name() -> String {
        DEFAULT_SESSION_NAME.to_string()
    }
    fn default_command() -> String {
        DEFAULT_COMMAND.to_string()
    }
    fn default_history_lines() -> usize {
        DEFAULT_HISTORY_LINES
    }
    fn default_ready_timeout() -> u64 {
        DEFAULT_READY_TIMEOUT_SECS
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout)
    }

    /// The configured start directory with `~` expanded, if it exists.
    pub fn resolved_start_dir(&self) -> Result<Option<PathBuf>> {
        let Some(raw) = self.start_dir.as_deref() else {
            return Ok(None);
        };
        let path = expand_tilde(raw)
            .with_context(|| format!("cannot expand '{raw}': home directory unknown"))?;
        if !path.is_dir() {
            bail!("session.start_dir {} is not a directory", path.display());
        }
        Ok(Some(path))
    }
}

pub fn load_config_from_str(s: &str) -> Result<Config> {
    let config: Config = toml::from_str(s)?;
    Ok(config)
}

/// Loads the config file. The default location is optional; an explicitly
/// given path must exist.
pub fn load_config(config_override: Option<&Path>) -> Result<Config> {
    let config_file = match config_override {
        Some(path) => path.to_path_buf(),
        None => {
            let default = config_file();
            if !default.exists() {
                log::debug!("no config at {}, using defaults", default.display());
                return Ok(Config::default());
            }
            default
        }
    };
    if !config_file.exists() {
        bail!("Config file not found at {}", config_file.display());
    }
    let contents = fs::read_to_string(&config_file)
        .with_context(|| format!("failed to read {}", config_file.display()))?;
    load_config_from_str(&contents)
        .with_context(|| format!("invalid config in {}", config_file.display()))
}
