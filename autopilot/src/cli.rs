use crate::console::Console;
use autopilot_core::{
    Clock, Config, Driver, DriverEvent, DriverSettings, PaneBridge, TmuxProvider,
};
use std::{io::Write, sync::atomic::AtomicBool};

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Clone)]
pub struct CliError {
    message: String,
    code: i32,
}

impl CliError {
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: 1,
        }
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: 2,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> i32 {
        self.code
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(value: anyhow::Error) -> Self {
        Self::system(format!("{value:#}"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub interval: Option<u64>,
    pub prompt_interval: Option<u64>,
    pub prompt: Option<String>,
    pub session: Option<String>,
    pub command: Option<String>,
    pub debug: bool,
}

/// Command-line values win over the config file.
pub fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(interval) = args.interval {
        config.check_interval = interval;
    }
    if let Some(interval) = args.prompt_interval {
        config.auto_prompt_interval = interval;
    }
    if let Some(session) = &args.session {
        config.session.name.clone_from(session);
    }
    if let Some(command) = &args.command {
        config.session.command.clone_from(command);
    }
}

/// Runs the driver until `shutdown` is set, rendering progress to `out`.
pub fn cmd_run(
    config: &Config,
    tmux: &dyn TmuxProvider,
    clock: &dyn Clock,
    args: &RunArgs,
    shutdown: &AtomicBool,
    out: &mut dyn Write,
) -> CliResult<()> {
    let settings = DriverSettings::from_config(config, args.prompt.clone())
        .map_err(|e| CliError::user(format!("{e:#}")))?;

    let mut console = Console::new(out, args.debug);
    if let Err(e) = console.banner(&config.session.name, &settings) {
        log::warn!("console write failed: {e}");
    }

    let bridge = PaneBridge::new(tmux, config.session.name.as_str())
        .with_history_lines(config.session.history_lines);
    let mut on_event = |event: DriverEvent| {
        if let Err(e) = console.render(&event) {
            log::warn!("console write failed: {e}");
        }
    };

    let mut driver = Driver::new(bridge, clock, settings, &mut on_event);
    driver.run(shutdown).map_err(CliError::from)
}

pub fn print_error(error: &CliError) {
    eprintln!("error: {}", error.message());
}

#[cfg(test)]
mod tests {
    use super::*;
    use autopilot_core::{clock::ManualClock, config, tmux::mock::MockTmuxProvider};

    fn run_with(
        config: &Config,
        tmux: &MockTmuxProvider,
        args: &RunArgs,
    ) -> (CliResult<()>, String) {
        let clock = ManualClock::new();
        let shutdown = AtomicBool::new(true);
        let mut out = Vec::new();
        let result = cmd_run(config, tmux, &clock, args, &shutdown, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut config = config::load_config_from_str(
            "check_interval = 5\n[session]\nname = \"from-file\"",
        )
        .unwrap();
        apply_overrides(
            &mut config,
            &RunArgs {
                interval: Some(9),
                session: Some("from-cli".to_string()),
                command: Some("claude --resume".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(config.check_interval, 9);
        assert_eq!(config.auto_prompt_interval, 60);
        assert_eq!(config.session.name, "from-cli");
        assert_eq!(config.session.command, "claude --resume");
    }

    #[test]
    fn run_starts_then_cleans_up_on_shutdown() {
        let tmux = MockTmuxProvider::with_pane("Welcome to Claude Code\n>");
        let (result, output) = run_with(&Config::default(), &tmux, &RunArgs::default());

        assert!(result.is_ok());
        assert!(output.contains("autopilot: unattended coding assistant"));
        assert!(output.contains("assistant ready (input prompt seen)"));
        assert!(output.contains("session 'claude-auto' removed"));
        assert!(!tmux.session_exists("claude-auto"));
    }

    #[test]
    fn missing_tmux_is_a_system_error() {
        let tmux = MockTmuxProvider::default();
        let (result, _) = run_with(&Config::default(), &tmux, &RunArgs::default());

        let error = result.unwrap_err();
        assert_eq!(error.code(), 2);
        assert!(error.message().contains("tmux"), "got: {error}");
    }

    #[test]
    fn zero_interval_is_a_user_error() {
        let mut config = Config::default();
        apply_overrides(
            &mut config,
            &RunArgs {
                interval: Some(0),
                ..Default::default()
            },
        );
        let tmux = MockTmuxProvider::installed();
        let (result, output) = run_with(&config, &tmux, &RunArgs::default());

        assert_eq!(result.unwrap_err().code(), 1);
        assert!(output.is_empty());
        assert!(tmux.created_sessions.lock().unwrap().is_empty());
    }
}
