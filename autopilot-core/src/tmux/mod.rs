pub mod cli;
pub mod mock;
pub mod provider;

pub use cli::CliTmuxProvider;
pub use provider::TmuxProvider;

use crate::snapshot::PaneSnapshot;
use std::{path::Path, thread, time::Duration};

/// Key that submits whatever has been typed into the pane.
pub const CONFIRM_KEY: &str = "C-m";

pub const DEFAULT_CONFIRM_DELAY: Duration = Duration::from_millis(200);

/// The driven program reads one line per instruction, so embedded newlines
/// would split an instruction into several submissions.
pub fn flatten_newlines(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// A [`TmuxProvider`] bound to the single session this process drives.
pub struct PaneBridge<'a> {
    tmux: &'a dyn TmuxProvider,
    session: String,
    history_lines: usize,
    confirm_delay: Duration,
}

impl<'a> PaneBridge<'a> {
    pub fn new(tmux: &'a dyn TmuxProvider, session: impl Into<String>) -> Self {
        Self {
            tmux,
            session: session.into(),
            history_lines: crate::config::DEFAULT_HISTORY_LINES,
            confirm_delay: DEFAULT_CONFIRM_DELAY,
        }
    }

    #[must_use]
    pub fn with_history_lines(mut self, lines: usize) -> Self {
        self.history_lines = lines;
        self
    }

    #[must_use]
    pub fn with_confirm_delay(mut self, delay: Duration) -> Self {
        self.confirm_delay = delay;
        self
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn tmux(&self) -> &dyn TmuxProvider {
        self.tmux
    }

    pub fn read_pane(&self) -> PaneSnapshot {
        PaneSnapshot::new(&self.tmux.capture_pane(&self.session, self.history_lines))
    }

    /// Types `text` (newlines flattened to spaces) and, if `confirm` is set,
    /// presses the confirm key after a short pause so the text lands first.
    pub fn send(&self, text: &str, confirm: bool) -> anyhow::Result<()> {
        let line = flatten_newlines(text);
        log::debug!("sending to {}: {line}", self.session);
        self.tmux.send_text(&self.session, &line)?;

        if confirm {
            if !self.confirm_delay.is_zero() {
                thread::sleep(self.confirm_delay);
            }
            self.tmux.send_keys(&self.session, &[CONFIRM_KEY])?;
        }
        Ok(())
    }

    pub fn session_exists(&self) -> bool {
        self.tmux.session_exists(&self.session)
    }

    pub fn create_session(&self, dir: Option<&Path>) -> anyhow::Result<()> {
        self.tmux.create_session(&self.session, dir)
    }

    pub fn destroy_session(&self) {
        self.tmux.kill_session(&self.session);
    }
}
