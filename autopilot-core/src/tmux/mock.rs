use super::provider::TmuxProvider;
use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// Everything written into the pane, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentInput {
    Text(String),
    Keys(Vec<String>),
}

/// In-memory tmux used by tests. Captures return `pane_script` entries in
/// order; once the script runs dry the last entry keeps being returned.
#[derive(Default)]
pub struct MockTmuxProvider {
    pub installed: bool,
    pub sessions: Mutex<Vec<String>>,
    pub created_sessions: Mutex<Vec<(String, Option<PathBuf>)>>,
    pub killed_sessions: Mutex<Vec<String>>,
    pub pane_script: Mutex<VecDeque<String>>,
    pub last_capture: Mutex<String>,
    /// Scrollback depth requested by each capture.
    pub history_requests: Mutex<Vec<usize>>,
    pub sent: Mutex<Vec<SentInput>>,
    pub fail_sends: bool,
}

impl MockTmuxProvider {
    pub fn installed() -> Self {
        Self {
            installed: true,
            ..Default::default()
        }
    }

    pub fn with_pane(content: &str) -> Self {
        let mock = Self::installed();
        mock.push_pane(content);
        mock
    }

    pub fn push_pane(&self, content: &str) {
        self.pane_script
            .lock()
            .unwrap()
            .push_back(content.to_string());
    }

    pub fn sent(&self) -> Vec<SentInput> {
        self.sent.lock().unwrap().clone()
    }

    /// Literal texts only, without the confirm keystrokes.
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|input| match input {
                SentInput::Text(text) => Some(text.clone()),
                SentInput::Keys(_) => None,
            })
            .collect()
    }
}

impl TmuxProvider for MockTmuxProvider {
    fn check_installed(&self) -> anyhow::Result<String> {
        if self.installed {
            Ok("tmux 3.4".to_string())
        } else {
            anyhow::bail!("tmux not found: install tmux")
        }
    }

    fn session_exists(&self, name: &str) -> bool {
        self.sessions.lock().unwrap().iter().any(|s| s == name)
    }

    fn create_session(&self, name: &str, dir: Option<&Path>) -> anyhow::Result<()> {
        self.sessions.lock().unwrap().push(name.to_string());
        self.created_sessions
            .lock()
            .unwrap()
            .push((name.to_string(), dir.map(Path::to_path_buf)));
        Ok(())
    }

    fn kill_session(&self, name: &str) {
        self.sessions.lock().unwrap().retain(|s| s != name);
        self.killed_sessions.lock().unwrap().push(name.to_string());
    }

    fn capture_pane(&self, name: &str, history_lines: usize) -> String {
        self.history_requests.lock().unwrap().push(history_lines);
        if !self.session_exists(name) {
            return String::new();
        }
        let mut last = self.last_capture.lock().unwrap();
        if let Some(next) = self.pane_script.lock().unwrap().pop_front() {
            *last = next;
        }
        last.clone()
    }

    fn send_text(&self, _name: &str, text: &str) -> anyhow::Result<()> {
        if self.fail_sends {
            anyhow::bail!("send failed");
        }
        self.sent
            .lock()
            .unwrap()
            .push(SentInput::Text(text.to_string()));
        Ok(())
    }

    fn send_keys(&self, _name: &str, keys: &[&str]) -> anyhow::Result<()> {
        if self.fail_sends {
            anyhow::bail!("send failed");
        }
        self.sent.lock().unwrap().push(SentInput::Keys(
            keys.iter().map(ToString::to_string).collect(),
        ));
        Ok(())
    }
}
