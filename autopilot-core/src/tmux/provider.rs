use std::path::Path;

/// The tmux capabilities the driver needs, one method per tmux command.
pub trait TmuxProvider {
    /// Returns the `tmux -V` version string, or an error with an install hint.
    fn check_installed(&self) -> anyhow::Result<String>;
    fn session_exists(&self, name: &str) -> bool;
    fn create_session(&self, name: &str, dir: Option<&Path>) -> anyhow::Result<()>;
    /// Best effort: a missing session is not an error.
    fn kill_session(&self, name: &str);
    /// Visible pane text plus `history_lines` of scrollback. Empty when the
    /// session does not exist or tmux fails.
    fn capture_pane(&self, name: &str, history_lines: usize) -> String;
    /// Types `text` literally into the pane.
    fn send_text(&self, name: &str, text: &str) -> anyhow::Result<()>;
    /// Sends named keys such as `C-m` or `Enter`.
    fn send_keys(&self, name: &str, keys: &[&str]) -> anyhow::Result<()>;
}
