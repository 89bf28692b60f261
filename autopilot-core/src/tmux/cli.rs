use super::provider::TmuxProvider;
use anyhow::{Context, bail};
use std::{path::Path, process::Command};

pub struct CliTmuxProvider;

/// Session-level commands resolve `-t` by prefix; `=` forces an exact match.
fn exact_session(name: &str) -> String {
    format!("={name}")
}

impl CliTmuxProvider {
    fn run(args: &[&str]) -> anyhow::Result<()> {
        let output = Command::new("tmux")
            .args(args)
            .output()
            .with_context(|| format!("failed to run tmux {}", args.first().unwrap_or(&"")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("tmux {} failed: {}", args.join(" "), stderr.trim());
        }
        Ok(())
    }
}

impl TmuxProvider for CliTmuxProvider {
    fn check_installed(&self) -> anyhow::Result<String> {
        let output = Command::new("tmux").arg("-V").output().context(
            "tmux not found: install tmux (e.g. `brew install tmux` or `apt install tmux`)",
        )?;
        if !output.status.success() {
            bail!(
                "tmux -V failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn session_exists(&self, name: &str) -> bool {
        let target = exact_session(name);
        Command::new("tmux")
            .args(["has-session", "-t", target.as_str()])
            .output()
            .is_ok_and(|o| o.status.success())
    }

    fn create_session(&self, name: &str, dir: Option<&Path>) -> anyhow::Result<()> {
        let dir_str = dir.map(|d| d.to_string_lossy().into_owned());
        let mut args = vec!["new-session", "-ds", name];
        if let Some(dir) = dir_str.as_deref() {
            args.extend(["-c", dir]);
        }
        Self::run(&args).with_context(|| format!("failed to create tmux session '{name}'"))?;
        log::info!("tmux session created: {name}");
        Ok(())
    }

    fn kill_session(&self, name: &str) {
        if !self.session_exists(name) {
            return;
        }
        let target = exact_session(name);
        match Self::run(&["kill-session", "-t", target.as_str()]) {
            Ok(()) => log::info!("tmux session killed: {name}"),
            Err(e) => log::warn!("{e:#}"),
        }
    }

    fn capture_pane(&self, name: &str, history_lines: usize) -> String {
        let start = format!("-{history_lines}");
        let output = Command::new("tmux")
            .args(["capture-pane", "-t", name, "-p", "-S", &start])
            .output();

        let Ok(output) = output else {
            return String::new();
        };
        if !output.status.success() {
            return String::new();
        }

        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    fn send_text(&self, name: &str, text: &str) -> anyhow::Result<()> {
        Self::run(&["send-keys", "-t", name, "-l", "--", text])
            .with_context(|| format!("failed to send text to '{name}'"))
    }

    fn send_keys(&self, name: &str, keys: &[&str]) -> anyhow::Result<()> {
        let mut args = vec!["send-keys", "-t", name];
        args.extend_from_slice(keys);
        Self::run(&args).with_context(|| format!("failed to send keys to '{name}'"))
    }
}
