use crate::agent::{Choice, IdleVerdict, PromptDecision, ReadySignal, SelectionRule};
use std::time::Duration;

/// Progress reported by the driver. The binary renders these for the console;
/// tests collect them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    /// tmux was found and the session is about to be (re)created.
    Starting { session: String, tmux_version: String },

    SessionCreated { session: String },

    /// The launch command was typed into the new session.
    Launching { command: String },

    Ready(ReadySignal),

    /// The assistant never looked ready; monitoring starts anyway.
    ReadyTimeout { waited: Duration },

    InitialPromptSent { text: String },

    /// Startup finished and the polling loop is running.
    Monitoring { session: String },

    /// A scheduled scan began. `idle_for` is the time since the last
    /// automatic action.
    Scanning { idle_for: Duration },

    /// Classifier result for this scan, including the no-op outcomes.
    PromptChecked(PromptDecision),

    /// Idle detector result for this scan.
    IdleChecked(IdleVerdict),

    PromptAnswered {
        choices: Vec<Choice>,
        response: String,
        rule: SelectionRule,
    },

    AutoPromptSent { text: String },

    /// A send failed; cooldowns were left untouched so the next scan retries.
    SendFailed { what: &'static str, error: String },

    Stopped { session: String },
}
