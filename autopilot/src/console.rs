use autopilot_core::{
    DriverEvent, DriverSettings,
    agent::{IdleSignal, IdleVerdict, NotIdleReason, PromptDecision, ReadySignal, SelectionRule},
};
use std::io::{self, Write};

const RULE: &str =
    "================================================================================";

/// Renders driver progress as human-readable console text. Trace output for
/// the no-op outcomes of each scan is only shown with `--debug`.
pub struct Console<W: Write> {
    out: W,
    debug: bool,
}

impl<W: Write> Console<W> {
    pub fn new(out: W, debug: bool) -> Self {
        Self { out, debug }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn banner(&mut self, session: &str, settings: &DriverSettings) -> io::Result<()> {
        let out = &mut self.out;
        writeln!(out, "{RULE}")?;
        writeln!(out, "autopilot: unattended coding assistant")?;
        writeln!(out, "{RULE}")?;
        writeln!(out, "tmux session:       {session}")?;
        writeln!(
            out,
            "scan interval:      {}s",
            settings.check_interval.as_secs()
        )?;
        writeln!(
            out,
            "auto-prompt after:  {}s without activity",
            settings.auto_prompt_interval.as_secs()
        )?;
        writeln!(
            out,
            "debug:              {}",
            if self.debug { "on" } else { "off" }
        )?;
        writeln!(out, "response rules:")?;
        writeln!(out, "  • 2 options → select 1 (Yes)")?;
        writeln!(out, "  • 3 options → select 2 (Yes, and don't ask again)")?;
        writeln!(out, "auto-prompt:")?;
        for line in settings.auto_prompt.lines() {
            writeln!(out, "    {line}")?;
        }
        if let Some(prompt) = &settings.initial_prompt {
            writeln!(out, "initial prompt:")?;
            for line in prompt.lines() {
                writeln!(out, "    {line}")?;
            }
        }
        writeln!(out, "{RULE}")?;
        writeln!(out)
    }

    pub fn render(&mut self, event: &DriverEvent) -> io::Result<()> {
        match event {
            DriverEvent::Starting {
                session,
                tmux_version,
            } => writeln!(
                self.out,
                "[start] {tmux_version} found, creating session '{session}'"
            ),
            DriverEvent::SessionCreated { session } => {
                writeln!(self.out, "[start] session '{session}' created")
            }
            DriverEvent::Launching { command } => writeln!(
                self.out,
                "[start] launched `{command}`, waiting for it to become ready..."
            ),
            DriverEvent::Ready(signal) => {
                let how = match signal {
                    ReadySignal::InputGlyph => "input prompt",
                    ReadySignal::WelcomeBanner => "welcome banner",
                };
                writeln!(self.out, "[start] assistant ready ({how} seen)")
            }
            DriverEvent::ReadyTimeout { waited } => writeln!(
                self.out,
                "[warn] assistant did not look ready after {}s, continuing anyway",
                waited.as_secs()
            ),
            DriverEvent::InitialPromptSent { text } => {
                writeln!(self.out, "[start] initial prompt sent ✓")?;
                self.trace(&format!("initial prompt: {text}"))
            }
            DriverEvent::Monitoring { session } => self.monitoring_hints(session),
            DriverEvent::Scanning { idle_for } => writeln!(
                self.out,
                "[scan] checking pane... (idle {}s)",
                idle_for.as_secs()
            ),
            DriverEvent::PromptChecked(decision) => self.trace_prompt(decision),
            DriverEvent::IdleChecked(verdict) => self.trace_idle(verdict),
            DriverEvent::PromptAnswered {
                choices,
                response,
                rule,
            } => {
                writeln!(self.out, "{RULE}")?;
                writeln!(self.out, "[prompt] {} options found:", choices.len())?;
                for choice in choices {
                    let marker = if choice.index.to_string() == *response {
                        "❯"
                    } else {
                        " "
                    };
                    writeln!(self.out, "  {marker} {}. {}", choice.index, choice.label)?;
                }
                let why = match rule {
                    SelectionRule::YesNo => "two options, choosing Yes".to_string(),
                    SelectionRule::YesAlwaysNo => {
                        "three options, choosing Yes and don't ask again".to_string()
                    }
                    SelectionRule::UnexpectedShape => {
                        format!("unexpected option count {}, defaulting", choices.len())
                    }
                };
                writeln!(self.out, "[prompt] {why} → sent '{response}' ✓")?;
                writeln!(self.out, "{RULE}")
            }
            DriverEvent::AutoPromptSent { text } => {
                writeln!(self.out, "[auto] assistant looks idle, sent auto-prompt ✓")?;
                self.trace(&format!("auto-prompt: {text}"))
            }
            DriverEvent::SendFailed { what, error } => {
                writeln!(self.out, "[warn] {what} not delivered: {error}")
            }
            DriverEvent::Stopped { session } => {
                writeln!(self.out, "[stop] session '{session}' removed ✓")
            }
        }
    }

    fn monitoring_hints(&mut self, session: &str) -> io::Result<()> {
        let out = &mut self.out;
        writeln!(out)?;
        writeln!(out, "{RULE}")?;
        writeln!(out, "monitoring started")?;
        writeln!(out, "  watch the assistant:  tmux attach -t {session}")?;
        writeln!(out, "  detach again:         Ctrl+B then D")?;
        writeln!(out, "  stop autopilot:       Ctrl+C")?;
        writeln!(out, "{RULE}")?;
        writeln!(out)
    }

    fn trace(&mut self, message: &str) -> io::Result<()> {
        if self.debug {
            writeln!(self.out, "[debug] {message}")?;
        }
        Ok(())
    }

    fn trace_prompt(&mut self, decision: &PromptDecision) -> io::Result<()> {
        let message = match decision {
            PromptDecision::NoPrompt => "no confirmation prompt found".to_string(),
            PromptDecision::CoolingDown {
                cue,
                since_response,
            } => format!(
                "prompt matched /{}/ but last answer was {}s ago",
                cue.pattern,
                since_response.as_secs()
            ),
            PromptDecision::NoOptions { cue, recent } => {
                let mut message = format!(
                    "prompt matched /{}/ but no numbered options found, recent pane:",
                    cue.pattern
                );
                for line in recent.lines() {
                    message.push_str("\n    ");
                    message.push_str(line);
                }
                message
            }
            PromptDecision::Select { cue, .. } => {
                format!("prompt matched /{}/", cue.pattern)
            }
        };
        self.trace(&message)
    }

    fn trace_idle(&mut self, verdict: &IdleVerdict) -> io::Result<()> {
        let message = match verdict {
            IdleVerdict::Idle(IdleSignal::InputPrompt(line)) => {
                format!("idle: input line {line:?}")
            }
            IdleVerdict::Idle(IdleSignal::ShortLastLine(line)) => {
                format!("idle: short last line {line:?} (heuristic)")
            }
            IdleVerdict::Idle(IdleSignal::CompletionKeyword { line, keyword }) => {
                format!("idle: {keyword:?} in last line {line:?}")
            }
            IdleVerdict::NotIdle(NotIdleReason::PromptCooldown { elapsed }) => format!(
                "not idle: auto-prompt sent {}s ago",
                elapsed.as_secs()
            ),
            IdleVerdict::NotIdle(NotIdleReason::ResponseCooldown { elapsed }) => {
                format!("not idle: last answer sent {}s ago", elapsed.as_secs())
            }
            IdleVerdict::NotIdle(NotIdleReason::PendingPrompt(cue)) => {
                format!("not idle: unanswered prompt /{}/", cue.pattern)
            }
            IdleVerdict::NotIdle(NotIdleReason::Busy(cue)) => {
                format!("not idle: busy marker /{}/ ({:?})", cue.pattern, cue.meaning)
            }
            IdleVerdict::NotIdle(NotIdleReason::NoIdleSignal { last_line }) => {
                format!("not idle: last line {last_line:?}")
            }
        };
        self.trace(&message)
    }
}
