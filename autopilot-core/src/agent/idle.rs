use super::patterns::{
    BUSY, BusyCue, COMPLETION_KEYWORDS, PENDING_PROMPT, PROMPT_GLYPHS, PatternMatch, PromptCue,
    SHORT_LINE_MAX_CHARS,
};
use crate::{clock::Cooldowns, snapshot::PaneSnapshot};
use std::time::{Duration, Instant};

/// Busy markers only count when they appear this close to the bottom.
pub const BUSY_WINDOW_LINES: usize = 20;

/// How far up to look for the assistant's input line.
pub const PROMPT_WINDOW_LINES: usize = 10;

/// Why the session was judged idle, strongest signal first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdleSignal {
    /// A `>` input line near the bottom.
    InputPrompt(String),
    /// The last line is a bare prompt glyph or very short.
    ShortLastLine(String),
    /// The last line mentions a finished turn.
    CompletionKeyword { line: String, keyword: &'static str },
}

/// Why the session was judged not idle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotIdleReason {
    PromptCooldown { elapsed: Duration },
    ResponseCooldown { elapsed: Duration },
    PendingPrompt(PatternMatch<PromptCue>),
    Busy(PatternMatch<BusyCue>),
    NoIdleSignal { last_line: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdleVerdict {
    Idle(IdleSignal),
    NotIdle(NotIdleReason),
}

impl IdleVerdict {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle(_))
    }
}

/// Decides whether the assistant looks like it is waiting for new work.
///
/// Checks run from cheapest to most speculative and stop at the first
/// conclusive one: cooldowns, an unanswered prompt, recent activity, an
/// explicit input line, and finally guesses from the last line alone.
pub fn detect_idle(
    snapshot: &PaneSnapshot,
    cooldowns: &Cooldowns,
    now: Instant,
    auto_prompt_interval: Duration,
) -> IdleVerdict {
    let elapsed = cooldowns.since_auto_prompt(now);
    if elapsed < auto_prompt_interval {
        return IdleVerdict::NotIdle(NotIdleReason::PromptCooldown { elapsed });
    }

    let elapsed = cooldowns.since_response(now);
    if elapsed < auto_prompt_interval {
        return IdleVerdict::NotIdle(NotIdleReason::ResponseCooldown { elapsed });
    }

    if let Some(cue) = PENDING_PROMPT.first_match(snapshot.text()) {
        return IdleVerdict::NotIdle(NotIdleReason::PendingPrompt(cue));
    }

    if let Some(cue) = BUSY.first_match(&snapshot.tail(BUSY_WINDOW_LINES)) {
        return IdleVerdict::NotIdle(NotIdleReason::Busy(cue));
    }

    if let Some(line) = find_input_line(snapshot) {
        return IdleVerdict::Idle(IdleSignal::InputPrompt(line.to_string()));
    }

    let last_line = snapshot.last_line();
    if PROMPT_GLYPHS.contains(&last_line) || last_line.chars().count() <= SHORT_LINE_MAX_CHARS {
        log::debug!("idle guessed from short last line {last_line:?}");
        return IdleVerdict::Idle(IdleSignal::ShortLastLine(last_line.to_string()));
    }

    let lowered = last_line.to_lowercase();
    if let Some(keyword) = COMPLETION_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| lowered.contains(keyword))
    {
        return IdleVerdict::Idle(IdleSignal::CompletionKeyword {
            line: last_line.to_string(),
            keyword,
        });
    }

    IdleVerdict::NotIdle(NotIdleReason::NoIdleSignal {
        last_line: last_line.to_string(),
    })
}

/// The lowest line within the prompt window that is `>` alone or `> ...`.
fn find_input_line(snapshot: &PaneSnapshot) -> Option<&str> {
    let lines = snapshot.lines();
    let start = lines.len().saturating_sub(PROMPT_WINDOW_LINES);
    lines
        .into_iter()
        .skip(start)
        .rev()
        .map(str::trim)
        .find(|line| *line == ">" || line.starts_with("> "))
}
