use super::patterns::{CHOICE_LINE, CONFIRMATION, PatternMatch, PromptCue};
use crate::{clock::Cooldowns, snapshot::PaneSnapshot};
use std::time::{Duration, Instant};

/// Minimum gap between two automatic answers, so overlapping polls of the
/// same prompt do not answer it twice.
pub const RESPONSE_COOLDOWN: Duration = Duration::from_secs(5);

/// Pane lines kept with [`PromptDecision::NoOptions`] for tuning the patterns.
pub const NO_OPTIONS_TAIL_LINES: usize = 30;

/// One numbered entry of an on-screen menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub index: u32,
    pub label: String,
}

/// How the chosen option was picked from the menu shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRule {
    /// Two options: the first is "Yes".
    YesNo,
    /// Three options: the second is "Yes, and don't ask again".
    YesAlwaysNo,
    /// Any other count: take the first and flag it.
    UnexpectedShape,
}

/// Outcome of classifying one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptDecision {
    NoPrompt,
    /// A prompt is showing but an answer was sent too recently.
    CoolingDown {
        cue: PatternMatch<PromptCue>,
        since_response: Duration,
    },
    /// Prompt phrasing matched but there is no numbered menu to answer.
    /// `recent` holds the bottom of the pane as it was seen.
    NoOptions {
        cue: PatternMatch<PromptCue>,
        recent: String,
    },
    Select {
        cue: PatternMatch<PromptCue>,
        choices: Vec<Choice>,
        response: String,
        rule: SelectionRule,
    },
}

impl PromptDecision {
    pub fn response(&self) -> Option<&str> {
        match self {
            Self::Select { response, .. } => Some(response),
            _ => None,
        }
    }
}

/// Numbered menu lines, de-duplicated by index (first occurrence wins).
pub fn extract_choices(text: &str) -> Vec<Choice> {
    let mut choices: Vec<Choice> = Vec::new();
    for caps in CHOICE_LINE.captures_iter(text) {
        let Ok(index) = caps[1].parse::<u32>() else {
            continue;
        };
        if choices.iter().any(|c| c.index == index) {
            continue;
        }
        choices.push(Choice {
            index,
            label: caps[2].trim().to_string(),
        });
    }
    choices
}

/// Which option to pick for a menu with `count` entries, if any.
pub fn select_option(count: usize) -> Option<(&'static str, SelectionRule)> {
    match count {
        0 => None,
        2 => Some(("1", SelectionRule::YesNo)),
        3 => Some(("2", SelectionRule::YesAlwaysNo)),
        _ => Some(("1", SelectionRule::UnexpectedShape)),
    }
}

/// Decides whether the snapshot shows a confirmation prompt worth answering
/// and, if so, which option to send. Never sends anything itself.
pub fn classify(snapshot: &PaneSnapshot, cooldowns: &Cooldowns, now: Instant) -> PromptDecision {
    let text = snapshot.text();
    let Some(cue) = CONFIRMATION.first_match(text) else {
        return PromptDecision::NoPrompt;
    };

    let since_response = cooldowns.since_response(now);
    if since_response < RESPONSE_COOLDOWN {
        return PromptDecision::CoolingDown {
            cue,
            since_response,
        };
    }

    let choices = extract_choices(text);
    match select_option(choices.len()) {
        None => PromptDecision::NoOptions {
            cue,
            recent: snapshot.tail(NO_OPTIONS_TAIL_LINES),
        },
        Some((response, rule)) => PromptDecision::Select {
            cue,
            choices,
            response: response.to_string(),
            rule,
        },
    }
}
