//! Declarative pattern tables for reading the assistant's pane.
//!
//! Each table is an ordered list of `(regex, meaning)`. The first matching
//! row wins, so more specific rows go first.

use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

/// Why a snapshot looks like it is asking for confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptCue {
    /// "Do you want to ...", "Would you like to ...", "Should I ..."
    Question,
    /// A bare "Continue?" / "Proceed?"
    Confirmation,
    /// The `❯ 1.` cursor the assistant draws on its highlighted menu entry.
    SelectedOption,
}

/// Why a snapshot looks like the assistant is still working.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyCue {
    /// Tool call or tool result markers.
    ToolActivity,
    /// The asterisk-like glyphs shown while thinking.
    ThinkingGlyph,
    /// Progress verbs such as "Compiling".
    ProgressWord,
    Ellipsis,
    Spinner,
    /// The "esc to interrupt" footer shown during a turn.
    Interruptible,
}

/// Prompts the classifier reacts to. Case-insensitive.
pub const CONFIRMATION_PATTERNS: &[(&str, PromptCue)] = &[
    (r"Do you want to", PromptCue::Question),
    (r"Would you like to", PromptCue::Question),
    (r"Should I", PromptCue::Question),
    (r"Continue\?", PromptCue::Confirmation),
    (r"Proceed\?", PromptCue::Confirmation),
    (r"❯\s*\d+\.", PromptCue::SelectedOption),
];

/// Unanswered prompts that block an auto-prompt. Narrower than
/// [`CONFIRMATION_PATTERNS`] so ordinary prose like "Should I" in earlier
/// output does not hold the session hostage. Case-insensitive.
pub const PENDING_PROMPT_PATTERNS: &[(&str, PromptCue)] = &[
    (r"Do you want to proceed\?", PromptCue::Question),
    (r"Would you like to continue\?", PromptCue::Question),
    (r"Should I proceed\?", PromptCue::Question),
    (r"Continue\?", PromptCue::Confirmation),
    (r"Proceed\?", PromptCue::Confirmation),
];

/// Activity markers, checked against recent lines only. Case-sensitive:
/// capitalised verbs are status lines, lowercase ones are usually prose.
pub const BUSY_PATTERNS: &[(&str, BusyCue)] = &[
    (r"⏺", BusyCue::ToolActivity),
    (r"⎿", BusyCue::ToolActivity),
    (r"✻", BusyCue::ThinkingGlyph),
    (r"✢", BusyCue::ThinkingGlyph),
    (r"✳", BusyCue::ThinkingGlyph),
    (r"Loading", BusyCue::ProgressWord),
    (r"Processing", BusyCue::ProgressWord),
    (r"Thinking", BusyCue::ProgressWord),
    (r"Working", BusyCue::ProgressWord),
    (r"Executing", BusyCue::ProgressWord),
    (r"Building", BusyCue::ProgressWord),
    (r"Testing", BusyCue::ProgressWord),
    (r"Compiling", BusyCue::ProgressWord),
    (r"\.\.\.", BusyCue::Ellipsis),
    (r"[⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏]", BusyCue::Spinner),
    (r"esc to interrupt", BusyCue::Interruptible),
];

/// One numbered menu entry: optional cursor glyph, digits, `.` or `)`, label.
pub const CHOICE_LINE_PATTERN: &str = r"(?m)^\s*[❯►]?\s*(\d+)[.)]\s+(.+)$";

/// Glyphs that on their own mean the assistant is waiting for input.
pub const PROMPT_GLYPHS: &[&str] = &[">", "❯", "$", "#", ":", "»", "›"];

/// A last line this short counts as idle. Known false-positive source:
/// short real output ("ok", "42") also passes.
pub const SHORT_LINE_MAX_CHARS: usize = 5;

/// Words in the last line that mean a turn just ended, in English and
/// Japanese. Matched against the lowercased line.
pub const COMPLETION_KEYWORDS: &[&str] = &[
    "completed",
    "finished",
    "done",
    "success",
    "failed",
    "error",
    "all",
    "完了",
    "終了",
    "成功",
    "失敗",
    "エラー",
    "すべて",
];

/// Compiled form of a `(pattern, meaning)` table.
pub struct PatternTable<M: 'static> {
    rows: Vec<(Regex, &'static str, M)>,
}

/// The row of a table that matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch<M> {
    pub pattern: &'static str,
    pub meaning: M,
}

impl<M: Copy> PatternTable<M> {
    pub fn compile(rows: &'static [(&'static str, M)], case_insensitive: bool) -> Self {
        let rows = rows
            .iter()
            .map(|&(pattern, meaning)| {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(case_insensitive)
                    .build()
                    .unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"));
                (regex, pattern, meaning)
            })
            .collect();
        Self { rows }
    }

    pub fn first_match(&self, text: &str) -> Option<PatternMatch<M>> {
        self.rows
            .iter()
            .find(|(regex, _, _)| regex.is_match(text))
            .map(|&(_, pattern, meaning)| PatternMatch { pattern, meaning })
    }
}

pub static CONFIRMATION: LazyLock<PatternTable<PromptCue>> =
    LazyLock::new(|| PatternTable::compile(CONFIRMATION_PATTERNS, true));

pub static PENDING_PROMPT: LazyLock<PatternTable<PromptCue>> =
    LazyLock::new(|| PatternTable::compile(PENDING_PROMPT_PATTERNS, true));

pub static BUSY: LazyLock<PatternTable<BusyCue>> =
    LazyLock::new(|| PatternTable::compile(BUSY_PATTERNS, false));

pub static CHOICE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CHOICE_LINE_PATTERN).expect("choice pattern is valid"));
