use crate::snapshot::PaneSnapshot;
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

static INPUT_GLYPH_AT_EOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)[>❯]\s*$").expect("input glyph pattern is valid"));

static WELCOME_BANNER: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"Welcome|Claude Code|Ready")
        .case_insensitive(true)
        .build()
        .expect("welcome pattern is valid")
});

/// What showed that the freshly launched assistant can take input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadySignal {
    InputGlyph,
    /// The banner is drawn slightly before the input box, so callers give it
    /// a moment to settle.
    WelcomeBanner,
}

pub fn detect_ready(snapshot: &PaneSnapshot) -> Option<ReadySignal> {
    if INPUT_GLYPH_AT_EOL.is_match(snapshot.text()) {
        Some(ReadySignal::InputGlyph)
    } else if WELCOME_BANNER.is_match(snapshot.text()) {
        Some(ReadySignal::WelcomeBanner)
    } else {
        None
    }
}
