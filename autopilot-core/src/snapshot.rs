use regex::Regex;
use std::sync::LazyLock;

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1B\[[0-9;?]*[A-Za-z]").expect("ANSI escape pattern is valid")
});

/// The text of one pane capture, with terminal escape codes removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaneSnapshot {
    text: String,
}

impl PaneSnapshot {
    pub fn new(raw: &str) -> Self {
        Self {
            text: strip_ansi_codes(raw),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Lines of the capture with surrounding blank space trimmed from the
    /// whole text, so trailing empty rows of the pane do not count.
    /// Always yields at least one (possibly empty) line.
    pub fn lines(&self) -> Vec<&str> {
        self.text.trim().split('\n').collect()
    }

    /// The last `count` lines, joined back together.
    pub fn tail(&self, count: usize) -> String {
        let lines = self.lines();
        let start = lines.len().saturating_sub(count);
        lines[start..].join("\n")
    }

    /// The last line after trimming.
    pub fn last_line(&self) -> &str {
        self.text.trim().rsplit('\n').next().unwrap_or("").trim()
    }
}

fn strip_ansi_codes(content: &str) -> String {
    ANSI_ESCAPE.replace_all(content, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_ansi_codes() {
        assert_eq!(
            PaneSnapshot::new("\x1B[32mGreen text\x1B[0m").text(),
            "Green text"
        );
        assert_eq!(
            PaneSnapshot::new("\x1B[1;31mBold red\x1B[0m and normal").text(),
            "Bold red and normal"
        );
        assert_eq!(PaneSnapshot::new("Normal text").text(), "Normal text");
    }

    #[test]
    fn lines_ignore_trailing_blank_rows() {
        let snapshot = PaneSnapshot::new("one\ntwo\n>\n\n\n");
        assert_eq!(snapshot.lines(), vec!["one", "two", ">"]);
        assert_eq!(snapshot.last_line(), ">");
    }

    #[test]
    fn tail_takes_last_lines() {
        let snapshot = PaneSnapshot::new("1\n2\n3\n4\n5");
        assert_eq!(snapshot.tail(2), "4\n5");
        assert_eq!(snapshot.tail(10), "1\n2\n3\n4\n5");
    }

    #[test]
    fn empty_capture_has_one_empty_line() {
        let snapshot = PaneSnapshot::new("   \n\n  \t  ");
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.lines(), vec![""]);
        assert_eq!(snapshot.last_line(), "");
    }
}
