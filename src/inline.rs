//! Inline emphasis – splits a line of response text into plain, bold and
//! italic runs.
//!
//! `**text**` is consumed first, then `*text*` inside the remaining plain
//! runs. Matching is non-greedy and the first match wins; markers nested
//! inside an already-consumed run stay literal.

use once_cell::sync::Lazy;
use regex::Regex;

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid bold regex"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.+?)\*").expect("valid italic regex"));

/// One run of inline text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Bold(String),
    Italic(String),
}

impl Inline {
    pub fn text(&self) -> &str {
        match self {
            Inline::Text(t) | Inline::Bold(t) | Inline::Italic(t) => t,
        }
    }
}

/// Parse emphasis markers in `text` into a sequence of runs.
pub fn parse_inline(text: &str) -> Vec<Inline> {
    let mut runs = Vec::new();
    let mut last = 0;
    for caps in BOLD.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_italic_runs(&text[last..whole.start()], &mut runs);
        runs.push(Inline::Bold(inner.as_str().to_string()));
        last = whole.end();
    }
    push_italic_runs(&text[last..], &mut runs);
    runs
}

fn push_italic_runs(segment: &str, runs: &mut Vec<Inline>) {
    let mut last = 0;
    for caps in ITALIC.captures_iter(segment) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_text(&segment[last..whole.start()], runs);
        runs.push(Inline::Italic(inner.as_str().to_string()));
        last = whole.end();
    }
    push_text(&segment[last..], runs);
}

fn push_text(s: &str, runs: &mut Vec<Inline>) {
    if s.is_empty() {
        return;
    }
    // Merge adjacent plain runs so callers see one run per gap.
    if let Some(Inline::Text(prev)) = runs.last_mut() {
        prev.push_str(s);
    } else {
        runs.push(Inline::Text(s.to_string()));
    }
}

/// Remove emphasis markers, keeping the emphasised text.
pub fn strip_emphasis(text: &str) -> String {
    parse_inline(text).iter().map(Inline::text).collect()
}
