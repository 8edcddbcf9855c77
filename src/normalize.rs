//! Normalizer – converts a loosely structured response string into an
//! ordered sequence of structural [`Block`]s.
//!
//! The upstream service returns markdown-like text: `##` section markers,
//! `**bold**` / `*italic*` emphasis, bullet and numbered list markers, and
//! line breaks that may arrive as `\n` or as HTML `<br>` tokens. Nothing about
//! it is guaranteed to be well formed, so every line that does not match a
//! structural pattern degrades to a paragraph. [`normalize`] never fails.
//!
//! Classification precedence for a non-section line:
//! 1. `1. Overview` (number, dot, space, capital) → level-3 heading
//! 2. `Key Features:` (capitalised label ending in a colon) → level-4 heading
//! 3. `- item` → unordered list item
//! 4. `1. item` → ordered list item
//! 5. anything else → paragraph

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::inline::strip_emphasis;

static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|\r?\n").expect("valid line-break regex"));
static ATX_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#+)\s+(.*)$").expect("valid heading regex"));
static NUMBERED_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\s[A-Z]").expect("valid numbered heading regex"));
static LABEL_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][\w\s]+:$").expect("valid label heading regex"));
static ORDERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\s+(.*)$").expect("valid ordered item regex"));

/// Markers accepted for unordered list items.
const BULLET_MARKERS: [&str; 2] = ["- ", "\u{2022} "];

/// A normalized structural unit of the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading {
        level: u8,
        text: String,
        page_break_before: bool,
    },
    /// Paragraph text keeps its emphasis markers; the composer renders them.
    Paragraph {
        text: String,
        page_break_before: bool,
    },
    List {
        ordered: bool,
        items: Vec<String>,
        page_break_before: bool,
    },
}

impl Block {
    pub fn page_break_before(&self) -> bool {
        match self {
            Block::Heading {
                page_break_before, ..
            }
            | Block::Paragraph {
                page_break_before, ..
            }
            | Block::List {
                page_break_before, ..
            } => *page_break_before,
        }
    }

    fn set_page_break_before(&mut self) {
        match self {
            Block::Heading {
                page_break_before, ..
            }
            | Block::Paragraph {
                page_break_before, ..
            }
            | Block::List {
                page_break_before, ..
            } => *page_break_before = true,
        }
    }

    /// Heading level, or `None` for paragraphs and lists.
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            Block::Heading { level, .. } => Some(*level),
            _ => None,
        }
    }
}

/// Per-line classification before list coalescing.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Heading { level: u8, text: String },
    ListItem { ordered: bool, text: String },
    Paragraph(String),
}

/// Normalize a response string into blocks.
pub fn normalize(response: &str) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut degraded = 0usize;

    for raw in LINE_BREAK.split(response) {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        match classify(line) {
            Some(Line::Heading { level, text }) => blocks.push(Block::Heading {
                level,
                text,
                page_break_before: level == 2,
            }),
            Some(Line::ListItem { ordered, text }) => match blocks.last_mut() {
                Some(Block::List {
                    ordered: open_ordered,
                    items,
                    ..
                }) if *open_ordered == ordered => items.push(text),
                _ => blocks.push(Block::List {
                    ordered,
                    items: vec![text],
                    page_break_before: false,
                }),
            },
            Some(Line::Paragraph(text)) => blocks.push(Block::Paragraph {
                text,
                page_break_before: false,
            }),
            None => degraded += 1,
        }
    }

    if degraded > 0 {
        log::debug!("normalize: dropped {degraded} line(s) without text content");
    }

    // The cover and TOC always precede body content.
    if let Some(first) = blocks.first_mut() {
        first.set_page_break_before();
    }
    log::debug!("normalize: {} block(s)", blocks.len());
    blocks
}

/// Classify one trimmed, non-empty line. `None` means the line carries no
/// text once markers are removed and is dropped.
fn classify(line: &str) -> Option<Line> {
    if let Some(caps) = ATX_HEADING.captures(line) {
        let hashes = caps.get(1).map_or(0, |m| m.as_str().len());
        let text = strip_emphasis(caps.get(2).map_or("", |m| m.as_str()))
            .trim()
            .to_string();
        if text.is_empty() {
            return None;
        }
        // `#####` and deeper collapse onto the smallest heading we render.
        let level = hashes.clamp(1, 4) as u8;
        return Some(Line::Heading { level, text });
    }

    if NUMBERED_HEADING.is_match(line) {
        return Some(Line::Heading {
            level: 3,
            text: strip_emphasis(line).trim().to_string(),
        });
    }

    if LABEL_HEADING.is_match(line) {
        return Some(Line::Heading {
            level: 4,
            text: line.to_string(),
        });
    }

    if let Some(rest) = BULLET_MARKERS.iter().find_map(|m| line.strip_prefix(m)) {
        let text = rest.trim();
        return (!text.is_empty()).then(|| Line::ListItem {
            ordered: false,
            text: text.to_string(),
        });
    }

    if let Some(caps) = ORDERED_ITEM.captures(line) {
        let text = caps.get(1).map_or("", |m| m.as_str()).trim();
        return (!text.is_empty()).then(|| Line::ListItem {
            ordered: true,
            text: text.to_string(),
        });
    }

    if strip_emphasis(line).chars().any(char::is_alphabetic) {
        Some(Line::Paragraph(line.to_string()))
    } else {
        None
    }
}

/// Reconstruct markdown-like source text from blocks, one line per heading,
/// paragraph or list item.
///
/// Re-normalizing the result yields the same number of blocks for
/// well-formed input. It is not a byte-exact inverse of [`normalize`].
pub fn to_source(blocks: &[Block]) -> String {
    let mut lines = Vec::new();
    for block in blocks {
        match block {
            Block::Heading { level: 2, text, .. } => lines.push(format!("## {text}")),
            Block::Heading { level: 3, text, .. } if NUMBERED_HEADING.is_match(text) => {
                lines.push(text.clone())
            }
            Block::Heading { level: 4, text, .. } if LABEL_HEADING.is_match(text) => {
                lines.push(text.clone())
            }
            Block::Heading { level, text, .. } => {
                lines.push(format!("{} {text}", "#".repeat(usize::from(*level))))
            }
            Block::Paragraph { text, .. } => lines.push(text.clone()),
            Block::List { ordered, items, .. } => {
                for (i, item) in items.iter().enumerate() {
                    if *ordered {
                        lines.push(format!("{}. {item}", i + 1));
                    } else {
                        lines.push(format!("- {item}"));
                    }
                }
            }
        }
    }
    lines.join("\n")
}
