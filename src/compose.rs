//! Document composer – turns normalized blocks, metadata and TOC entries into
//! the printable HTML handed to a rendering engine.
//!
//! The output is always cover page, TOC page, body, in that order. Every
//! forced break is written twice: as an explicit `page-break-*` style and as
//! a legacy marker element, so an engine honouring either mode paginates the
//! same way.

use std::fmt::Write as _;

use serde::Serialize;

use crate::inline::{parse_inline, Inline};
use crate::metadata::DocumentMetadata;
use crate::normalize::Block;
use crate::pipeline::PageSetup;
use crate::style::LEGACY_BREAK_CLASS;
use crate::toc::TocEntry;

const PRIMARY: &str = "#1a365d";
const ACCENT: &str = "#2b6cb0";
const TEXT: &str = "#2d3748";
const MUTED: &str = "#718096";
const ITALIC: &str = "#4a5568";

/// Glyph drawn before unordered list items.
pub const LIST_BULLET: &str = "\u{2022}";

const COVER_SUBTITLE: &str = "Project Requirements Document";
const TOC_HEADING: &str = "Table of Contents";

/// Characters a TOC line is padded to with leader dots.
const TOC_LINE_CHARS: usize = 80;

/// The composed artifact: HTML plus the structure it was built from.
#[derive(Debug, Clone, Serialize)]
pub struct PrintableDocument {
    pub title: String,
    pub html: String,
    pub toc: Vec<TocEntry>,
    pub body_blocks: Vec<Block>,
}

/// Builds [`PrintableDocument`]s for one page geometry.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    setup: PageSetup,
}

impl Composer {
    pub fn new(setup: PageSetup) -> Self {
        Self { setup }
    }

    pub fn compose(
        &self,
        blocks: &[Block],
        metadata: &DocumentMetadata,
        toc: &[TocEntry],
    ) -> PrintableDocument {
        let title = metadata.display_title().to_string();
        // One point short of the content area so the section fits one page.
        let page_height = (self.setup.content_height() - 1.0).max(1.0);

        let mut html = String::with_capacity(4096);
        let _ = write!(
            html,
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title></head><body>",
            escape(&title)
        );
        write_cover(&mut html, metadata, page_height);
        write_toc(&mut html, toc, page_height);
        for block in blocks {
            write_block(&mut html, block);
        }
        html.push_str("</body></html>");

        log::debug!(
            "Composed '{title}': {} body blocks, {} TOC entries, {} bytes of HTML",
            blocks.len(),
            toc.len(),
            html.len()
        );

        PrintableDocument {
            title,
            html,
            toc: toc.to_vec(),
            body_blocks: blocks.to_vec(),
        }
    }
}

/// Compose with the default A4 portrait geometry.
pub fn compose(blocks: &[Block], metadata: &DocumentMetadata, toc: &[TocEntry]) -> PrintableDocument {
    Composer::default().compose(blocks, metadata, toc)
}

fn legacy_break(html: &mut String) {
    let _ = write!(html, "<div class=\"{LEGACY_BREAK_CLASS}\"></div>");
}

fn write_cover(html: &mut String, meta: &DocumentMetadata, height: f32) {
    let _ = write!(
        html,
        "<div class=\"flex justify-center items-center text-center\" \
         style=\"height: {height:.0}px; page-break-after: always\">"
    );
    let _ = write!(
        html,
        "<h1 class=\"text-4xl mb-4\" style=\"color: {PRIMARY}\">{}</h1>",
        escape(meta.display_title())
    );
    let _ = write!(
        html,
        "<p class=\"text-xl mb-6\" style=\"color: {MUTED}\">{COVER_SUBTITLE}</p>"
    );
    let _ = write!(
        html,
        "<div class=\"mb-6\" style=\"width: 160px; height: 2px; background-color: {ACCENT}\"></div>"
    );
    for (label, value) in [
        ("Prepared by", meta.display_author().to_string()),
        ("Company", meta.display_company().to_string()),
        ("Generated on", meta.display_date()),
    ] {
        let _ = write!(
            html,
            "<p class=\"text-lg mb-2\" style=\"color: {TEXT}\"><span class=\"font-bold\">{label}:</span> {}</p>",
            escape(&value)
        );
    }
    html.push_str("</div>");
    legacy_break(html);
}

/// `label ..... page`, padded with leader dots to a fixed width.
fn toc_line(label: &str, page: u32) -> String {
    let page = page.to_string();
    let used = label.chars().count() + page.len() + 2;
    let dots = TOC_LINE_CHARS.saturating_sub(used).max(3);
    format!("{label} {} {page}", ".".repeat(dots))
}

fn write_toc(html: &mut String, toc: &[TocEntry], min_height: f32) {
    let _ = write!(
        html,
        "<div style=\"min-height: {min_height:.0}px; page-break-after: always\">"
    );
    let _ = write!(
        html,
        "<h2 class=\"mb-6\" style=\"color: {PRIMARY}\">{TOC_HEADING}</h2>"
    );
    for entry in toc {
        let (class, label) = if entry.is_indented() {
            ("mb-2 pl-6", format!("{LIST_BULLET} {}", entry.label))
        } else {
            ("mb-2 font-bold", entry.label.clone())
        };
        let _ = write!(
            html,
            "<p class=\"{class}\" style=\"color: {TEXT}\">{}</p>",
            escape(&toc_line(&label, entry.page_number))
        );
    }
    html.push_str("</div>");
    legacy_break(html);
}

fn write_block(html: &mut String, block: &Block) {
    let break_style = if block.page_break_before() {
        legacy_break(html);
        "; page-break-before: always"
    } else {
        ""
    };

    match block {
        Block::Heading { level, text, .. } => {
            let color = match level {
                1 | 2 => PRIMARY,
                3 => ACCENT,
                _ => TEXT,
            };
            let _ = write!(
                html,
                "<h{level} style=\"color: {color}{break_style}\">{}</h{level}>",
                escape(text)
            );
        }
        Block::Paragraph { text, .. } => {
            let _ = write!(html, "<p style=\"color: {TEXT}{break_style}\">");
            write_inline(html, text);
            html.push_str("</p>");
        }
        Block::List { ordered, items, .. } => {
            let tag = if *ordered { "ol" } else { "ul" };
            let bullet = if *ordered {
                String::new()
            } else {
                format!(" data-bullet=\"{LIST_BULLET}\"")
            };
            let _ = write!(html, "<{tag}{bullet} style=\"color: {TEXT}{break_style}\">");
            for item in items {
                html.push_str("<li><p class=\"mb-0\">");
                write_inline(html, item);
                html.push_str("</p></li>");
            }
            let _ = write!(html, "</{tag}>");
        }
    }
}

/// Emit emphasis runs as coloured spans. A whitespace-only run is folded
/// into the next run so it survives whitespace collapsing between tags.
fn write_inline(html: &mut String, text: &str) {
    let mut pending = String::new();
    for run in parse_inline(text) {
        if run.text().trim().is_empty() {
            pending.push_str(run.text());
            continue;
        }
        let content = escape(&format!("{pending}{}", run.text()));
        pending.clear();
        match run {
            Inline::Text(_) => html.push_str(&content),
            Inline::Bold(_) => {
                let _ = write!(
                    html,
                    "<span class=\"font-bold\" style=\"color: {PRIMARY}\">{content}</span>"
                );
            }
            Inline::Italic(_) => {
                let _ = write!(
                    html,
                    "<span class=\"italic\" style=\"color: {ITALIC}\">{content}</span>"
                );
            }
        }
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
