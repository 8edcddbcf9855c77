//! Pagination – splits a flat list of positioned boxes into pages.
//!
//! Breaks are decided per box, in this order:
//! 1. explicit markers (`page-break-before` / `page-break-after`),
//! 2. legacy marker elements (break after the marker),
//! 3. overflow at the bottom of the content area.
//!
//! A break never produces an empty page. A text box taller than the content
//! area is split between lines so every line lands on some page.

use std::borrow::Cow;

use crate::engine::PageBreakMode;
use crate::fonts::{FontManager, DEFAULT_FAMILY};
use crate::layout::{line_text, line_width, BoxContent, PositionedBox};
use crate::layout_config::*;
use crate::style;

/// Which kinds of page-break hints the paginator honours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakPolicy {
    /// `page-break-before` / `page-break-after` styles.
    pub explicit: bool,
    /// Split containers taller than a page between their children and keep
    /// `page-break-inside: avoid` boxes whole.
    pub css: bool,
    /// Empty elements carrying the legacy break class.
    pub legacy: bool,
}

impl BreakPolicy {
    pub fn from_modes(modes: &[PageBreakMode]) -> Self {
        Self {
            explicit: modes.contains(&PageBreakMode::ExplicitMarkers),
            css: modes.contains(&PageBreakMode::Css),
            legacy: modes.contains(&PageBreakMode::Legacy),
        }
    }
}

impl Default for BreakPolicy {
    fn default() -> Self {
        Self {
            explicit: true,
            css: true,
            legacy: true,
        }
    }
}

/// Recursively expand any pure-container box whose height exceeds a single
/// page so its children can be split across pages individually.
fn flatten_for_pagination<'a>(
    boxes: &'a [PositionedBox],
    content_height: f32,
    policy: BreakPolicy,
) -> Vec<&'a PositionedBox> {
    let mut result = Vec::new();
    for pbox in boxes {
        if policy.css
            && pbox.height > content_height
            && !pbox.style.page_break_inside_avoid
            && matches!(pbox.content, BoxContent::None)
            && !pbox.children.is_empty()
        {
            result.extend(flatten_for_pagination(&pbox.children, content_height, policy));
        } else {
            result.push(pbox);
        }
    }
    result
}

/// Cut a text box that cannot fit on one page into page-sized slices at
/// line boundaries. Slices keep the box padding, so the last one ends where
/// the original box did.
fn split_tall_text<'a>(
    pbox: &'a PositionedBox,
    content_height: f32,
    fonts: &FontManager,
) -> Vec<Cow<'a, PositionedBox>> {
    let BoxContent::Text { lines, .. } = &pbox.content else {
        return vec![Cow::Borrowed(pbox)];
    };
    if pbox.height <= content_height || lines.len() < 2 {
        return vec![Cow::Borrowed(pbox)];
    }

    let s = &pbox.style;
    let line_height = fonts.line_height_px(s.font_size, s.line_height);
    let room = content_height - s.padding_top - s.padding_bottom;
    let per_page = ((room / line_height).floor() as usize).max(1);
    let chunks: Vec<_> = lines.chunks(per_page).collect();
    let last = chunks.len() - 1;
    log::debug!(
        "Splitting {} lines of text over {} pages",
        lines.len(),
        chunks.len()
    );

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut slice = pbox.clone();
            slice.y = pbox.y + (i * per_page) as f32 * line_height;
            slice.height = s.padding_top + chunk.len() as f32 * line_height + s.padding_bottom;
            slice.style.page_break_before = s.page_break_before && i == 0;
            slice.style.page_break_after = s.page_break_after && i == last;
            slice.content = BoxContent::Text {
                text: chunk.iter().map(|l| line_text(l)).collect::<Vec<_>>().join(" "),
                lines: chunk.to_vec(),
            };
            Cow::Owned(slice)
        })
        .collect()
}

/// Accumulates pages while tracking where the current page starts in
/// document space.
struct Paginator<'a> {
    config: LayoutConfig,
    current: PageLayout,
    /// Document-space y at which the current page begins. `PositionedBox.y`
    /// values are absolute document coordinates, so `pbox.y - page_start`
    /// is the y-on-page of any box.
    page_start: f32,
    page_margin: f32,
    content_height: f32,
    policy: BreakPolicy,
    fonts: &'a FontManager,
}

impl<'a> Paginator<'a> {
    /// Close the current page and start a new one at `doc_y`. No-op when the
    /// current page is still empty.
    fn break_at(&mut self, doc_y: f32) {
        if self.current.boxes.is_empty() {
            return;
        }
        let next = PageLayout {
            page_index: self.config.pages.len() + 1,
            boxes: Vec::new(),
        };
        self.config
            .pages
            .push(std::mem::replace(&mut self.current, next));
        self.page_start = doc_y;
    }

    fn place(&mut self, pbox: &PositionedBox) {
        let y_on_page = (pbox.y - self.page_start).max(0.0);
        let lb = build_layout_box(pbox, pbox.x, self.page_margin + y_on_page, self.fonts);
        self.current.boxes.push(lb);
    }

    fn feed(&mut self, pbox: &PositionedBox) {
        let policy = self.policy;
        if pbox.is_marker() {
            if policy.legacy && pbox.style.legacy_break {
                self.break_at(pbox.y);
            } else if policy.explicit && (pbox.style.page_break_before || pbox.style.page_break_after) {
                self.break_at(pbox.y);
            }
            return;
        }

        if policy.explicit && pbox.style.page_break_before {
            self.break_at(pbox.y);
        }

        let box_bottom = (pbox.y - self.page_start).max(0.0) + pbox.height;
        if box_bottom > self.content_height {
            self.break_at(pbox.y);
        }

        self.place(pbox);

        if policy.explicit && pbox.style.page_break_after {
            self.break_at(pbox.y + pbox.height);
        }
    }

    fn finish(mut self) -> LayoutConfig {
        if !self.current.boxes.is_empty() || self.config.pages.is_empty() {
            self.config.pages.push(self.current);
        }
        self.config
    }
}

/// Convert positioned boxes into a paginated [`LayoutConfig`].
pub fn paginate(
    boxes: &[PositionedBox],
    title: &str,
    page_width: f32,
    page_height: f32,
    page_margin: f32,
    policy: BreakPolicy,
    fonts: &FontManager,
) -> LayoutConfig {
    let content_height = page_height - 2.0 * page_margin;
    let flat = flatten_for_pagination(boxes, content_height, policy);

    let mut p = Paginator {
        config: LayoutConfig::new(title, page_width, page_height),
        current: PageLayout {
            page_index: 0,
            boxes: Vec::new(),
        },
        page_start: 0.0,
        page_margin,
        content_height,
        policy,
        fonts,
    };

    for pbox in flat {
        for piece in split_tall_text(pbox, content_height, fonts) {
            p.feed(&piece);
        }
    }

    let config = p.finish();
    log::debug!(
        "Paginated {} boxes into {} pages",
        boxes.len(),
        config.pages.len()
    );
    config
}

/// Recursively build a LayoutBox tree where every box carries page-absolute
/// x/y coordinates (origin = top-left of the physical page).
///
/// Child offsets are `child.y - parent.y`, since PositionedBox coordinates
/// are accumulated document-space absolutes.
fn build_layout_box(pbox: &PositionedBox, abs_x: f32, abs_y: f32, fonts: &FontManager) -> LayoutBox {
    let mut lb = LayoutBox::new(abs_x, abs_y, pbox.width, pbox.height);
    let s = &pbox.style;

    if !s.background_color.is_transparent() {
        lb.background_color = Some(s.background_color.to_array());
    }

    let bold = s.font_weight == style::FontWeight::Bold;
    let italic = s.font_style == style::FontStyle::Italic;
    let line_height = fonts.line_height_px(s.font_size, s.line_height);

    match &pbox.content {
        BoxContent::Text { lines, .. } => {
            let inner_width = pbox.width - s.padding_left - s.padding_right;
            let text_lines = lines
                .iter()
                .enumerate()
                .map(|(i, runs)| {
                    let slack = (inner_width - line_width(runs, s.font_size, fonts)).max(0.0);
                    let align = match s.text_align {
                        style::TextAlign::Left => 0.0,
                        style::TextAlign::Center => slack / 2.0,
                        style::TextAlign::Right => slack,
                    };
                    let mut line = TextLine::new(
                        line_text(runs),
                        s.padding_left + align,
                        s.padding_top + i as f32 * line_height,
                    );
                    let mut x = 0.0;
                    for run in runs {
                        line.spans.push(TextSpan {
                            text: run.text.clone(),
                            x_offset: x,
                            bold: run.bold,
                            italic: run.italic,
                            color: run.color.to_array(),
                        });
                        x += fonts.measure_text_width(&run.text, s.font_size, run.bold, run.italic, DEFAULT_FAMILY);
                    }
                    line
                })
                .collect();

            lb.text = Some(TextContent {
                lines: text_lines,
                font_family: DEFAULT_FAMILY.to_string(),
                font_size: s.font_size,
                bold,
                italic,
                color: s.color.to_array(),
                line_height,
                list_marker: None,
            });
        }
        BoxContent::ListItem { marker } => {
            // No lines of its own: the item's text lives in child boxes and
            // only the marker is drawn in the gutter.
            lb.text = Some(TextContent {
                lines: vec![],
                font_family: DEFAULT_FAMILY.to_string(),
                font_size: s.font_size,
                bold,
                italic: false,
                color: s.color.to_array(),
                line_height,
                list_marker: Some(marker.clone()),
            });
        }
        BoxContent::None => {}
    }

    for child in &pbox.children {
        let child_abs_y = abs_y + (child.y - pbox.y);
        lb.children
            .push(build_layout_box(child, child.x, child_abs_y, fonts));
    }

    lb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::layout::compute_layout;
    use crate::style::build_styled_tree;

    const MARGIN: f32 = 40.0;

    fn paginate_html(html: &str, policy: BreakPolicy) -> LayoutConfig {
        let dom = parse_html(html);
        let styled = build_styled_tree(&dom, None);
        let fonts = FontManager::default();
        let boxes = compute_layout(&styled, 595.0, MARGIN, &fonts).unwrap();
        paginate(&boxes, "test", 595.0, 842.0, MARGIN, policy, &fonts)
    }

    #[test]
    fn single_page() {
        let config = paginate_html("<p>Short text</p>", BreakPolicy::default());
        assert_eq!(config.pages.len(), 1);
        assert_eq!(config.title, "test");
    }

    #[test]
    fn overflow_creates_pages() {
        let html: String = (0..80)
            .map(|i| format!("<p>Paragraph {i} with some text</p>"))
            .collect();
        let config = paginate_html(&html, BreakPolicy::default());
        assert!(config.pages.len() > 1, "got {}", config.pages.len());
        for page in &config.pages {
            for b in &page.boxes {
                assert!(b.y + b.height <= 842.0 - MARGIN + 0.5);
            }
        }
    }

    #[test]
    fn explicit_break_before() {
        let html = r#"<p>one</p><h2 style="page-break-before: always">two</h2><p>three</p>"#;
        let config = paginate_html(html, BreakPolicy::default());
        assert_eq!(config.pages.len(), 2);
        assert_eq!(config.pages[1].boxes[0].plain_text(), "two");

        let ignored = BreakPolicy {
            explicit: false,
            ..BreakPolicy::default()
        };
        assert_eq!(paginate_html(html, ignored).pages.len(), 1);
    }

    #[test]
    fn legacy_marker_breaks_once() {
        let html = r#"<p>one</p><div class="html2pdf__page-break"></div><h2 style="page-break-before: always">two</h2>"#;
        let config = paginate_html(html, BreakPolicy::default());
        assert_eq!(config.pages.len(), 2);
        // The marker itself is never drawn.
        assert_eq!(config.pages[0].boxes.len(), 1);

        let legacy_only = BreakPolicy {
            explicit: false,
            css: false,
            legacy: true,
        };
        assert_eq!(paginate_html(html, legacy_only).pages.len(), 2);
    }

    #[test]
    fn leading_break_adds_no_blank_page() {
        let html = r#"<h2 style="page-break-before: always">first</h2><p>body</p>"#;
        let config = paginate_html(html, BreakPolicy::default());
        assert_eq!(config.pages.len(), 1);
        assert_eq!(config.pages[0].page_index, 0);
    }

    #[test]
    fn empty_document_has_one_page() {
        let config = paginate_html("", BreakPolicy::default());
        assert_eq!(config.pages.len(), 1);
        assert!(config.pages[0].boxes.is_empty());
    }

    #[test]
    fn centered_short_line_is_offset() {
        let html = format!(r#"<p class="text-center">{}</p>"#, "word ".repeat(25));
        let config = paginate_html(&html, BreakPolicy::default());
        let text = config.pages[0].boxes[0].text.as_ref().unwrap();
        assert_eq!(text.lines.len(), 2);
        assert!(text.lines[0].x_offset.abs() < 0.01);
        assert!(text.lines[1].x_offset > 0.0);
    }

    #[test]
    fn tall_paragraph_is_split_between_lines() {
        let html = format!("<p>{}</p>", "word ".repeat(1800));
        let fonts = FontManager::default();
        let styled = build_styled_tree(&parse_html(&html), None);
        let boxes = compute_layout(&styled, 595.0, MARGIN, &fonts).unwrap();
        let BoxContent::Text { lines, .. } = &boxes[0].content else {
            panic!("Expected a text box");
        };
        assert!(lines.len() >= 100, "got {} lines", lines.len());

        let config = paginate(&boxes, "test", 595.0, 842.0, MARGIN, BreakPolicy::default(), &fonts);
        assert!(config.pages.len() >= 3);

        let mut placed = 0;
        for page in &config.pages {
            for b in &page.boxes {
                let text = b.text.as_ref().unwrap();
                for line in &text.lines {
                    assert!(b.y + line.y_offset >= MARGIN - 0.01);
                    assert!(b.y + line.y_offset + text.line_height <= 842.0 - MARGIN + 0.01);
                }
                placed += text.lines.len();
            }
        }
        assert_eq!(placed, lines.len());
    }

    #[test]
    fn text_after_split_paragraph_follows_it() {
        let html = format!("<p>{}</p><p>tail</p>", "word ".repeat(1800));
        let config = paginate_html(&html, BreakPolicy::default());
        let last_page = config.pages.last().unwrap();
        let tail = last_page.boxes.last().unwrap();
        assert_eq!(tail.plain_text(), "tail");
        let before = &last_page.boxes[last_page.boxes.len() - 2];
        assert!(tail.y >= before.y + before.height);
    }

    #[test]
    fn bold_span_reaches_layout() {
        let config = paginate_html(
            r#"<p>Uses <span class="font-bold">Rust</span> everywhere</p>"#,
            BreakPolicy::default(),
        );
        let text = config.pages[0].boxes[0].text.as_ref().unwrap();
        assert!(!text.bold);
        let spans = &text.lines[0].spans;
        assert_eq!(spans.len(), 3);
        assert!(spans[1].bold && spans[1].text.trim() == "Rust");
        assert!((spans[1].x_offset - 5.0 * 11.0 * 0.5).abs() < 0.01);
        assert!(spans[2].x_offset > spans[1].x_offset);
    }

    #[test]
    fn policy_from_modes() {
        let p = BreakPolicy::from_modes(&[PageBreakMode::Legacy]);
        assert!(p.legacy && !p.explicit && !p.css);
        assert_eq!(
            BreakPolicy::from_modes(&[
                PageBreakMode::ExplicitMarkers,
                PageBreakMode::Css,
                PageBreakMode::Legacy
            ]),
            BreakPolicy::default()
        );
    }
}
