//! Layout engine – uses Taffy to compute flexbox layout from a styled tree,
//! then converts the result into positioned boxes in document coordinates.

use std::collections::HashMap;
use taffy::prelude::*;

use crate::dom::Tag;
use crate::error::EngineError;
use crate::fonts::{FontManager, DEFAULT_FAMILY};
use crate::style::{self, Color, ComputedStyle, FontStyle as CssFontStyle, FontWeight, StyledNode};

/// Default list marker for unordered lists.
pub const DEFAULT_BULLET: &str = "\u{2022}";

/// A positioned box in document coordinates (before page splitting).
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub style: ComputedStyle,
    pub content: BoxContent,
    pub children: Vec<PositionedBox>,
}

impl PositionedBox {
    /// A zero-height, contentless box such as a legacy page-break marker.
    pub fn is_marker(&self) -> bool {
        self.height <= f32::EPSILON
            && matches!(self.content, BoxContent::None)
            && self.children.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum BoxContent {
    None,
    /// Wrapped lines, each a sequence of differently styled runs.
    Text {
        text: String,
        lines: Vec<Vec<StyledRun>>,
    },
    /// Bullet or number drawn in the gutter left of a list item.
    ListItem { marker: String },
}

/// A stretch of text drawn in one face and colour.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub color: Color,
}

impl StyledRun {
    pub fn new(text: impl Into<String>, style: &ComputedStyle) -> Self {
        Self {
            text: text.into(),
            bold: style.font_weight == FontWeight::Bold,
            italic: style.font_style == CssFontStyle::Italic,
            color: style.color,
        }
    }

    fn with_text(&self, text: String) -> Self {
        Self {
            text,
            ..self.clone()
        }
    }

    fn same_face(&self, other: &Self) -> bool {
        self.bold == other.bold && self.italic == other.italic && self.color == other.color
    }
}

/// Text of a wrapped line with its runs concatenated.
pub fn line_text(runs: &[StyledRun]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}

/// Width of a wrapped line, each run measured in its own face.
pub fn line_width(runs: &[StyledRun], font_size: f32, fonts: &FontManager) -> f32 {
    runs.iter()
        .map(|r| fonts.measure_text_width(&r.text, font_size, r.bold, r.italic, DEFAULT_FAMILY))
        .sum()
}

/// Split runs into words. A word may span several runs when emphasis
/// starts or ends mid-word; whitespace in any run ends the current word.
fn split_words(runs: &[StyledRun]) -> Vec<Vec<StyledRun>> {
    let mut words = Vec::new();
    let mut word: Vec<StyledRun> = Vec::new();
    for run in runs {
        let mut piece = String::new();
        for c in run.text.chars() {
            if c.is_whitespace() {
                if !piece.is_empty() {
                    word.push(run.with_text(std::mem::take(&mut piece)));
                }
                if !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
            } else {
                piece.push(c);
            }
        }
        if !piece.is_empty() {
            word.push(run.with_text(piece));
        }
    }
    if !word.is_empty() {
        words.push(word);
    }
    words
}

/// Append `run` to a line, merging it into the previous run when the face
/// and colour match.
fn push_run(line: &mut Vec<StyledRun>, run: StyledRun) {
    match line.last_mut() {
        Some(last) if last.same_face(&run) => last.text.push_str(&run.text),
        _ => line.push(run),
    }
}

/// Word-wrap styled runs to fit within `max_width` points. Whitespace
/// collapses to single spaces; a word wider than the line gets a line of
/// its own.
pub fn wrap_runs(
    runs: &[StyledRun],
    font_size: f32,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<Vec<StyledRun>> {
    let mut lines = Vec::new();
    let mut line: Vec<StyledRun> = Vec::new();
    let mut width = 0.0f32;

    for word in split_words(runs) {
        let word_width = line_width(&word, font_size, fonts);
        let space = line
            .last()
            .map(|last| fonts.measure_text_width(" ", font_size, last.bold, last.italic, DEFAULT_FAMILY));
        if let Some(space) = space {
            if width + space + word_width > max_width {
                lines.push(std::mem::take(&mut line));
                width = 0.0;
            } else if let Some(last) = line.last_mut() {
                last.text.push(' ');
                width += space;
            }
        }
        width += word_width;
        for piece in word {
            push_run(&mut line, piece);
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn taffy_err(e: impl std::fmt::Display) -> EngineError {
    EngineError::Layout(e.to_string())
}

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    node_styles: HashMap<NodeId, ComputedStyle>,
    node_content: HashMap<NodeId, BoxContent>,
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager) -> Self {
        Self {
            taffy: TaffyTree::new(),
            fonts,
            node_styles: HashMap::new(),
            node_content: HashMap::new(),
        }
    }

    fn collect_runs(node: &StyledNode, out: &mut Vec<StyledRun>) {
        match node {
            StyledNode::Text { text, style } => out.push(StyledRun::new(text.as_str(), style)),
            StyledNode::Element { children, .. } => {
                for child in children {
                    Self::collect_runs(child, out);
                }
            }
        }
    }

    fn all_inline(children: &[StyledNode]) -> bool {
        children.iter().all(|c| match c {
            StyledNode::Text { .. } => true,
            StyledNode::Element {
                style,
                children: gc,
                ..
            } => style.display == style::Display::Inline && Self::all_inline(gc),
        })
    }

    fn build_node(&mut self, styled: &StyledNode, width: f32) -> Result<NodeId, EngineError> {
        match styled {
            StyledNode::Text { text, style } => {
                self.build_text_node(&[StyledRun::new(text.as_str(), style)], style, width)
            }
            StyledNode::Element {
                tag,
                style,
                children,
                attrs,
            } => self.build_element_node(tag, style, children, attrs, width),
        }
    }

    /// A wrapped text leaf. Block spacing of the enclosing element (if any)
    /// is folded into the leaf so headings keep their margins.
    fn build_text_node(
        &mut self,
        runs: &[StyledRun],
        style: &ComputedStyle,
        width: f32,
    ) -> Result<NodeId, EngineError> {
        let line_height_px = self.fonts.line_height_px(style.font_size, style.line_height);
        let wrap_width = (width - style.padding_left - style.padding_right).max(1.0);
        let lines = wrap_runs(runs, style.font_size, wrap_width, self.fonts);

        let text_width = lines
            .iter()
            .map(|l| line_width(l, style.font_size, self.fonts))
            .fold(0.0f32, f32::max);
        let text_height = lines.len() as f32 * line_height_px;

        let taffy_style = Style {
            size: Size {
                width: taffy::Dimension::Length(text_width + style.padding_left + style.padding_right),
                height: taffy::Dimension::Length(text_height + style.padding_top + style.padding_bottom),
            },
            margin: Rect {
                top: LengthPercentageAuto::Length(style.margin_top),
                bottom: LengthPercentageAuto::Length(style.margin_bottom),
                left: LengthPercentageAuto::Length(0.0),
                right: LengthPercentageAuto::Length(0.0),
            },
            padding: Rect {
                top: LengthPercentage::Length(style.padding_top),
                right: LengthPercentage::Length(style.padding_right),
                bottom: LengthPercentage::Length(style.padding_bottom),
                left: LengthPercentage::Length(style.padding_left),
            },
            ..Default::default()
        };

        let node = self.taffy.new_leaf(taffy_style).map_err(taffy_err)?;
        self.node_styles.insert(node, style.clone());
        let text = lines.iter().map(|l| line_text(l)).collect::<Vec<_>>().join(" ");
        self.node_content.insert(node, BoxContent::Text { text, lines });
        Ok(node)
    }

    fn build_element_node(
        &mut self,
        tag: &Tag,
        style: &ComputedStyle,
        children: &[StyledNode],
        attrs: &HashMap<String, String>,
        width: f32,
    ) -> Result<NodeId, EngineError> {
        // Headings and paragraphs flow their spans as one wrapped leaf; each
        // span keeps its own face and colour.
        if tag.is_text_block() && !children.is_empty() && Self::all_inline(children) {
            let mut runs = Vec::new();
            for child in children {
                Self::collect_runs(child, &mut runs);
            }
            if runs.iter().any(|r| !r.text.trim().is_empty()) {
                return self.build_text_node(&runs, style, width);
            }
        }

        let own_width = match style.width {
            style::Dimension::Px(w) => w,
            style::Dimension::Percent(p) => width * p / 100.0,
            style::Dimension::Auto => width,
        };
        let child_width = (own_width - style.padding_left - style.padding_right).max(1.0);

        let bullet = attrs
            .get("data-bullet")
            .map(String::as_str)
            .unwrap_or(DEFAULT_BULLET);

        let mut child_nodes = Vec::with_capacity(children.len());
        let mut counter = 0u32;
        for child in children {
            let id = self.build_node(child, child_width)?;
            if let StyledNode::Element { tag: Tag::Li, .. } = child {
                counter += 1;
                let marker = match tag {
                    Tag::Ol => format!("{counter}."),
                    _ => bullet.to_string(),
                };
                self.node_content.insert(id, BoxContent::ListItem { marker });
            }
            child_nodes.push(id);
        }

        let node = self
            .taffy
            .new_with_children(self.to_taffy(style), &child_nodes)
            .map_err(taffy_err)?;
        self.node_styles.insert(node, style.clone());
        Ok(node)
    }

    fn to_taffy(&self, s: &ComputedStyle) -> Style {
        let mut ts = Style {
            display: taffy::Display::Flex,
            flex_direction: taffy::FlexDirection::Column,
            ..Default::default()
        };

        if s.display == style::Display::Inline {
            ts.flex_direction = taffy::FlexDirection::Row;
            ts.flex_wrap = taffy::FlexWrap::Wrap;
        }
        ts.justify_content = Some(match s.justify_content {
            style::JustifyContent::Start => taffy::JustifyContent::Start,
            style::JustifyContent::Center => taffy::JustifyContent::Center,
        });
        ts.align_items = Some(match s.align_items {
            style::AlignItems::Center => taffy::AlignItems::Center,
            style::AlignItems::Stretch => taffy::AlignItems::Stretch,
        });

        ts.size = Size {
            width: dim_to_taffy(s.width),
            height: dim_to_taffy(s.height),
        };
        ts.min_size = Size {
            width: taffy::Dimension::Auto,
            height: dim_to_taffy(s.min_height),
        };
        ts.margin = Rect {
            top: LengthPercentageAuto::Length(s.margin_top),
            right: LengthPercentageAuto::Length(0.0),
            bottom: LengthPercentageAuto::Length(s.margin_bottom),
            left: LengthPercentageAuto::Length(0.0),
        };
        ts.padding = Rect {
            top: LengthPercentage::Length(s.padding_top),
            right: LengthPercentage::Length(s.padding_right),
            bottom: LengthPercentage::Length(s.padding_bottom),
            left: LengthPercentage::Length(s.padding_left),
        };
        ts
    }

    /// Read back computed positions, accumulating parent offsets.
    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> Result<PositionedBox, EngineError> {
        let layout = self.taffy.layout(node).map_err(taffy_err)?;
        let style = self.node_styles.get(&node).cloned().unwrap_or_default();
        let content = self
            .node_content
            .get(&node)
            .cloned()
            .unwrap_or(BoxContent::None);

        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;

        let children = self
            .taffy
            .children(node)
            .map_err(taffy_err)?
            .into_iter()
            .map(|child| self.extract(child, x, y))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PositionedBox {
            x,
            y,
            width: layout.size.width,
            height: layout.size.height,
            style,
            content,
            children,
        })
    }
}

fn dim_to_taffy(d: style::Dimension) -> taffy::Dimension {
    match d {
        style::Dimension::Auto => taffy::Dimension::Auto,
        style::Dimension::Px(v) => taffy::Dimension::Length(v),
        style::Dimension::Percent(v) => taffy::Dimension::Percent(v / 100.0),
    }
}

/// Compute layout for a styled tree, returning top-level positioned boxes in
/// document coordinates (x already offset by the page margin).
pub fn compute_layout(
    styled_nodes: &[StyledNode],
    page_width: f32,
    page_margin: f32,
    fonts: &FontManager,
) -> Result<Vec<PositionedBox>, EngineError> {
    let content_width = page_width - 2.0 * page_margin;
    if content_width <= 0.0 {
        return Err(EngineError::InvalidConfig(format!(
            "margin {page_margin}pt leaves no room on a {page_width}pt page"
        )));
    }
    let mut builder = LayoutBuilder::new(fonts);

    let child_ids = styled_nodes
        .iter()
        .map(|node| builder.build_node(node, content_width))
        .collect::<Result<Vec<_>, _>>()?;

    let root_style = Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Column,
        size: Size {
            width: taffy::Dimension::Length(content_width),
            height: taffy::Dimension::Auto,
        },
        ..Default::default()
    };
    let root = builder
        .taffy
        .new_with_children(root_style, &child_ids)
        .map_err(taffy_err)?;

    builder
        .taffy
        .compute_layout(
            root,
            Size {
                width: AvailableSpace::Definite(content_width),
                height: AvailableSpace::MaxContent,
            },
        )
        .map_err(taffy_err)?;

    Ok(builder.extract(root, page_margin, 0.0)?.children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::style::build_styled_tree;

    fn layout(html: &str) -> Vec<PositionedBox> {
        let dom = parse_html(html);
        let styled = build_styled_tree(&dom, None);
        compute_layout(&styled, 595.0, 40.0, &FontManager::default()).unwrap()
    }

    #[test]
    fn paragraph_has_size() {
        let boxes = layout("<p>Hello world</p>");
        assert_eq!(boxes.len(), 1);
        assert!(boxes[0].width > 0.0);
        assert!(boxes[0].height > 0.0);
        assert!((boxes[0].x - 40.0).abs() < 0.01);
    }

    fn text_lines(pbox: &PositionedBox) -> &[Vec<StyledRun>] {
        match &pbox.content {
            BoxContent::Text { lines, .. } => lines,
            other => panic!("Expected text, got {other:?}"),
        }
    }

    #[test]
    fn emphasis_spans_keep_their_face() {
        let boxes = layout(
            r##"<p style="color: #2d3748">Uses <span class="font-bold" style="color: #1a365d">Rust</span>'s <span class="italic">type</span> system</p>"##,
        );
        let lines = text_lines(&boxes[0]);
        assert_eq!(lines.len(), 1);
        let runs = &lines[0];
        assert_eq!(line_text(runs), "Uses Rust's type system");
        assert_eq!(runs.len(), 5);
        assert!(!runs[0].bold);
        assert_eq!(runs[1].text, "Rust");
        assert!(runs[1].bold);
        assert_eq!(runs[1].color, Color::from_hex("#1a365d").unwrap());
        assert!(!runs[2].bold && runs[2].text.starts_with("'s"));
        assert!(runs[3].italic);
    }

    #[test]
    fn wrap_splits_long_lines() {
        let fonts = FontManager::default();
        let run = StyledRun::new("Hello   world foo bar", &ComputedStyle::default());
        let lines = wrap_runs(&[run], 16.0, 60.0, &fonts);
        assert!(lines.len() >= 2, "Expected wrapping, got {lines:?}");
        assert!(lines.iter().all(|l| !line_text(l).is_empty()));
        let joined = lines.iter().map(|l| line_text(l)).collect::<Vec<_>>().join(" ");
        assert_eq!(joined, "Hello world foo bar");
    }

    #[test]
    fn list_markers_follow_list_kind() {
        let boxes = layout(
            r#"<ul data-bullet="-"><li><p>a</p></li></ul><ol><li><p>x</p></li><li><p>y</p></li></ol>"#,
        );
        let marker = |b: &PositionedBox| match &b.content {
            BoxContent::ListItem { marker } => marker.clone(),
            other => panic!("Expected list item, got {other:?}"),
        };
        assert_eq!(marker(&boxes[0].children[0]), "-");
        assert_eq!(marker(&boxes[1].children[1]), "2.");
    }

    #[test]
    fn fixed_height_is_respected() {
        let boxes = layout(r#"<div style="height: 300px"><p>cover</p></div><p>next</p>"#);
        assert!((boxes[0].height - 300.0).abs() < 0.01);
        assert!(boxes[1].y >= 300.0);
    }

    #[test]
    fn min_height_grows_short_content() {
        let boxes = layout(r#"<div style="min-height: 500px"><p>toc</p></div>"#);
        assert!((boxes[0].height - 500.0).abs() < 0.01);
    }

    #[test]
    fn empty_div_is_marker() {
        let boxes = layout(r#"<div class="html2pdf__page-break"></div><p>x</p>"#);
        assert!(boxes[0].is_marker());
        assert!(!boxes[1].is_marker());
    }

    #[test]
    fn margins_too_wide_are_rejected() {
        let styled = build_styled_tree(&parse_html("<p>x</p>"), None);
        let err = compute_layout(&styled, 100.0, 60.0, &FontManager::default()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }
}
