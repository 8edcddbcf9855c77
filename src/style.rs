//! Style resolver – maps inline CSS and utility classes to a flat
//! [`ComputedStyle`] consumed by the layout engine.
//!
//! Only the properties the composer emits are understood: typography,
//! spacing, flex alignment, colours, fixed heights, and page-break hints.

use std::collections::HashMap;

use crate::dom::{DomNode, ElementNode, Tag};

/// Class name of a legacy page-break marker element.
pub const LEGACY_BREAK_CLASS: &str = "html2pdf__page-break";

/// Fully resolved style for a single element.
#[derive(Debug, Clone)]
pub struct ComputedStyle {
    // Display / layout
    pub display: Display,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,
    pub min_height: Dimension,

    // Spacing (pt)
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub padding_top: f32,
    pub padding_right: f32,
    pub padding_bottom: f32,
    pub padding_left: f32,

    // Typography
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub color: Color,
    pub text_align: TextAlign,
    pub line_height: f32,

    pub background_color: Color,

    // Page breaks
    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_inside_avoid: bool,
    /// Set on legacy marker elements; breaks after the element.
    pub legacy_break: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_height: Dimension::Auto,
            margin_top: 0.0,
            margin_bottom: 0.0,
            padding_top: 0.0,
            padding_right: 0.0,
            padding_bottom: 0.0,
            padding_left: 0.0,
            font_size: 11.0,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            color: Color::BLACK,
            text_align: TextAlign::Left,
            line_height: 1.5,
            background_color: Color::TRANSPARENT,
            page_break_before: false,
            page_break_after: false,
            page_break_inside_avoid: false,
            legacy_break: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Flex,
    Inline,
    ListItem,
    None,
}

/// Main-axis placement inside a flex column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JustifyContent {
    Start,
    Center,
}

/// Cross-axis placement inside a flex column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignItems {
    Center,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Px(f32),
    Percent(f32),
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parse `#rrggbb` or `#rgb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let expanded: String = match hex.len() {
            6 => hex.to_string(),
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            _ => return None,
        };
        let channel = |i: usize| -> Option<f32> {
            let byte = u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok()?;
            Some(f32::from(byte) / 255.0)
        };
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: 1.0,
        })
    }
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Resolve the style for an element, inheriting text properties from its parent.
pub fn resolve_style(element: &ElementNode, parent: Option<&ComputedStyle>) -> ComputedStyle {
    let mut style = ComputedStyle::default();

    if let Some(p) = parent {
        style.font_size = p.font_size;
        style.font_weight = p.font_weight;
        style.font_style = p.font_style;
        style.color = p.color;
        style.text_align = p.text_align;
        style.line_height = p.line_height;
    }

    apply_tag_defaults(&mut style, &element.tag);

    for class in element.classes() {
        apply_class(&mut style, class);
    }

    if let Some(inline) = element.inline_style() {
        apply_inline_style(&mut style, inline);
    }

    style
}

/// Tag semantics applied on top of inherited text properties.
fn apply_tag_defaults(s: &mut ComputedStyle, tag: &Tag) {
    match tag {
        Tag::H1 => {
            s.font_size = 26.0;
            s.font_weight = FontWeight::Bold;
            s.margin_top = 14.0;
            s.margin_bottom = 10.0;
        }
        Tag::H2 => {
            s.font_size = 20.0;
            s.font_weight = FontWeight::Bold;
            s.margin_top = 12.0;
            s.margin_bottom = 8.0;
        }
        Tag::H3 => {
            s.font_size = 15.0;
            s.font_weight = FontWeight::Bold;
            s.margin_top = 10.0;
            s.margin_bottom = 6.0;
        }
        Tag::H4 => {
            s.font_size = 12.5;
            s.font_weight = FontWeight::Bold;
            s.margin_top = 8.0;
            s.margin_bottom = 4.0;
        }
        Tag::P => {
            s.margin_bottom = 8.0;
        }
        Tag::Ul | Tag::Ol => {
            s.margin_bottom = 8.0;
            s.padding_left = 22.0;
        }
        Tag::Li => {
            s.display = Display::ListItem;
            s.margin_bottom = 3.0;
        }
        Tag::Span => {
            s.display = Display::Inline;
        }
        Tag::Div | Tag::Body | Tag::Html => {}
        Tag::Head | Tag::Unknown(_) => {
            s.display = Display::None;
        }
    }
}

/// Apply a single utility class.
fn apply_class(s: &mut ComputedStyle, class: &str) {
    match class {
        "flex" => s.display = Display::Flex,
        "justify-center" => s.justify_content = JustifyContent::Center,
        "items-center" => s.align_items = AlignItems::Center,

        "font-bold" => s.font_weight = FontWeight::Bold,
        "italic" => s.font_style = FontStyle::Italic,
        "text-center" => s.text_align = TextAlign::Center,

        "text-lg" => s.font_size = 13.0,
        "text-xl" => s.font_size = 16.0,
        "text-4xl" => s.font_size = 32.0,

        LEGACY_BREAK_CLASS => s.legacy_break = true,

        _ => apply_spacing_class(s, class),
    }
}

/// `mb-{n}` and `pl-{n}` with 1 unit = 4pt.
fn apply_spacing_class(s: &mut ComputedStyle, class: &str) {
    let Some((prefix, n)) = class.split_once('-') else {
        return;
    };
    let Ok(units) = n.parse::<f32>() else {
        return;
    };
    match prefix {
        "mb" => s.margin_bottom = units * 4.0,
        "pl" => s.padding_left = units * 4.0,
        _ => {}
    }
}

fn apply_inline_style(s: &mut ComputedStyle, style_str: &str) {
    for decl in style_str.split(';') {
        if let Some((prop, val)) = decl.split_once(':') {
            apply_css_property(s, prop.trim(), val.trim());
        }
    }
}

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    let always = matches!(val, "always" | "page");
    match prop {
        "display" => {
            s.display = match val {
                "flex" => Display::Flex,
                "block" => Display::Block,
                "inline" => Display::Inline,
                "none" => Display::None,
                _ => s.display,
            }
        }
        "font-size" => set_px(&mut s.font_size, val),
        "font-weight" => {
            s.font_weight = match val {
                "bold" | "600" | "700" | "800" | "900" => FontWeight::Bold,
                _ => FontWeight::Normal,
            }
        }
        "font-style" => {
            s.font_style = if val == "italic" {
                FontStyle::Italic
            } else {
                FontStyle::Normal
            }
        }
        "color" => {
            if let Some(c) = Color::from_hex(val) {
                s.color = c;
            }
        }
        "background-color" | "background" => {
            if let Some(c) = Color::from_hex(val) {
                s.background_color = c;
            }
        }
        "text-align" => {
            s.text_align = match val {
                "center" => TextAlign::Center,
                "right" => TextAlign::Right,
                _ => TextAlign::Left,
            }
        }
        "width" => s.width = parse_dimension(val),
        "height" => s.height = parse_dimension(val),
        "min-height" => s.min_height = parse_dimension(val),
        "margin-top" => set_px(&mut s.margin_top, val),
        "margin-bottom" => set_px(&mut s.margin_bottom, val),
        "padding-top" => set_px(&mut s.padding_top, val),
        "padding-right" => set_px(&mut s.padding_right, val),
        "padding-bottom" => set_px(&mut s.padding_bottom, val),
        "padding-left" => set_px(&mut s.padding_left, val),
        "line-height" => {
            if let Ok(v) = val.parse::<f32>() {
                s.line_height = v;
            } else if let Some(px) = parse_px(val) {
                s.line_height = px / s.font_size;
            }
        }
        "page-break-before" | "break-before" => s.page_break_before = always,
        "page-break-after" | "break-after" => s.page_break_after = always,
        "page-break-inside" | "break-inside" => s.page_break_inside_avoid = val == "avoid",
        _ => {}
    }
}

fn set_px(target: &mut f32, val: &str) {
    if let Some(px) = parse_px(val) {
        *target = px;
    }
}

fn parse_px(s: &str) -> Option<f32> {
    s.trim()
        .trim_end_matches("px")
        .trim_end_matches("pt")
        .parse()
        .ok()
}

fn parse_dimension(s: &str) -> Dimension {
    let s = s.trim();
    if s == "auto" {
        Dimension::Auto
    } else if let Some(pct) = s.strip_suffix('%') {
        pct.parse().map(Dimension::Percent).unwrap_or(Dimension::Auto)
    } else {
        parse_px(s).map(Dimension::Px).unwrap_or(Dimension::Auto)
    }
}

// ---------------------------------------------------------------------------
// Styled DOM tree
// ---------------------------------------------------------------------------

/// A DOM node annotated with its computed style.
#[derive(Debug, Clone)]
pub enum StyledNode {
    Element {
        tag: Tag,
        style: ComputedStyle,
        children: Vec<StyledNode>,
        attrs: HashMap<String, String>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
}

/// Build a styled tree from a DOM tree, resolving styles top-down.
pub fn build_styled_tree(
    nodes: &[DomNode],
    parent_style: Option<&ComputedStyle>,
) -> Vec<StyledNode> {
    let mut result = Vec::new();
    for node in nodes {
        match node {
            DomNode::Element(e) => {
                let style = resolve_style(e, parent_style);
                if style.display == Display::None {
                    continue;
                }
                let children = build_styled_tree(&e.children, Some(&style));
                result.push(StyledNode::Element {
                    tag: e.tag.clone(),
                    style,
                    children,
                    attrs: e.attributes.clone(),
                });
            }
            DomNode::Text(text) if !text.trim().is_empty() => {
                // Text inherits typography only; box-model properties stay on
                // the enclosing element.
                let parent = parent_style.cloned().unwrap_or_default();
                let style = ComputedStyle {
                    font_size: parent.font_size,
                    font_weight: parent.font_weight,
                    font_style: parent.font_style,
                    color: parent.color,
                    text_align: parent.text_align,
                    line_height: parent.line_height,
                    ..ComputedStyle::default()
                };
                result.push(StyledNode::Text {
                    text: text.clone(),
                    style,
                });
            }
            DomNode::Text(_) => {}
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn style_of(html: &str) -> ComputedStyle {
        let dom = parse_html(html);
        match &build_styled_tree(&dom, None)[0] {
            StyledNode::Element { style, .. } => style.clone(),
            StyledNode::Text { .. } => panic!("Expected element"),
        }
    }

    #[test]
    fn spacing_classes() {
        let mut s = ComputedStyle::default();
        apply_class(&mut s, "pl-6");
        apply_class(&mut s, "mb-2");
        apply_class(&mut s, "mb-x");
        assert_eq!(s.padding_left, 24.0);
        assert_eq!(s.margin_bottom, 8.0);
        assert_eq!(s.margin_top, 0.0);
    }

    #[test]
    fn inline_page_break_and_colour() {
        let s = style_of(r##"<h2 style="page-break-before: always; color: #1a365d">A</h2>"##);
        assert!(s.page_break_before);
        assert!(!s.page_break_after);
        assert_eq!(s.font_weight, FontWeight::Bold);
        assert!((s.color.r - 0x1a as f32 / 255.0).abs() < 0.01);
    }

    #[test]
    fn legacy_marker_class() {
        let s = style_of(r#"<div class="html2pdf__page-break"></div>"#);
        assert!(s.legacy_break);
        assert!(!s.page_break_after);
    }

    #[test]
    fn text_inherits_typography_not_spacing() {
        let dom = parse_html(r#"<p class="mb-4 italic">words</p>"#);
        let styled = build_styled_tree(&dom, None);
        let StyledNode::Element { children, .. } = &styled[0] else {
            panic!("Expected element");
        };
        let StyledNode::Text { style, .. } = &children[0] else {
            panic!("Expected text");
        };
        assert_eq!(style.font_style, FontStyle::Italic);
        assert_eq!(style.margin_bottom, 0.0);
    }

    #[test]
    fn cover_classes() {
        let s = style_of(r#"<div class="flex justify-center items-center text-center text-4xl"></div>"#);
        assert_eq!(s.display, Display::Flex);
        assert_eq!(s.justify_content, JustifyContent::Center);
        assert_eq!(s.align_items, AlignItems::Center);
        assert_eq!(s.text_align, TextAlign::Center);
        assert_eq!(s.font_size, 32.0);

        // Unknown utilities leave the defaults alone.
        let plain = style_of(r#"<div class="w-full text-right"></div>"#);
        assert_eq!(plain.text_align, TextAlign::Left);
        assert_eq!(plain.width, Dimension::Auto);
    }

    #[test]
    fn short_hex_colour() {
        let c = Color::from_hex("#f80").unwrap();
        assert!((c.r - 1.0).abs() < 0.01);
        assert!((c.g - 0.533).abs() < 0.01);
        assert!(Color::from_hex("#12").is_none());
    }
}
