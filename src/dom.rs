//! HTML reader for composed documents.
//!
//! The composer emits a small, controlled vocabulary, so the reader only
//! knows those tags:
//! - Structural: div, p, h1-h4, ul, ol, li
//! - Inline: span
//! - Document wrappers: html, head, body
//!
//! Styling arrives through `class` and `style` attributes; list markers may
//! be overridden with a `data-bullet` attribute.

use std::collections::HashMap;

/// The tag name of a supported element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Div,
    P,
    H1,
    H2,
    H3,
    H4,
    Ul,
    Ol,
    Li,
    Span,
    Body,
    Html,
    Head,
    /// Anything else; kept in the tree but never rendered.
    Unknown(String),
}

impl Tag {
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "div" => Tag::Div,
            "p" => Tag::P,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "h4" => Tag::H4,
            "ul" => Tag::Ul,
            "ol" => Tag::Ol,
            "li" => Tag::Li,
            "span" => Tag::Span,
            "body" => Tag::Body,
            "html" => Tag::Html,
            "head" => Tag::Head,
            _ => Tag::Unknown(name.to_string()),
        }
    }

    /// Elements whose inline children are merged into one wrapped text run.
    pub fn is_text_block(&self) -> bool {
        matches!(self, Tag::P | Tag::H1 | Tag::H2 | Tag::H3 | Tag::H4)
    }

    /// Void elements never have children or a closing tag.
    fn is_void(&self) -> bool {
        matches!(self, Tag::Unknown(name) if matches!(name.to_ascii_lowercase().as_str(), "br" | "hr" | "img" | "meta"))
    }
}

#[derive(Debug, Clone)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attributes.get("style").map(String::as_str)
    }

    /// Custom list marker requested by the document (`data-bullet`).
    pub fn bullet(&self) -> Option<&str> {
        self.attributes.get("data-bullet").map(String::as_str)
    }

    /// Concatenated text of this element and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[DomNode], out: &mut String) {
    for node in nodes {
        match node {
            DomNode::Text(t) => out.push_str(t),
            DomNode::Element(e) => collect_text(&e.children, out),
        }
    }
}

/// Parse an HTML string into a list of DOM nodes.
///
/// Unclosed elements are closed at end of input and stray closing tags end
/// the current element, so malformed markup never aborts the parse.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    Reader { src: html, pos: 0 }.nodes()
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn eat(&mut self, prefix: &str) -> bool {
        if self.rest().starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    /// Advance to just past `needle`, or to end of input.
    fn skip_past(&mut self, needle: &str) {
        match self.rest().find(needle) {
            Some(i) => self.pos += i + needle.len(),
            None => self.pos = self.src.len(),
        }
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    /// Take characters while `keep` holds.
    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let end = rest.find(|c: char| !keep(c)).unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn nodes(&mut self) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        while !self.at_end() && !self.rest().starts_with("</") {
            if self.eat("<!--") {
                self.skip_past("-->");
            } else if self.rest().starts_with("<!") || self.rest().starts_with("<?") {
                self.skip_past(">");
            } else if self.rest().starts_with('<') {
                nodes.push(DomNode::Element(self.element()));
            } else {
                let text = self.take_while(|c| c != '<');
                // Whitespace between tags is layout noise.
                if !text.trim().is_empty() {
                    nodes.push(DomNode::Text(decode_entities(text)));
                }
            }
        }
        nodes
    }

    fn element(&mut self) -> ElementNode {
        self.eat("<");
        let name = self.take_while(is_name_char);
        let mut elem = ElementNode::new(Tag::parse(name));

        loop {
            self.skip_ws();
            if self.at_end() || self.eat(">") {
                break;
            }
            if self.eat("/>") {
                return elem;
            }
            let key = self.take_while(is_name_char).to_ascii_lowercase();
            if key.is_empty() {
                // Unexpected character inside a tag; skip it.
                self.pos += self.rest().chars().next().map_or(1, char::len_utf8);
                continue;
            }
            self.skip_ws();
            let value = if self.eat("=") {
                self.skip_ws();
                self.attr_value()
            } else {
                String::new()
            };
            elem.attributes.insert(key, value);
        }

        if elem.tag.is_void() {
            return elem;
        }

        elem.children = self.nodes();
        if self.eat("</") {
            self.skip_past(">");
        }
        elem
    }

    fn attr_value(&mut self) -> String {
        for quote in ['"', '\''] {
            if self.rest().starts_with(quote) {
                self.pos += 1;
                let value = self.take_while(|c| c != quote);
                self.pos = (self.pos + 1).min(self.src.len());
                return decode_entities(value);
            }
        }
        self.take_while(|c| !c.is_whitespace() && c != '>' && c != '/')
            .to_string()
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", "\u{00A0}")
        .replace("&amp;", "&")
}

/// Children of `<body>`, or all nodes if there is no `<body>`.
pub fn body_children(nodes: &[DomNode]) -> Vec<DomNode> {
    for node in nodes {
        if let DomNode::Element(e) = node {
            if e.tag == Tag::Body {
                return e.children.clone();
            }
            if e.tag == Tag::Html {
                let inner = body_children(&e.children);
                if !inner.is_empty() {
                    return inner;
                }
            }
        }
    }
    nodes.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_element(nodes: &[DomNode]) -> &ElementNode {
        match &nodes[0] {
            DomNode::Element(e) => e,
            DomNode::Text(t) => panic!("Expected element, got text {t:?}"),
        }
    }

    #[test]
    fn parse_heading_with_style() {
        let nodes = parse_html(r#"<h2 class="mb-2" style="page-break-before: always">Intro</h2>"#);
        assert_eq!(nodes.len(), 1);
        let h2 = first_element(&nodes);
        assert_eq!(h2.tag, Tag::H2);
        assert_eq!(h2.classes(), vec!["mb-2"]);
        assert_eq!(h2.inline_style(), Some("page-break-before: always"));
        assert_eq!(h2.text_content(), "Intro");
    }

    #[test]
    fn parse_list_with_bullet_override() {
        let nodes = parse_html(r#"<ul data-bullet="&#39;-&#39;"><li><p>a</p></li><li><p>b</p></li></ul>"#);
        let ul = first_element(&nodes);
        assert_eq!(ul.tag, Tag::Ul);
        assert_eq!(ul.bullet(), Some("'-'"));
        assert_eq!(ul.children.len(), 2);
    }

    #[test]
    fn parse_spans_inside_paragraph() {
        let nodes = parse_html(r#"<p>Hello <span class="font-bold">world</span>!</p>"#);
        let p = first_element(&nodes);
        assert_eq!(p.tag, Tag::P);
        assert_eq!(p.children.len(), 3);
    }

    #[test]
    fn entities_decode_once() {
        let nodes = parse_html("<p>R&amp;D &amp;lt;ok&amp;gt;</p>");
        assert_eq!(first_element(&nodes).text_content(), "R&D &lt;ok&gt;");
    }

    #[test]
    fn empty_marker_div_and_void_tags() {
        let nodes = parse_html(r#"<div class="html2pdf__page-break"></div><br><p>after</p>"#);
        assert_eq!(nodes.len(), 3);
        assert!(first_element(&nodes).children.is_empty());
    }

    #[test]
    fn body_children_unwraps_document() {
        let nodes = parse_html("<!DOCTYPE html><html><head></head><body><p>x</p></body></html>");
        let body = body_children(&nodes);
        assert_eq!(body.len(), 1);
    }
}
