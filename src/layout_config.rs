//! Layout config – the frozen page-by-page description of a rendered
//! document. Pagination produces it, footer stamping amends it, and the PDF
//! writer consumes it.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A complete document layout ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Document title embedded in the PDF metadata.
    #[serde(default = "LayoutConfig::default_title")]
    pub title: String,
    /// Width of each page in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    /// Height of each page in PDF points.
    pub page_height_pt: f32,
    /// Ordered list of pages.
    pub pages: Vec<PageLayout>,
}

/// One page of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_index: usize,
    pub boxes: Vec<LayoutBox>,
}

/// A positioned rectangle with optional content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutBox {
    /// Position relative to page top-left, in points.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub background_color: Option<[f32; 4]>,
    pub text: Option<TextContent>,

    pub children: Vec<LayoutBox>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    /// Pre-wrapped lines of text.
    pub lines: Vec<TextLine>,
    pub font_family: String,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: [f32; 4],
    pub line_height: f32,
    /// List bullet or number drawn in the gutter (e.g. "•" or "2.").
    pub list_marker: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    /// X offset within the layout box (for alignment)
    pub x_offset: f32,
    /// Y offset from the top of the text content area
    pub y_offset: f32,
    /// Differently styled stretches of `text`. Empty means the whole line
    /// uses the face and colour of its [`TextContent`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<TextSpan>,
}

/// Part of a line drawn in its own face and colour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    /// X offset from the start of the line.
    pub x_offset: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: [f32; 4],
}

impl TextLine {
    pub fn new(text: impl Into<String>, x_offset: f32, y_offset: f32) -> Self {
        Self {
            text: text.into(),
            x_offset,
            y_offset,
            spans: Vec::new(),
        }
    }
}

impl LayoutConfig {
    pub fn new(title: impl Into<String>, page_width_pt: f32, page_height_pt: f32) -> Self {
        Self {
            title: title.into(),
            page_width_pt,
            page_height_pt,
            pages: Vec::new(),
        }
    }

    fn default_title() -> String {
        "Document".to_string()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page index of every text box whose full text equals `needle`
    /// (whitespace-normalized), one entry per box in reading order.
    pub fn pages_containing(&self, needle: &str) -> Vec<usize> {
        let needle = collapse_whitespace(needle);
        let mut found = Vec::new();
        if needle.is_empty() {
            return found;
        }
        for (index, page) in self.pages.iter().enumerate() {
            let hits: usize = page.boxes.iter().map(|b| b.count_text(&needle)).sum();
            found.extend(std::iter::repeat(index).take(hits));
        }
        found
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::Serialize(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::Serialize(e.to_string()))
    }
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            background_color: None,
            text: None,
            children: Vec::new(),
        }
    }

    /// Joined text of this box's own lines.
    pub fn plain_text(&self) -> String {
        self.text
            .as_ref()
            .map(|t| {
                t.lines
                    .iter()
                    .map(|l| l.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default()
    }

    fn count_text(&self, needle: &str) -> usize {
        let own = usize::from(self.text.is_some() && collapse_whitespace(&self.plain_text()) == needle);
        own + self.children.iter().map(|c| c.count_text(needle)).sum::<usize>()
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
