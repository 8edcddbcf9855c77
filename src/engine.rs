//! Rendering engine boundary and the bundled PDF engine.
//!
//! An engine turns a [`PrintableDocument`] into a paginated artifact that
//! reports its physical page count and accepts per-page footer stamps before
//! being serialized. [`ForgeEngine`] is the in-process implementation built
//! on Taffy and printpdf.

use serde::{Deserialize, Serialize};

use crate::compose::PrintableDocument;
use crate::error::EngineError;
use crate::fonts::{FontManager, DEFAULT_FAMILY};
use crate::layout_config::{LayoutBox, LayoutConfig, TextContent, TextLine};
use crate::pagination::BreakPolicy;
use crate::pipeline::{layout_document, PageSetup};
use crate::render::render_pdf;

/// Default footer font size, in points.
pub const FOOTER_FONT_SIZE: f32 = 9.0;

const FOOTER_COLOR: [f32; 4] = [0.443, 0.502, 0.588, 1.0];

/// A source of page breaks an engine may honour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageBreakMode {
    /// `page-break-before` / `page-break-after` styles on elements.
    ExplicitMarkers,
    /// Automatic breaks driven by content height and CSS hints.
    Css,
    /// Empty marker elements with the legacy break class.
    Legacy,
}

impl PageBreakMode {
    /// Explicit markers first, then CSS, then legacy markers.
    pub fn defaults() -> Vec<PageBreakMode> {
        vec![
            PageBreakMode::ExplicitMarkers,
            PageBreakMode::Css,
            PageBreakMode::Legacy,
        ]
    }
}

/// Settings handed to an engine for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub page: PageSetup,
    /// Compression quality for raster output, in `(0, 1]`.
    pub image_quality: f32,
    /// Rasterization scale factor, `> 0`.
    pub raster_scale: f32,
    pub page_break_modes: Vec<PageBreakMode>,
    pub footer_font_size: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page: PageSetup::default(),
            image_quality: 0.98,
            raster_scale: 2.0,
            page_break_modes: PageBreakMode::defaults(),
            footer_font_size: FOOTER_FONT_SIZE,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.image_quality > 0.0 && self.image_quality <= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "image quality must be in (0, 1], got {}",
                self.image_quality
            )));
        }
        if !(self.raster_scale.is_finite() && self.raster_scale > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "raster scale must be positive, got {}",
                self.raster_scale
            )));
        }
        if !(self.footer_font_size.is_finite() && self.footer_font_size > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "footer font size must be positive, got {}",
                self.footer_font_size
            )));
        }
        self.page.validate()
    }
}

/// A paginating renderer.
pub trait RenderEngine {
    type Artifact: PaginatedArtifact;

    fn render(
        &self,
        document: &PrintableDocument,
        config: &EngineConfig,
    ) -> Result<Self::Artifact, EngineError>;
}

/// A rendered document whose pages can still be annotated.
pub trait PaginatedArtifact {
    fn page_count(&self) -> usize;

    /// Draw `text` right-aligned in the bottom margin of page `page_index`
    /// (zero-based).
    fn stamp_footer(&mut self, page_index: usize, text: &str) -> Result<(), EngineError>;

    /// Zero-based page of every block whose whole text is `text`, in
    /// reading order. Empty when the engine cannot tell.
    fn pages_of(&self, _text: &str) -> Vec<usize> {
        Vec::new()
    }

    fn into_bytes(self) -> Result<Vec<u8>, EngineError>;
}

/// The bundled engine: HTML → Taffy layout → pages → printpdf.
#[derive(Clone, Default)]
pub struct ForgeEngine {
    fonts: FontManager,
}

impl ForgeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Measure text with the glyph advances of a TTF/OTF face instead of the
    /// built-in estimate. The face should be metrically compatible with
    /// Helvetica; drawing still uses the PDF builtin fonts.
    pub fn with_metrics_font(mut self, bytes: Vec<u8>) -> Result<Self, EngineError> {
        self.fonts
            .load_font(DEFAULT_FAMILY, false, false, bytes.clone())
            .map_err(EngineError::InvalidConfig)?;
        self.fonts
            .load_font(DEFAULT_FAMILY, true, false, bytes)
            .map_err(EngineError::InvalidConfig)?;
        Ok(self)
    }
}

impl RenderEngine for ForgeEngine {
    type Artifact = ForgeArtifact;

    fn render(
        &self,
        document: &PrintableDocument,
        config: &EngineConfig,
    ) -> Result<ForgeArtifact, EngineError> {
        config.validate()?;
        if document.html.trim().is_empty() {
            return Err(EngineError::Rejected("document has no content".into()));
        }
        // Vector output: quality and scale only apply to raster engines.
        log::debug!(
            "Rendering '{}' (quality {}, scale {}, modes {:?})",
            document.title,
            config.image_quality,
            config.raster_scale,
            config.page_break_modes
        );

        let layout = layout_document(
            &document.html,
            &document.title,
            &config.page,
            BreakPolicy::from_modes(&config.page_break_modes),
            &self.fonts,
        )?;

        Ok(ForgeArtifact {
            layout,
            margin: config.page.margin_pt,
            footer_font_size: config.footer_font_size,
            fonts: self.fonts.clone(),
        })
    }
}

/// Paginated output of [`ForgeEngine`], still editable until serialized.
pub struct ForgeArtifact {
    layout: LayoutConfig,
    margin: f32,
    footer_font_size: f32,
    fonts: FontManager,
}

impl ForgeArtifact {
    /// The page layout as it will be drawn.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }
}

impl PaginatedArtifact for ForgeArtifact {
    fn page_count(&self) -> usize {
        self.layout.page_count()
    }

    fn stamp_footer(&mut self, page_index: usize, text: &str) -> Result<(), EngineError> {
        let total = self.page_count();
        let page_width = self.layout.page_width_pt;
        let page_height = self.layout.page_height_pt;
        let page = self
            .layout
            .pages
            .get_mut(page_index)
            .ok_or(EngineError::PageOutOfRange {
                page: page_index,
                total,
            })?;

        let size = self.footer_font_size;
        let width = self
            .fonts
            .measure_text_width(text, size, false, false, DEFAULT_FAMILY);
        let line_height = self.fonts.line_height_px(size, 1.2);
        let x = page_width - self.margin - width;
        // Vertically centred in the bottom margin.
        let y = page_height - self.margin + (self.margin - line_height).max(0.0) / 2.0;

        let mut footer = LayoutBox::new(x, y, width, line_height);
        footer.text = Some(TextContent {
            lines: vec![TextLine::new(text, 0.0, 0.0)],
            font_family: DEFAULT_FAMILY.to_string(),
            font_size: size,
            bold: false,
            italic: false,
            color: FOOTER_COLOR,
            line_height,
            list_marker: None,
        });
        page.boxes.push(footer);
        Ok(())
    }

    fn pages_of(&self, text: &str) -> Vec<usize> {
        self.layout.pages_containing(text)
    }

    fn into_bytes(self) -> Result<Vec<u8>, EngineError> {
        render_pdf(&self.layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> PrintableDocument {
        PrintableDocument {
            title: "t".into(),
            html: html.into(),
            toc: Vec::new(),
            body_blocks: Vec::new(),
        }
    }

    #[test]
    fn config_validation() {
        assert!(EngineConfig::default().validate().is_ok());
        for bad in [
            EngineConfig {
                image_quality: 0.0,
                ..EngineConfig::default()
            },
            EngineConfig {
                image_quality: 1.5,
                ..EngineConfig::default()
            },
            EngineConfig {
                raster_scale: -1.0,
                ..EngineConfig::default()
            },
            EngineConfig {
                footer_font_size: f32::NAN,
                ..EngineConfig::default()
            },
        ] {
            assert!(matches!(bad.validate(), Err(EngineError::InvalidConfig(_))));
        }
    }

    #[test]
    fn empty_document_is_rejected() {
        let err = ForgeEngine::new()
            .render(&doc("   "), &EngineConfig::default())
            .err();
        assert!(matches!(err, Some(EngineError::Rejected(_))));
    }

    #[test]
    fn footer_is_right_aligned_in_bottom_margin() {
        let mut artifact = ForgeEngine::new()
            .render(&doc("<p>body</p>"), &EngineConfig::default())
            .unwrap();
        artifact.stamp_footer(0, "Page 1 of 1").unwrap();

        let footer = artifact.layout().pages[0].boxes.last().unwrap();
        assert_eq!(footer.plain_text(), "Page 1 of 1");
        assert!((footer.x + footer.width - (595.28 - 40.0)).abs() < 0.01);
        assert!(footer.y > 841.89 - 40.0);
        assert!(footer.y + footer.height < 841.89);
    }

    #[test]
    fn stamp_out_of_range() {
        let mut artifact = ForgeEngine::new()
            .render(&doc("<p>body</p>"), &EngineConfig::default())
            .unwrap();
        let err = artifact.stamp_footer(3, "x").unwrap_err();
        assert!(matches!(err, EngineError::PageOutOfRange { page: 3, total: 1 }));
    }

    #[test]
    fn pages_of_finds_blocks() {
        let html = r#"<p>first</p><h2 style="page-break-before: always">Second</h2>"#;
        let artifact = ForgeEngine::new()
            .render(&doc(html), &EngineConfig::default())
            .unwrap();
        assert_eq!(artifact.page_count(), 2);
        assert_eq!(artifact.pages_of("Second"), vec![1]);
        assert!(artifact.pages_of("absent").is_empty());
    }

    #[test]
    fn modes_deserialize_kebab_case() {
        let modes: Vec<PageBreakMode> =
            serde_json::from_str(r#"["explicit-markers", "css", "legacy"]"#).unwrap();
        assert_eq!(modes, PageBreakMode::defaults());
    }

    #[test]
    fn bad_metrics_font() {
        assert!(ForgeEngine::new().with_metrics_font(vec![1, 2, 3]).is_err());
    }
}
