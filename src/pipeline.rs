//! Pipeline – page geometry plus the parse → style → layout → paginate →
//! render chain used by the bundled engine.

use serde::{Deserialize, Serialize};

use crate::dom::{body_children, parse_html};
use crate::error::EngineError;
use crate::fonts::FontManager;
use crate::layout::compute_layout;
use crate::layout_config::LayoutConfig;
use crate::pagination::{paginate, BreakPolicy};
use crate::render::render_pdf;
use crate::style::build_styled_tree;

/// Default page margin in points.
pub const PAGE_MARGIN_PT: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    /// 210mm × 297mm = 595.28 × 841.89 points.
    #[default]
    A4,
    /// 8.5in × 11in = 612 × 792 points.
    Letter,
}

impl PageSize {
    /// Portrait (width, height) in points.
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
        }
    }
}

/// Page orientation for the generated PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    #[default]
    Portrait,
    /// Width and height swapped.
    Landscape,
}

/// Physical page geometry shared by the composer and the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSetup {
    pub page_size: PageSize,
    pub orientation: PageOrientation,
    /// Margin on every edge, in points.
    pub margin_pt: f32,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            orientation: PageOrientation::Portrait,
            margin_pt: PAGE_MARGIN_PT,
        }
    }
}

impl PageSetup {
    /// Effective page width after applying orientation.
    pub fn width(&self) -> f32 {
        let (w, h) = self.page_size.dimensions();
        match self.orientation {
            PageOrientation::Portrait => w,
            PageOrientation::Landscape => h,
        }
    }

    /// Effective page height after applying orientation.
    pub fn height(&self) -> f32 {
        let (w, h) = self.page_size.dimensions();
        match self.orientation {
            PageOrientation::Portrait => h,
            PageOrientation::Landscape => w,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width() - 2.0 * self.margin_pt
    }

    pub fn content_height(&self) -> f32 {
        self.height() - 2.0 * self.margin_pt
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.margin_pt.is_finite() || self.margin_pt < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "margin must be a non-negative number of points, got {}",
                self.margin_pt
            )));
        }
        if self.content_width() <= 0.0 || self.content_height() <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "margin {}pt leaves no content area on a {}x{}pt page",
                self.margin_pt,
                self.width(),
                self.height()
            )));
        }
        Ok(())
    }
}

/// Lay out an HTML document into pages without rendering it.
pub fn layout_document(
    html: &str,
    title: &str,
    setup: &PageSetup,
    policy: BreakPolicy,
    fonts: &FontManager,
) -> Result<LayoutConfig, EngineError> {
    setup.validate()?;

    let dom = parse_html(html);
    let dom_nodes = body_children(&dom);
    let styled = build_styled_tree(&dom_nodes, None);
    let boxes = compute_layout(&styled, setup.width(), setup.margin_pt, fonts)?;

    Ok(paginate(
        &boxes,
        title,
        setup.width(),
        setup.height(),
        setup.margin_pt,
        policy,
        fonts,
    ))
}

/// Full pipeline: HTML string → PDF bytes and the layout they were drawn from.
pub fn generate_pdf(
    html: &str,
    title: &str,
    setup: &PageSetup,
) -> Result<(Vec<u8>, LayoutConfig), EngineError> {
    let layout = layout_document(
        html,
        title,
        setup,
        BreakPolicy::default(),
        &FontManager::default(),
    )?;
    let bytes = render_pdf(&layout)?;
    Ok((bytes, layout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_basic() {
        let html = "<h1>Hello</h1><p>World</p>";
        let (bytes, config) = generate_pdf(html, "Hello", &PageSetup::default()).unwrap();
        assert_eq!(config.pages.len(), 1);
        assert_eq!(config.title, "Hello");
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let setup = PageSetup {
            page_size: PageSize::Letter,
            orientation: PageOrientation::Landscape,
            ..PageSetup::default()
        };
        assert_eq!(setup.width(), 792.0);
        assert_eq!(setup.height(), 612.0);
        assert_eq!(setup.content_height(), 612.0 - 80.0);
    }

    #[test]
    fn oversized_margin_is_invalid() {
        let setup = PageSetup {
            margin_pt: 400.0,
            ..PageSetup::default()
        };
        let err = layout_document(
            "<p>x</p>",
            "t",
            &setup,
            BreakPolicy::default(),
            &FontManager::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn page_size_names() {
        let s: PageSize = serde_json::from_str("\"letter\"").unwrap();
        assert_eq!(s, PageSize::Letter);
        let o: PageOrientation = serde_json::from_str("\"landscape\"").unwrap();
        assert_eq!(o, PageOrientation::Landscape);
    }
}
