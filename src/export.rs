//! Export orchestrator – drives compose → render → stamp for one document
//! and tracks where the pipeline is.
//!
//! `export` takes `&mut self`, so one orchestrator runs at most one export at
//! a time. A failed export leaves the orchestrator in
//! [`ExportState::Failed`] until [`ExportOrchestrator::reset`] is called.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::compose::{Composer, PrintableDocument};
use crate::engine::{EngineConfig, PageBreakMode, PaginatedArtifact, RenderEngine, FOOTER_FONT_SIZE};
use crate::error::{ExportError, Result};
use crate::metadata::DocumentMetadata;
use crate::normalize::normalize;
use crate::pipeline::{PageOrientation, PageSetup, PageSize, PAGE_MARGIN_PT};
use crate::toc::{build_toc, TocEntry, TOC_PAGE_OFFSET};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    Composing,
    Rendering,
    Stamping,
    Complete,
    Failed,
}

/// User-facing export settings, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub page_size: PageSize,
    pub orientation: PageOrientation,
    pub margin_pt: f32,
    pub image_quality: f32,
    pub raster_scale: f32,
    pub page_break_modes: Vec<PageBreakMode>,
    pub footer_font_size: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            page_size: PageSize::A4,
            orientation: PageOrientation::Portrait,
            margin_pt: PAGE_MARGIN_PT,
            image_quality: engine.image_quality,
            raster_scale: engine.raster_scale,
            page_break_modes: engine.page_break_modes,
            footer_font_size: FOOTER_FONT_SIZE,
        }
    }
}

impl ExportOptions {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn page_setup(&self) -> PageSetup {
        PageSetup {
            page_size: self.page_size,
            orientation: self.orientation,
            margin_pt: self.margin_pt,
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            page: self.page_setup(),
            image_quality: self.image_quality,
            raster_scale: self.raster_scale,
            page_break_modes: self.page_break_modes.clone(),
            footer_font_size: self.footer_font_size,
        }
    }
}

/// A TOC entry whose estimated page differs from where the heading landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocDrift {
    pub label: String,
    /// Page printed in the TOC.
    pub estimated: u32,
    /// One-based physical page the heading was rendered on.
    pub actual: u32,
}

/// The result of a successful export.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub total_pages: usize,
    /// One-based numbers of the pages that received a footer.
    pub stamped_pages: Vec<usize>,
    pub toc_drift: Vec<TocDrift>,
}

/// `"My Report"` → `"my-report.pdf"`; blank titles give `"document.pdf"`.
pub fn export_filename(title: &str) -> String {
    let slug = title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    if slug.is_empty() {
        "document.pdf".to_string()
    } else {
        format!("{slug}.pdf")
    }
}

pub struct ExportOrchestrator<E> {
    engine: E,
    state: ExportState,
}

impl<E: RenderEngine> ExportOrchestrator<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            state: ExportState::Idle,
        }
    }

    pub fn state(&self) -> ExportState {
        self.state
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Leave the failed state so another export can be attempted.
    pub fn reset(&mut self) {
        self.state = ExportState::Idle;
    }

    fn fail(&mut self, err: ExportError) -> ExportError {
        log::error!("Export failed: {err}");
        self.state = ExportState::Failed;
        err
    }

    /// Normalize, compose and export a raw service response.
    pub fn export_response(
        &mut self,
        response: Option<&str>,
        metadata: &DocumentMetadata,
        options: &ExportOptions,
    ) -> Result<ExportedFile> {
        if self.state == ExportState::Failed {
            return Err(ExportError::AlreadyFailed);
        }
        let response = match response {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                log::warn!("Export requested without a survey response");
                return Err(ExportError::MissingInput);
            }
        };

        self.state = ExportState::Composing;
        let blocks = normalize(response);
        let toc = build_toc(&blocks);
        let document = Composer::new(options.page_setup()).compose(&blocks, metadata, &toc);
        self.export(&document, options)
    }

    /// Render `document`, stamp "Page X of N" on every page after the cover,
    /// and serialize it.
    pub fn export(
        &mut self,
        document: &PrintableDocument,
        options: &ExportOptions,
    ) -> Result<ExportedFile> {
        if self.state == ExportState::Failed {
            return Err(ExportError::AlreadyFailed);
        }

        self.state = ExportState::Rendering;
        let mut artifact = match self.engine.render(document, &options.engine_config()) {
            Ok(artifact) => artifact,
            Err(e) => return Err(self.fail(ExportError::Render(e))),
        };

        self.state = ExportState::Stamping;
        let total_pages = artifact.page_count();
        let mut stamped_pages = Vec::with_capacity(total_pages.saturating_sub(1));
        for index in 1..total_pages {
            let number = index + 1;
            if let Err(e) = artifact.stamp_footer(index, &format!("Page {number} of {total_pages}")) {
                return Err(self.fail(ExportError::Stamp(e)));
            }
            stamped_pages.push(number);
        }

        let toc_drift = find_toc_drift(&artifact, &document.toc);

        let bytes = match artifact.into_bytes() {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.fail(ExportError::Render(e))),
        };

        self.state = ExportState::Complete;
        let file_name = export_filename(&document.title);
        log::info!(
            "Exported {file_name}: {total_pages} pages, {} bytes",
            bytes.len()
        );

        Ok(ExportedFile {
            file_name,
            bytes,
            total_pages,
            stamped_pages,
            toc_drift,
        })
    }
}

/// Compare estimated TOC pages with where the engine placed each heading.
/// The cover and TOC pages are skipped, and a label listed more than once
/// is matched to its occurrences in order.
fn find_toc_drift<A: PaginatedArtifact>(artifact: &A, toc: &[TocEntry]) -> Vec<TocDrift> {
    let body_start = TOC_PAGE_OFFSET as usize - 1;
    let mut seen: HashMap<&str, usize> = HashMap::new();
    toc.iter()
        .filter_map(|entry| {
            let nth = seen.entry(entry.label.as_str()).or_insert(0);
            let occurrence = *nth;
            *nth += 1;
            let page = artifact
                .pages_of(&entry.label)
                .into_iter()
                .filter(|&page| page >= body_start)
                .nth(occurrence)?;
            let actual = u32::try_from(page + 1).ok()?;
            (actual != entry.page_number).then(|| {
                log::warn!(
                    "TOC lists '{}' on page {} but it was rendered on page {actual}",
                    entry.label,
                    entry.page_number
                );
                TocDrift {
                    label: entry.label.clone(),
                    estimated: entry.page_number,
                    actual,
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ForgeEngine;
    use crate::error::EngineError;
    use crate::samples;
    use crate::toc::TocLevel;

    struct RejectingEngine;

    enum NoArtifact {}

    impl PaginatedArtifact for NoArtifact {
        fn page_count(&self) -> usize {
            unreachable!()
        }

        fn stamp_footer(&mut self, _: usize, _: &str) -> std::result::Result<(), EngineError> {
            unreachable!()
        }

        fn into_bytes(self) -> std::result::Result<Vec<u8>, EngineError> {
            unreachable!()
        }
    }

    impl RenderEngine for RejectingEngine {
        type Artifact = NoArtifact;

        fn render(
            &self,
            _: &PrintableDocument,
            _: &EngineConfig,
        ) -> std::result::Result<NoArtifact, EngineError> {
            Err(EngineError::Rejected("engine offline".into()))
        }
    }

    /// Reports fixed page positions for every label.
    struct PlacedArtifact(HashMap<&'static str, Vec<usize>>);

    impl PaginatedArtifact for PlacedArtifact {
        fn page_count(&self) -> usize {
            8
        }

        fn stamp_footer(&mut self, _: usize, _: &str) -> std::result::Result<(), EngineError> {
            Ok(())
        }

        fn pages_of(&self, text: &str) -> Vec<usize> {
            self.0.get(text).cloned().unwrap_or_default()
        }

        fn into_bytes(self) -> std::result::Result<Vec<u8>, EngineError> {
            Ok(Vec::new())
        }
    }

    fn entry(label: &str, level: TocLevel, page_number: u32) -> TocEntry {
        TocEntry {
            label: label.into(),
            level,
            page_number,
        }
    }

    #[test]
    fn repeated_labels_resolve_in_order_past_the_cover() {
        // Page 0 is the cover, whose title is also "Overview".
        let artifact = PlacedArtifact(HashMap::from([
            ("Overview", vec![0, 2, 5]),
            ("Intro", vec![2]),
            ("Outro", vec![4]),
        ]));
        let toc = [
            entry("Intro", TocLevel::Section, 3),
            entry("Overview", TocLevel::Subsection, 3),
            entry("Outro", TocLevel::Section, 4),
            entry("Overview", TocLevel::Subsection, 4),
            entry("Missing", TocLevel::Section, 5),
        ];

        let drift = find_toc_drift(&artifact, &toc);
        assert_eq!(
            drift,
            vec![
                TocDrift {
                    label: "Outro".into(),
                    estimated: 4,
                    actual: 5,
                },
                TocDrift {
                    label: "Overview".into(),
                    estimated: 4,
                    actual: 6,
                },
            ]
        );
    }

    #[test]
    fn filename_slug() {
        assert_eq!(export_filename("Demo"), "demo.pdf");
        assert_eq!(export_filename("  My   Big\tReport "), "my-big-report.pdf");
        assert_eq!(export_filename("   "), "document.pdf");
    }

    #[test]
    fn missing_response_keeps_idle() {
        let mut orch = ExportOrchestrator::new(ForgeEngine::new());
        let meta = DocumentMetadata::default();
        for response in [None, Some(""), Some(" \n ")] {
            let err = orch
                .export_response(response, &meta, &ExportOptions::default())
                .unwrap_err();
            assert!(matches!(err, ExportError::MissingInput));
        }
        assert_eq!(orch.state(), ExportState::Idle);
    }

    #[test]
    fn rejected_render_fails_until_reset() {
        let mut orch = ExportOrchestrator::new(RejectingEngine);
        let meta = DocumentMetadata::default();
        let opts = ExportOptions::default();

        let err = orch.export_response(Some("## A\nb"), &meta, &opts).unwrap_err();
        assert!(matches!(err, ExportError::Render(EngineError::Rejected(_))));
        assert_eq!(orch.state(), ExportState::Failed);

        let err = orch.export_response(Some("## A\nb"), &meta, &opts).unwrap_err();
        assert!(matches!(err, ExportError::AlreadyFailed));

        orch.reset();
        assert_eq!(orch.state(), ExportState::Idle);
    }

    #[test]
    fn invalid_options_fail_render() {
        let mut orch = ExportOrchestrator::new(ForgeEngine::new());
        let opts = ExportOptions {
            image_quality: 0.0,
            ..ExportOptions::default()
        };
        let err = orch
            .export_response(Some("hello"), &DocumentMetadata::default(), &opts)
            .unwrap_err();
        assert!(matches!(err, ExportError::Render(EngineError::InvalidConfig(_))));
        assert_eq!(orch.state(), ExportState::Failed);
    }

    #[test]
    fn stamps_every_page_but_the_cover() {
        let mut orch = ExportOrchestrator::new(ForgeEngine::new());
        let meta = DocumentMetadata::default().with_title("Demo Report");
        let file = orch
            .export_response(Some(samples::TWO_SECTIONS), &meta, &ExportOptions::default())
            .unwrap();

        assert_eq!(orch.state(), ExportState::Complete);
        assert_eq!(file.file_name, "demo-report.pdf");
        assert!(file.total_pages >= 3);
        assert_eq!(file.stamped_pages, (2..=file.total_pages).collect::<Vec<_>>());
        assert_eq!(&file.bytes[0..5], b"%PDF-");
    }

    #[test]
    fn options_json_defaults() {
        let opts = ExportOptions::from_json(r#"{"page_size": "letter", "margin_pt": 36}"#).unwrap();
        assert_eq!(opts.page_size, PageSize::Letter);
        assert_eq!(opts.margin_pt, 36.0);
        assert_eq!(opts.page_break_modes, PageBreakMode::defaults());
        assert_eq!(opts.engine_config().page.width(), 612.0);
    }
}
