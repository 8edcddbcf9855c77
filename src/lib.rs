//! # reqdoc – requirement responses → paginated PDF documents
//!
//! Turns the loosely structured text returned by a survey-processing service
//! into a printable document with a cover page, a table of contents and a
//! styled body, then exports it through a pluggable rendering engine that
//! stamps "Page X of N" footers. The stages are:
//!
//! 1. **Normalize** – response text → structural blocks ([`normalize`], [`inline`])
//! 2. **Index** – section headings → TOC entries with estimated pages ([`toc`])
//! 3. **Compose** – blocks + [`metadata`] + TOC → printable HTML ([`compose`])
//! 4. **Export** – render, stamp footers, name the file ([`export`], [`engine`])
//!
//! The bundled engine ([`engine::ForgeEngine`]) parses the HTML ([`dom`]),
//! resolves styles ([`style`]), computes flexbox layout with Taffy
//! ([`layout`]), paginates ([`pagination`]) into a [`layout_config`] and
//! writes PDF bytes via printpdf ([`render`]).

pub mod compose;
pub mod dom;
pub mod engine;
pub mod error;
pub mod export;
pub mod fonts;
pub mod inline;
pub mod layout;
pub mod layout_config;
pub mod metadata;
pub mod normalize;
pub mod pagination;
pub mod pipeline;
pub mod render;
pub mod samples;
pub mod style;
pub mod toc;

// Re-exports for convenience
pub use compose::{compose, Composer, PrintableDocument};
pub use engine::{EngineConfig, ForgeEngine, PageBreakMode, PaginatedArtifact, RenderEngine};
pub use error::{EngineError, ExportError};
pub use export::{export_filename, ExportOptions, ExportOrchestrator, ExportState, ExportedFile};
pub use metadata::DocumentMetadata;
pub use normalize::{normalize, Block};
pub use pipeline::{PageOrientation, PageSetup, PageSize};
pub use toc::{build_toc, TocEntry};
