//! Table of contents – derives section entries from normalized blocks.
//!
//! Page numbers are estimates: the n-th section or subsection heading is
//! reported on page `n + TOC_PAGE_OFFSET`, counting the cover and the TOC
//! page itself. Real content height is only known once the engine paginates,
//! so these numbers can disagree with the stamped footers. The export step
//! reports that drift, it never rewrites the TOC.

use serde::Serialize;

use crate::normalize::Block;

/// Page reported for the first body heading (cover = 1, TOC = 2).
pub const TOC_PAGE_OFFSET: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TocLevel {
    /// Level-2 heading.
    Section,
    /// Level-3 heading, indented and bullet-prefixed in the TOC.
    Subsection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub label: String,
    pub level: TocLevel,
    pub page_number: u32,
}

impl TocEntry {
    pub fn is_indented(&self) -> bool {
        self.level == TocLevel::Subsection
    }
}

/// Build TOC entries for every level-2 and level-3 heading, in order.
pub fn build_toc(blocks: &[Block]) -> Vec<TocEntry> {
    blocks
        .iter()
        .filter_map(|block| match block {
            Block::Heading { level: 2, text, .. } => Some((TocLevel::Section, text)),
            Block::Heading { level: 3, text, .. } => Some((TocLevel::Subsection, text)),
            _ => None,
        })
        .zip(0u32..)
        .map(|((level, text), index)| TocEntry {
            label: text.clone(),
            level,
            page_number: index + TOC_PAGE_OFFSET,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    #[test]
    fn sections_and_subsections_get_sequential_pages() {
        let blocks = normalize("## Intro\ntext\n## Scope\n1. Overview\nmore");
        let toc = build_toc(&blocks);
        assert_eq!(toc.len(), 3);
        let pages: Vec<u32> = toc.iter().map(|e| e.page_number).collect();
        assert_eq!(pages, vec![3, 4, 5]);
        assert_eq!(toc[2].label, "1. Overview");
        assert!(toc[2].is_indented());
        assert!(!toc[0].is_indented());
    }

    #[test]
    fn level_one_and_four_headings_are_excluded() {
        let blocks = normalize("# Title\n## Body\nKey Points:\n#### Minor");
        let toc = build_toc(&blocks);
        assert_eq!(toc.len(), 1);
        assert_eq!(toc[0].label, "Body");
        assert_eq!(toc[0].page_number, TOC_PAGE_OFFSET);
    }

    #[test]
    fn no_headings_no_entries() {
        assert!(build_toc(&normalize("just a paragraph")).is_empty());
    }
}
