//! Sample service responses for tests and demonstration.
//!
//! Each sample exercises a different part of the normalizer: section markers,
//! heading heuristics, lists, emphasis, and the `<br>` line breaks the
//! processing service substitutes for newlines.

/// Two top-level sections with a paragraph each.
pub const TWO_SECTIONS: &str = "## Project Overview\n\
The team needs a **mobile-first** booking tool for small clinics.\n\
## Requirements\n\
Patients book, reschedule and cancel appointments *without calling*.";

/// A full requirements write-up: numbered and label headings, both list
/// kinds, emphasis, and a separator line that degrades to nothing.
pub const REQUIREMENTS: &str = "## Executive Summary\n\
This document captures the requirements gathered from the **project survey**.\n\
\n\
---\n\
## Scope\n\
1. Functional Requirements\n\
- Online appointment booking\n\
- SMS and e-mail reminders\n\
\n\
- Staff calendar view\n\
2. Non-Functional Requirements\n\
1. respond within 200 ms\n\
2. stay available during clinic hours\n\
Constraints:\n\
Budget is *fixed* for the first release.\n\
## Timeline\n\
Phase one ships after **eight weeks**, followed by a pilot.";

/// The same shape as [`TWO_SECTIONS`] but with HTML line breaks, as the
/// processing service returns it.
pub const BR_DELIMITED: &str = "## Project Overview<br>The team needs a booking tool.<br/>\
- calendar sync<BR />- reminders<br>## Budget<br>Fixed price.";

/// No section markers at all.
pub const PLAIN: &str = "Just one paragraph of text with no structure.";

/// Enough sections and body text to spill the body over many pages.
pub fn long_report(sections: usize, paragraphs_per_section: usize) -> String {
    let mut out = String::new();
    for s in 1..=sections {
        out.push_str(&format!("## Section {s}\n"));
        for p in 1..=paragraphs_per_section {
            out.push_str(&format!(
                "Paragraph {p} of section {s} describes a requirement in enough detail \
                 to wrap across several lines once it is laid out on the page.\n"
            ));
        }
    }
    out
}
