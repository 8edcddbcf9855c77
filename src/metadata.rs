//! User-editable document metadata shown on the cover page.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "Project Documentation";
pub const DEFAULT_AUTHOR: &str = "Project Team";
pub const DEFAULT_COMPANY: &str = "Independent";

/// Title, author and company for one export, plus the generation time.
///
/// Values are immutable; the `with_*` builders return an updated copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    pub company: String,
    pub generated_at: DateTime<Local>,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            company: DEFAULT_COMPANY.to_string(),
            generated_at: Local::now(),
        }
    }
}

impl DocumentMetadata {
    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self
        }
    }

    pub fn with_author(self, author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            ..self
        }
    }

    pub fn with_company(self, company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            ..self
        }
    }

    pub fn with_generated_at(self, generated_at: DateTime<Local>) -> Self {
        Self {
            generated_at,
            ..self
        }
    }

    /// Title to display; a blank field falls back to the default.
    pub fn display_title(&self) -> &str {
        non_blank(&self.title, DEFAULT_TITLE)
    }

    pub fn display_author(&self) -> &str {
        non_blank(&self.author, DEFAULT_AUTHOR)
    }

    pub fn display_company(&self) -> &str {
        non_blank(&self.company, DEFAULT_COMPANY)
    }

    /// Generation date as printed on the cover, e.g. "March 04, 2025".
    pub fn display_date(&self) -> String {
        self.generated_at.format("%B %d, %Y").to_string()
    }
}

fn non_blank<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn blank_fields_fall_back_to_defaults() {
        let meta = DocumentMetadata::default()
            .with_title("   ")
            .with_author("")
            .with_company("Acme");
        assert_eq!(meta.display_title(), DEFAULT_TITLE);
        assert_eq!(meta.display_author(), DEFAULT_AUTHOR);
        assert_eq!(meta.display_company(), "Acme");
    }

    #[test]
    fn date_format() {
        let at = Local.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap();
        let meta = DocumentMetadata::default().with_generated_at(at);
        assert_eq!(meta.display_date(), "March 04, 2025");
    }
}
