/*!
# Document Ingestion

Turns PDF files into [`DocumentText`]: the per-page text of a document in page
order, joined by blank lines.
*/

pub mod pdf;

pub use pdf::PdfExtractor;

use serde::{Deserialize, Serialize};

/// Separator placed between page texts
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Text of one document. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentText {
    pages: Vec<String>,
    text: String,
}

impl DocumentText {
    /// Build from page texts in page order
    pub fn from_pages(pages: Vec<String>) -> Self {
        let text = pages.join(PAGE_SEPARATOR);
        Self { pages, text }
    }

    /// Full text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Page texts
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    /// Number of pages that contributed text
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Length in characters
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Whitespace-separated words
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// True when the document has no visible text
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Counters for reports
    pub fn stats(&self) -> DocumentStats {
        DocumentStats {
            page_count: self.page_count(),
            char_count: self.char_count(),
            word_count: self.word_count(),
        }
    }

    /// Consume into the full text
    pub fn into_string(self) -> String {
        self.text
    }
}

/// Size counters of an extracted document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Pages that contributed text
    pub page_count: usize,
    /// Characters, not bytes
    pub char_count: usize,
    /// Whitespace-separated words
    pub word_count: usize,
}
