/*!
# PDF Extractor

Extracts text from PDF files page by page with `lopdf`. Documents `lopdf`
cannot decode, or that decode to no text at all, are retried with
`pdf-extract` as a single whole-document page.
*/

use super::DocumentText;
use crate::{OrderScanError, Result};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// PDF to [`DocumentText`]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Extract the text of the PDF at `path`
    pub fn extract(path: impl AsRef<Path>) -> Result<DocumentText> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(OrderScanError::pdf(format!(
                "file not found: {}",
                path.display()
            )));
        }

        let document = match Self::extract_pages(path) {
            Ok(doc) if !doc.is_blank() => doc,
            Ok(_) => {
                debug!("PDF_FALLBACK file={} reason=no_text", path.display());
                Self::extract_whole(path)?
            }
            Err(e) => {
                warn!("PDF_FALLBACK file={} reason={}", path.display(), e);
                Self::extract_whole(path)?
            }
        };

        info!(
            "PDF_EXTRACTED file={} pages={} chars={}",
            path.display(),
            document.page_count(),
            document.char_count()
        );
        Ok(document)
    }

    /// Extract on the blocking thread pool
    pub async fn extract_async(path: PathBuf) -> Result<DocumentText> {
        tokio::task::spawn_blocking(move || Self::extract(&path))
            .await
            .map_err(|e| OrderScanError::pdf(format!("extraction task failed: {}", e)))?
    }

    fn extract_pages(path: &Path) -> Result<DocumentText> {
        let doc = lopdf::Document::load(path)
            .map_err(|e| OrderScanError::pdf(format!("failed to load PDF: {}", e)))?;

        let mut pages = Vec::new();
        // get_pages is keyed by 1-based page number, already in order
        for page_number in doc.get_pages().keys() {
            let text = doc.extract_text(&[*page_number]).map_err(|e| {
                OrderScanError::pdf(format!("failed to read page {}: {}", page_number, e))
            })?;
            pages.push(text);
        }

        if pages.is_empty() {
            return Err(OrderScanError::pdf("document has no pages"));
        }
        Ok(DocumentText::from_pages(pages))
    }

    fn extract_whole(path: &Path) -> Result<DocumentText> {
        // pdf-extract panics on some malformed inputs
        let result = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text(path)));
        match result {
            Ok(Ok(text)) => Ok(DocumentText::from_pages(vec![text])),
            Ok(Err(e)) => Err(OrderScanError::pdf(format!(
                "failed to extract PDF text: {}",
                e
            ))),
            Err(_) => Err(OrderScanError::pdf("failed to extract PDF text: parser panicked")),
        }
    }
}
