/*!
# Document Pipeline

Runs one PDF through every analysis stage:

```text
extract ──┬── fields (one request) ──> StageOutcome<StructuredFields>
          └── chunk → map → reduce  ──> StageOutcome<Summary>
```

The two branches only share the extracted text. When extraction fails, both
branches report that failure and the model is never called.
*/

use crate::chunking::TextChunker;
use crate::config::AppConfig;
use crate::fields::{FieldExtractor, StructuredFields};
use crate::ingestion::{DocumentStats, DocumentText, PdfExtractor};
use crate::outcome::{Stage, StageFailure, StageOutcome};
use crate::summarizer::{MapReduceSummarizer, Summary};
use crate::types::LanguageModel;
use crate::OrderScanError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Everything produced for one document
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Run identifier
    pub id: Uuid,

    /// File name of the analyzed document
    pub source: String,

    /// Completion time
    pub generated_at: DateTime<Utc>,

    /// Counters of the extracted text, when extraction succeeded
    pub document: Option<DocumentStats>,

    /// Map-reduce summary
    pub summary: StageOutcome<Summary>,

    /// Structured fields; `None` when field extraction was not requested
    pub fields: Option<StageOutcome<StructuredFields>>,
}

impl AnalysisReport {
    /// Summary text, or the rendered failure
    pub fn summary_display(&self) -> String {
        match &self.summary {
            StageOutcome::Ready(summary) => summary.text.clone(),
            StageOutcome::Failed(failure) => failure.to_string(),
        }
    }

    /// CSV document for the fields, when they were extracted
    pub fn csv_download(&self) -> Option<String> {
        match &self.fields {
            Some(StageOutcome::Ready(fields)) => match fields.to_csv_string() {
                Ok(csv) => Some(csv),
                Err(e) => {
                    warn!("CSV_RENDER_FAILED id={} reason={}", self.id, e);
                    None
                }
            },
            _ => None,
        }
    }

    /// True when no requested stage failed
    pub fn is_complete(&self) -> bool {
        self.summary.is_ready() && self.fields.as_ref().map_or(true, |f| f.is_ready())
    }
}

/// Runs extraction, field extraction and summarization for one document
pub struct DocumentPipeline {
    summarizer: MapReduceSummarizer,
    field_extractor: FieldExtractor,
    extract_fields: bool,
}

impl DocumentPipeline {
    /// Create a pipeline around `model`
    pub fn new(model: Arc<dyn LanguageModel>, config: &AppConfig) -> Self {
        Self {
            summarizer: MapReduceSummarizer::new(
                model.clone(),
                TextChunker::new(config.chunking),
            ),
            field_extractor: FieldExtractor::new(model),
            extract_fields: true,
        }
    }

    /// Enable or disable the field branch
    pub fn with_fields(mut self, enabled: bool) -> Self {
        self.extract_fields = enabled;
        self
    }

    /// Analyze the PDF at `path`
    pub async fn analyze(&self, path: &Path) -> AnalysisReport {
        let id = Uuid::new_v4();
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        info!("ANALYSIS_START id={} file={}", id, source);

        let report = match PdfExtractor::extract_async(path.to_path_buf()).await {
            Ok(document) => self.analyze_document(id, source, &document).await,
            Err(e) => self.extraction_failed(id, source, &e),
        };

        info!(
            "ANALYSIS_DONE id={} summary={} fields={}",
            report.id,
            status_tag(Some(&report.summary)),
            status_tag(report.fields.as_ref())
        );
        report
    }

    /// Report for a document whose text could not be extracted
    pub fn extraction_failed(&self, id: Uuid, source: String, error: &OrderScanError) -> AnalysisReport {
        let failure = StageFailure::from_error(Stage::Extraction, error);
        warn!("STAGE_FAILED id={} stage={} reason={}", id, failure.stage, failure.reason);
        AnalysisReport {
            id,
            source,
            generated_at: Utc::now(),
            document: None,
            summary: StageOutcome::Failed(failure.clone()),
            fields: self.extract_fields.then(|| StageOutcome::Failed(failure)),
        }
    }

    /// Analyze already extracted text
    pub async fn analyze_document(
        &self,
        id: Uuid,
        source: String,
        document: &DocumentText,
    ) -> AnalysisReport {
        if document.is_blank() {
            warn!("DOCUMENT_BLANK id={} file={}", id, source);
        }
        let text = document.as_str();

        let fields = if self.extract_fields {
            let outcome =
                StageOutcome::from_result(Stage::FieldExtraction, self.field_extractor.extract(text).await);
            log_failure(id, &outcome);
            Some(outcome)
        } else {
            None
        };

        let summary = StageOutcome::from_result(Stage::Summarization, self.summarizer.summarize(text).await);
        log_failure(id, &summary);

        AnalysisReport {
            id,
            source,
            generated_at: Utc::now(),
            document: Some(document.stats()),
            summary,
            fields,
        }
    }
}

fn log_failure<T>(id: Uuid, outcome: &StageOutcome<T>) {
    if let Some(failure) = outcome.failure() {
        warn!("STAGE_FAILED id={} stage={} reason={}", id, failure.stage, failure.reason);
    }
}

fn status_tag<T>(outcome: Option<&StageOutcome<T>>) -> &'static str {
    match outcome {
        None => "skipped",
        Some(StageOutcome::Ready(_)) => "ready",
        Some(StageOutcome::Failed(_)) => "failed",
    }
}
