/*!
# Batch Runner

Processes every `*.pdf` in an input directory, one file after another, and
writes `<stem>.txt` (and optionally `<stem>.csv`) into an output directory.

Per file: `Discovered → Extracting → Summarizing → Saving → Done`. Failed
stages are handled by the [`FailurePolicy`]; a failed write ends the file in
`Saving` and the runner moves on.
*/

use crate::artifacts::{ArtifactWriter, SaveResult};
use crate::fields::StructuredFields;
use crate::ingestion::PdfExtractor;
use crate::outcome::{StageFailure, StageOutcome};
use crate::pipeline::{AnalysisReport, DocumentPipeline};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};
use uuid::Uuid;

/// What to write when a stage failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Write the failure text where the artifact would have gone
    Embed,
    /// Write the failure text to a `.failed.txt` sidecar instead
    #[default]
    Mark,
    /// Write nothing
    Skip,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailurePolicy::Embed => "embed",
            FailurePolicy::Mark => "mark",
            FailurePolicy::Skip => "skip",
        };
        f.write_str(name)
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "embed" => Ok(FailurePolicy::Embed),
            "mark" => Ok(FailurePolicy::Mark),
            "skip" => Ok(FailurePolicy::Skip),
            other => Err(format!(
                "unknown failure policy '{}' (expected embed, mark or skip)",
                other
            )),
        }
    }
}

/// Batch run settings
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory scanned for PDFs
    pub input_dir: PathBuf,
    /// Directory receiving the artifacts
    pub output_dir: PathBuf,
    /// Also extract fields and write `<stem>.csv`
    pub write_fields_csv: bool,
    /// Handling of failed stages
    pub failure_policy: FailurePolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            write_fields_csv: true,
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Per-file processing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    /// Found in the input directory
    Discovered,
    /// Reading the PDF
    Extracting,
    /// Model requests in flight
    Summarizing,
    /// Writing artifacts
    Saving,
    /// All artifacts written
    Done,
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileState::Discovered => "discovered",
            FileState::Extracting => "extracting",
            FileState::Summarizing => "summarizing",
            FileState::Saving => "saving",
            FileState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result for one input file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// Input PDF
    pub input: PathBuf,

    /// Last state reached
    pub state: FileState,

    /// Stage failures, including write failures
    pub failures: Vec<StageFailure>,

    /// Files written for this input
    pub written: Vec<PathBuf>,

    /// One status line per attempted write
    pub save_status: Vec<String>,
}

impl FileReport {
    fn new(input: PathBuf) -> Self {
        Self {
            input,
            state: FileState::Discovered,
            failures: Vec::new(),
            written: Vec::new(),
            save_status: Vec::new(),
        }
    }

    /// True when every stage and write succeeded
    pub fn is_success(&self) -> bool {
        self.state == FileState::Done && self.failures.is_empty()
    }

    fn enter(&mut self, state: FileState) {
        self.state = state;
        info!("BATCH_FILE_STATE file={} state={}", self.input.display(), state);
    }
}

/// Result of a whole batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// The input directory did not exist and was created
    pub input_created: bool,

    /// Per-file results in processing order
    pub files: Vec<FileReport>,
}

impl BatchReport {
    /// Files without any failure
    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.is_success()).count()
    }

    /// Files with at least one failure
    pub fn failed(&self) -> usize {
        self.files.len() - self.succeeded()
    }

    /// Every file written, in processing order
    pub fn written_files(&self) -> Vec<&Path> {
        self.files
            .iter()
            .flat_map(|f| f.written.iter().map(PathBuf::as_path))
            .collect()
    }
}

/// `*.pdf` regular files directly inside `dir`, sorted by name
pub fn discover_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "pdf") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Sequential batch processor
pub struct BatchRunner {
    pipeline: DocumentPipeline,
    options: BatchOptions,
}

impl BatchRunner {
    /// Create a runner; field extraction follows `options.write_fields_csv`
    pub fn new(pipeline: DocumentPipeline, options: BatchOptions) -> Self {
        let pipeline = pipeline.with_fields(options.write_fields_csv);
        Self { pipeline, options }
    }

    /// Process every PDF in the input directory
    pub async fn run(&self) -> Result<BatchReport> {
        let input = &self.options.input_dir;
        let mut report = BatchReport::default();

        if !input.exists() {
            fs::create_dir_all(input)?;
            report.input_created = true;
            info!(
                "BATCH_INPUT_CREATED dir={} hint=\"place PDF files here and run again\"",
                input.display()
            );
            return Ok(report);
        }

        let files = discover_pdfs(input)?;
        if files.is_empty() {
            info!("BATCH_EMPTY dir={}", input.display());
            return Ok(report);
        }

        fs::create_dir_all(&self.options.output_dir)?;
        info!(
            "BATCH_START files={} output={} policy={}",
            files.len(),
            self.options.output_dir.display(),
            self.options.failure_policy
        );

        for path in files {
            let file_report = self.process_file(path).await;
            report.files.push(file_report);
        }

        info!(
            "BATCH_DONE succeeded={} failed={} written={}",
            report.succeeded(),
            report.failed(),
            report.written_files().len()
        );
        Ok(report)
    }

    async fn process_file(&self, path: PathBuf) -> FileReport {
        let mut file = FileReport::new(path.clone());
        info!("BATCH_FILE_STATE file={} state={}", path.display(), file.state);

        let id = Uuid::new_v4();
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        file.enter(FileState::Extracting);
        let analysis = match PdfExtractor::extract_async(path.clone()).await {
            Ok(document) => {
                file.enter(FileState::Summarizing);
                self.pipeline.analyze_document(id, source, &document).await
            }
            Err(e) => {
                let report = self.pipeline.extraction_failed(id, source, &e);
                file.enter(FileState::Summarizing);
                report
            }
        };

        file.failures.extend(analysis_failures(&analysis));

        file.enter(FileState::Saving);
        if self.save(&mut file, &analysis) {
            file.enter(FileState::Done);
        }
        file
    }

    /// Write the artifacts of one analysis; false when a write failed
    fn save(&self, file: &mut FileReport, analysis: &AnalysisReport) -> bool {
        let stem = file
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let out = &self.options.output_dir;
        let policy = self.options.failure_policy;

        let summary_target = match &analysis.summary {
            StageOutcome::Ready(summary) => {
                Some((out.join(format!("{}.txt", stem)), summary.text.clone()))
            }
            StageOutcome::Failed(failure) => match policy {
                FailurePolicy::Embed => Some((out.join(format!("{}.txt", stem)), failure.to_string())),
                FailurePolicy::Mark => {
                    Some((out.join(format!("{}.failed.txt", stem)), failure.to_string()))
                }
                FailurePolicy::Skip => None,
            },
        };
        // The two writes are independent; a failed summary write does not skip the CSV
        let summary_saved = match summary_target {
            Some((target, text)) => {
                record_write(file, ArtifactWriter::save_text(&target, &text))
            }
            None => true,
        };

        let Some(fields) = &analysis.fields else {
            return summary_saved;
        };
        let fields_saved = match fields {
            StageOutcome::Ready(fields) => {
                let target = out.join(format!("{}.csv", stem));
                record_write(file, ArtifactWriter::save_fields_csv(&target, fields))
            }
            StageOutcome::Failed(failure) => match policy {
                FailurePolicy::Embed => {
                    let target = out.join(format!("{}.csv", stem));
                    let empty = StructuredFields::new();
                    record_write(file, ArtifactWriter::save_fields_csv(&target, &empty))
                }
                FailurePolicy::Mark => {
                    let target = out.join(format!("{}.fields.failed.txt", stem));
                    record_write(file, ArtifactWriter::save_text(&target, &failure.to_string()))
                }
                FailurePolicy::Skip => true,
            },
        };
        summary_saved && fields_saved
    }
}

fn analysis_failures(analysis: &AnalysisReport) -> Vec<StageFailure> {
    let mut failures: Vec<StageFailure> = Vec::new();
    let candidates = [
        analysis.summary.failure(),
        analysis.fields.as_ref().and_then(|f| f.failure()),
    ];
    for failure in candidates.into_iter().flatten() {
        if !failures.contains(failure) {
            failures.push(failure.clone());
        }
    }
    failures
}

fn record_write(file: &mut FileReport, result: SaveResult) -> bool {
    file.save_status.push(ArtifactWriter::save_status(&result));
    match result {
        Ok(written) => {
            file.written.push(written);
            true
        }
        Err(failure) => {
            warn!("BATCH_SAVE_FAILED file={} reason={}", file.input.display(), failure.reason);
            file.failures.push(failure);
            false
        }
    }
}
