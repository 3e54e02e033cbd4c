//! Route handlers
//!
//! Every upload gets its own temporary directory, under the configured work
//! directory when one is set, holding the uploaded PDF and the two artifacts.
//! The directory is removed when the handler returns, whatever the outcome.

use crate::error::WebError;
use crate::WebUiServer;
use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use orderscan_core::{
    csv_header, AnalysisReport, ArtifactWriter, DocumentStats, OrderScanError, SaveResult, Stage,
    StageFailure, StageOutcome,
};
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use tracing::{error, info, warn};

/// Name of the uploaded PDF inside the request directory
pub const UPLOAD_FILE_NAME: &str = "uploaded_file.pdf";
/// Name of the summary artifact
pub const ANALYSIS_FILE_NAME: &str = "detailed_analysis.txt";
/// Name of the fields artifact
pub const FIELDS_FILE_NAME: &str = "extracted_fields.csv";

const TEXT_MIME: &str = "text/plain;charset=utf-8";
const CSV_MIME: &str = "text/csv;charset=utf-8";

struct Upload {
    filename: String,
    data: Bytes,
}

/// Pipeline report plus the downloadable artifacts
struct Analysis {
    report: AnalysisReport,
    summary_download: Option<String>,
    csv_download: Option<String>,
    save_failures: Vec<StageFailure>,
}

#[derive(Serialize)]
struct StepView {
    label: &'static str,
    status: &'static str,
}

#[derive(Serialize)]
struct TableView {
    header: Vec<&'static str>,
    row: Vec<String>,
}

#[derive(Serialize)]
struct ResultsView {
    source: String,
    stats: Option<DocumentStats>,
    steps: Vec<StepView>,
    failures: Vec<String>,
    summary_text: Option<String>,
    summary_download: Option<String>,
    summary_filename: &'static str,
    csv_download: Option<String>,
    csv_filename: &'static str,
    table: Option<TableView>,
}

#[derive(Serialize)]
struct ApiResponse {
    report: AnalysisReport,
    csv: Option<String>,
    save_failures: Vec<StageFailure>,
}

/// `GET /`
pub(crate) async fn index(State(server): State<WebUiServer>) -> Response {
    let max_upload_mb = server.config.max_upload_bytes / (1024 * 1024);
    render_page(&server, "index", &json!({ "max_upload_mb": max_upload_mb }), StatusCode::OK)
}

/// `GET /health`
pub(crate) async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /analyze`: HTML results page
pub(crate) async fn analyze_page(State(server): State<WebUiServer>, multipart: Multipart) -> Response {
    match analyze_upload(&server, multipart).await {
        Ok(analysis) => {
            let view = results_view(analysis);
            render_page(&server, "results", &view, StatusCode::OK)
        }
        Err(e) => {
            warn!("WEB_REJECTED status={} reason={}", e.status(), e);
            render_page(
                &server,
                "error",
                &json!({ "message": e.to_string() }),
                e.status(),
            )
        }
    }
}

/// `POST /api/analyze`: JSON report and CSV text
pub(crate) async fn analyze_api(State(server): State<WebUiServer>, multipart: Multipart) -> Response {
    match analyze_upload(&server, multipart).await {
        Ok(analysis) => {
            let csv = analysis.report.csv_download();
            Json(ApiResponse {
                report: analysis.report,
                csv,
                save_failures: analysis.save_failures,
            })
            .into_response()
        }
        Err(e) => {
            warn!("WEB_REJECTED status={} reason={}", e.status(), e);
            (e.status(), Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

fn render_page<T: Serialize>(server: &WebUiServer, name: &str, data: &T, status: StatusCode) -> Response {
    match server.pages.render(name, data) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!("WEB_RENDER_FAILED page={} reason={}", name, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render page").into_response()
        }
    }
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, WebError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        if filename.is_empty() && data.is_empty() {
            // Browsers send an empty part when no file was chosen
            return Err(WebError::MissingFile);
        }
        if !filename.to_lowercase().ends_with(".pdf") {
            return Err(WebError::NotPdf(filename));
        }
        return Ok(Upload { filename, data });
    }
    Err(WebError::MissingFile)
}

async fn analyze_upload(server: &WebUiServer, multipart: Multipart) -> Result<Analysis, WebError> {
    let upload = read_upload(multipart).await?;
    info!("WEB_UPLOAD file={} bytes={}", upload.filename, upload.data.len());

    let workdir = request_dir(server.config.work_dir.as_deref())?;
    let pdf_path = workdir.path().join(UPLOAD_FILE_NAME);
    tokio::fs::write(&pdf_path, &upload.data).await?;

    let mut report = server.pipeline.analyze(&pdf_path).await;
    report.source = upload.filename;

    let mut save_failures = Vec::new();

    let summary_download = match report.summary.ready() {
        Some(summary) => {
            let path = workdir.path().join(ANALYSIS_FILE_NAME);
            let saved = ArtifactWriter::save_text(&path, &summary.text);
            download(saved, TEXT_MIME, &mut save_failures).await
        }
        None => None,
    };

    let csv_download = match report.fields.as_ref().and_then(|f| f.ready()) {
        Some(fields) => {
            let path = workdir.path().join(FIELDS_FILE_NAME);
            let saved = ArtifactWriter::save_fields_csv(&path, fields);
            download(saved, CSV_MIME, &mut save_failures).await
        }
        None => None,
    };

    info!(
        "WEB_ANALYSIS_DONE id={} complete={} downloads={}",
        report.id,
        report.is_complete() && save_failures.is_empty(),
        summary_download.is_some() as usize + csv_download.is_some() as usize
    );

    // workdir is dropped (and deleted) here
    Ok(Analysis {
        report,
        summary_download,
        csv_download,
        save_failures,
    })
}

/// Read a written artifact back as a base64 `data:` URI
async fn download(saved: SaveResult, mime: &str, failures: &mut Vec<StageFailure>) -> Option<String> {
    let read = match saved {
        Ok(path) => read_artifact(&path).await,
        Err(failure) => Err(failure),
    };
    match read {
        Ok(bytes) => Some(data_uri(mime, &bytes)),
        Err(failure) => {
            warn!("WEB_ARTIFACT_FAILED reason={}", failure.reason);
            failures.push(failure);
            None
        }
    }
}

async fn read_artifact(path: &Path) -> Result<Vec<u8>, StageFailure> {
    tokio::fs::read(path)
        .await
        .map_err(|e| StageFailure::from_error(Stage::Saving, &OrderScanError::from(e)))
}

/// Fresh per-request directory, removed on drop
fn request_dir(work_dir: Option<&Path>) -> std::io::Result<tempfile::TempDir> {
    match work_dir {
        Some(root) => {
            std::fs::create_dir_all(root)?;
            tempfile::TempDir::new_in(root)
        }
        None => tempfile::TempDir::new(),
    }
}

/// `data:` URI for a download link
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

fn step<T>(label: &'static str, outcome: Option<&StageOutcome<T>>, own_stage: Stage) -> StepView {
    let status = match outcome {
        None => "skipped",
        Some(StageOutcome::Ready(_)) => "done",
        Some(StageOutcome::Failed(f)) if f.stage == own_stage => "failed",
        Some(StageOutcome::Failed(_)) => "skipped",
    };
    StepView { label, status }
}

fn results_view(analysis: Analysis) -> ResultsView {
    let Analysis {
        report,
        summary_download,
        csv_download,
        save_failures,
    } = analysis;

    let steps = vec![
        StepView {
            label: "Extracting text from PDF",
            status: if report.document.is_some() { "done" } else { "failed" },
        },
        step("Extracting structured fields", report.fields.as_ref(), Stage::FieldExtraction),
        step("Generating detailed analysis", Some(&report.summary), Stage::Summarization),
        StepView {
            label: "Preparing downloads",
            status: if save_failures.is_empty() { "done" } else { "failed" },
        },
    ];

    let mut failures: Vec<String> = Vec::new();
    let stage_failures = [
        report.summary.failure(),
        report.fields.as_ref().and_then(|f| f.failure()),
    ];
    for failure in stage_failures.into_iter().flatten().chain(save_failures.iter()) {
        let text = failure.to_string();
        if !failures.contains(&text) {
            failures.push(text);
        }
    }

    let table = report
        .fields
        .as_ref()
        .and_then(|f| f.ready())
        .map(|fields| TableView {
            header: csv_header(),
            row: fields.csv_row(),
        });

    ResultsView {
        source: report.source.clone(),
        stats: report.document,
        steps,
        failures,
        summary_text: report.summary.ready().map(|s| s.text.clone()),
        summary_download,
        summary_filename: ANALYSIS_FILE_NAME,
        csv_download,
        csv_filename: FIELDS_FILE_NAME,
        table,
    }
}
