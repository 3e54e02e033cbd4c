//! Router tests driven through `tower::ServiceExt::oneshot`

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use orderscan_adaptor_web::{WebUiConfig, WebUiServer};
use orderscan_core::testing::{write_text_pdf, ScriptedModel};
use orderscan_core::{AppConfig, DocumentPipeline, LanguageModel};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const BOUNDARY: &str = "orderscan-test-boundary";

fn app(model: Arc<dyn LanguageModel>, max_upload_bytes: usize) -> Router {
    app_with(
        model,
        WebUiConfig {
            max_upload_bytes,
            ..Default::default()
        },
    )
}

fn app_with(model: Arc<dyn LanguageModel>, config: WebUiConfig) -> Router {
    let pipeline = DocumentPipeline::new(model, &AppConfig::with_api_key("sk-test"));
    WebUiServer::new(config, Arc::new(pipeline)).unwrap().router()
}

fn entries(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap()
}

fn sample_pdf() -> Vec<u8> {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("po.pdf");
    write_text_pdf(&path, &["Purchase order 4711", "Delivery in week 32"]).unwrap();
    std::fs::read(path).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_index_and_health() {
    let app = app(Arc::new(ScriptedModel::new()), 1024 * 1024);

    let response = app
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("enctype=\"multipart/form-data\""));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn test_results_page_offers_both_downloads() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply("ORDER_NUMBER: 4711\nCURRENCY: EUR")
            .reply("Order 4711 <delivery week 32>"),
    );
    let app = app(model.clone(), 1024 * 1024);

    let response = app
        .oneshot(upload_request(
            "/analyze",
            multipart_body("file", "po.pdf", &sample_pdf()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Analysis completed"));
    assert!(html.contains("download=\"detailed_analysis.txt\""));
    assert!(html.contains("download=\"extracted_fields.csv\""));
    assert!(html.contains("data:text/plain;charset=utf-8;base64,"));
    assert!(html.contains("data:text/csv;charset=utf-8;base64,"));
    assert!(html.contains("<th>Order number</th>"));
    assert!(html.contains("<td>4711</td>"));
    // Summary is escaped inside the textarea
    assert!(html.contains("Order 4711 &lt;delivery week 32&gt;"));
    assert!(!html.contains("class=\"failure\""));
    assert_eq!(model.call_count(), 2);
}

#[tokio::test]
async fn test_model_failure_is_rendered_as_failure_panel() {
    let app = app(Arc::new(ScriptedModel::failing("quota exceeded")), 1024 * 1024);

    let response = app
        .oneshot(upload_request(
            "/analyze",
            multipart_body("file", "po.pdf", &sample_pdf()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Analysis completed"));
    assert!(html.contains("class=\"failure\">Error processing text: Model error: quota exceeded"));
    assert!(html.contains("Error extracting fields: Model error: quota exceeded"));
    assert!(!html.contains("download=\"detailed_analysis.txt\""));
    assert!(!html.contains("<textarea"));
}

#[tokio::test]
async fn test_json_api() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply("ORDER_NUMBER: 12345")
            .reply("short summary"),
    );
    let app = app(model, 1024 * 1024);

    let response = app
        .oneshot(upload_request(
            "/api/analyze",
            multipart_body("file", "order.pdf", &sample_pdf()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["report"]["source"], "order.pdf");
    assert_eq!(json["report"]["summary"]["status"], "ready");
    assert_eq!(json["report"]["summary"]["value"]["text"], "short summary");
    assert_eq!(json["report"]["fields"]["value"]["ORDER_NUMBER"], "12345");
    assert_eq!(json["report"]["document"]["page_count"], 2);
    let csv_text = json["csv"].as_str().unwrap();
    assert!(csv_text.starts_with("Order date,Order number,"));
    assert!(csv_text.contains(",12345,"));
}

#[tokio::test]
async fn test_broken_pdf_reports_extraction_failure() {
    let app = app(Arc::new(ScriptedModel::new()), 1024 * 1024);

    let response = app
        .oneshot(upload_request(
            "/api/analyze",
            multipart_body("file", "broken.pdf", b"this is not a pdf"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["report"]["summary"]["status"], "failed");
    assert_eq!(json["report"]["summary"]["stage"], "extraction");
    assert!(json["csv"].is_null());
}

#[tokio::test]
async fn test_request_directory_is_removed_after_each_upload() {
    let work_root = tempfile::TempDir::new().unwrap();
    let root = work_root.path().to_path_buf();

    // Record what the work root holds while the model is being called
    let seen: Arc<Mutex<Vec<PathBuf>>> = Arc::new(Mutex::new(Vec::new()));
    let model = {
        let root = root.clone();
        let seen = seen.clone();
        ScriptedModel::responding(move |_prompt| {
            for dir in entries(&root) {
                if dir.join(orderscan_adaptor_web::UPLOAD_FILE_NAME).is_file() {
                    seen.lock().unwrap().push(dir);
                }
            }
            Ok("ORDER_NUMBER: 4711".to_string())
        })
    };
    let app = app_with(
        Arc::new(model),
        WebUiConfig {
            max_upload_bytes: 1024 * 1024,
            work_dir: Some(root.clone()),
            ..Default::default()
        },
    );

    let response = app
        .clone()
        .oneshot(upload_request(
            "/analyze",
            multipart_body("file", "po.pdf", &sample_pdf()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("download=\"detailed_analysis.txt\""));

    let seen = seen.lock().unwrap().clone();
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|dir| dir.starts_with(&root)));
    assert!(entries(&root).is_empty());

    let response = app
        .oneshot(upload_request(
            "/api/analyze",
            multipart_body("file", "broken.pdf", b"this is not a pdf"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["report"]["summary"]["stage"], "extraction");
    assert!(entries(&root).is_empty());
}

#[tokio::test]
async fn test_rejects_non_pdf_and_missing_file() {
    let app = app(Arc::new(ScriptedModel::new()), 1024 * 1024);

    let response = app
        .clone()
        .oneshot(upload_request(
            "/analyze",
            multipart_body("file", "notes.txt", b"hello"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("is not a PDF file"));

    let response = app
        .oneshot(upload_request(
            "/api/analyze",
            multipart_body("attachment", "po.pdf", b"%PDF-1.5"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let app = app(Arc::new(ScriptedModel::new()), 1024);

    let response = app
        .oneshot(upload_request(
            "/analyze",
            multipart_body("file", "big.pdf", &vec![b'x'; 4096]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
