use std::sync::Arc;

use anyhow::Result;
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::Value;

mod support;
use support::{StalledScanner, StaticScanner, build_test_app, zip_bytes};

const REPORT: &str = r#"{"findings":[{"module":"mod","issue":"unchecked_return"}]}"#;

fn archive_form(file_name: &str, bytes: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(bytes)
            .file_name(file_name)
            .mime_type("application/zip"),
    )
}

fn project_zip() -> Vec<u8> {
    zip_bytes(&[
        ("project/", ""),
        ("project/bytecode_modules/mod.mv", "mv"),
    ])
}

#[tokio::test]
async fn api_scan_returns_artifact_and_identifier() -> Result<()> {
    let app = build_test_app(Arc::new(StaticScanner(REPORT)), &[])?;

    let response = app
        .server
        .post("/api/v1/scans")
        .multipart(archive_form("project.zip", project_zip()))
        .await;

    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), REPORT.as_bytes());

    let id = response.header("x-result-id");
    let id = id.to_str()?;
    assert_eq!(id.len(), 10);
    let stored = app.root.path().join("results").join(format!("{id}.json"));
    assert_eq!(std::fs::read_to_string(stored)?, REPORT);
    Ok(())
}

#[tokio::test]
async fn browser_upload_renders_report_page() -> Result<()> {
    let app = build_test_app(Arc::new(StaticScanner(REPORT)), &[])?;

    let response = app
        .server
        .post("/upload")
        .multipart(archive_form("project.zip", project_zip()))
        .await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("<pre>"));
    assert!(html.contains("unchecked_return"));
    assert!(html.contains("/download\">Download JSON"));
    Ok(())
}

#[tokio::test]
async fn stored_result_can_be_viewed_and_downloaded() -> Result<()> {
    let app = build_test_app(Arc::new(StaticScanner(REPORT)), &[])?;
    let created = app
        .server
        .post("/api/v1/scans")
        .multipart(archive_form("project.zip", project_zip()))
        .await;
    let id = created.header("x-result-id").to_str()?.to_string();

    let view = app.server.get(&format!("/results/{id}")).await;
    view.assert_status_ok();
    assert!(view.text().contains("unchecked_return"));

    let download = app.server.get(&format!("/results/{id}/download")).await;
    download.assert_status_ok();
    assert_eq!(download.header("content-type"), "application/octet-stream");
    assert_eq!(
        download.header("content-disposition").to_str()?,
        format!("attachment; filename=\"{id}.json\"")
    );
    assert_eq!(download.as_bytes().as_ref(), REPORT.as_bytes());
    Ok(())
}

#[tokio::test]
async fn archive_without_modules_is_unprocessable() -> Result<()> {
    let app = build_test_app(Arc::new(StaticScanner(REPORT)), &[])?;
    let empty = zip_bytes(&[("empty/README.md", "nothing")]);

    let response = app
        .server
        .post("/api/v1/scans")
        .multipart(archive_form("empty.zip", empty))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["kind"], "locator_not_found");
    assert_eq!(body["error"]["status"], 422);
    Ok(())
}

#[tokio::test]
async fn scanner_timeout_maps_to_gateway_timeout() -> Result<()> {
    let app = build_test_app(Arc::new(StalledScanner), &[])?;

    let response = app
        .server
        .post("/api/v1/scans")
        .multipart(archive_form("project.zip", project_zip()))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::GATEWAY_TIMEOUT);
    let body: Value = response.json();
    assert_eq!(body["error"]["kind"], "scan_timeout");
    Ok(())
}

#[tokio::test]
async fn missing_file_field_is_bad_request() -> Result<()> {
    let app = build_test_app(Arc::new(StaticScanner(REPORT)), &[])?;
    let form = MultipartForm::new().add_text("comment", "no archive attached");

    let response = app
        .server
        .post("/api/v1/scans")
        .multipart(form)
        .expect_failure()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn unknown_and_malformed_identifiers() -> Result<()> {
    let app = build_test_app(Arc::new(StaticScanner(REPORT)), &[])?;

    let unknown = app.server.get("/results/aB3dE5gH9k").expect_failure().await;
    unknown.assert_status(StatusCode::NOT_FOUND);
    let body: Value = unknown.json();
    assert_eq!(body["error"]["kind"], "result_not_found");

    let malformed = app
        .server
        .get("/results/not-an-id/download")
        .expect_failure()
        .await;
    malformed.assert_status(StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn oversized_upload_is_rejected() -> Result<()> {
    let app = build_test_app(
        Arc::new(StaticScanner(REPORT)),
        &[("MAX_UPLOAD_BYTES", "256")],
    )?;
    let big = vec![0u8; 4096];

    let response = app
        .server
        .post("/api/v1/scans")
        .multipart(archive_form("big.zip", big))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    Ok(())
}

#[tokio::test]
async fn index_lists_templates_and_serves_them() -> Result<()> {
    let app = build_test_app(Arc::new(StaticScanner(REPORT)), &[])?;
    let templates = app.root.path().join("templates");
    std::fs::create_dir_all(templates.join("nested"))?;
    std::fs::write(templates.join("starter.zip"), b"PK-template")?;

    let index = app.server.get("/").await;
    index.assert_status_ok();
    let html = index.text();
    assert!(html.contains("starter.zip"));
    assert!(!html.contains("nested"));
    assert!(html.contains("enctype=\"multipart/form-data\""));

    let download = app.server.get("/download/starter.zip").await;
    download.assert_status_ok();
    assert_eq!(download.as_bytes().as_ref(), b"PK-template");

    let missing = app.server.get("/download/absent.zip").expect_failure().await;
    missing.assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn template_download_streams_file_behind_encoded_link() -> Result<()> {
    let app = build_test_app(Arc::new(StaticScanner(REPORT)), &[])?;
    let templates = app.root.path().join("templates");
    std::fs::create_dir_all(&templates)?;
    let contents = vec![b'x'; 200_000];
    std::fs::write(templates.join("my template.zip"), &contents)?;

    let html = app.server.get("/").await.text();
    assert!(html.contains("href=\"/download/my%20template.zip\""));

    let download = app.server.get("/download/my%20template.zip").await;
    download.assert_status_ok();
    assert_eq!(download.header("content-length"), "200000");
    assert!(
        download
            .header("content-disposition")
            .to_str()?
            .contains("my template.zip")
    );
    assert_eq!(download.as_bytes().len(), contents.len());
    Ok(())
}

#[tokio::test]
async fn index_without_templates_directory_is_empty() -> Result<()> {
    let app = build_test_app(Arc::new(StaticScanner(REPORT)), &[])?;

    let index = app.server.get("/").await;

    index.assert_status_ok();
    assert!(index.text().contains("No templates available."));
    Ok(())
}

#[tokio::test]
async fn health_reports_ok() -> Result<()> {
    let app = build_test_app(Arc::new(StaticScanner(REPORT)), &[])?;

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, serde_json::json!({ "status": "ok" }));
    Ok(())
}
