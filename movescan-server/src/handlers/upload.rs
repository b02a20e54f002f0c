use axum::{
    extract::{Multipart, State},
    http::{HeaderName, HeaderValue, header},
    response::{Html, IntoResponse},
};
use tracing::info;

use movescan_core::{ScanReport, Upload};

use super::render;
use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};
use crate::routes::paths;

/// Multipart field carrying the archive.
pub const UPLOAD_FIELD: &str = "file";
/// Response header naming the stored artifact.
pub const RESULT_ID_HEADER: HeaderName = HeaderName::from_static("x-result-id");

async fn read_upload(mut multipart: Multipart) -> AppResult<Upload> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        return Ok(Upload::new(file_name, bytes.to_vec()));
    }

    Err(AppError::bad_request(format!(
        "multipart field '{UPLOAD_FIELD}' is missing"
    ))
    .with_kind("invalid_upload"))
}

async fn run_pipeline(state: &AppState, multipart: Multipart) -> AppResult<ScanReport> {
    let upload = read_upload(multipart).await?;
    let report = state.pipeline.submit(upload).await?;
    info!(
        result_id = %report.result_id,
        work_id = %report.work_id,
        "upload scanned"
    );
    Ok(report)
}

/// Browser flow: scan the archive and render the report.
pub async fn upload_form_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Html<String>> {
    let report = run_pipeline(&state, multipart).await?;
    Ok(Html(render::result_page(&report.result_id, &report.bytes)))
}

/// API flow: scan the archive and return the raw artifact.
pub async fn create_scan_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let report = run_pipeline(&state, multipart).await?;

    let id_header = HeaderValue::from_str(report.result_id.as_str())
        .map_err(|err| AppError::internal(err.to_string()))?;
    let location = HeaderValue::from_str(&paths::result_view(&report.result_id))
        .map_err(|err| AppError::internal(err.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (RESULT_ID_HEADER, id_header),
            (header::LOCATION, location),
        ],
        report.bytes,
    ))
}
