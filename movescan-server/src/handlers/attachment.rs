use axum::http::{HeaderMap, HeaderName, HeaderValue, header};

use crate::infra::errors::{AppError, AppResult};

/// Headers for a binary file download named `file_name`.
pub fn headers(file_name: &str) -> AppResult<HeaderMap> {
    let disposition = format!("attachment; filename=\"{}\"", file_name.replace('"', ""));
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|_| AppError::bad_request("file name is not a valid header value"))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    headers.insert(
        HeaderName::from_static("content-description"),
        HeaderValue::from_static("File Transfer"),
    );
    headers.insert(
        HeaderName::from_static("content-transfer-encoding"),
        HeaderValue::from_static("binary"),
    );
    Ok(headers)
}
