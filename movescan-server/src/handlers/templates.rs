use std::path::Path as FsPath;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, header},
    response::{Html, IntoResponse},
};
use tokio_util::io::ReaderStream;
use tracing::warn;

use movescan_core::pipeline::sanitize_file_name;

use super::{attachment, render};
use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

/// Regular files directly inside `dir`, sorted by name. A missing directory
/// yields an empty list.
pub async fn list_templates(dir: &FsPath) -> Vec<String> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %dir.display(), error = %err, "cannot list templates");
            }
            return Vec::new();
        }
    };

    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    names
}

pub async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let templates = list_templates(state.config.templates_dir()).await;
    Html(render::index_page(&templates))
}

pub async fn download_template_handler(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let not_found = || AppError::not_found(format!("template '{file_name}' not found"));

    let name = sanitize_file_name(&file_name).ok_or_else(not_found)?;
    let path = state.config.templates_dir().join(&name);

    let metadata = match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => meta,
        _ => return Err(not_found()),
    };

    let file = tokio::fs::File::open(&path).await.map_err(|err| {
        warn!(path = %path.display(), error = %err, "failed to open template");
        not_found()
    })?;

    let mut headers = attachment::headers(&name)?;
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(metadata.len()));

    Ok((headers, Body::from_stream(ReaderStream::new(file))))
}
