use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse},
};

use movescan_core::ResultId;

use super::{attachment, render};
use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn view_result_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Html<String>> {
    let id: ResultId = raw_id.parse()?;
    let bytes = state.results().read(&id).await?;
    Ok(Html(render::result_page(&id, &bytes)))
}

pub async fn download_result_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id: ResultId = raw_id.parse()?;
    let bytes = state.results().read(&id).await?;
    let headers = attachment::headers(&id.file_name())?;
    Ok((headers, bytes))
}

