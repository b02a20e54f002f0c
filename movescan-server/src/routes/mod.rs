use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::handlers::{health, results, templates, upload};
use crate::infra::app_state::AppState;

/// Route templates and link builders.
pub mod paths {
    use movescan_core::ResultId;

    pub const INDEX: &str = "/";
    pub const HEALTH: &str = "/health";
    pub const UPLOAD: &str = "/upload";
    pub const SCANS: &str = "/api/v1/scans";
    pub const RESULT_VIEW: &str = "/results/{id}";
    pub const RESULT_DOWNLOAD: &str = "/results/{id}/download";
    pub const TEMPLATE_DOWNLOAD: &str = "/download/{filename}";

    pub fn result_view(id: &ResultId) -> String {
        format!("/results/{id}")
    }

    pub fn result_download(id: &ResultId) -> String {
        format!("/results/{id}/download")
    }

    pub fn template_download(name: &str) -> String {
        format!("/download/{}", urlencoding::encode(name))
    }
}

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    let upload_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route(paths::INDEX, get(templates::index_handler))
        .route(paths::TEMPLATE_DOWNLOAD, get(templates::download_template_handler))
        .route(paths::HEALTH, get(health::health_handler))
        .route(paths::UPLOAD, post(upload::upload_form_handler))
        .route(paths::SCANS, post(upload::create_scan_handler))
        .route(paths::RESULT_VIEW, get(results::view_result_handler))
        .route(paths::RESULT_DOWNLOAD, get(results::download_result_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(upload_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
