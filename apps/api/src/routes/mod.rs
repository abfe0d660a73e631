pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::export::handlers as export;
use crate::generation::handlers as generation;
use crate::pages;
use crate::state::AppState;
use crate::uploads::handlers as uploads;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_content_length;

    Router::new()
        .route("/health", get(health::health_handler))
        // Pages
        .route("/", get(pages::handle_index))
        .route("/result", get(pages::handle_result))
        // Uploads
        .route("/upload/:category", post(uploads::handle_upload))
        .route("/files/:category", get(uploads::handle_list_files))
        .route("/delete/:category/:id", delete(uploads::handle_delete_file))
        .route("/stats", get(uploads::handle_stats))
        // Generation and export
        .route("/generate", post(generation::handle_generate))
        .route("/download-docx", get(export::handle_download_docx))
        .route("/download-txt", get(export::handle_download_txt))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
