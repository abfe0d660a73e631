use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::TextGenerator;
use crate::session::ResultStore;
use crate::uploads::UploadStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub uploads: Arc<UploadStore>,
    /// Pluggable completion backend. Default: `LlmClient` (Anthropic Messages API).
    pub generator: Arc<dyn TextGenerator>,
    /// Generated content per session, read by the result page and exports.
    pub results: ResultStore,
}

impl AppState {
    pub fn new(config: Config, generator: Arc<dyn TextGenerator>) -> Self {
        let uploads = UploadStore::new(
            config.upload_folder.clone(),
            config.max_files_per_category,
            config.max_content_length,
        );
        Self {
            config: Arc::new(config),
            uploads: Arc::new(uploads),
            generator,
            results: ResultStore::default(),
        }
    }
}
