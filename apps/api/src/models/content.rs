use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text produced by one generation call, kept in the session store until
/// the result page and exports no longer need it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub text: String,
    pub format_key: String,
    pub format_description: String,
    pub created_at: DateTime<Utc>,
}

impl GeneratedContent {
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Download filename stem, e.g. `blog_500-20240102-1530`.
    pub fn file_stem(&self) -> String {
        format!("{}-{}", self.format_key, self.created_at.format("%Y%m%d-%H%M"))
    }
}
