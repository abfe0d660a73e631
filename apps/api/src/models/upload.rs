use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Separator between the generated id and the sanitized original name on disk.
const STORED_NAME_SEPARATOR: &str = "__";

/// Reference-material bucket an upload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Style,
    Past,
    Competitive,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Style, Category::Past, Category::Competitive];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Style => "style",
            Category::Past => "past",
            Category::Competitive => "competitive",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "style" => Ok(Category::Style),
            "past" => Ok(Category::Past),
            "competitive" => Ok(Category::Competitive),
            _ => Err(()),
        }
    }
}

/// A reference document stored under a session's upload directory.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    pub id: Uuid,
    pub category: Category,
    /// Sanitized name as supplied by the browser.
    pub filename: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl UploadedFile {
    /// Builds the on-disk name for a fresh upload: `<uuid>__<filename>`.
    pub fn stored_name(id: Uuid, filename: &str) -> String {
        format!("{id}{STORED_NAME_SEPARATOR}{filename}")
    }

    /// Reconstructs an `UploadedFile` from a stored path and its metadata.
    /// Returns `None` for files that were not written by the upload store.
    pub fn from_stored(category: Category, path: &Path, metadata: &std::fs::Metadata) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let (id, filename) = name.split_once(STORED_NAME_SEPARATOR)?;
        let id = Uuid::parse_str(id).ok()?;
        let uploaded_at = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Some(UploadedFile {
            id,
            category,
            filename: filename.to_string(),
            path: path.to_path_buf(),
            size_bytes: metadata.len(),
            uploaded_at,
        })
    }
}

pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
