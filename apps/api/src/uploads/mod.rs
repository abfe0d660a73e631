//! Upload Store: session-scoped reference documents on the local filesystem.
//!
//! Layout: `<root>/<session_id>/<category>/<uuid>__<sanitized name>`.
//! Every stored file is test-extracted before the upload is accepted, so anything
//! that reaches the generation pipeline is known to be readable at upload time.

pub mod handlers;
pub mod stats;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::{extract_upload, ALLOWED_EXTENSIONS};
use crate::models::upload::extension_of;
use crate::models::{Category, UploadedFile};

pub struct UploadStore {
    root: PathBuf,
    max_files_per_category: usize,
    max_file_bytes: usize,
    /// Serializes the count check and the write so the per-category cap holds.
    write_lock: Mutex<()>,
    /// Held for the duration of a retention sweep.
    sweep_lock: Mutex<()>,
}

impl UploadStore {
    pub fn new(root: PathBuf, max_files_per_category: usize, max_file_bytes: usize) -> Self {
        Self {
            root,
            max_files_per_category,
            max_file_bytes,
            write_lock: Mutex::new(()),
            sweep_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_files_per_category(&self) -> usize {
        self.max_files_per_category
    }

    /// Claims the sweep slot; `None` while another sweep runs.
    pub fn try_begin_sweep(&self) -> Option<tokio::sync::MutexGuard<'_, ()>> {
        self.sweep_lock.try_lock().ok()
    }

    pub fn session_dir(&self, session: Uuid) -> PathBuf {
        self.root.join(session.to_string())
    }

    pub fn category_dir(&self, session: Uuid, category: Category) -> PathBuf {
        self.session_dir(session).join(category.as_str())
    }

    /// Creates the session directory with one subdirectory per category.
    pub async fn ensure_session(&self, session: Uuid) -> Result<PathBuf, AppError> {
        let dir = self.session_dir(session);
        for category in Category::ALL {
            let path = dir.join(category.as_str());
            tokio::fs::create_dir_all(&path)
                .await
                .with_context(|| format!("creating upload directory {}", path.display()))?;
        }
        Ok(dir)
    }

    /// Files of one category, oldest first. A missing directory is an empty list.
    pub async fn list(&self, session: Uuid, category: Category) -> Result<Vec<UploadedFile>, AppError> {
        let dir = self.category_dir(session, category);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(anyhow::Error::from(e).context("listing uploads").into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.context("listing uploads")? {
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            if let Some(file) = UploadedFile::from_stored(category, &entry.path(), &metadata) {
                files.push(file);
            }
        }

        files.sort_by(|a, b| {
            a.uploaded_at
                .cmp(&b.uploaded_at)
                .then_with(|| a.filename.cmp(&b.filename))
        });
        Ok(files)
    }

    /// All files of a session across categories.
    pub async fn list_all(&self, session: Uuid) -> Result<Vec<UploadedFile>, AppError> {
        let mut all = Vec::new();
        for category in Category::ALL {
            all.extend(self.list(session, category).await?);
        }
        Ok(all)
    }

    /// Validates and stores one uploaded file.
    ///
    /// Rejections: empty or disallowed name, size over the limit, category full,
    /// or content the extractor cannot read (the stored copy is removed again).
    pub async fn save(
        &self,
        session: Uuid,
        category: Category,
        original_name: &str,
        bytes: Bytes,
    ) -> Result<UploadedFile, AppError> {
        let filename = sanitize_filename(original_name)
            .ok_or_else(|| AppError::Upload("No selected file".to_string()))?;

        match extension_of(&filename) {
            Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
            _ => return Err(AppError::Upload("File type not allowed".to_string())),
        }

        if bytes.len() > self.max_file_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds the maximum size of {}",
                stats::format_size(self.max_file_bytes as u64)
            )));
        }

        let file = {
            let _guard = self.write_lock.lock().await;

            if self.list(session, category).await?.len() >= self.max_files_per_category {
                return Err(AppError::Upload(format!(
                    "Maximum {} files allowed per category",
                    self.max_files_per_category
                )));
            }

            self.ensure_session(session).await?;
            let dir = self.category_dir(session, category);
            let id = Uuid::new_v4();
            let path = dir.join(UploadedFile::stored_name(id, &filename));
            write_atomically(dir, path.clone(), bytes).await?;

            let metadata = tokio::fs::metadata(&path).await.context("reading upload metadata")?;
            UploadedFile::from_stored(category, &path, &metadata)
                .context("stored upload has an unexpected name")?
        };

        if let Err(e) = extract_upload(&file).await {
            warn!("Rejecting unreadable upload {}: {e}", file.filename);
            if let Err(rm) = tokio::fs::remove_file(&file.path).await {
                warn!("Failed to remove rejected upload {}: {rm}", file.path.display());
            }
            return Err(AppError::Extraction(e));
        }

        info!(
            "Stored {} ({} bytes) in {}/{}",
            file.filename, file.size_bytes, session, category
        );
        Ok(file)
    }

    /// Deletes one file by id.
    pub async fn delete(&self, session: Uuid, category: Category, id: Uuid) -> Result<(), AppError> {
        let file = self
            .list(session, category)
            .await?
            .into_iter()
            .find(|f| f.id == id)
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        tokio::fs::remove_file(&file.path)
            .await
            .context("deleting upload")?;
        info!("Deleted {} from {}/{}", file.filename, session, category);
        Ok(())
    }
}

/// Writes to a temp file beside the target, then renames it into place.
async fn write_atomically(dir: PathBuf, path: PathBuf, bytes: Bytes) -> Result<(), AppError> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .context("upload writer task failed")??;
    Ok(())
}

/// Reduces a browser-supplied name to a safe single path component.
/// Returns `None` when nothing usable remains.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    // Browsers on Windows may send full paths.
    let name = filename.rsplit(['/', '\\']).next().unwrap_or_default();

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = sanitized.trim_matches(|c| c == '.' || c == '_');

    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path, max_files: usize, max_bytes: usize) -> UploadStore {
        UploadStore::new(dir.to_path_buf(), max_files, max_bytes)
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.txt").as_deref(), Some("report.txt"));
        assert_eq!(
            sanitize_filename("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            sanitize_filename(r"C:\Users\me\My Notes.docx").as_deref(),
            Some("My_Notes.docx")
        );
        assert_eq!(sanitize_filename("..").as_deref(), None);
        assert_eq!(sanitize_filename("").as_deref(), None);
    }

    #[tokio::test]
    async fn test_save_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 3, 1024);
        let session = Uuid::new_v4();

        let saved = store
            .save(session, Category::Style, "voice.txt", Bytes::from_static(b"Warm and direct."))
            .await
            .unwrap();
        assert_eq!(saved.filename, "voice.txt");

        let listed = store.list(session, Category::Style).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, saved.id);
        assert!(store.list(session, Category::Past).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_name_twice_gets_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 3, 1024);
        let session = Uuid::new_v4();

        let a = store
            .save(session, Category::Past, "a.txt", Bytes::from_static(b"one"))
            .await
            .unwrap();
        let b = store
            .save(session, Category::Past, "a.txt", Bytes::from_static(b"two"))
            .await
            .unwrap();
        assert_ne!(a.path, b.path);
        assert_eq!(store.list(session, Category::Past).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_category_cap_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 2, 1024);
        let session = Uuid::new_v4();

        for i in 0..2 {
            store
                .save(session, Category::Competitive, &format!("{i}.txt"), Bytes::from_static(b"x"))
                .await
                .unwrap();
        }
        let err = store
            .save(session, Category::Competitive, "3.txt", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upload(ref m) if m == "Maximum 2 files allowed per category"));
        // other categories are unaffected
        store
            .save(session, Category::Style, "s.txt", Bytes::from_static(b"x"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_oversized_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 3, 10);
        let err = store
            .save(Uuid::new_v4(), Category::Style, "big.txt", Bytes::from(vec![b'a'; 11]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
    }

    #[tokio::test]
    async fn test_disallowed_and_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 3, 1024);
        let session = Uuid::new_v4();

        let err = store
            .save(session, Category::Style, "old.doc", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upload(_)));

        let err = store
            .save(session, Category::Style, "fake.docx", Bytes::from_static(b"not a zip"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
        assert!(store.list(session, Category::Style).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 3, 1024);
        let session = Uuid::new_v4();
        let saved = store
            .save(session, Category::Style, "gone.txt", Bytes::from_static(b"bye"))
            .await
            .unwrap();

        store.delete(session, Category::Style, saved.id).await.unwrap();
        assert!(!saved.path.exists());
        assert!(matches!(
            store.delete(session, Category::Style, saved.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
