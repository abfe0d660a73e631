use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub modified: DateTime<Utc>,
    pub size: u64,
    pub files: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StorageStats {
    pub total_size: u64,
    pub total_size_human: String,
    pub total_files: u64,
    pub total_sessions: usize,
    pub oldest_session: Option<SessionSummary>,
    pub newest_session: Option<SessionSummary>,
}

/// Walks the upload root and summarizes usage per session directory.
/// Blocking; call from `spawn_blocking` on the request path.
pub fn get_storage_stats(upload_root: &Path) -> StorageStats {
    let Ok(entries) = std::fs::read_dir(upload_root) else {
        warn!("Upload folder does not exist: {}", upload_root.display());
        return StorageStats {
            total_size_human: format_size(0),
            ..Default::default()
        };
    };

    let mut sessions = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let id = entry.file_name().to_string_lossy().to_string();

        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(t) => DateTime::<Utc>::from(t),
            Err(e) => {
                error!("Error processing session directory {id}: {e}");
                continue;
            }
        };

        let (size, files) = WalkDir::new(&path)
            .min_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.metadata().ok())
            .fold((0u64, 0u64), |(size, files), m| (size + m.len(), files + 1));

        sessions.push(SessionSummary {
            id,
            modified,
            size,
            files,
        });
    }

    sessions.sort_by_key(|s| s.modified);

    let total_size = sessions.iter().map(|s| s.size).sum();
    StorageStats {
        total_size,
        total_size_human: format_size(total_size),
        total_files: sessions.iter().map(|s| s.files).sum(),
        total_sessions: sessions.len(),
        oldest_session: sessions.first().cloned(),
        newest_session: sessions.last().cloned(),
    }
}

/// Human-readable byte size: `0 B`, `512 B`, `1.50 KB`, `10.00 MB`.
pub fn format_size(size_bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if size_bytes < 1024 {
        return format!("{size_bytes} B");
    }

    let mut size = size_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.2} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(10 * 1024 * 1024), "10.00 MB");
    }

    #[test]
    fn test_stats_for_missing_root() {
        let stats = get_storage_stats(Path::new("/definitely/not/here"));
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.total_size_human, "0 B");
    }

    #[test]
    fn test_stats_counts_sessions_and_files() {
        let dir = tempfile::tempdir().unwrap();
        for (session, files) in [("s1", 2), ("s2", 1)] {
            let category = dir.path().join(session).join("style");
            std::fs::create_dir_all(&category).unwrap();
            for i in 0..files {
                std::fs::write(category.join(format!("{i}.txt")), "abcd").unwrap();
            }
        }
        std::fs::write(dir.path().join("stray.txt"), "ignored").unwrap();

        let stats = get_storage_stats(dir.path());
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.total_size, 12);
        assert!(stats.oldest_session.is_some());
    }
}
