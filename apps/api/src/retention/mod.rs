//! Retention Sweeper: deletes uploads older than the retention window.
//!
//! Age is the file's modification time. A session directory goes once it holds
//! no files and its own modification time is past the window as well.

pub mod worker;

use std::io;
use std::path::Path;
use std::time::SystemTime;

use serde::Serialize;
use tracing::{error, info, warn};
use walkdir::WalkDir;

pub use worker::{spawn_background_sweep, RetentionWorker};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub files_removed: u64,
    pub dirs_removed: u64,
    pub sessions_evicted: usize,
}

fn modified(path: &Path) -> io::Result<SystemTime> {
    path.symlink_metadata()?.modified()
}

/// Removes every file under `upload_root` last modified before `cutoff`, then
/// every session directory left without files that is itself older than `cutoff`.
///
/// Per-entry failures are logged and skipped. A missing root is an empty sweep.
pub fn sweep_expired(upload_root: &Path, cutoff: SystemTime) -> io::Result<SweepReport> {
    let mut report = SweepReport::default();

    if !upload_root.exists() {
        warn!("Upload folder does not exist: {}", upload_root.display());
        return Ok(report);
    }

    for entry in std::fs::read_dir(upload_root)? {
        let entry = entry?;
        let session_path = entry.path();
        if !entry.file_type()?.is_dir() {
            continue;
        }

        // Captured before any deletion inside touches it.
        let session_modified = match modified(&session_path) {
            Ok(t) => t,
            Err(e) => {
                error!("Error reading session directory {}: {e}", session_path.display());
                continue;
            }
        };

        let mut remaining = 0u64;
        for file in WalkDir::new(&session_path)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            let expired = file
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .is_some_and(|t| t < cutoff);
            if !expired {
                remaining += 1;
                continue;
            }
            match std::fs::remove_file(file.path()) {
                Ok(()) => report.files_removed += 1,
                Err(e) => {
                    error!("Failed to remove {}: {e}", file.path().display());
                    remaining += 1;
                }
            }
        }

        if remaining == 0 && session_modified < cutoff {
            match std::fs::remove_dir_all(&session_path) {
                Ok(()) => {
                    info!("Removed expired session directory {}", session_path.display());
                    report.dirs_removed += 1;
                }
                Err(e) => error!(
                    "Failed to remove session directory {}: {e}",
                    session_path.display()
                ),
            }
        }
    }

    info!(
        "Cleanup complete. Removed {} files and {} directories.",
        report.files_removed, report.dirs_removed
    );
    Ok(report)
}
