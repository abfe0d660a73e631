use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use super::{sweep_expired, SweepReport};
use crate::session::ResultStore;
use crate::state::AppState;
use crate::uploads::UploadStore;

/// How long generated content stays readable by the result page and exports.
pub const RESULT_TTL_HOURS: i64 = 24;

/// One sweep of the upload root plus result-store eviction. Returns `None`
/// when another sweep of the same store is still running.
pub async fn run_sweep(
    uploads: &UploadStore,
    retention: chrono::Duration,
    results: &ResultStore,
) -> Option<SweepReport> {
    let Some(_guard) = uploads.try_begin_sweep() else {
        tracing::debug!("Sweep already in progress, skipping");
        return None;
    };

    let upload_root = uploads.root().to_path_buf();
    let cutoff = SystemTime::now() - retention.to_std().unwrap_or_default();
    let swept = tokio::task::spawn_blocking(move || sweep_expired(&upload_root, cutoff)).await;

    let mut report = match swept {
        Ok(Ok(report)) => report,
        Ok(Err(e)) => {
            tracing::error!("Upload sweep failed: {e}");
            SweepReport::default()
        }
        Err(e) => {
            tracing::error!("Upload sweep task failed: {e}");
            SweepReport::default()
        }
    };
    let result_cutoff = Utc::now() - chrono::Duration::hours(RESULT_TTL_HOURS);
    report.sessions_evicted = results.evict_older_than(result_cutoff);
    Some(report)
}

/// Fire-and-forget sweep, triggered when the index page is served.
pub fn spawn_background_sweep(state: &AppState) {
    let uploads = state.uploads.clone();
    let retention = state.config.retention();
    let results = state.results.clone();
    tokio::spawn(async move {
        run_sweep(&uploads, retention, &results).await;
    });
}

pub struct RetentionWorker {
    uploads: Arc<UploadStore>,
    retention: chrono::Duration,
    every: Duration,
    results: ResultStore,
    shutdown: watch::Receiver<bool>,
}

impl RetentionWorker {
    pub fn new(state: &AppState, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            uploads: state.uploads.clone(),
            retention: state.config.retention(),
            every: Duration::from_secs(state.config.sweep_interval_secs.max(1)),
            results: state.results.clone(),
            shutdown,
        }
    }

    /// Sweeps once at startup and then on every interval tick until shutdown.
    pub async fn run(mut self) {
        tracing::info!(
            "Retention worker started (every {:?}, retention {} days)",
            self.every,
            self.retention.num_days()
        );

        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("Retention worker shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Some(report) = run_sweep(&self.uploads, self.retention, &self.results).await {
                        tracing::info!(
                            "Sweep removed {} files, {} directories, evicted {} results ({} held)",
                            report.files_removed,
                            report.dirs_removed,
                            report.sessions_evicted,
                            self.results.len()
                        );
                    }
                }
            }
        }
    }
}
