use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use relay_core::{JobId, JobRegistry, NotificationFeed, NotificationKind};
use relay_logging::{relay_info, relay_warn};

use crate::client::{UpstreamClient, UpstreamError};
use crate::persist::StreamingFileWriter;

const NOTIFY_SOURCE: &str = "downloads";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Drives a download job end to end: stream from upstream into a temp file,
/// report progress to the registry, persist atomically on success.
pub struct Downloader {
    upstream: Arc<UpstreamClient>,
    jobs: Arc<JobRegistry>,
    notifications: Arc<NotificationFeed>,
}

impl Downloader {
    pub fn new(
        upstream: Arc<UpstreamClient>,
        jobs: Arc<JobRegistry>,
        notifications: Arc<NotificationFeed>,
    ) -> Self {
        Self {
            upstream,
            jobs,
            notifications,
        }
    }

    /// Runs a job to a terminal state and records the outcome. Never
    /// returns an error; failures land on the job and the feed.
    pub async fn run(&self, job_id: JobId, url: &str, dest_dir: &Path, filename: Option<String>) {
        self.jobs.mark_running(job_id);
        match self.transfer(job_id, url, dest_dir, filename).await {
            Ok(outcome) => {
                relay_info!(
                    "download job {job_id} finished: {} ({} bytes)",
                    outcome.path.display(),
                    outcome.bytes
                );
                self.jobs.complete(job_id);
                self.notifications.push(
                    NotificationKind::Success,
                    "Download finished",
                    format!("{url} -> {}", outcome.path.display()),
                    NOTIFY_SOURCE,
                );
            }
            Err(UpstreamError::Cancelled) => {
                relay_info!("download job {job_id} cancelled");
                // Status was already set to Cancelled by the registry.
            }
            Err(err) => {
                relay_warn!("download job {job_id} failed: {err}");
                self.jobs.fail(job_id, err.to_string());
                self.notifications.push(
                    NotificationKind::Error,
                    "Download failed",
                    format!("{url}: {err}"),
                    NOTIFY_SOURCE,
                );
            }
        }
    }

    async fn transfer(
        &self,
        job_id: JobId,
        url: &str,
        dest_dir: &Path,
        filename: Option<String>,
    ) -> Result<DownloadOutcome, UpstreamError> {
        let stream = self.upstream.open_proxy(url).await?;
        let filename = filename.unwrap_or(stream.filename);
        let total = stream.size_bytes;

        let mut writer = StreamingFileWriter::create(dest_dir)?;
        let mut body = stream.body;
        let mut received: u64 = 0;

        while let Some(chunk) = body.next().await {
            if self.jobs.is_cancelled(job_id) {
                // Temp file is dropped with the writer; no partial output.
                return Err(UpstreamError::Cancelled);
            }
            let chunk = chunk?;
            writer.write_chunk(&chunk)?;
            received += chunk.len() as u64;
            self.jobs.record_progress(job_id, received, total);
        }

        let path = writer.persist(&filename)?;
        Ok(DownloadOutcome {
            path,
            bytes: received,
        })
    }
}
