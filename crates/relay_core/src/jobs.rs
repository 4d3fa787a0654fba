use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Error,
    Cancelled,
}

impl JobStatus {
    /// Terminal states are absorbing: no later update may leave them.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Error | JobStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadJob {
    pub id: JobId,
    pub url: String,
    pub dest: String,
    pub status: JobStatus,
    pub bytes_received: u64,
    pub bytes_total: Option<u64>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// In-memory download bookkeeping. Not durable; a restart forgets all jobs.
#[derive(Debug, Default)]
pub struct JobRegistry {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: JobId,
    jobs: HashMap<JobId, DownloadJob>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, url: impl Into<String>, dest: impl Into<String>) -> JobId {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.jobs.insert(
            id,
            DownloadJob {
                id,
                url: url.into(),
                dest: dest.into(),
                status: JobStatus::Pending,
                bytes_received: 0,
                bytes_total: None,
                error: None,
                started_at: Utc::now(),
                finished_at: None,
            },
        );
        id
    }

    pub fn mark_running(&self, id: JobId) {
        self.update_live(id, |job| job.status = JobStatus::Running);
    }

    /// Progress on a terminal job is ignored.
    pub fn record_progress(&self, id: JobId, bytes_received: u64, bytes_total: Option<u64>) {
        self.update_live(id, |job| {
            job.bytes_received = bytes_received;
            if bytes_total.is_some() {
                job.bytes_total = bytes_total;
            }
        });
    }

    pub fn complete(&self, id: JobId) {
        self.update_live(id, |job| {
            job.status = JobStatus::Completed;
            job.finished_at = Some(Utc::now());
        });
    }

    pub fn fail(&self, id: JobId, message: impl Into<String>) {
        self.update_live(id, |job| {
            job.status = JobStatus::Error;
            job.error = Some(message.into());
            job.finished_at = Some(Utc::now());
        });
    }

    /// Returns false when the job is unknown or already terminal.
    pub fn cancel(&self, id: JobId) -> bool {
        let mut inner = self.lock();
        match inner.jobs.get_mut(&id) {
            Some(job) if !job.status.is_terminal() => {
                job.status = JobStatus::Cancelled;
                job.finished_at = Some(Utc::now());
                true
            }
            _ => false,
        }
    }

    pub fn is_cancelled(&self, id: JobId) -> bool {
        self.lock()
            .jobs
            .get(&id)
            .is_some_and(|job| job.status == JobStatus::Cancelled)
    }

    pub fn get(&self, id: JobId) -> Option<DownloadJob> {
        self.lock().jobs.get(&id).cloned()
    }

    /// All jobs, newest first.
    pub fn list(&self) -> Vec<DownloadJob> {
        let inner = self.lock();
        let mut jobs: Vec<DownloadJob> = inner.jobs.values().cloned().collect();
        jobs.sort_by(|a, b| b.id.cmp(&a.id));
        jobs
    }

    fn update_live(&self, id: JobId, apply: impl FnOnce(&mut DownloadJob)) {
        let mut inner = self.lock();
        if let Some(job) = inner.jobs.get_mut(&id) {
            if !job.status.is_terminal() {
                apply(job);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("job registry poisoned")
    }
}
