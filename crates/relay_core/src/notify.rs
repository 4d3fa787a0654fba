use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DEFAULT_FEED_CAP: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// Capped in-memory notification list; pushing past the cap evicts the
/// oldest entry.
#[derive(Debug)]
pub struct NotificationFeed {
    cap: usize,
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    entries: VecDeque<Notification>,
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::with_cap(DEFAULT_FEED_CAP)
    }
}

impl NotificationFeed {
    pub fn with_cap(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn push(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<String>,
    ) -> u64 {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.entries.push_back(Notification {
            id,
            kind,
            title: title.into(),
            message: message.into(),
            read: false,
            source: source.into(),
            created_at: Utc::now(),
        });
        while inner.entries.len() > self.cap {
            inner.entries.pop_front();
        }
        id
    }

    /// Newest first.
    pub fn list(&self) -> Vec<Notification> {
        self.lock().entries.iter().rev().cloned().collect()
    }

    pub fn mark_read(&self, id: u64) -> bool {
        let mut inner = self.lock();
        match inner.entries.iter_mut().find(|n| n.id == id) {
            Some(entry) => {
                entry.read = true;
                true
            }
            None => false,
        }
    }

    /// Returns how many entries changed state.
    pub fn mark_all_read(&self) -> usize {
        let mut inner = self.lock();
        let mut changed = 0;
        for entry in inner.entries.iter_mut() {
            if !entry.read {
                entry.read = true;
                changed += 1;
            }
        }
        changed
    }

    pub fn unread_count(&self) -> usize {
        self.lock().entries.iter().filter(|n| !n.read).count()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("notification feed poisoned")
    }
}
