//! Relay core: allow-list matching, rate limiting and in-memory bookkeeping.
mod allowlist;
mod jobs;
mod notify;
mod ratelimit;
mod repo_path;

pub use allowlist::{AllowList, DEFAULT_ALLOWED_HOSTS};
pub use jobs::{DownloadJob, JobId, JobRegistry, JobStatus};
pub use notify::{Notification, NotificationFeed, NotificationKind, DEFAULT_FEED_CAP};
pub use ratelimit::{RateDecision, RateLimitSettings, SlidingWindowLimiter};
pub use repo_path::{validate_repo_path, RepoPathError};
