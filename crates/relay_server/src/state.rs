use std::path::PathBuf;
use std::sync::Arc;

use relay_core::{AllowList, JobRegistry, NotificationFeed, RateLimitSettings, SlidingWindowLimiter};
use relay_engine::{Downloader, UpstreamClient, UpstreamSettings};

use crate::config::RelayConfig;

/// Everything a request handler needs, constructed once at startup and
/// shared behind an `Arc`.
pub struct AppState {
    pub config: RelayConfig,
    pub upstream: Arc<UpstreamClient>,
    pub limiter: Arc<SlidingWindowLimiter>,
    pub jobs: Arc<JobRegistry>,
    pub notifications: Arc<NotificationFeed>,
    pub downloader: Arc<Downloader>,
}

impl AppState {
    pub fn from_config(config: RelayConfig) -> anyhow::Result<Arc<Self>> {
        let allow_list = AllowList::with_extra_hosts(config.extra_allowed_hosts.clone());
        let mut settings = UpstreamSettings {
            hf_token: config.hf_token.clone(),
            ..UpstreamSettings::default()
        };
        if let Some(base) = &config.hf_base {
            settings.hf_base = base.clone();
        }
        let upstream = Arc::new(UpstreamClient::new(settings, allow_list)?);

        let limiter = Arc::new(SlidingWindowLimiter::new(RateLimitSettings {
            max_requests: config.rate_limit_max_requests,
            window: config.rate_limit_window(),
        }));
        let jobs = Arc::new(JobRegistry::new());
        let notifications = Arc::new(NotificationFeed::default());
        let downloader = Arc::new(Downloader::new(
            upstream.clone(),
            jobs.clone(),
            notifications.clone(),
        ));

        Ok(Arc::new(Self {
            config,
            upstream,
            limiter,
            jobs,
            notifications,
            downloader,
        }))
    }

    pub fn download_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.download_dir)
    }
}
