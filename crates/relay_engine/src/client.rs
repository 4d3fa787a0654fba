use std::time::Duration;

use relay_core::AllowList;
use reqwest::header::{AUTHORIZATION, LOCATION};
use reqwest::{Method, Url};
use thiserror::Error;

pub const DEFAULT_USER_AGENT: &str = "source-relay/0.1";
pub const DEFAULT_HF_BASE: &str = "https://huggingface.co";

#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub user_agent: String,
    /// Bearer token attached to requests whose hop targets a Hugging Face
    /// host. Never forwarded to other hosts.
    pub hf_token: Option<String>,
    /// Base URL for Hugging Face, overridable so tests can point at a mock.
    pub hf_base: String,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            hf_token: None,
            hf_base: DEFAULT_HF_BASE.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("host not allowed: {0}")]
    HostNotAllowed(String),
    #[error("too many redirects (limit {limit})")]
    TooManyRedirects { limit: usize },
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("upstream request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("download cancelled")]
    Cancelled,
    #[error(transparent)]
    Persist(#[from] crate::persist::PersistError),
}

/// Client for all upstream traffic. Redirects are followed manually so the
/// hop count stays bounded and the final URL is known exactly.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    settings: UpstreamSettings,
    allow_list: AllowList,
}

impl UpstreamClient {
    pub fn new(settings: UpstreamSettings, allow_list: AllowList) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| UpstreamError::Network(err.to_string()))?;
        Ok(Self {
            client,
            settings,
            allow_list,
        })
    }

    pub fn settings(&self) -> &UpstreamSettings {
        &self.settings
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Parses client input and enforces the allow-list. Rejected URLs never
    /// produce an upstream request.
    pub(crate) fn parse_allowed(&self, raw: &str) -> Result<Url, UpstreamError> {
        let url =
            Url::parse(raw.trim()).map_err(|err| UpstreamError::InvalidUrl(err.to_string()))?;
        if !self.allow_list.is_url_allowed(&url) {
            let host = url.host_str().unwrap_or("<none>").to_string();
            return Err(UpstreamError::HostNotAllowed(host));
        }
        Ok(url)
    }

    /// Issues `method` against `url`, following up to `redirect_limit` hops.
    /// A 3xx without a Location header is returned as-is.
    pub(crate) async fn send_following(
        &self,
        method: Method,
        mut url: Url,
    ) -> Result<reqwest::Response, UpstreamError> {
        for _ in 0..=self.settings.redirect_limit {
            let mut request = self.client.request(method.clone(), url.clone());
            if let Some(token) = self.hf_token_for(&url) {
                request = request.header(AUTHORIZATION, format!("Bearer {token}"));
            }
            let response = request.send().await.map_err(map_reqwest_error)?;

            if response.status().is_redirection() {
                if let Some(location) = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                {
                    url = url
                        .join(location)
                        .map_err(|err| UpstreamError::InvalidUrl(err.to_string()))?;
                    continue;
                }
            }
            return Ok(response);
        }
        Err(UpstreamError::TooManyRedirects {
            limit: self.settings.redirect_limit,
        })
    }

    // Token is attached per hop, so a redirect off huggingface.co (e.g. to
    // a CDN bucket) does not leak it.
    fn hf_token_for(&self, url: &Url) -> Option<&str> {
        let token = self.settings.hf_token.as_deref()?;
        let host = url.host_str()?;
        let is_hf = host.eq_ignore_ascii_case("huggingface.co")
            || host.to_ascii_lowercase().ends_with(".huggingface.co");
        is_hf.then_some(token)
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        return UpstreamError::Timeout;
    }
    UpstreamError::Network(err.to_string())
}
