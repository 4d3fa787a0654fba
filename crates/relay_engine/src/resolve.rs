use relay_logging::relay_debug;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_LENGTH};
use reqwest::Method;
use serde::Serialize;

use crate::client::{UpstreamClient, UpstreamError};
use crate::filename::extract_filename;

/// Metadata for a source URL after following redirects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub ok: bool,
    pub status: u16,
    pub final_url: String,
    pub filename: String,
    pub size_bytes: Option<u64>,
}

impl UpstreamClient {
    /// Resolves final location, filename and size for an allow-listed URL.
    ///
    /// Tries HEAD first; falls back to GET when the upstream refuses the
    /// method (405) or the HEAD attempt fails on the wire. The GET body is
    /// discarded, only headers are inspected.
    pub async fn resolve(&self, raw: &str) -> Result<Resolution, UpstreamError> {
        let url = self.parse_allowed(raw)?;

        let response = match self.send_following(Method::HEAD, url.clone()).await {
            Ok(response) if response.status() == reqwest::StatusCode::METHOD_NOT_ALLOWED => {
                relay_debug!("HEAD not supported for {url}, retrying with GET");
                self.send_following(Method::GET, url).await?
            }
            Ok(response) => response,
            Err(UpstreamError::TooManyRedirects { limit }) => {
                return Err(UpstreamError::TooManyRedirects { limit });
            }
            Err(err) => {
                relay_debug!("HEAD failed ({err}), retrying with GET");
                self.send_following(Method::GET, url).await?
            }
        };

        let status = response.status();
        let final_url = response.url().clone();
        let disposition = header_str(&response, CONTENT_DISPOSITION);
        let filename = extract_filename(disposition.as_deref(), &final_url);
        let size_bytes =
            header_str(&response, CONTENT_LENGTH).and_then(|value| value.parse::<u64>().ok());

        Ok(Resolution {
            ok: status.is_success(),
            status: status.as_u16(),
            final_url: final_url.to_string(),
            filename,
            size_bytes,
        })
    }
}

fn header_str(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}
