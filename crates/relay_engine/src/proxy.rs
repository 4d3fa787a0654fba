use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_LENGTH};
use reqwest::Method;

use crate::client::{map_reqwest_error, UpstreamClient, UpstreamError};
use crate::filename::extract_filename;

/// Response headers copied through to the client verbatim. Everything else
/// from upstream is dropped.
pub const PASSTHROUGH_HEADERS: &[&str] = &[
    "content-type",
    "content-length",
    "content-disposition",
    "accept-ranges",
    "etag",
    "last-modified",
    "cache-control",
];

/// An open upstream body ready to be piped to a client.
pub struct ProxyStream {
    pub status: u16,
    pub filename: String,
    pub size_bytes: Option<u64>,
    /// Pass-through subset of upstream headers, lowercase names.
    pub headers: Vec<(String, String)>,
    pub body: BoxStream<'static, Result<Bytes, UpstreamError>>,
}

impl UpstreamClient {
    /// Opens a GET stream to an allow-listed URL. Non-2xx final responses
    /// surface as [`UpstreamError::Status`] so the caller can propagate the
    /// upstream code.
    pub async fn open_proxy(&self, raw: &str) -> Result<ProxyStream, UpstreamError> {
        let url = self.parse_allowed(raw)?;
        let response = self.send_following(Method::GET, url).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let final_url = response.url().clone();
        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let filename = extract_filename(disposition.as_deref(), &final_url);

        let mut headers = Vec::new();
        for name in PASSTHROUGH_HEADERS {
            if let Some(value) = response
                .headers()
                .get(*name)
                .and_then(|value| value.to_str().ok())
            {
                headers.push((name.to_string(), value.to_string()));
            }
        }
        let size_bytes = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());

        let body = response.bytes_stream().map_err(map_reqwest_error).boxed();

        Ok(ProxyStream {
            status: status.as_u16(),
            filename,
            size_bytes,
            headers,
            body,
        })
    }
}
