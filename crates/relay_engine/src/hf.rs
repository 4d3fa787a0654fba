use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use relay_core::{validate_repo_path, RepoPathError};
use reqwest::{Method, Url};
use serde::Serialize;
use serde_json::Value;

use crate::client::{map_reqwest_error, UpstreamClient, UpstreamError};
use crate::proxy::ProxyStream;

const MAX_PAGE: u32 = 100;
const MAX_LIMIT: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Models,
    Datasets,
    /// Models filtered to the text-to-speech task.
    Tts,
}

impl SearchKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "models" => Some(SearchKind::Models),
            "datasets" => Some(SearchKind::Datasets),
            "tts" => Some(SearchKind::Tts),
            _ => None,
        }
    }

    fn endpoint(&self) -> &'static str {
        match self {
            SearchKind::Datasets => "datasets",
            SearchKind::Models | SearchKind::Tts => "models",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub kind: SearchKind,
    pub query: String,
    pub page: u32,
    pub limit: u32,
    pub sort: String,
}

impl SearchRequest {
    /// Builds a request with page/limit clamped into their legal ranges.
    pub fn new(
        kind: SearchKind,
        query: impl Into<String>,
        page: u32,
        limit: u32,
        sort: impl Into<String>,
    ) -> Self {
        let sort = sort.into();
        Self {
            kind,
            query: query.into(),
            page: page.clamp(1, MAX_PAGE),
            limit: limit.clamp(1, MAX_LIMIT),
            sort: if sort.is_empty() {
                "downloads".to_string()
            } else {
                sort
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    pub id: String,
    pub author: String,
    pub downloads: u64,
    pub likes: u64,
    pub last_modified: Option<String>,
    pub tags: Vec<String>,
    pub private: bool,
    pub library_name: Option<String>,
    pub task: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchPage {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub items: Vec<SearchItem>,
}

impl UpstreamClient {
    /// Queries the Hugging Face hub API and normalizes the result list.
    pub async fn hf_search(&self, request: &SearchRequest) -> Result<SearchPage, UpstreamError> {
        let base = format!("{}/api", self.settings().hf_base.trim_end_matches('/'));
        let mut url = Url::parse(&format!("{base}/{}", request.kind.endpoint()))
            .map_err(|err| UpstreamError::InvalidUrl(err.to_string()))?;

        {
            let mut params = url.query_pairs_mut();
            let query = request.query.trim();
            if !query.is_empty() {
                params.append_pair("search", query);
            }
            if request.kind == SearchKind::Tts {
                params.append_pair("filter", "text-to-speech");
            }
            params.append_pair("sort", &request.sort);
            params.append_pair("limit", &request.limit.to_string());
            params.append_pair("full", "true");
            params.append_pair("direction", "-1");
        }

        let response = self.send_following(Method::GET, url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let payload = response.bytes().await.map_err(map_reqwest_error)?;
        let raw: Vec<Value> = serde_json::from_slice(&payload).unwrap_or_default();
        let items: Vec<SearchItem> = raw.iter().map(normalize_item).collect();

        Ok(SearchPage {
            page: request.page,
            limit: request.limit,
            total: items.len(),
            items,
        })
    }

    /// Streams a single repository file. The path must already have passed
    /// [`validate_repo_path`]; it is re-checked here as a last line.
    pub async fn hf_download(
        &self,
        repo_id: &str,
        revision: &str,
        path: &str,
    ) -> Result<ProxyStream, UpstreamError> {
        let url = self.hf_file_url(repo_id, revision, path)?;
        self.open_proxy(url.as_str()).await
    }

    /// Builds `{hf_base}/{repo}/resolve/{revision}/{path}`.
    pub fn hf_file_url(
        &self,
        repo_id: &str,
        revision: &str,
        path: &str,
    ) -> Result<Url, UpstreamError> {
        validate_repo_path(path).map_err(repo_path_error)?;
        let base = self.settings().hf_base.trim_end_matches('/');
        let repo = encode_segment(repo_id);
        let revision = encode_segment(revision);
        Url::parse(&format!("{base}/{repo}/resolve/{revision}/{path}"))
            .map_err(|err| UpstreamError::InvalidUrl(err.to_string()))
    }
}

fn repo_path_error(err: RepoPathError) -> UpstreamError {
    UpstreamError::InvalidUrl(err.to_string())
}

const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

// Repo ids contain a literal `/` between owner and name; keep it.
fn encode_segment(segment: &str) -> String {
    segment
        .split('/')
        .map(|part| utf8_percent_encode(part, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn normalize_item(value: &Value) -> SearchItem {
    SearchItem {
        id: str_field(value, "id").unwrap_or_default(),
        author: str_field(value, "author").unwrap_or_else(|| "unknown".to_string()),
        downloads: u64_field(value, "downloads")
            .or_else(|| u64_field(value, "downloadCount"))
            .unwrap_or(0),
        likes: u64_field(value, "likes").unwrap_or(0),
        last_modified: str_field(value, "lastModified").or_else(|| str_field(value, "updatedAt")),
        tags: value
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        private: value
            .get("private")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        library_name: str_field(value, "library_name").or_else(|| str_field(value, "libraryName")),
        task: str_field(value, "pipeline_tag").or_else(|| str_field(value, "task")),
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn u64_field(value: &Value, key: &str) -> Option<u64> {
    value.get(key).and_then(Value::as_u64)
}
