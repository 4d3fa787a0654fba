use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{Response, StatusCode};
use axum::Json;
use relay_core::validate_repo_path;
use relay_engine::{SearchKind, SearchPage, SearchRequest};
use serde::Deserialize;

use super::enforce_rate_limit;
use crate::client_ip::ClientIp;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub(super) struct SearchParams {
    kind: Option<String>,
    q: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
    sort: Option<String>,
}

/// GET /api/hf/search
pub(super) async fn search(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchPage>, ApiError> {
    enforce_rate_limit(&state, &ip)?;

    let kind = params.kind.as_deref().unwrap_or("models");
    let kind = SearchKind::parse(kind).ok_or_else(|| {
        ApiError::InvalidParam("kind must be one of: models, datasets, tts".to_string())
    })?;

    let request = SearchRequest::new(
        kind,
        params.q.unwrap_or_default(),
        params.page.unwrap_or(1),
        params.limit.unwrap_or(10),
        params.sort.unwrap_or_default(),
    );
    let page = state.upstream.hf_search(&request).await?;
    Ok(Json(page))
}

#[derive(Deserialize)]
pub(super) struct DownloadParams {
    path: Option<String>,
}

/// GET /api/hf/download/{repo_id}/{revision}?path=
pub(super) async fn download(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    Path((repo_id, revision)): Path<(String, String)>,
    Query(params): Query<DownloadParams>,
) -> Result<Response<Body>, ApiError> {
    enforce_rate_limit(&state, &ip)?;

    let path = params
        .path
        .filter(|p| !p.is_empty())
        .ok_or(ApiError::MissingParam("path"))?;
    // Reject traversal before anything touches the network.
    validate_repo_path(&path).map_err(|_| ApiError::InvalidPath)?;

    let stream = state.upstream.hf_download(&repo_id, &revision, &path).await?;

    let filename = path.rsplit('/').next().unwrap_or("download").to_string();
    let content_type = stream
        .headers
        .iter()
        .find(|(name, _)| name.as_str() == "content-type")
        .map(|(_, value)| value.clone())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from_stream(stream.body))
        .map_err(|err| ApiError::Internal(err.to_string()))
}
