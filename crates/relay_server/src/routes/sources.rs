use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_DISPOSITION;
use axum::http::Response;
use axum::Json;
use relay_core::{DownloadJob, JobId};
use relay_engine::Resolution;
use relay_logging::relay_info;
use serde::Deserialize;
use serde_json::json;

use super::enforce_rate_limit;
use crate::client_ip::ClientIp;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub(super) struct UrlParam {
    url: Option<String>,
}

/// GET /api/v1/sources/resolve?url=ENCODED
pub(super) async fn resolve(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    Query(params): Query<UrlParam>,
) -> Result<Json<Resolution>, ApiError> {
    enforce_rate_limit(&state, &ip)?;
    let url = params.url.filter(|u| !u.is_empty()).ok_or(ApiError::MissingParam("url"))?;
    let resolution = state.upstream.resolve(&url).await?;
    Ok(Json(resolution))
}

/// GET /api/v1/sources/proxy?url=ENCODED
///
/// Streams the upstream body through unbuffered, with the safe header
/// subset copied over and an attachment disposition forced on top.
pub(super) async fn proxy(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    Query(params): Query<UrlParam>,
) -> Result<Response<Body>, ApiError> {
    enforce_rate_limit(&state, &ip)?;
    let url = params.url.filter(|u| !u.is_empty()).ok_or(ApiError::MissingParam("url"))?;

    let stream = state.upstream.open_proxy(&url).await?;
    relay_info!("proxying {url} as {}", stream.filename);

    let mut builder = Response::builder().status(stream.status);
    for (name, value) in &stream.headers {
        // `header` appends; the upstream disposition must not survive next
        // to the forced attachment one.
        if name.as_str() == "content-disposition" {
            continue;
        }
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder = builder.header(
        CONTENT_DISPOSITION,
        format!("attachment; filename=\"{}\"", stream.filename),
    );
    builder
        .body(Body::from_stream(stream.body))
        .map_err(|err| ApiError::Internal(err.to_string()))
}

#[derive(Deserialize)]
pub(super) struct StartDownloadBody {
    url: String,
    filename: Option<String>,
}

/// POST /api/v1/sources/download
pub(super) async fn start_download(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    Json(body): Json<StartDownloadBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    enforce_rate_limit(&state, &ip)?;
    if body.url.is_empty() {
        return Err(ApiError::MissingParam("url"));
    }
    // Fail fast before a job is created.
    if !state.upstream.allow_list().is_allowed(&body.url) {
        return Err(ApiError::HostNotAllowed);
    }

    let dest = state.download_dir();
    let job_id = state.jobs.create(&body.url, dest.to_string_lossy());
    relay_info!("download job {job_id} queued for {}", body.url);

    let downloader = state.downloader.clone();
    let url = body.url.clone();
    let filename = body.filename.clone();
    tokio::spawn(async move {
        downloader.run(job_id, &url, &dest, filename).await;
    });

    Ok(Json(json!({ "jobId": job_id })))
}

/// GET /api/v1/sources/downloads
pub(super) async fn list_downloads(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<DownloadJob>> {
    Json(state.jobs.list())
}

/// GET /api/v1/sources/download/{id}
pub(super) async fn get_download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<JobId>,
) -> Result<Json<DownloadJob>, ApiError> {
    state
        .jobs
        .get(id)
        .map(Json)
        .ok_or(ApiError::NotFound("download job"))
}

/// DELETE /api/v1/sources/download/{id}
pub(super) async fn cancel_download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<JobId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.jobs.cancel(id) {
        Ok(Json(json!({ "cancelled": true, "jobId": id })))
    } else {
        Err(ApiError::NotFound("download job"))
    }
}
