// src/serve/mod.rs

pub mod upload;

use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use bytes::BufMut;
use futures_util::TryStreamExt;
use tracing::{info, warn};
use warp::http::{Response, StatusCode};
use warp::hyper::Body;
use warp::multipart::{FormData, Part};
use warp::{reject::Rejection, reply::Reply, Filter};

use crate::artifact::{self, ARTIFACT_NAME};
use crate::config::AppConfig;
use crate::render;
use crate::store::RecordStore;
use upload::UploadError;

/// Shared service state: resolved configuration plus the open record store.
/// The store sits behind a std mutex because every use of it happens inside
/// `spawn_blocking` alongside the other synchronous pipeline work.
pub struct AppState {
    pub config: AppConfig,
    pub store: Mutex<RecordStore>,
}

pub type SharedState = Arc<AppState>;

fn with_state(
    state: SharedState,
) -> impl Filter<Extract = (SharedState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Compose the full route tree: upload form, ingestion, artifact download,
/// and the liveness probe.
pub fn routes(
    state: SharedState,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let max_upload_bytes = state.config.max_upload_bytes;

    let form = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::html(render::upload_page(None)));

    let ingest = warp::path::end()
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(warp::multipart::form().max_length(max_upload_bytes))
        .and_then(handle_upload);

    let download = warp::path("download")
        .and(warp::get())
        .and(with_state(state))
        .and_then(handle_download);

    let health = warp::path("health").and(warp::get()).and_then(health_check);

    form.or(ingest)
        .or(download)
        .or(health)
        .recover(handle_rejection)
}

async fn health_check() -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&serde_json::json!({
        "status": "healthy",
        "service": "mdtables",
    })))
}

async fn handle_upload(state: SharedState, form: FormData) -> Result<impl Reply, Rejection> {
    let html = match run_upload(state, form).await {
        Ok(page) => page,
        Err(err) => {
            warn!(error = %err.message(), "upload rejected");
            render::upload_page(Some(&err.message()))
        }
    };
    Ok(warp::reply::html(html))
}

/// The async half of the upload pipeline: locate the `markdown` part, check
/// its file name, buffer the body, then hand the synchronous work (save,
/// validate, extract, artifact, store) to the blocking pool.
async fn run_upload(state: SharedState, mut form: FormData) -> Result<String, UploadError> {
    let mut part: Option<Part> = None;
    while let Some(p) = form
        .try_next()
        .await
        .map_err(|e| UploadError::Other(e.to_string()))?
    {
        if p.name() == "markdown" {
            part = Some(p);
            break;
        }
    }
    let part = part.ok_or(UploadError::NoFile)?;

    let filename = part
        .filename()
        .filter(|name| name.ends_with(".md"))
        .map(upload::sanitize_filename)
        .ok_or(UploadError::BadExtension)?;

    let bytes = part
        .stream()
        .try_fold(Vec::new(), |mut acc, buf| async move {
            acc.put(buf);
            Ok(acc)
        })
        .await
        .map_err(|e| UploadError::Other(e.to_string()))?;

    info!(filename, bytes = bytes.len(), "upload received");

    let tables = {
        let state = state.clone();
        let filename = filename.clone();
        tokio::task::spawn_blocking(move || upload::ingest(&state, &filename, &bytes))
            .await
            .map_err(|e| UploadError::Other(e.to_string()))??
    };

    Ok(render::result_page(&filename, &tables))
}

async fn handle_download(state: SharedState) -> Result<warp::reply::Response, Rejection> {
    let reply = match artifact::load_artifact(&state.config.upload_dir) {
        Ok(Some(bytes)) => Response::builder()
            .header("content-type", "application/json")
            .header(
                "content-disposition",
                format!("attachment; filename=\"{ARTIFACT_NAME}\""),
            )
            .body(Body::from(bytes))
            .unwrap_or_else(|_| {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }),
        Ok(None) => warp::reply::html(render::upload_page(Some(
            "No JSON file available for download",
        )))
        .into_response(),
        Err(e) => {
            warn!(error = %format!("{e:#}"), "artifact read failed");
            warp::reply::html(render::upload_page(Some(&format!(
                "Error processing file: {e:#}"
            ))))
            .into_response()
        }
    };
    Ok(reply)
}

async fn handle_rejection(err: Rejection) -> Result<warp::reply::Response, Infallible> {
    if err.is_not_found() {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }
    if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        let html = render::upload_page(Some("Error processing file: upload too large"));
        return Ok(warp::reply::html(html).into_response());
    }
    warn!(?err, "unhandled rejection");
    Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: SharedState) {
    let port = state.config.port;
    info!(port, "server starting");
    warp::serve(routes(state)).run(([0, 0, 0, 0], port)).await;
}
