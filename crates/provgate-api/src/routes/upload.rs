//! # Upload Route
//!
//! `PUT /upload` takes the raw archive as the request body. The body is
//! streamed straight into the store: the async body is wrapped as a
//! blocking reader and the pipeline runs on Tokio's blocking pool.
//!
//! The body carries the router's idle timeout. When it fires, the read
//! inside the blocking task fails with [`io::ErrorKind::TimedOut`] and the
//! upload is answered with 408, leaving nothing in the store.

use std::error::Error as _;
use std::io;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::routing::put;
use axum::Router;
use futures_util::TryStreamExt;
use tokio_util::io::{StreamReader, SyncIoBridge};
use tower_http::timeout::TimeoutError;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/upload", put(upload).fallback(super::not_found))
}

async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<&'static str, AppError> {
    if let (Some(limit), Some(declared)) = (
        state.pipeline.config().max_upload_bytes,
        declared_length(&headers),
    ) {
        if declared > limit {
            return Err(AppError::PayloadTooLarge { declared, limit });
        }
    }

    let stream = body.into_data_stream().map_err(body_read_error);
    let reader = SyncIoBridge::new(StreamReader::new(stream));
    let pipeline = state.pipeline.clone();

    let accepted = tokio::task::spawn_blocking(move || pipeline.process(reader))
        .await
        .map_err(|e| AppError::Internal(format!("upload task failed: {e}")))??;

    tracing::info!(
        digest = %accepted.object.digest,
        manifests = accepted.manifests_checked,
        "upload request accepted"
    );
    Ok("OK")
}

/// Convert a body error into the reader's error, keeping an expired body
/// timeout recognisable as `TimedOut`.
fn body_read_error(err: axum::Error) -> io::Error {
    let timed_out = std::iter::successors(err.source(), |e| (*e).source())
        .any(|e| e.is::<TimeoutError>());
    if timed_out {
        io::Error::new(io::ErrorKind::TimedOut, err)
    } else {
        io::Error::other(err)
    }
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
