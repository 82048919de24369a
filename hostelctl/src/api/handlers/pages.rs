//! HTML pages and their assets, embedded at build time.
//!
//! The page routes themselves are mounted behind the authentication gate, except `/login`. The
//! asset fallback is public but never serves `.html` files, so a page cannot be fetched by file
//! name to get around the gate.

use axum::{
    body::Body,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use crate::static_assets;

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

fn embedded(path: &str, cache_control: &'static str) -> Option<Response> {
    let content = static_assets::Assets::get(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    Some(
        (
            [
                (header::CONTENT_TYPE, mime.as_ref().to_string()),
                (header::CACHE_CONTROL, cache_control.to_string()),
            ],
            Body::from(content.data.into_owned()),
        )
            .into_response(),
    )
}

/// Serve one of the embedded HTML pages by file name.
pub fn serve_page(name: &str) -> Response {
    // Pages must not be cached: they sit behind a session check
    embedded(name, "no-cache").unwrap_or_else(not_found)
}

#[instrument]
pub async fn dashboard() -> Response {
    serve_page("index.html")
}

#[instrument]
pub async fn students() -> Response {
    serve_page("students.html")
}

#[instrument]
pub async fn rooms() -> Response {
    serve_page("rooms.html")
}

#[instrument]
pub async fn fees() -> Response {
    serve_page("fees.html")
}

/// Fallback for everything unrouted: stylesheets, scripts and icons.
#[instrument]
pub async fn serve_asset(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    if path.is_empty() || path.ends_with(".html") {
        debug!(path, "Refusing to serve page through the asset fallback");
        return not_found();
    }

    embedded(path, "public, max-age=3600").unwrap_or_else(not_found)
}
