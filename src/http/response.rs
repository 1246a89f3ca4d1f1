//! HTTP response building module
//!
//! Provides builders for every status the handler emits, over a single boxed
//! body type so full buffers and streamed file slices share one signature.

use super::cache::CachePolicy;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Bytes;
use hyper::header::{
    ACCEPT_RANGES, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, LAST_MODIFIED,
    LOCATION,
};
use hyper::{Response, StatusCode};
use std::io;

/// Response body used throughout the crate
pub type ServeBody = BoxBody<Bytes, io::Error>;

/// Body holding an in-memory buffer
pub fn full_body(data: impl Into<Bytes>) -> ServeBody {
    Full::new(data.into()).map_err(|never| match never {}).boxed()
}

/// Body with no bytes
pub fn empty_body() -> ServeBody {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed()
}

/// Build 400 Bad Request response (unsafe request path)
pub fn build_400_response() -> Response<ServeBody> {
    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .body(empty_body())
        .unwrap_or_else(|e| fallback("400", &e))
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<ServeBody> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(CONTENT_TYPE, "text/plain")
        .body(full_body("404 Not Found"))
        .unwrap_or_else(|e| fallback("404", &e))
}

/// Build 301 redirect that browsers must not cache past revalidation
pub fn build_redirect_response(location: &str) -> Response<ServeBody> {
    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(LOCATION, location)
        .header(CACHE_CONTROL, CachePolicy::Revalidate.to_header_value())
        .body(empty_body())
        .unwrap_or_else(|e| fallback("301", &e))
}

/// Build 304 Not Modified response
pub fn build_304_response(last_modified: &str) -> Response<ServeBody> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(LAST_MODIFIED, last_modified)
        .body(empty_body())
        .unwrap_or_else(|e| fallback("304", &e))
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(total: u64, last_modified: &str) -> Response<ServeBody> {
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(LAST_MODIFIED, last_modified)
        .header(CONTENT_RANGE, format!("bytes */{total}"))
        .body(empty_body())
        .unwrap_or_else(|e| fallback("416", &e))
}

/// Build 200 response for a fully buffered file
pub fn build_file_response(
    data: Bytes,
    content_type: &str,
    last_modified: &str,
) -> Response<ServeBody> {
    Response::builder()
        .status(StatusCode::OK)
        .header(LAST_MODIFIED, last_modified)
        .header(CACHE_CONTROL, CachePolicy::Revalidate.to_header_value())
        .header(CONTENT_LENGTH, data.len())
        .header(CONTENT_TYPE, content_type)
        .body(full_body(data))
        .unwrap_or_else(|e| fallback("200", &e))
}

/// Build 206 Partial Content response around an already prepared body
///
/// `content_length` is supplied by the caller: the compatible mode advertises
/// the whole file size here, strict mode the slice length.
pub fn build_partial_response(
    body: ServeBody,
    content_type: &str,
    last_modified: &str,
    start: u64,
    end: u64,
    total: u64,
    content_length: u64,
) -> Response<ServeBody> {
    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(LAST_MODIFIED, last_modified)
        .header(ACCEPT_RANGES, "bytes")
        .header(CONTENT_LENGTH, content_length)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_RANGE, format!("bytes {start}-{end}/{total}"))
        .body(body)
        .unwrap_or_else(|e| fallback("206", &e))
}

/// Build generated HTML page response (directory listing, build error)
pub fn build_html_response(
    status: StatusCode,
    html: String,
    cache: CachePolicy,
) -> Response<ServeBody> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/html")
        .header(CACHE_CONTROL, cache.to_header_value())
        .body(full_body(html))
        .unwrap_or_else(|e| fallback(status.as_str(), &e))
}

/// Log response build error and return an empty response
fn fallback(status: &str, error: &hyper::http::Error) -> Response<ServeBody> {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
    Response::new(empty_body())
}
