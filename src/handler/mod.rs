//! Request handler module
//!
//! Serves the output of the current build: waits for the build, resolves the
//! request path, and decides on exactly one [`ResponseIntent`] per request.
//! Deciding is kept separate from writing so each responder can be exercised
//! without a transport.

pub mod directory;
pub mod error_page;
pub mod file;
pub mod intent;
pub mod middleware;
pub mod resolve;

pub use intent::{DirEntry, Outcome, ResponseIntent};
pub use middleware::{Fallback, NotFoundFallback, ServeBuild};
pub use resolve::{FileStat, PathSecurityViolation, ResolvedTarget};

use crate::templates::TemplateError;
use hyper::Request;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Static options fixed when the middleware is constructed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeOptions {
    /// Generate listings for directories without `index.html`
    pub auto_index: bool,
    /// Live-reload script URL injected into generated pages
    pub live_reload_path: Option<String>,
    /// Answer unsatisfiable ranges with 416 and advertise the slice length;
    /// off reproduces the lenient range responses clients already depend on
    pub strict_ranges: bool,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            auto_index: true,
            live_reload_path: None,
            strict_ranges: false,
        }
    }
}

/// Read-only view of the request the handler needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Path and query exactly as received
    pub url: String,
    /// Raw (percent-encoded) path component
    pub path: String,
    /// Query string without the leading `?`
    pub query: Option<String>,
    pub range: Option<String>,
    pub if_modified_since: Option<String>,
}

impl RequestContext {
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let uri = req.uri();
        let header = |name: hyper::header::HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };

        Self {
            url: uri
                .path_and_query()
                .map_or_else(|| uri.path().to_string(), |pq| pq.as_str().to_string()),
            path: uri.path().to_string(),
            query: uri.query().map(ToString::to_string),
            range: header(hyper::header::RANGE),
            if_modified_since: header(hyper::header::IF_MODIFIED_SINCE),
        }
    }
}

/// Unexpected failure while producing a response
///
/// Caught at the request boundary and logged; never crashes the server.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{action} '{}': {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl HandlerError {
    fn io(action: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io {
            action,
            path,
            source,
        }
    }
}
