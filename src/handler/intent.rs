//! Response intents
//!
//! Every request ends in exactly one [`ResponseIntent`]. The responders only
//! decide; [`ResponseIntent::into_response`] is the one place that turns a
//! decision into status, headers and body.

use super::HandlerError;
use crate::http::cache::CachePolicy;
use crate::http::response::{self, ServeBody};
use crate::templates::{self, DirContext, ErrorContext, ListingFile};
use futures_util::{Stream, TryStreamExt};
use http_body_util::{BodyExt, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::{Response, StatusCode};
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// Child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_directory: bool,
    /// Lowercase extension without the dot, empty when there is none
    pub extension_tag: String,
}

impl DirEntry {
    fn into_listing_file(self) -> ListingFile {
        if self.is_directory {
            ListingFile {
                href: format!("{}/", self.name),
                kind: "dir".to_string(),
            }
        } else {
            ListingFile {
                href: self.name,
                kind: self.extension_tag,
            }
        }
    }
}

/// How a request was answered, attached to the response for access logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome(pub &'static str);

/// The single decision made for a request
#[derive(Debug)]
pub enum ResponseIntent {
    /// Unsafe request path (400)
    BadRequest,
    /// Directory requested without trailing slash (301)
    Redirect { location: String },
    /// `If-Modified-Since` matched (304)
    NotModified { last_modified: String },
    /// Byte range of a file, streamed from disk (206)
    PartialContent {
        path: PathBuf,
        start: u64,
        end: u64,
        total: u64,
        content_length: u64,
        content_type: String,
        last_modified: String,
    },
    /// Range outside the file, strict mode only (416)
    RangeNotSatisfiable { total: u64, last_modified: String },
    /// Whole file, already read into memory (200)
    FullContent {
        body: Bytes,
        content_type: String,
        last_modified: String,
    },
    /// Generated directory index (200)
    Listing {
        url: String,
        entries: Vec<DirEntry>,
        live_reload_path: Option<String>,
    },
    /// Build failure page (500)
    ErrorPage(ErrorContext),
    /// Not ours to answer; the next handler decides, seeing the stat error if any
    Delegate(Option<io::Error>),
}

impl ResponseIntent {
    /// Short label for access logs
    pub const fn outcome(&self) -> &'static str {
        match self {
            Self::BadRequest => "bad-request",
            Self::Redirect { .. } => "redirect",
            Self::NotModified { .. } => "not-modified",
            Self::PartialContent { .. } => "range",
            Self::RangeNotSatisfiable { .. } => "range-not-satisfiable",
            Self::FullContent { .. } => "file",
            Self::Listing { .. } => "listing",
            Self::ErrorPage(_) => "build-error",
            Self::Delegate(_) => "delegated",
        }
    }

    /// Write the decision out as a hyper response
    ///
    /// `Delegate` is handled by the middleware before this point; should one
    /// arrive here it is answered with a plain 404.
    pub async fn into_response(self) -> Result<Response<ServeBody>, HandlerError> {
        let response = match self {
            Self::BadRequest => response::build_400_response(),
            Self::Redirect { location } => response::build_redirect_response(&location),
            Self::NotModified { last_modified } => response::build_304_response(&last_modified),
            Self::PartialContent {
                path,
                start,
                end,
                total,
                content_length,
                content_type,
                last_modified,
            } => {
                let len = if end < start { 0 } else { end - start + 1 };
                let body = stream_slice(&path, start, len, content_length > len)
                    .await
                    .map_err(HandlerError::io("failed to stream", &path))?;
                response::build_partial_response(
                    body,
                    &content_type,
                    &last_modified,
                    start,
                    end,
                    total,
                    content_length,
                )
            }
            Self::RangeNotSatisfiable {
                total,
                last_modified,
            } => response::build_416_response(total, &last_modified),
            Self::FullContent {
                body,
                content_type,
                last_modified,
            } => response::build_file_response(body, &content_type, &last_modified),
            Self::Listing {
                url,
                entries,
                live_reload_path,
            } => {
                let html = templates::render_dir(&DirContext {
                    url,
                    files: entries
                        .into_iter()
                        .map(DirEntry::into_listing_file)
                        .collect(),
                    live_reload_path,
                })?;
                response::build_html_response(StatusCode::OK, html, CachePolicy::Revalidate)
            }
            Self::ErrorPage(context) => {
                let html = templates::render_error(&context)?;
                response::build_html_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    html,
                    CachePolicy::NoStore,
                )
            }
            Self::Delegate(_) => response::build_404_response(),
        };
        Ok(response)
    }
}

/// Stream `len` bytes starting at `start`
///
/// The file stays open only while the body is being polled; dropping the body
/// (client gone) closes it. `short` marks a body that ends before the declared
/// `Content-Length`.
async fn stream_slice(path: &Path, start: u64, len: u64, short: bool) -> io::Result<ServeBody> {
    let mut file = tokio::fs::File::open(path).await?;
    file.seek(SeekFrom::Start(start)).await?;
    let frames = ReaderStream::new(file.take(len)).map_ok(Frame::data);
    if short {
        Ok(StreamBody::new(FlushBeforeEnd::new(frames)).boxed())
    } else {
        Ok(StreamBody::new(frames).boxed())
    }
}

/// Holds back end-of-stream for one poll
///
/// hyper aborts a connection whose body ends short of its `Content-Length`
/// and drops whatever is still in its write buffer. Yielding once after the
/// last frame lets the connection flush the slice to the socket first.
struct FlushBeforeEnd<S> {
    inner: S,
    held_back: bool,
}

impl<S> FlushBeforeEnd<S> {
    const fn new(inner: S) -> Self {
        Self {
            inner,
            held_back: false,
        }
    }
}

impl<S: Stream + Unpin> Stream for FlushBeforeEnd<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(None) if !self.held_back => {
                self.held_back = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            other => other,
        }
    }
}
