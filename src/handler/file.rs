//! File responder
//!
//! Given a resolved, already statted regular file, decides between 304, a
//! ranged 206 and a full 200.

use super::{FileStat, HandlerError, RequestContext, ResponseIntent, ServeOptions};
use crate::http::{cache, date, mime, parse_range_header};
use hyper::body::Bytes;
use std::path::Path;

pub async fn respond(
    path: &Path,
    stat: &FileStat,
    ctx: &RequestContext,
    options: &ServeOptions,
) -> Result<ResponseIntent, HandlerError> {
    let last_modified = date::http_date(stat.modified);

    if cache::is_not_modified(ctx.if_modified_since.as_deref(), &last_modified) {
        return Ok(ResponseIntent::NotModified { last_modified });
    }

    let content_type = mime::content_type(path);
    let total = stat.size;

    if let Some(range) = ctx.range.as_deref().and_then(parse_range_header) {
        if options.strict_ranges && !range.is_satisfiable(total) {
            return Ok(ResponseIntent::RangeNotSatisfiable {
                total,
                last_modified,
            });
        }

        // Lenient mode advertises the whole file size, as existing clients expect
        let content_length = if options.strict_ranges {
            range.slice_len(total)
        } else {
            total
        };

        return Ok(ResponseIntent::PartialContent {
            path: path.to_path_buf(),
            start: range.start,
            end: range.end_position(total),
            total,
            content_length,
            content_type,
            last_modified,
        });
    }

    // Read to completion before any header is written: the handle must be
    // closed by the time the response goes out, or a concurrent rebuild cannot
    // replace the file on platforms that lock open files.
    let body = tokio::fs::read(path)
        .await
        .map_err(HandlerError::io("failed to read", path))?;

    Ok(ResponseIntent::FullContent {
        body: Bytes::from(body),
        content_type,
        last_modified,
    })
}
