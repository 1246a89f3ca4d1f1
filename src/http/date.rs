//! HTTP-date formatting for `Last-Modified`

use chrono::{DateTime, Utc};
use std::time::SystemTime;

/// IMF-fixdate layout from RFC 7231 section 7.1.1.1
const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Format a timestamp as an HTTP-date, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
///
/// Sub-second precision is dropped; clients echo this string back verbatim
/// in `If-Modified-Since`, so it must be stable for an unchanged file.
pub fn http_date(time: SystemTime) -> String {
    let time: DateTime<Utc> = time.into();
    time.format(IMF_FIXDATE).to_string()
}
