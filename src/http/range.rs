//! HTTP Range request parsing module
//!
//! Only the single-range `bytes=<start>-<end>` form is understood. The start
//! offset is mandatory; the end defaults to the last byte of the file.

/// Parsed Range request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// Start byte position
    pub start: u64,
    /// End byte position (inclusive), None means until end of file
    pub end: Option<u64>,
}

impl ByteRange {
    /// Inclusive end offset, defaulting to `total - 1`
    #[inline]
    pub fn end_position(&self, total: u64) -> u64 {
        self.end.unwrap_or_else(|| total.saturating_sub(1))
    }

    /// Number of bytes covered by `[start, end]`, zero when the range is inverted
    pub fn slice_len(&self, total: u64) -> u64 {
        let end = self.end_position(total);
        if end < self.start {
            0
        } else {
            end - self.start + 1
        }
    }

    /// Whether the range lies entirely within a file of `total` bytes
    pub fn is_satisfiable(&self, total: u64) -> bool {
        let end = self.end_position(total);
        self.start <= end && end < total
    }
}

/// Parse a `Range` header value
///
/// Returns `None` for anything that is not a single `bytes=` range with a
/// numeric start; the caller then serves the whole file.
///
/// # Examples
/// ```
/// use buildserve::http::range::{parse_range_header, ByteRange};
///
/// assert_eq!(
///     parse_range_header("bytes=0-99"),
///     Some(ByteRange { start: 0, end: Some(99) })
/// );
/// assert_eq!(parse_range_header("bytes=-20"), None);
/// ```
pub fn parse_range_header(header: &str) -> Option<ByteRange> {
    let spec = header.trim().strip_prefix("bytes=")?;

    // Multi-range requests are not supported
    if spec.contains(',') {
        return None;
    }

    let (start_str, end_str) = spec.split_once('-')?;
    let start = start_str.trim().parse::<u64>().ok()?;

    let end_str = end_str.trim();
    let end = if end_str.is_empty() {
        None
    } else {
        Some(end_str.parse::<u64>().ok()?)
    };

    Some(ByteRange { start, end })
}
