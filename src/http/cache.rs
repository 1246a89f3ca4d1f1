//! HTTP cache control module
//!
//! Provides the `Cache-Control` policies used by the handler and the
//! `If-Modified-Since` validation check.

/// Cache control policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Browser may store the response but must revalidate before every reuse
    #[default]
    Revalidate,
    /// Never store (build error pages)
    NoStore,
}

impl CachePolicy {
    /// Convert to Cache-Control header value
    pub const fn to_header_value(self) -> &'static str {
        match self {
            Self::Revalidate => "private, max-age=0, must-revalidate",
            Self::NoStore => "no-store",
        }
    }
}

/// Check the client's `If-Modified-Since` against the computed `Last-Modified`
///
/// The header is treated as an opaque tag echoed back by the browser, nginx
/// style: only an exact string match counts, there is no date arithmetic.
pub fn is_not_modified(if_modified_since: Option<&str>, last_modified: &str) -> bool {
    if_modified_since.is_some_and(|since| since == last_modified)
}
