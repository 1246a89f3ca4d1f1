//! HTTP protocol layer module
//!
//! Protocol helpers decoupled from the build-serving logic: media types,
//! HTTP dates, range parsing, cache validation and response builders.

pub mod cache;
pub mod date;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{parse_range_header, ByteRange};
pub use response::{
    build_304_response, build_400_response, build_404_response, build_416_response,
    build_redirect_response, ServeBody,
};
