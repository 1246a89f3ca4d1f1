//! Development server middleware that serves the output of an in-progress build
//!
//! Requests wait for the current build, are resolved safely inside its output
//! directory and answered with a file, a byte range, a directory listing or the
//! build's error page.

pub mod build;
pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod templates;
