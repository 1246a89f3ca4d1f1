//! Build coordination module
//!
//! The handler never drives a build itself. It asks a [`BuildSource`] for the
//! outcome of the current build once per request and either serves from the
//! returned output root or renders the returned [`BuildError`].

pub mod command;
mod coordinator;

pub use coordinator::{BuildCoordinator, BuildState};

use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a build, rendered on the error page
#[derive(Debug, Clone, Error, Serialize)]
#[error("build failed: {message}")]
pub struct BuildError {
    /// One-line summary
    pub message: String,
    /// Human-readable trace (compiler output, stack)
    pub stack: String,
    /// Optional structured detail for the error template
    pub payload: Option<serde_json::Value>,
}

impl BuildError {
    pub fn new(message: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: stack.into(),
            payload: None,
        }
    }

    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Asynchronous producer of build results
///
/// `await_build` suspends until the in-flight build (if any) settles. Many
/// requests may wait at once; implementations fan the single outcome out to
/// all of them instead of building per request.
pub trait BuildSource: Send + Sync + 'static {
    fn await_build(&self) -> impl Future<Output = Result<PathBuf, BuildError>> + Send;
}

/// Prebuilt output directory that is always ready
#[derive(Debug, Clone)]
pub struct StaticOutput(pub PathBuf);

impl BuildSource for StaticOutput {
    async fn await_build(&self) -> Result<PathBuf, BuildError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_output_is_always_ready() {
        let source = StaticOutput(PathBuf::from("/srv/dist"));
        assert_eq!(source.await_build().await.unwrap(), PathBuf::from("/srv/dist"));
        assert_eq!(source.await_build().await.unwrap(), PathBuf::from("/srv/dist"));
    }

    #[test]
    fn test_build_error_display() {
        let err = BuildError::new("syntax error in app.js", "at line 3")
            .with_payload(serde_json::json!({ "file": "app.js" }));
        assert_eq!(err.to_string(), "build failed: syntax error in app.js");
        assert_eq!(err.payload.unwrap()["file"], "app.js");
    }
}
