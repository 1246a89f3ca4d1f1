//! Shared, lazily settling build result cell
//!
//! Backed by a `tokio::sync::watch` channel: the builder publishes state
//! transitions, each request subscribes and waits for the first settled value.

use super::{BuildError, BuildSource};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

/// Current build state as seen by waiting requests
#[derive(Debug, Clone)]
pub enum BuildState {
    /// A build is in flight
    Pending,
    /// Last build succeeded and produced this output root
    Ready(PathBuf),
    /// Last build failed
    Failed(Arc<BuildError>),
}

impl BuildState {
    const fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Build result cell shared by the builder and all request handlers
///
/// Cloning is cheap; clones observe the same state.
#[derive(Debug, Clone)]
pub struct BuildCoordinator {
    tx: Arc<watch::Sender<BuildState>>,
}

impl BuildCoordinator {
    /// Create a coordinator with a build already pending
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(BuildState::Pending);
        Self { tx: Arc::new(tx) }
    }

    /// Mark a new build as in flight; subsequent requests wait for it
    pub fn begin(&self) {
        self.tx.send_replace(BuildState::Pending);
    }

    /// Settle the in-flight build, waking every waiting request
    pub fn complete(&self, result: Result<PathBuf, BuildError>) {
        let state = match result {
            Ok(root) => BuildState::Ready(root),
            Err(err) => BuildState::Failed(Arc::new(err)),
        };
        self.tx.send_replace(state);
    }

    /// Snapshot of the current state
    pub fn state(&self) -> BuildState {
        self.tx.borrow().clone()
    }
}

impl Default for BuildCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildSource for BuildCoordinator {
    async fn await_build(&self) -> Result<PathBuf, BuildError> {
        let mut rx = self.tx.subscribe();
        let state = rx
            .wait_for(BuildState::is_settled)
            .await
            .map_err(|_| BuildError::new("build coordinator shut down", ""))?;

        match &*state {
            BuildState::Ready(root) => Ok(root.clone()),
            BuildState::Failed(err) => Err(err.as_ref().clone()),
            BuildState::Pending => Err(BuildError::new("build still pending", "")),
        }
    }
}
