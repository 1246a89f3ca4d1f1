//! Shell build runner
//!
//! Runs the configured build command, publishes each outcome through the
//! [`BuildCoordinator`] and rebuilds whenever the reload signal fires.

use super::{BuildCoordinator, BuildError, BuildState};
use crate::logger;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::process::Command;
use tokio::sync::Notify;

/// What to run and where the result lands
#[derive(Debug, Clone)]
pub struct BuildCommand {
    /// Shell command line; `None` serves `output_dir` as-is
    pub command: Option<String>,
    pub working_dir: PathBuf,
    pub output_dir: PathBuf,
}

/// Run one build and return the absolute output root
pub async fn run_build(build: &BuildCommand) -> Result<PathBuf, BuildError> {
    if let Some(command) = build.command.as_deref() {
        run_command(command, &build.working_dir).await?;
    }

    let output_dir = build.working_dir.join(&build.output_dir);
    tokio::fs::canonicalize(&output_dir).await.map_err(|e| {
        BuildError::new(
            format!("output directory '{}' is not available", output_dir.display()),
            e.to_string(),
        )
    })
}

async fn run_command(command: &str, working_dir: &Path) -> Result<(), BuildError> {
    let output = shell(command)
        .current_dir(working_dir)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| BuildError::new(format!("failed to start `{command}`"), e.to_string()))?;

    if output.status.success() {
        return Ok(());
    }

    let mut stack = String::from_utf8_lossy(&output.stderr).into_owned();
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        if !stack.is_empty() && !stack.ends_with('\n') {
            stack.push('\n');
        }
        stack.push_str(&stdout);
    }

    Err(
        BuildError::new(format!("`{command}` exited with {}", output.status), stack).with_payload(
            serde_json::json!({
                "command": command,
                "exitCode": output.status.code(),
            }),
        ),
    )
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(not(unix))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

/// Fails a still pending build when the builder task goes away
///
/// Runs on abort and on panic, so waiting requests get the error page instead
/// of hanging.
struct SettleOnExit(BuildCoordinator);

impl Drop for SettleOnExit {
    fn drop(&mut self) {
        if matches!(self.0.state(), BuildState::Pending) {
            logger::log_error("[BUILD] Build runner stopped with a build in flight");
            self.0.complete(Err(BuildError::new(
                "build runner stopped",
                "The build task exited before the build finished.",
            )));
        }
    }
}

/// Build once now, then again every time `rebuild` is notified
pub fn spawn_builder(
    coordinator: BuildCoordinator,
    build: BuildCommand,
    rebuild: Arc<Notify>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let guard = SettleOnExit(coordinator);
        let coordinator = &guard.0;
        loop {
            coordinator.begin();
            let started = Instant::now();
            let result = run_build(&build).await;

            match &result {
                Ok(root) => logger::log_info(&format!(
                    "[BUILD] Completed in {}ms, serving {}",
                    started.elapsed().as_millis(),
                    root.display()
                )),
                Err(e) => logger::log_error(&format!("[BUILD] {e}")),
            }
            coordinator.complete(result);

            rebuild.notified().await;
            logger::log_info("[BUILD] Rebuild requested");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildSource;

    fn build_in(dir: &Path, command: Option<&str>) -> BuildCommand {
        BuildCommand {
            command: command.map(ToString::to_string),
            working_dir: dir.to_path_buf(),
            output_dir: PathBuf::from("dist"),
        }
    }

    #[tokio::test]
    async fn test_no_command_serves_existing_output() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("dist")).unwrap();

        let root = run_build(&build_in(tmp.path(), None)).await.unwrap();
        assert!(root.is_absolute());
        assert!(root.ends_with("dist"));
    }

    #[tokio::test]
    async fn test_missing_output_is_a_build_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = run_build(&build_in(tmp.path(), None)).await.unwrap_err();
        assert!(err.message.contains("not available"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_creates_output() {
        let tmp = tempfile::tempdir().unwrap();
        let build = build_in(tmp.path(), Some("mkdir dist && echo hi > dist/index.html"));
        let root = run_build(&build).await.unwrap();
        assert_eq!(std::fs::read_to_string(root.join("index.html")).unwrap(), "hi\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_captures_output() {
        let tmp = tempfile::tempdir().unwrap();
        let build = build_in(tmp.path(), Some("echo 'unexpected token' >&2; exit 3"));
        let err = run_build(&build).await.unwrap_err();
        assert!(err.stack.contains("unexpected token"));
        assert_eq!(err.payload.unwrap()["exitCode"], 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_builder_publishes_and_rebuilds() {
        let tmp = tempfile::tempdir().unwrap();
        let coordinator = BuildCoordinator::new();
        let rebuild = Arc::new(Notify::new());
        let build = build_in(tmp.path(), Some("mkdir -p dist && echo run >> dist/log"));

        let handle = spawn_builder(coordinator.clone(), build, Arc::clone(&rebuild));
        let root = coordinator.await_build().await.unwrap();
        let first = std::fs::read_to_string(root.join("log")).unwrap();
        assert_eq!(first.lines().count(), 1);

        rebuild.notify_one();
        for _ in 0..100 {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            let log = std::fs::read_to_string(root.join("log")).unwrap_or_default();
            if log.lines().count() == 2 {
                handle.abort();
                return;
            }
        }
        handle.abort();
        panic!("rebuild did not run");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stopped_builder_fails_pending_build() {
        let tmp = tempfile::tempdir().unwrap();
        let coordinator = BuildCoordinator::new();
        let build = build_in(tmp.path(), Some("sleep 30"));

        let handle = spawn_builder(coordinator.clone(), build, Arc::new(Notify::new()));
        let waiter = {
            let c = coordinator.clone();
            tokio::spawn(async move { c.await_build().await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        handle.abort();
        let _ = handle.await;

        let err = tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap_err();
        assert_eq!(err.message, "build runner stopped");
    }

    #[tokio::test]
    async fn test_settled_build_survives_builder_exit() {
        let coordinator = BuildCoordinator::new();
        coordinator.complete(Ok(PathBuf::from("/srv/dist")));
        drop(SettleOnExit(coordinator.clone()));
        assert_eq!(coordinator.await_build().await.unwrap(), PathBuf::from("/srv/dist"));
    }
}
