// Signal handling module
//
// - SIGHUP:  Rebuild the site
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Shutdown state shared between the signal task and the accept loop
#[derive(Debug, Default)]
pub struct SignalHandler {
    /// Woken once when shutdown is requested
    pub shutdown: Notify,
    pub shutdown_requested: AtomicBool,
}

impl SignalHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the accept loop to stop
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        // notify_one keeps a permit if the loop is not waiting right now
        self.shutdown.notify_one();
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }
}

/// Start signal handlers (Unix)
///
/// | Signal  | Action             |
/// |---------|--------------------|
/// | SIGHUP  | Rebuild            |
/// | SIGTERM | Graceful stop      |
/// | SIGINT  | Graceful stop      |
#[cfg(unix)]
pub fn start_signal_handler(handler: Arc<SignalHandler>, rebuild: Arc<Notify>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let registered = (
            signal(SignalKind::hangup()),
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        );
        let (mut sighup, mut sigterm, mut sigint) = match registered {
            (Ok(hup), Ok(term), Ok(int)) => (hup, term, int),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                logger::log_error(&format!("[SIGNAL] Failed to register handlers: {e}"));
                return;
            }
        };

        logger::log_info(&format!(
            "[SIGNAL] Handlers registered (pid {}): HUP rebuilds, TERM/INT stop",
            std::process::id()
        ));

        loop {
            tokio::select! {
                _ = sighup.recv() => {
                    logger::log_info("[SIGNAL] SIGHUP received, rebuilding");
                    rebuild.notify_one();
                }
                _ = sigterm.recv() => {
                    logger::log_info("[SIGNAL] SIGTERM received, shutting down");
                    handler.request_shutdown();
                    break;
                }
                _ = sigint.recv() => {
                    logger::log_info("[SIGNAL] SIGINT received, shutting down");
                    handler.request_shutdown();
                    break;
                }
            }
        }
    });
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(handler: Arc<SignalHandler>, _rebuild: Arc<Notify>) {
    tokio::spawn(async move {
        logger::log_info("[SIGNAL] Only Ctrl+C is supported on this platform");
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logger::log_info("[SIGNAL] Ctrl+C received, shutting down");
            handler.request_shutdown();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_request_is_not_lost() {
        let handler = SignalHandler::new();
        assert!(!handler.is_shutdown_requested());

        // Requested before anyone waits; the permit must still wake the loop
        handler.request_shutdown();
        tokio::time::timeout(std::time::Duration::from_secs(1), handler.shutdown.notified())
            .await
            .unwrap();
        assert!(handler.is_shutdown_requested());
    }
}
