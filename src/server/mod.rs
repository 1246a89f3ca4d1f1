// Server module entry point
// Listener setup, the accept loop, per-connection serving and signal handling

pub mod connection;
pub mod listener;
pub mod signal;

pub use connection::{handle_connection, ConnectionSettings};
pub use listener::create_reusable_listener;
pub use signal::{start_signal_handler, SignalHandler};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::build::BuildSource;
use crate::handler::{Fallback, ServeBuild};
use crate::logger;

/// Accept connections until shutdown is requested
///
/// Connections already in flight keep running on their own tasks.
pub async fn run<S, F>(
    listener: TcpListener,
    handler: Arc<ServeBuild<S, F>>,
    settings: ConnectionSettings,
    signals: Arc<SignalHandler>,
) where
    S: BuildSource,
    F: Fallback,
{
    let settings = Arc::new(settings);
    let active = Arc::new(AtomicUsize::new(0));

    while !signals.is_shutdown_requested() {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    logger::log_debug(&format!("Accepted connection from {peer_addr}"));
                    handle_connection(
                        stream,
                        peer_addr,
                        Arc::clone(&handler),
                        Arc::clone(&settings),
                        Arc::clone(&active),
                    );
                }
                Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
            },
            () = signals.shutdown.notified() => break,
        }
    }

    logger::log_info(&format!(
        "Stopped accepting connections ({} still open)",
        active.load(Ordering::SeqCst)
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{BuildCoordinator, StaticOutput};
    use crate::handler::ServeOptions;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn settings() -> ConnectionSettings {
        ConnectionSettings {
            keep_alive: false,
            header_read_timeout: Duration::from_secs(5),
            access_log: false,
            access_log_format: "combined".to_string(),
        }
    }

    async fn fetch_bytes(addr: std::net::SocketAddr, request: &str) -> Vec<u8> {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        raw
    }

    async fn fetch(addr: std::net::SocketAddr, request: &str) -> String {
        String::from_utf8_lossy(&fetch_bytes(addr, request).await).into_owned()
    }

    /// Lowercased head and raw body of a response read to EOF
    fn split_response(raw: &[u8]) -> (String, &[u8]) {
        let end = raw.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
        let head = String::from_utf8_lossy(&raw[..end]).to_lowercase();
        (head, &raw[end + 4..])
    }

    fn start<S: BuildSource>(
        source: S,
        settings: ConnectionSettings,
    ) -> (std::net::SocketAddr, Arc<SignalHandler>, tokio::task::JoinHandle<()>) {
        let handler = Arc::new(ServeBuild::new(source, ServeOptions::default()));
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let signals = Arc::new(SignalHandler::new());
        let server = tokio::spawn(run(listener, handler, settings, Arc::clone(&signals)));
        (addr, signals, server)
    }

    #[tokio::test]
    async fn test_serves_build_over_tcp_and_stops() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("index.html"), "<p>hello</p>").unwrap();

        let coordinator = BuildCoordinator::new();
        let handler = Arc::new(ServeBuild::new(coordinator.clone(), ServeOptions::default()));
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let signals = Arc::new(SignalHandler::new());

        let server = tokio::spawn(run(listener, handler, settings(), Arc::clone(&signals)));

        let request = "GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n";
        let pending = tokio::spawn(fetch(addr, request));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        coordinator.complete(Ok(tmp.path().to_path_buf()));
        let raw = pending.await.unwrap();
        assert!(raw.starts_with("HTTP/1.1 200 OK"), "{raw}");
        assert!(raw.ends_with("<p>hello</p>"));

        let raw = fetch(addr, "GET /../etc/passwd HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
        assert!(raw.starts_with("HTTP/1.1 400"), "{raw}");

        signals.request_shutdown();
        tokio::time::timeout(Duration::from_secs(1), server)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_lenient_range_slice_reaches_client() {
        let tmp = tempfile::tempdir().unwrap();
        let media: Vec<u8> = (0..500u32).map(|i| (i % 256) as u8).collect();
        std::fs::write(tmp.path().join("clip.mp4"), &media).unwrap();
        let (addr, signals, server) = start(StaticOutput(tmp.path().to_path_buf()), settings());

        let raw = fetch_bytes(
            addr,
            "GET /clip.mp4 HTTP/1.1\r\nHost: localhost\r\nRange: bytes=0-99\r\n\r\n",
        )
        .await;
        let (head, body) = split_response(&raw);
        assert!(head.starts_with("http/1.1 206"), "{head}");
        assert!(head.contains("content-length: 500"), "{head}");
        assert!(head.contains("content-range: bytes 0-99/500"), "{head}");
        assert_eq!(body, &media[..100]);

        let raw = fetch_bytes(
            addr,
            "GET /clip.mp4 HTTP/1.1\r\nHost: localhost\r\nRange: bytes=100-\r\n\r\n",
        )
        .await;
        let (head, body) = split_response(&raw);
        assert!(head.contains("content-range: bytes 100-499/500"), "{head}");
        assert_eq!(body, &media[100..]);

        signals.request_shutdown();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_build_wait_is_not_cut_by_header_timeout() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("index.html"), "<p>late</p>").unwrap();
        let coordinator = BuildCoordinator::new();
        let settings = ConnectionSettings {
            header_read_timeout: Duration::from_millis(100),
            ..settings()
        };
        let (addr, signals, server) = start(coordinator.clone(), settings);

        let request = "GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let pending = tokio::spawn(fetch(addr, request));
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!pending.is_finished());

        coordinator.complete(Ok(tmp.path().to_path_buf()));
        let raw = tokio::time::timeout(Duration::from_secs(2), pending)
            .await
            .unwrap()
            .unwrap();
        assert!(raw.starts_with("HTTP/1.1 200 OK"), "{raw}");
        assert!(raw.ends_with("<p>late</p>"));

        signals.request_shutdown();
        server.await.unwrap();
    }
}
