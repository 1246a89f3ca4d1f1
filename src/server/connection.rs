// Connection handling module
// Serves one TCP connection with the build-serving middleware and writes access logs

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use hyper::body::Incoming;
use hyper::header::{HeaderName, CONTENT_LENGTH, REFERER, USER_AGENT};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, Version};
use hyper_util::rt::{TokioIo, TokioTimer};

use crate::build::BuildSource;
use crate::config::Config;
use crate::handler::{Fallback, Outcome, RequestContext, ServeBuild};
use crate::http::ServeBody;
use crate::logger::{self, AccessLogEntry};

/// Per-connection settings, fixed at startup
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub keep_alive: bool,
    /// Time allowed to receive a request's headers; zero disables it
    pub header_read_timeout: Duration,
    pub access_log: bool,
    pub access_log_format: String,
}

impl ConnectionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            keep_alive: config.performance.keep_alive,
            header_read_timeout: Duration::from_secs(config.performance.header_read_timeout),
            access_log: config.logging.access_log,
            access_log_format: config.logging.access_log_format.clone(),
        }
    }
}

/// Serve a connection in its own task, tracking it in `active`
pub fn handle_connection<S, F>(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    handler: Arc<ServeBuild<S, F>>,
    settings: Arc<ConnectionSettings>,
    active: Arc<AtomicUsize>,
) where
    S: BuildSource,
    F: Fallback,
{
    active.fetch_add(1, Ordering::SeqCst);

    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let mut builder = http1::Builder::new();
        builder.keep_alive(settings.keep_alive);
        builder.timer(TokioTimer::new());
        builder.header_read_timeout(
            (!settings.header_read_timeout.is_zero()).then_some(settings.header_read_timeout),
        );

        let service_settings = Arc::clone(&settings);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let handler = Arc::clone(&handler);
                let settings = Arc::clone(&service_settings);
                async move {
                    Ok::<_, Infallible>(serve_request(&handler, req, peer_addr, &settings).await)
                }
            }),
        );

        match conn.await {
            Ok(()) => {}
            // A lenient range response ends short of its Content-Length
            Err(err) if err.is_body_write_aborted() => {
                logger::log_debug(&format!("Closed connection from {peer_addr} after a short body"));
            }
            Err(err) if err.is_timeout() => {
                logger::log_debug(&format!("Header read from {peer_addr} timed out"));
            }
            Err(err) => logger::log_connection_error(&err),
        }

        active.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Answer one request and record it in the access log
async fn serve_request<S: BuildSource, F: Fallback>(
    handler: &ServeBuild<S, F>,
    req: Request<Incoming>,
    peer_addr: SocketAddr,
    settings: &ConnectionSettings,
) -> Response<ServeBody> {
    let started = Instant::now();
    let ctx = RequestContext::from_request(&req);
    let entry = settings.access_log.then(|| request_entry(&req, peer_addr));
    drop(req);

    let response = handler.handle(&ctx).await;

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        entry.outcome = response.extensions().get::<Outcome>().map_or("-", |o| o.0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &settings.access_log_format);
    }

    response
}

fn request_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let header = |name: HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri()
            .path_and_query()
            .map_or_else(|| req.uri().path().to_string(), ToString::to_string),
    );
    entry.http_version = match req.version() {
        Version::HTTP_10 => "1.0",
        _ => "1.1",
    }
    .to_string();
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry
}
