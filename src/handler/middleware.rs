//! Request orchestration
//!
//! `AwaitingBuild -> Resolving -> {respond | delegate}`. Waiting for the build
//! is the only suspension point that depends on anything outside this request.

use super::{
    directory, error_page, file, HandlerError, Outcome, RequestContext, ResolvedTarget,
    ResponseIntent, ServeOptions,
};
use crate::build::BuildSource;
use crate::http::response::{self, empty_body, ServeBody};
use crate::logger;
use hyper::{Request, Response, StatusCode};
use std::future::Future;
use std::io;

/// Next link in the handler chain, used when a path is not ours to serve
pub trait Fallback: Send + Sync + 'static {
    /// `cause` is the stat error when the path did not exist
    fn respond(
        &self,
        ctx: &RequestContext,
        cause: Option<&io::Error>,
    ) -> impl Future<Output = Response<ServeBody>> + Send;
}

/// End of the chain: plain 404
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFoundFallback;

impl Fallback for NotFoundFallback {
    async fn respond(&self, ctx: &RequestContext, cause: Option<&io::Error>) -> Response<ServeBody> {
        if let Some(cause) = cause {
            logger::log_debug(&format!("{} not found: {cause}", ctx.path));
        }
        response::build_404_response()
    }
}

/// Serves the current build's output, delegating misses to `F`
pub struct ServeBuild<S, F = NotFoundFallback> {
    source: S,
    fallback: F,
    options: ServeOptions,
}

impl<S: BuildSource> ServeBuild<S> {
    pub const fn new(source: S, options: ServeOptions) -> Self {
        Self {
            source,
            fallback: NotFoundFallback,
            options,
        }
    }
}

impl<S: BuildSource, F: Fallback> ServeBuild<S, F> {
    /// Replace the next handler in the chain
    pub fn with_fallback<G: Fallback>(self, fallback: G) -> ServeBuild<S, G> {
        ServeBuild {
            source: self.source,
            fallback,
            options: self.options,
        }
    }

    /// Decide how to answer, without producing any bytes
    pub async fn decide(&self, ctx: &RequestContext) -> Result<ResponseIntent, HandlerError> {
        let root = match self.source.await_build().await {
            Ok(root) => root,
            Err(build_error) => return Ok(error_page::respond(&build_error, &self.options)),
        };

        let target = match super::resolve::resolve(&root, &ctx.path).await {
            Ok(target) => target,
            Err(violation) => {
                logger::log_warning(&format!("Rejected request path {}: {violation}", ctx.path));
                return Ok(ResponseIntent::BadRequest);
            }
        };

        match target {
            ResolvedTarget::NotFound(e) => Ok(ResponseIntent::Delegate(Some(e))),
            ResolvedTarget::Directory {
                path,
                trailing_slash,
            } => directory::respond(&path, trailing_slash, ctx, &self.options).await,
            ResolvedTarget::File { path, stat } => {
                file::respond(&path, &stat, ctx, &self.options).await
            }
        }
    }

    /// Answer one request; unexpected failures are logged, never propagated
    ///
    /// The response carries an [`Outcome`] extension naming the branch taken.
    pub async fn handle(&self, ctx: &RequestContext) -> Response<ServeBody> {
        let intent = match self.decide(ctx).await {
            Ok(intent) => intent,
            Err(e) => return failed(ctx, &e),
        };
        let outcome = intent.outcome();

        let mut response = match intent {
            ResponseIntent::Delegate(cause) => self.fallback.respond(ctx, cause.as_ref()).await,
            intent => match intent.into_response().await {
                Ok(response) => response,
                Err(e) => return failed(ctx, &e),
            },
        };
        response.extensions_mut().insert(Outcome(outcome));
        response
    }

    /// Convenience entry point for hyper services
    pub async fn serve<B>(&self, req: &Request<B>) -> Response<ServeBody> {
        self.handle(&RequestContext::from_request(req)).await
    }
}

/// Degraded answer for a request that failed unexpectedly
fn failed(ctx: &RequestContext, error: &HandlerError) -> Response<ServeBody> {
    logger::log_error(&format!("Failed to serve {}: {error}", ctx.url));
    let mut response = Response::new(empty_body());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.extensions_mut().insert(Outcome("failed"));
    response
}
