//! The continuation passed to each behavior.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::behavior::PipelineBehavior;
use crate::error::DispatchResult;
use crate::handler::RequestHandler;
use crate::request::Request;

/// Boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type Link<R> =
    Box<dyn FnOnce(R) -> BoxFuture<'static, DispatchResult<<R as Request>::Response>> + Send>;

/// One-shot handle to the rest of the chain.
///
/// A behavior proceeds by calling [`Next::run`] with the (possibly replaced)
/// request, or short-circuits by dropping it.
pub struct Next<R: Request> {
    link: Link<R>,
}

impl<R: Request> Next<R> {
    /// Wraps an arbitrary async step as a continuation.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce(R) -> Fut + Send + 'static,
        Fut: Future<Output = DispatchResult<R::Response>> + Send + 'static,
    {
        Self {
            link: Box::new(
                move |request: R| -> BoxFuture<'static, DispatchResult<R::Response>> {
                    Box::pin(f(request))
                },
            ),
        }
    }

    /// Innermost link: invokes the handler with the request and `cancel`.
    #[must_use]
    pub fn handler(handler: Arc<dyn RequestHandler<R>>, cancel: CancellationToken) -> Self {
        Self::new(move |request| async move { handler.handle(request, cancel).await })
    }

    /// Wrapping link: invokes `behavior` with the request, `next` and `cancel`.
    #[must_use]
    pub fn behavior(
        behavior: Arc<dyn PipelineBehavior<R>>,
        next: Next<R>,
        cancel: CancellationToken,
    ) -> Self {
        Self::new(move |request| async move { behavior.handle(request, next, cancel).await })
    }

    /// Runs the remainder of the chain.
    ///
    /// # Errors
    ///
    /// Returns whatever error the next behavior or the handler produced.
    pub async fn run(self, request: R) -> DispatchResult<R::Response> {
        (self.link)(request).await
    }
}

impl<R: Request> fmt::Debug for Next<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}
