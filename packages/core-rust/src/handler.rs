use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::DispatchResult;
use crate::request::Request;

/// The unique implementation of a request type's operation.
///
/// Handlers own cancellation: the dispatcher passes `cancel` through untouched
/// and never enforces it.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    async fn handle(&self, request: R, cancel: CancellationToken) -> DispatchResult<R::Response>;
}

/// Handler backed by an async closure. Built with [`handler_fn`].
pub struct HandlerFn<R, F> {
    f: F,
    _request: PhantomData<fn(R)>,
}

/// Adapts `Fn(R, CancellationToken) -> impl Future` into a [`RequestHandler`].
pub fn handler_fn<R, F, Fut>(f: F) -> HandlerFn<R, F>
where
    R: Request,
    F: Fn(R, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DispatchResult<R::Response>> + Send + 'static,
{
    HandlerFn {
        f,
        _request: PhantomData,
    }
}

#[async_trait]
impl<R, F, Fut> RequestHandler<R> for HandlerFn<R, F>
where
    R: Request,
    F: Fn(R, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DispatchResult<R::Response>> + Send + 'static,
{
    async fn handle(&self, request: R, cancel: CancellationToken) -> DispatchResult<R::Response> {
        (self.f)(request, cancel).await
    }
}
