//! Pipeline behaviors: cross-cutting wrappers around a handler.
//!
//! Two flavours exist:
//! - [`PipelineBehavior<R>`]: typed, registered for one request type.
//! - [`UniversalBehavior`]: type-erased, registered once and applied to every
//!   request type. [`universal`] adapts it into a `PipelineBehavior<R>`.

use std::any::{type_name, Any};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{DispatchError, DispatchResult};
use crate::next::{BoxFuture, Next};
use crate::request::{Request, RequestInfo};

// ---------------------------------------------------------------------------
// Typed behaviors
// ---------------------------------------------------------------------------

/// A cross-cutting wrapper invoked around the handler of `R` and around any
/// behaviors further inward.
#[async_trait]
pub trait PipelineBehavior<R: Request>: Send + Sync {
    async fn handle(
        &self,
        request: R,
        next: Next<R>,
        cancel: CancellationToken,
    ) -> DispatchResult<R::Response>;
}

/// Behavior backed by an async closure. Built with [`behavior_fn`].
pub struct BehaviorFn<R, F> {
    f: F,
    _request: PhantomData<fn(R)>,
}

/// Adapts `Fn(R, Next<R>, CancellationToken) -> impl Future` into a
/// [`PipelineBehavior`].
pub fn behavior_fn<R, F, Fut>(f: F) -> BehaviorFn<R, F>
where
    R: Request,
    F: Fn(R, Next<R>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DispatchResult<R::Response>> + Send + 'static,
{
    BehaviorFn {
        f,
        _request: PhantomData,
    }
}

#[async_trait]
impl<R, F, Fut> PipelineBehavior<R> for BehaviorFn<R, F>
where
    R: Request,
    F: Fn(R, Next<R>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DispatchResult<R::Response>> + Send + 'static,
{
    async fn handle(
        &self,
        request: R,
        next: Next<R>,
        cancel: CancellationToken,
    ) -> DispatchResult<R::Response> {
        (self.f)(request, next, cancel).await
    }
}

// ---------------------------------------------------------------------------
// Universal behaviors
// ---------------------------------------------------------------------------

/// Type-erased response flowing through a [`UniversalBehavior`].
pub type AnyResponse = Box<dyn Any + Send>;

/// Continuation handed to a [`UniversalBehavior`]. The request is already
/// bound; running it yields the inner response boxed.
pub struct ErasedNext {
    link: Box<dyn FnOnce() -> BoxFuture<'static, DispatchResult<AnyResponse>> + Send>,
}

impl ErasedNext {
    fn bind<R: Request>(next: Next<R>, request: R) -> Self {
        Self {
            link: Box::new(move || -> BoxFuture<'static, DispatchResult<AnyResponse>> {
                Box::pin(async move {
                    let response = next.run(request).await?;
                    Ok(Box::new(response) as AnyResponse)
                })
            }),
        }
    }

    /// Runs the remainder of the chain.
    ///
    /// # Errors
    ///
    /// Returns whatever error the next behavior or the handler produced.
    pub async fn run(self) -> DispatchResult<AnyResponse> {
        (self.link)().await
    }
}

/// A behavior that applies to every request type.
///
/// It sees only a [`RequestInfo`] and must return the response it got from
/// `next` (or a value of the same type).
#[async_trait]
pub trait UniversalBehavior: Send + Sync {
    async fn handle(
        &self,
        info: RequestInfo,
        next: ErasedNext,
        cancel: CancellationToken,
    ) -> DispatchResult<AnyResponse>;
}

struct Universal<R> {
    inner: Arc<dyn UniversalBehavior>,
    _request: PhantomData<fn(R)>,
}

#[async_trait]
impl<R: Request> PipelineBehavior<R> for Universal<R> {
    async fn handle(
        &self,
        request: R,
        next: Next<R>,
        cancel: CancellationToken,
    ) -> DispatchResult<R::Response> {
        let next = ErasedNext::bind(next, request);
        let response = self.inner.handle(RequestInfo::of::<R>(), next, cancel).await?;
        response
            .downcast::<R::Response>()
            .map(|response| *response)
            .map_err(|_| DispatchError::ResponseMismatch {
                response_type: type_name::<R::Response>(),
            })
    }
}

/// Views a universal behavior as a typed behavior for `R`.
#[must_use]
pub fn universal<R: Request>(behavior: Arc<dyn UniversalBehavior>) -> Arc<dyn PipelineBehavior<R>> {
    Arc::new(Universal {
        inner: behavior,
        _request: PhantomData,
    })
}
