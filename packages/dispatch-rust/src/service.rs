//! `tower::Service` view of a mediator for a single request type.

use std::fmt;
use std::marker::PhantomData;
use std::task::{Context, Poll};

use courier_core::{BoxFuture, CancellationToken, DispatchError, DispatchResult, Request};
use tower::Service;

use crate::mediator::Mediator;

/// Sends every request it is called with through a [`Mediator`].
///
/// Always ready. Each call gets a clone of the token the service was built
/// with.
pub struct SendService<R> {
    mediator: Mediator,
    cancel: CancellationToken,
    _request: PhantomData<fn(R)>,
}

impl Mediator {
    /// A `tower::Service<R>` that dispatches through this mediator.
    #[must_use]
    pub fn service<R: Request>(&self, cancel: CancellationToken) -> SendService<R> {
        SendService {
            mediator: self.clone(),
            cancel,
            _request: PhantomData,
        }
    }
}

impl<R> Clone for SendService<R> {
    fn clone(&self) -> Self {
        Self {
            mediator: self.mediator.clone(),
            cancel: self.cancel.clone(),
            _request: PhantomData,
        }
    }
}

impl<R> fmt::Debug for SendService<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendService")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<R: Request> Service<R> for SendService<R> {
    type Response = R::Response;
    type Error = DispatchError;
    type Future = BoxFuture<'static, DispatchResult<R::Response>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: R) -> Self::Future {
        let mediator = self.mediator.clone();
        let cancel = self.cancel.clone();
        Box::pin(async move { mediator.send(request, cancel).await })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use courier_core::handler_fn;
    use tower::{ServiceBuilder, ServiceExt};

    use super::*;
    use crate::config::MediatorConfig;

    struct Square(u32);
    impl Request for Square {
        type Response = u32;
    }

    struct Orphan;
    impl Request for Orphan {
        type Response = ();
    }

    fn mediator() -> Mediator {
        Mediator::builder()
            .config(MediatorConfig {
                shared_cache: false,
                ..MediatorConfig::default()
            })
            .handler(handler_fn(|req: Square, _cancel| async move { Ok(req.0 * req.0) }))
            .build()
    }

    #[tokio::test]
    async fn oneshot_dispatches_through_mediator() {
        let svc = mediator().service::<Square>(CancellationToken::new());
        let resp = svc.oneshot(Square(7)).await.unwrap();
        assert_eq!(resp, 49);
    }

    #[tokio::test]
    async fn unroutable_request_surfaces_dispatch_error() {
        let svc = mediator().service::<Orphan>(CancellationToken::new());
        let err = svc.oneshot(Orphan).await.unwrap_err();
        assert!(matches!(err, DispatchError::HandlerNotFound { .. }));
    }

    #[tokio::test]
    async fn composes_with_tower_layers() {
        let mut svc = ServiceBuilder::new()
            .concurrency_limit(4)
            .service(mediator().service::<Square>(CancellationToken::new()));

        let resp = ServiceExt::ready(&mut svc)
            .await
            .unwrap()
            .call(Square(3))
            .await
            .unwrap();
        assert_eq!(resp, 9);
    }

    #[tokio::test]
    async fn service_token_reaches_the_handler() {
        let mediator = Mediator::builder()
            .config(MediatorConfig {
                shared_cache: false,
                ..MediatorConfig::default()
            })
            .handler(handler_fn(|req: Square, cancel: CancellationToken| async move {
                tokio::select! {
                    () = cancel.cancelled() => Err(DispatchError::Cancelled),
                    () = tokio::time::sleep(Duration::from_secs(60)) => Ok(req.0),
                }
            }))
            .build();

        let cancel = CancellationToken::new();
        let svc = mediator.service::<Square>(cancel.clone());
        let call = tokio::spawn(svc.oneshot(Square(2)));
        cancel.cancel();

        let err = call.await.unwrap().unwrap_err();
        assert!(matches!(err, DispatchError::Cancelled));
    }
}
