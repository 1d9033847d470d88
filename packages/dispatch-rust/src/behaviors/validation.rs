//! Request validation ahead of the handler.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use courier_core::{
    CancellationToken, DispatchError, DispatchResult, Next, PipelineBehavior, Request,
};

/// A request that can check its own fields before dispatch.
pub trait Validate {
    /// Returns the reason the request is rejected, if any.
    ///
    /// # Errors
    ///
    /// A human-readable reason when the request must not reach its handler.
    fn validate(&self) -> Result<(), String>;
}

/// Typed behavior that rejects invalid requests with
/// [`DispatchError::Validation`] without calling the rest of the chain.
pub struct ValidationBehavior<R> {
    _request: PhantomData<fn(R)>,
}

impl<R> ValidationBehavior<R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _request: PhantomData,
        }
    }
}

impl<R> Default for ValidationBehavior<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for ValidationBehavior<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationBehavior")
            .field("request", &type_name::<R>())
            .finish()
    }
}

#[async_trait]
impl<R> PipelineBehavior<R> for ValidationBehavior<R>
where
    R: Request + Validate,
{
    async fn handle(
        &self,
        request: R,
        next: Next<R>,
        _cancel: CancellationToken,
    ) -> DispatchResult<R::Response> {
        if let Err(reason) = request.validate() {
            tracing::debug!(request_type = type_name::<R>(), %reason, "request rejected");
            return Err(DispatchError::Validation {
                request_type: type_name::<R>(),
                reason,
            });
        }
        next.run(request).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
