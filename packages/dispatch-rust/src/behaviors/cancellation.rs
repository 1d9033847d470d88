//! Cancellation behavior.
//!
//! Fails the send with `DispatchError::Cancelled` when the token is already
//! triggered on entry or fires before the inner links finish.

use async_trait::async_trait;
use courier_core::{
    AnyResponse, CancellationToken, DispatchError, DispatchResult, ErasedNext, RequestInfo,
    UniversalBehavior,
};

/// Universal behavior that honors the cancellation token on behalf of the
/// links inside it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CancellationBehavior;

#[async_trait]
impl UniversalBehavior for CancellationBehavior {
    async fn handle(
        &self,
        info: RequestInfo,
        next: ErasedNext,
        cancel: CancellationToken,
    ) -> DispatchResult<AnyResponse> {
        if cancel.is_cancelled() {
            tracing::debug!(request_type = info.request_type, "cancelled before dispatch");
            return Err(DispatchError::Cancelled);
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(request_type = info.request_type, "cancelled during dispatch");
                Err(DispatchError::Cancelled)
            }
            result = next.run() => result,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
