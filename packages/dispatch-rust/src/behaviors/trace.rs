//! Tracing behavior.
//!
//! Wraps each send in a `dispatch` span and records duration and outcome on
//! it, then emits one completion event.

use std::time::Instant;

use async_trait::async_trait;
use courier_core::{
    AnyResponse, CancellationToken, DispatchResult, ErasedNext, RequestInfo, UniversalBehavior,
};
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// Universal behavior that instruments every send with a `tracing` span.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingBehavior;

#[async_trait]
impl UniversalBehavior for TracingBehavior {
    async fn handle(
        &self,
        info: RequestInfo,
        next: ErasedNext,
        _cancel: CancellationToken,
    ) -> DispatchResult<AnyResponse> {
        let dispatch_id = Uuid::new_v4();
        let span = info_span!(
            "dispatch",
            request_type = info.request_type,
            response_type = info.response_type,
            %dispatch_id,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        async move {
            let start = Instant::now();
            let result = next.run().await;

            let outcome = match &result {
                Ok(_) => "ok",
                Err(_) => "error",
            };

            #[allow(clippy::cast_possible_truncation)]
            let duration_ms = start.elapsed().as_millis() as u64;
            tracing::Span::current().record("duration_ms", duration_ms);
            tracing::Span::current().record("outcome", outcome);

            match &result {
                Ok(_) => tracing::info!(
                    request_type = info.request_type,
                    duration_ms,
                    outcome,
                    "dispatch complete"
                ),
                Err(err) => tracing::info!(
                    request_type = info.request_type,
                    duration_ms,
                    outcome,
                    error = %err,
                    "dispatch complete"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
