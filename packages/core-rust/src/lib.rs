//! Courier Core: request, handler and pipeline behavior contracts for
//! in-process request dispatch.

pub mod behavior;
pub mod contract;
pub mod error;
pub mod handler;
pub mod next;
pub mod provider;
pub mod request;

pub use behavior::{
    behavior_fn, universal, AnyResponse, BehaviorFn, ErasedNext, PipelineBehavior,
    UniversalBehavior,
};
pub use contract::{ContractKey, ContractKind};
pub use error::{DispatchError, DispatchResult};
pub use handler::{handler_fn, HandlerFn, RequestHandler};
pub use next::{BoxFuture, Next};
pub use provider::{Component, RegistryError, ServiceProvider};
pub use request::{Request, RequestInfo};
pub use tokio_util::sync::CancellationToken;

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }
}
