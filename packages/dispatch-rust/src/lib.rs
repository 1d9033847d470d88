//! Courier dispatcher: routes a request to the single handler registered for
//! its type, through the ordered behaviors registered for it.

pub mod behaviors;
pub mod builder;
pub mod cache;
pub mod config;
pub mod mediator;
pub mod registry;
pub mod service;

pub use behaviors::{CancellationBehavior, TracingBehavior, Validate, ValidationBehavior};
pub use builder::MediatorBuilder;
pub use cache::{ResolutionCache, Route};
pub use config::{AmbiguityPolicy, MediatorConfig};
pub use mediator::{Mediator, RequestSender};
pub use registry::HandlerRegistry;
pub use service::SendService;

pub use courier_core::{
    behavior_fn, handler_fn, universal, AnyResponse, CancellationToken, DispatchError,
    DispatchResult, ErasedNext, Next, PipelineBehavior, Request, RequestHandler, RequestInfo,
    ServiceProvider, UniversalBehavior,
};
