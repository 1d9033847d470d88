//! Fluent registration facade over an in-memory [`HandlerRegistry`].

use std::sync::Arc;

use courier_core::{PipelineBehavior, Request, RequestHandler, UniversalBehavior};

use crate::config::{AmbiguityPolicy, MediatorConfig};
use crate::mediator::Mediator;
use crate::registry::HandlerRegistry;

/// Collects handlers, behaviors and configuration, then builds a [`Mediator`].
///
/// ```ignore
/// let mediator = Mediator::builder()
///     .handler(handler_fn(|_: Ping, _| async { Ok("pong".to_string()) }))
///     .universal_behavior(TracingBehavior)
///     .build();
/// ```
#[derive(Default)]
pub struct MediatorBuilder {
    registry: HandlerRegistry,
    config: MediatorConfig,
}

impl MediatorBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: MediatorConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn ambiguity(mut self, policy: AmbiguityPolicy) -> Self {
        self.config.ambiguity = policy;
        self
    }

    #[must_use]
    pub fn handler<R, H>(self, handler: H) -> Self
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        self.registry.register_handler(handler);
        self
    }

    /// Add a behavior for `R`. Earlier calls wrap later ones.
    #[must_use]
    pub fn behavior<R, B>(self, behavior: B) -> Self
    where
        R: Request,
        B: PipelineBehavior<R> + 'static,
    {
        self.registry.register_behavior(behavior);
        self
    }

    /// Add a behavior for every request type, ordered with the typed ones.
    #[must_use]
    pub fn universal_behavior<B: UniversalBehavior + 'static>(self, behavior: B) -> Self {
        self.registry.register_universal_behavior(behavior);
        self
    }

    /// Builds the mediator. The registry stays reachable through
    /// [`MediatorBuilder::build_with_registry`] for late registrations.
    #[must_use]
    pub fn build(self) -> Mediator {
        self.build_with_registry().0
    }

    /// Builds the mediator and returns the registry it reads from.
    #[must_use]
    pub fn build_with_registry(self) -> (Mediator, Arc<HandlerRegistry>) {
        let registry = Arc::new(self.registry);
        let mediator = Mediator::with_config(registry.clone(), self.config);
        (mediator, registry)
    }
}

#[cfg(test)]
mod tests {
    use courier_core::{behavior_fn, handler_fn, CancellationToken, DispatchError, Next};

    use super::*;

    struct Ping;
    impl Request for Ping {
        type Response = String;
    }

    struct Late;
    impl Request for Late {
        type Response = u8;
    }

    fn private() -> MediatorConfig {
        MediatorConfig {
            shared_cache: false,
            ..MediatorConfig::default()
        }
    }

    #[tokio::test]
    async fn builds_a_working_mediator() {
        let mediator = MediatorBuilder::new()
            .config(private())
            .handler(handler_fn(|_req: Ping, _cancel| async move { Ok("pong".to_string()) }))
            .behavior(behavior_fn(|req: Ping, next: Next<Ping>, _cancel| async move {
                next.run(req).await.map(|resp| format!("<{resp}>"))
            }))
            .build();

        let resp = mediator.send(Ping, CancellationToken::new()).await.unwrap();
        assert_eq!(resp, "<pong>");
    }

    #[tokio::test]
    async fn ambiguity_setting_reaches_the_mediator() {
        let mediator = Mediator::builder()
            .config(private())
            .ambiguity(AmbiguityPolicy::Last)
            .handler(handler_fn(|_req: Late, _cancel| async move { Ok(1) }))
            .handler(handler_fn(|_req: Late, _cancel| async move { Ok(2) }))
            .build();

        assert_eq!(mediator.config().ambiguity, AmbiguityPolicy::Last);
        assert_eq!(mediator.send(Late, CancellationToken::new()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn late_registrations_are_visible() {
        let (mediator, registry) = MediatorBuilder::new().config(private()).build_with_registry();

        let err = mediator.send(Late, CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, DispatchError::HandlerNotFound { .. }));

        registry.register_handler(handler_fn(|_req: Late, _cancel| async move { Ok(9) }));
        assert_eq!(mediator.send(Late, CancellationToken::new()).await.unwrap(), 9);
    }
}
