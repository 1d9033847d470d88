//! Request dispatch: resolves the handler for a request's type, folds the
//! registered behaviors around it and runs the chain once.

use std::sync::Arc;

use async_trait::async_trait;
use courier_core::{
    CancellationToken, DispatchError, DispatchResult, Next, PipelineBehavior, Request,
    RequestHandler, ServiceProvider,
};
use tracing::debug;

use crate::builder::MediatorBuilder;
use crate::cache::{ResolutionCache, Route};
use crate::config::{AmbiguityPolicy, MediatorConfig};

// ---------------------------------------------------------------------------
// RequestSender trait
// ---------------------------------------------------------------------------

/// Anything that can send a request to its handler.
#[async_trait]
pub trait RequestSender: Send + Sync {
    /// Dispatch `request` and return its handler's response.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::HandlerNotFound` (or `AmbiguousHandler`) when
    /// the request type cannot be routed, otherwise whatever the chain
    /// returned.
    async fn send<R: Request>(
        &self,
        request: R,
        cancel: CancellationToken,
    ) -> DispatchResult<R::Response>;
}

// ---------------------------------------------------------------------------
// Mediator
// ---------------------------------------------------------------------------

/// The dispatcher.
///
/// Stateless per call: the only shared mutable state is the resolution cache.
/// Cloning is cheap and clones share provider, cache and config.
#[derive(Clone)]
pub struct Mediator {
    provider: Arc<dyn ServiceProvider>,
    cache: Arc<ResolutionCache>,
    config: Arc<MediatorConfig>,
}

impl Mediator {
    /// Creates a mediator over `provider` with the default configuration.
    #[must_use]
    pub fn new(provider: Arc<dyn ServiceProvider>) -> Self {
        Self::with_config(provider, MediatorConfig::default())
    }

    /// Creates a mediator over `provider`. The cache is the process-wide one
    /// unless `config.shared_cache` is false.
    #[must_use]
    pub fn with_config(provider: Arc<dyn ServiceProvider>, config: MediatorConfig) -> Self {
        let cache = if config.shared_cache {
            ResolutionCache::global()
        } else {
            Arc::new(ResolutionCache::new())
        };
        Self::with_cache(provider, config, cache)
    }

    /// Creates a mediator using an explicit resolution cache.
    #[must_use]
    pub fn with_cache(
        provider: Arc<dyn ServiceProvider>,
        config: MediatorConfig,
        cache: Arc<ResolutionCache>,
    ) -> Self {
        Self {
            provider,
            cache,
            config: Arc::new(config),
        }
    }

    /// Starts a builder that owns an in-memory registry.
    #[must_use]
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::new()
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    #[must_use]
    pub fn config(&self) -> &MediatorConfig {
        &self.config
    }

    /// Send `request` through its behaviors to its handler.
    ///
    /// Resolution happens before anything user-supplied runs; the composed
    /// chain is then awaited exactly once and its outcome returned as is.
    /// `cancel` is handed to every behavior and to the handler; the mediator
    /// never checks it.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::HandlerNotFound` when no handler is registered
    /// for `R`, `DispatchError::AmbiguousHandler` when several are and the
    /// policy is [`AmbiguityPolicy::Reject`], otherwise whatever error a
    /// behavior or the handler produced.
    pub async fn send<R: Request>(
        &self,
        request: R,
        cancel: CancellationToken,
    ) -> DispatchResult<R::Response> {
        let chain = self.compose::<R>(cancel)?;
        chain.run(request).await
    }

    /// Resolve the handler and behaviors for `R` and fold them into a single
    /// continuation without running it.
    ///
    /// Behaviors are folded in reverse registration order, so the first
    /// registered ends up outermost: it is entered first and exited last.
    ///
    /// # Errors
    ///
    /// Same resolution errors as [`Mediator::send`], plus
    /// `DispatchError::ContractMismatch` when a registered component does not
    /// implement the contract it is registered under.
    pub fn compose<R: Request>(&self, cancel: CancellationToken) -> DispatchResult<Next<R>> {
        let route = self.cache.route::<R>();
        let handler = self.resolve_handler(&route)?;
        let behaviors = self.resolve_behaviors(&route)?;

        let mut chain = Next::handler(handler, cancel.clone());
        for behavior in behaviors.into_iter().rev() {
            chain = Next::behavior(behavior, chain, cancel.clone());
        }
        Ok(chain)
    }

    fn resolve_handler<R: Request>(
        &self,
        route: &Route<R>,
    ) -> DispatchResult<Arc<dyn RequestHandler<R>>> {
        let key = route.handler_key();
        let component = match self.config.ambiguity {
            AmbiguityPolicy::Reject => self.provider.resolve_one(key)?,
            AmbiguityPolicy::First => self.provider.resolve_all(key).into_iter().next(),
            AmbiguityPolicy::Last => self.provider.resolve_all(key).pop(),
        };

        let Some(component) = component else {
            debug!(request_type = key.request_name(), "no handler registered");
            return Err(DispatchError::HandlerNotFound {
                request_type: key.request_name(),
            });
        };

        route
            .handler(&component)
            .ok_or_else(|| DispatchError::ContractMismatch {
                contract: key.to_string(),
            })
    }

    fn resolve_behaviors<R: Request>(
        &self,
        route: &Route<R>,
    ) -> DispatchResult<Vec<Arc<dyn PipelineBehavior<R>>>> {
        let key = route.behavior_key();
        self.provider
            .resolve_all(key)
            .iter()
            .map(|component| {
                route
                    .behavior(component)
                    .ok_or_else(|| DispatchError::ContractMismatch {
                        contract: key.to_string(),
                    })
            })
            .collect()
    }
}

#[async_trait]
impl RequestSender for Mediator {
    async fn send<R: Request>(
        &self,
        request: R,
        cancel: CancellationToken,
    ) -> DispatchResult<R::Response> {
        Mediator::send(self, request, cancel).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
