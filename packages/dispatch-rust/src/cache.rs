//! Resolution cache: request type -> contract keys and invocation entry points.
//!
//! Entries are a pure function of the request type, so the cache is
//! append-only, never evicted, and a racing duplicate insert is harmless.

use std::any::{type_name, Any, TypeId};
use std::sync::{Arc, OnceLock};

use courier_core::{
    universal, Component, ContractKey, PipelineBehavior, Request, RequestHandler,
    UniversalBehavior,
};
use dashmap::DashMap;
use tracing::trace;

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

type HandlerEntry<R> = fn(&Component) -> Option<Arc<dyn RequestHandler<R>>>;
type BehaviorEntry<R> = fn(&Component) -> Option<Arc<dyn PipelineBehavior<R>>>;

/// Everything needed to dispatch request type `R` that does not depend on
/// what is registered.
pub struct Route<R: Request> {
    handler_key: ContractKey,
    behavior_key: ContractKey,
    handler_entry: HandlerEntry<R>,
    behavior_entry: BehaviorEntry<R>,
}

impl<R: Request> Route<R> {
    fn new() -> Self {
        Self {
            handler_key: ContractKey::handler::<R>(),
            behavior_key: ContractKey::behavior::<R>(),
            handler_entry: downcast_handler::<R>,
            behavior_entry: downcast_behavior::<R>,
        }
    }

    #[must_use]
    pub fn handler_key(&self) -> &ContractKey {
        &self.handler_key
    }

    #[must_use]
    pub fn behavior_key(&self) -> &ContractKey {
        &self.behavior_key
    }

    /// Views a component registered under `handler_key` as the handler for
    /// `R`. `None` if it does not implement the contract.
    #[must_use]
    pub fn handler(&self, component: &Component) -> Option<Arc<dyn RequestHandler<R>>> {
        (self.handler_entry)(component)
    }

    /// Views a component registered under `behavior_key` as a behavior for
    /// `R`, adapting universal behaviors.
    #[must_use]
    pub fn behavior(&self, component: &Component) -> Option<Arc<dyn PipelineBehavior<R>>> {
        (self.behavior_entry)(component)
    }
}

fn downcast_handler<R: Request>(component: &Component) -> Option<Arc<dyn RequestHandler<R>>> {
    component
        .downcast_ref::<Arc<dyn RequestHandler<R>>>()
        .cloned()
}

fn downcast_behavior<R: Request>(component: &Component) -> Option<Arc<dyn PipelineBehavior<R>>> {
    if let Some(behavior) = component.downcast_ref::<Arc<dyn PipelineBehavior<R>>>() {
        return Some(Arc::clone(behavior));
    }
    component
        .downcast_ref::<Arc<dyn UniversalBehavior>>()
        .map(|behavior| universal::<R>(Arc::clone(behavior)))
}

// ---------------------------------------------------------------------------
// ResolutionCache
// ---------------------------------------------------------------------------

static GLOBAL: OnceLock<Arc<ResolutionCache>> = OnceLock::new();

/// Concurrency-safe map from request `TypeId` to its `Route<R>`.
#[derive(Default)]
pub struct ResolutionCache {
    routes: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ResolutionCache {
    /// Creates an empty, private cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache shared by mediators configured with
    /// `shared_cache`.
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new())))
    }

    /// Returns the route for `R`, building and caching it on first use.
    #[must_use]
    pub fn route<R: Request>(&self) -> Arc<Route<R>> {
        let request_type = TypeId::of::<R>();
        // The shard guard is released at the end of this statement, before
        // any insert below.
        let cached = self
            .routes
            .get(&request_type)
            .map(|entry| Arc::clone(entry.value()));
        if let Some(route) = cached.and_then(|route| route.downcast::<Route<R>>().ok()) {
            return route;
        }

        let route = Arc::new(Route::<R>::new());
        self.routes.insert(request_type, route.clone());
        trace!(request_type = type_name::<R>(), "cached dispatch route");
        route
    }

    /// Whether a route for `R` has been cached.
    #[must_use]
    pub fn contains<R: Request>(&self) -> bool {
        self.routes.contains_key(&TypeId::of::<R>())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use courier_core::{
        behavior_fn, handler_fn, AnyResponse, CancellationToken, ContractKind, DispatchResult,
        ErasedNext, Next, RequestInfo,
    };

    use super::*;

    struct Ping;
    impl Request for Ping {
        type Response = String;
    }

    struct Count;
    impl Request for Count {
        type Response = u64;
    }

    struct PassThrough;

    #[async_trait]
    impl UniversalBehavior for PassThrough {
        async fn handle(
            &self,
            _info: RequestInfo,
            next: ErasedNext,
            _cancel: CancellationToken,
        ) -> DispatchResult<AnyResponse> {
            next.run().await
        }
    }

    fn ping_handler() -> Component {
        let handler: Arc<dyn RequestHandler<Ping>> = Arc::new(handler_fn(
            |_req: Ping, _cancel| async move { Ok("pong".to_string()) },
        ));
        Arc::new(handler)
    }

    #[test]
    fn repeated_lookup_returns_cached_route() {
        let cache = ResolutionCache::new();
        let first = cache.route::<Ping>();
        let second = cache.route::<Ping>();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_request_types_get_distinct_routes() {
        let cache = ResolutionCache::new();
        assert!(cache.is_empty());

        let ping = cache.route::<Ping>();
        let count = cache.route::<Count>();
        assert_eq!(ping.handler_key(), &ContractKey::handler::<Ping>());
        assert_eq!(count.handler_key(), &ContractKey::handler::<Count>());
        assert_eq!(count.behavior_key().kind(), ContractKind::Behavior);
        assert!(cache.contains::<Ping>());
        assert!(cache.contains::<Count>());
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn handler_entry_invokes_registered_handler() {
        let route = ResolutionCache::new().route::<Ping>();
        let handler = route.handler(&ping_handler()).unwrap();
        let resp = handler.handle(Ping, CancellationToken::new()).await.unwrap();
        assert_eq!(resp, "pong");
    }

    #[test]
    fn handler_entry_rejects_foreign_component() {
        let route = ResolutionCache::new().route::<Count>();
        assert!(route.handler(&ping_handler()).is_none());
        assert!(route.handler(&(Arc::new(5_u64) as Component)).is_none());
    }

    #[tokio::test]
    async fn behavior_entry_accepts_typed_and_universal() {
        let route = ResolutionCache::new().route::<Ping>();

        let typed: Arc<dyn PipelineBehavior<Ping>> = Arc::new(behavior_fn(
            |req: Ping, next: Next<Ping>, _cancel| async move { next.run(req).await },
        ));
        let universal: Arc<dyn UniversalBehavior> = Arc::new(PassThrough);

        let typed = route.behavior(&(Arc::new(typed) as Component)).unwrap();
        let universal = route.behavior(&(Arc::new(universal) as Component)).unwrap();
        let handler = route.handler(&ping_handler()).unwrap();

        let cancel = CancellationToken::new();
        let chain = Next::behavior(
            typed,
            Next::behavior(universal, Next::handler(handler, cancel.clone()), cancel.clone()),
            cancel,
        );
        assert_eq!(chain.run(Ping).await.unwrap(), "pong");
    }

    #[test]
    fn concurrent_first_use_leaves_one_consistent_entry() {
        let cache = ResolutionCache::new();
        let routes: Vec<Arc<Route<Count>>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| cache.route::<Count>()))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        });

        assert_eq!(cache.len(), 1);
        for route in &routes {
            assert_eq!(route.handler_key(), &ContractKey::handler::<Count>());
        }
    }

    #[test]
    fn global_cache_is_a_single_instance() {
        assert!(Arc::ptr_eq(
            &ResolutionCache::global(),
            &ResolutionCache::global()
        ));
    }
}
