use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use courier_core::{
    Component, ContractKey, ContractKind, PipelineBehavior, Request, RequestHandler,
    ServiceProvider, UniversalBehavior,
};
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// A registered component and its position in the global registration order.
#[derive(Clone)]
struct Registration {
    seq: u64,
    component: Component,
}

// ---------------------------------------------------------------------------
// HandlerRegistry
// ---------------------------------------------------------------------------

/// In-memory registry of handlers and behaviors.
///
/// Every registration takes the next value of a single sequence counter, so
/// typed and universal behaviors interleave in the order they were registered.
/// Handlers are stored as `Arc<dyn RequestHandler<R>>`, typed behaviors as
/// `Arc<dyn PipelineBehavior<R>>` and universal behaviors as
/// `Arc<dyn UniversalBehavior>`, each wrapped in a [`Component`].
pub struct HandlerRegistry {
    /// Typed registrations keyed by contract.
    by_contract: DashMap<ContractKey, Vec<Registration>>,
    /// Behaviors applied to every request type.
    universal: RwLock<Vec<Registration>>,
    next_seq: AtomicU64,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_contract: DashMap::new(),
            universal: RwLock::new(Vec::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Register the handler for request type `R`.
    ///
    /// Registering a second handler for the same type is allowed here; the
    /// mediator's `AmbiguityPolicy` decides what a send does with it.
    pub fn register_handler<R, H>(&self, handler: H)
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        let handler: Arc<dyn RequestHandler<R>> = Arc::new(handler);
        self.insert(ContractKey::handler::<R>(), Arc::new(handler));
    }

    /// Register a behavior for request type `R`. Behaviors run in
    /// registration order, the first registered being outermost.
    pub fn register_behavior<R, B>(&self, behavior: B)
    where
        R: Request,
        B: PipelineBehavior<R> + 'static,
    {
        let behavior: Arc<dyn PipelineBehavior<R>> = Arc::new(behavior);
        self.insert(ContractKey::behavior::<R>(), Arc::new(behavior));
    }

    /// Register a behavior for every request type, including types whose
    /// handlers are registered later.
    pub fn register_universal_behavior<B: UniversalBehavior + 'static>(&self, behavior: B) {
        let behavior: Arc<dyn UniversalBehavior> = Arc::new(behavior);
        let seq = self.next_seq();
        self.universal.write().push(Registration {
            seq,
            component: Arc::new(behavior),
        });
        debug!(seq, "registered universal behavior");
    }

    /// Number of components `resolve_all` returns for `key`.
    #[must_use]
    pub fn registration_count(&self, key: &ContractKey) -> usize {
        self.registrations(key).len()
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    fn insert(&self, key: ContractKey, component: Component) {
        let seq = self.next_seq();
        self.by_contract
            .entry(key)
            .or_default()
            .push(Registration { seq, component });
        debug!(contract = %key, seq, "registered component");
    }

    fn registrations(&self, key: &ContractKey) -> Vec<Registration> {
        let mut found = self
            .by_contract
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        if key.kind() == ContractKind::Behavior {
            found.extend(self.universal.read().iter().cloned());
        }
        // Concurrent registrations may push out of sequence order, and one
        // still in flight may be missing here while a later one is present.
        found.sort_by_key(|registration| registration.seq);
        found
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceProvider for HandlerRegistry {
    fn resolve_all(&self, key: &ContractKey) -> Vec<Component> {
        self.registrations(key)
            .into_iter()
            .map(|registration| registration.component)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
