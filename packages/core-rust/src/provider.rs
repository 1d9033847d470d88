//! Lookup surface the dispatcher consumes from a registry.

use std::any::Any;
use std::sync::Arc;

use crate::contract::ContractKey;

/// An opaque registered instance, downcast by the dispatcher to the contract
/// its key names.
pub type Component = Arc<dyn Any + Send + Sync>;

/// Errors reported by a registry during lookup.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("{count} implementations registered for {contract}")]
    Ambiguous { contract: ContractKey, count: usize },
}

/// Registry capabilities needed for dispatch: "the one" and "all of them".
///
/// How components are discovered, constructed and registered is the
/// implementor's concern.
pub trait ServiceProvider: Send + Sync {
    /// Every component registered under `key`, in registration order.
    fn resolve_all(&self, key: &ContractKey) -> Vec<Component>;

    /// The single component registered under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Ambiguous` when more than one component is
    /// registered under `key`.
    fn resolve_one(&self, key: &ContractKey) -> Result<Option<Component>, RegistryError> {
        let mut all = self.resolve_all(key);
        match all.len() {
            0 | 1 => Ok(all.pop()),
            count => Err(RegistryError::Ambiguous {
                contract: *key,
                count,
            }),
        }
    }
}

impl<P: ServiceProvider + ?Sized> ServiceProvider for Arc<P> {
    fn resolve_all(&self, key: &ContractKey) -> Vec<Component> {
        (**self).resolve_all(key)
    }

    fn resolve_one(&self, key: &ContractKey) -> Result<Option<Component>, RegistryError> {
        (**self).resolve_one(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;

    struct Ping;
    impl Request for Ping {
        type Response = String;
    }

    /// Provider returning a fixed list of components for every key.
    struct FixedProvider(Vec<Component>);

    impl ServiceProvider for FixedProvider {
        fn resolve_all(&self, _key: &ContractKey) -> Vec<Component> {
            self.0.clone()
        }
    }

    fn component(value: u32) -> Component {
        Arc::new(value)
    }

    #[test]
    fn resolve_one_empty_returns_none() {
        let provider = FixedProvider(Vec::new());
        let found = provider.resolve_one(&ContractKey::handler::<Ping>()).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn resolve_one_single_returns_it() {
        let provider = FixedProvider(vec![component(7)]);
        let found = provider
            .resolve_one(&ContractKey::handler::<Ping>())
            .unwrap()
            .unwrap();
        assert_eq!(found.downcast_ref::<u32>(), Some(&7));
    }

    #[test]
    fn resolve_one_multiple_is_ambiguous() {
        let provider = FixedProvider(vec![component(1), component(2)]);
        let err = provider
            .resolve_one(&ContractKey::handler::<Ping>())
            .unwrap_err();
        assert!(matches!(err, RegistryError::Ambiguous { count: 2, .. }));
    }

    #[test]
    fn arc_provider_delegates() {
        let provider: Arc<dyn ServiceProvider> = Arc::new(FixedProvider(vec![component(1)]));
        assert_eq!(provider.resolve_all(&ContractKey::behavior::<Ping>()).len(), 1);
    }
}
