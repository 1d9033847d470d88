/// How a request type with more than one registered handler is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AmbiguityPolicy {
    /// Fail the send with `DispatchError::AmbiguousHandler`.
    #[default]
    Reject,
    /// Use the handler registered first.
    First,
    /// Use the handler registered last.
    Last,
}

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct MediatorConfig {
    /// Resolution of duplicate handler registrations.
    pub ambiguity: AmbiguityPolicy,
    /// Share the process-wide resolution cache. When `false` the mediator gets
    /// a private cache.
    pub shared_cache: bool,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            ambiguity: AmbiguityPolicy::Reject,
            shared_cache: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::ValueEnum;

    use super::*;

    #[test]
    fn mediator_config_defaults() {
        let config = MediatorConfig::default();
        assert_eq!(config.ambiguity, AmbiguityPolicy::Reject);
        assert!(config.shared_cache);
    }

    #[test]
    fn ambiguity_policy_parses_from_cli_names() {
        assert_eq!(
            AmbiguityPolicy::from_str("last", true).unwrap(),
            AmbiguityPolicy::Last
        );
        assert!(AmbiguityPolicy::from_str("random", true).is_err());
    }
}
