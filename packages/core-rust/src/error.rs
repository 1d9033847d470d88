use crate::provider::RegistryError;

/// Errors surfaced by `send`.
///
/// Handlers and behaviors return this type too, so a failure raised anywhere
/// in the chain reaches the caller as the same value.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no handler registered for request type {request_type}")]
    HandlerNotFound { request_type: &'static str },
    #[error("{count} handlers registered for request type {request_type}")]
    AmbiguousHandler {
        request_type: &'static str,
        count: usize,
    },
    #[error("request cancelled")]
    Cancelled,
    #[error("invalid {request_type}: {reason}")]
    Validation {
        request_type: &'static str,
        reason: String,
    },
    #[error("component registered as {contract} does not implement it")]
    ContractMismatch { contract: String },
    #[error("behavior returned a response that is not {response_type}")]
    ResponseMismatch { response_type: &'static str },
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

/// Result alias used by handlers, behaviors and the dispatcher.
pub type DispatchResult<T> = Result<T, DispatchError>;

impl From<RegistryError> for DispatchError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Ambiguous { contract, count } => Self::AmbiguousHandler {
                request_type: contract.request_name(),
                count,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ContractKey;
    use crate::request::Request;

    struct Ping;
    impl Request for Ping {
        type Response = String;
    }

    #[test]
    fn ambiguous_registry_error_maps_to_ambiguous_handler() {
        let err: DispatchError = RegistryError::Ambiguous {
            contract: ContractKey::handler::<Ping>(),
            count: 3,
        }
        .into();
        assert!(matches!(
            err,
            DispatchError::AmbiguousHandler { request_type, count: 3 } if request_type.ends_with("Ping")
        ));
    }

    #[test]
    fn handler_errors_render_transparently() {
        let err = DispatchError::from(anyhow::anyhow!("disk full"));
        assert_eq!(err.to_string(), "disk full");
    }
}
