//! Contract keys: the explicit runtime identity of "the handler for R" and
//! "the behaviors for R".

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::request::Request;

/// Which capability a contract key refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    /// The single handler for a request type.
    Handler,
    /// The ordered behaviors wrapping a request type's handler.
    Behavior,
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler => f.write_str("handler"),
            Self::Behavior => f.write_str("behavior"),
        }
    }
}

/// Registry lookup key derived from a (request type, response type) pair.
///
/// Equality and hashing use only the kind and the two `TypeId`s; the type
/// names are carried for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct ContractKey {
    kind: ContractKind,
    request: TypeId,
    response: TypeId,
    request_name: &'static str,
    response_name: &'static str,
}

impl ContractKey {
    /// Key under which the handler for `R` is registered.
    #[must_use]
    pub fn handler<R: Request>() -> Self {
        Self::of::<R>(ContractKind::Handler)
    }

    /// Key under which the behaviors for `R` are registered.
    #[must_use]
    pub fn behavior<R: Request>() -> Self {
        Self::of::<R>(ContractKind::Behavior)
    }

    fn of<R: Request>(kind: ContractKind) -> Self {
        Self {
            kind,
            request: TypeId::of::<R>(),
            response: TypeId::of::<R::Response>(),
            request_name: type_name::<R>(),
            response_name: type_name::<R::Response>(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ContractKind {
        self.kind
    }

    #[must_use]
    pub fn request_type_id(&self) -> TypeId {
        self.request
    }

    #[must_use]
    pub fn request_name(&self) -> &'static str {
        self.request_name
    }

    #[must_use]
    pub fn response_name(&self) -> &'static str {
        self.response_name
    }
}

impl PartialEq for ContractKey {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.request == other.request && self.response == other.response
    }
}

impl Eq for ContractKey {}

impl Hash for ContractKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.request.hash(state);
        self.response.hash(state);
    }
}

impl fmt::Display for ContractKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<{}, {}>", self.kind, self.request_name, self.response_name)
    }
}
