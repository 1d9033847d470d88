use std::any::type_name;

/// A value routed to exactly one handler by its type.
///
/// The associated `Response` ties every request type to the type its handler
/// produces, so the (request, response) pair used for routing is always
/// derivable from the request type alone.
pub trait Request: Send + 'static {
    /// Value produced by the handler for this request type.
    type Response: Send + 'static;
}

/// Type-erased description of a request, handed to behaviors that apply to
/// every request type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestInfo {
    /// Fully qualified name of the request type.
    pub request_type: &'static str,
    /// Fully qualified name of the response type.
    pub response_type: &'static str,
}

impl RequestInfo {
    /// Describes the request type `R`.
    #[must_use]
    pub fn of<R: Request>() -> Self {
        Self {
            request_type: type_name::<R>(),
            response_type: type_name::<R::Response>(),
        }
    }
}
