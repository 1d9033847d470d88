//! Opt-in pipeline behaviors. Nothing here is installed unless registered.

mod cancellation;
mod trace;
mod validation;

pub use cancellation::CancellationBehavior;
pub use trace::TracingBehavior;
pub use validation::{Validate, ValidationBehavior};
