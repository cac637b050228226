//! Handler capability bound to routes.

use crate::context::{RequestContext, ResponseContext};

/// An unexpected failure. Carries its full cause chain so the session can
/// show it in debug mode.
pub type Fault = anyhow::Error;

/// What a handler returns.
pub type HandlerResult = Result<ResponseContext, Fault>;

/// Anything that can turn a request context into a response.
///
/// Implemented for plain functions and closures, so bound methods, free
/// functions and captured state all register the same way.
pub trait Handler: Send + Sync {
    fn call(&self, request: &mut RequestContext) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&mut RequestContext) -> HandlerResult + Send + Sync,
{
    fn call(&self, request: &mut RequestContext) -> HandlerResult {
        self(request)
    }
}
