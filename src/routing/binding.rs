//! Route bindings: a compiled pattern plus the handler it dispatches to.

use std::fmt;
use std::sync::Arc;

use crate::http::handler::Handler;
use crate::routing::params::PathParams;
use crate::routing::pattern::RoutePattern;

/// Registrant identity used when a binding is created without one.
pub const ANONYMOUS_REGISTRANT: &str = "<anonymous>";

/// A route pattern bound to a handler.
///
/// The registrant names whoever registered the binding (usually a
/// controller) so duplicate errors can point at both sides of a conflict.
#[derive(Clone)]
pub struct RouteBinding {
    pattern: RoutePattern,
    handler: Arc<dyn Handler>,
    registrant: String,
}

impl RouteBinding {
    pub fn new(pattern: RoutePattern, handler: impl Handler + 'static) -> Self {
        Self::from_arc(pattern, Arc::new(handler))
    }

    pub fn from_arc(pattern: RoutePattern, handler: Arc<dyn Handler>) -> Self {
        Self {
            pattern,
            handler,
            registrant: ANONYMOUS_REGISTRANT.to_string(),
        }
    }

    /// Record who registered this binding.
    pub fn registered_by(mut self, registrant: impl Into<String>) -> Self {
        self.registrant = registrant.into();
        self
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    pub fn registrant(&self) -> &str {
        &self.registrant
    }
}

impl fmt::Debug for RouteBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteBinding")
            .field("pattern", &self.pattern.to_string())
            .field("registrant", &self.registrant)
            .finish_non_exhaustive()
    }
}

/// Result of a successful lookup.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub binding: Arc<RouteBinding>,
    pub params: PathParams,
}

impl PartialEq for RouteMatch {
    /// Two matches are equal when they resolve to the same registered
    /// binding with the same extracted parameters.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.binding, &other.binding) && self.params == other.params
    }
}
