//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration (at startup):
//!     (method, template, handler)
//!     → pattern.rs (normalize + compile segments)
//!     → method_router.rs (duplicate check, ordered insert)
//!     → Freeze: Router shared immutably via Arc
//!
//! Incoming Request (method, path):
//!     → router.rs (select method table)
//!     → method_router.rs (segment-wise match)
//!     → Return: RouteMatch (binding + raw params) or None
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex: literal and whole-segment parameters only
//! - Deterministic: same input always matches same route
//! - Duplicates are rejected by shape, ignoring parameter names

pub mod binding;
pub mod method;
pub mod method_router;
pub mod params;
pub mod pattern;
pub mod router;

pub use binding::{RouteBinding, RouteMatch};
pub use method::HttpMethod;
pub use method_router::MethodRouter;
pub use params::{ParamKind, ParamValue, PathParams};
pub use pattern::{normalize_path, split_segments, PatternError, RoutePattern};
pub use router::Router;

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// A pattern with the same shape is already registered for the method.
    #[error(
        "method {method} with path \"{pattern}\" from {registrant} duplicates \"{existing}\" from {existing_registrant}"
    )]
    Duplicate {
        method: HttpMethod,
        pattern: String,
        registrant: String,
        existing: String,
        existing_registrant: String,
    },
}
