//! Per-invocation context objects.
//!
//! # Data Flow
//! ```text
//! Session (route resolved)
//!     → RequestContext (method, path, binding, headers, raw body)
//!     → input actions fill query, typed params, cookies, body
//!     → handler produces ResponseContext
//!     → output actions fix the body to text/bytes
//! ```
//!
//! # Design Decisions
//! - Contexts are plain owned values: one per request, never shared
//! - Typed accessors over `http` types; free-form data goes in `Extensions`

pub mod body;
pub mod charset;
pub mod request;
pub mod response;

pub use body::Body;
pub use charset::{Charset, CharsetError};
pub use request::{Cookies, QueryParams, RequestContext, RequestContextBuilder};
pub use response::ResponseContext;

/// Misuse of a context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("request body has already been set")]
    BodyAlreadySet,
}
