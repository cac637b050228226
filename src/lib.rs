//! HTTP request dispatch core.
//!
//! Routes requests by method and path pattern to handlers, runs them through
//! typed, short-circuiting input and output pipelines, and turns every
//! outcome into exactly one response.

pub mod config;
pub mod context;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod routing;

pub use config::schema::ServerConfig;
pub use context::{Body, Charset, RequestContext, ResponseContext};
pub use http::{Controller, DispatchSettings, Dispatcher, Fault, Handler, HandlerResult, HttpServer};
pub use lifecycle::Shutdown;
pub use pipeline::{Action, Pipeline, PipelineBuilder, Rejection};
pub use routing::{HttpMethod, RouteError, RoutePattern, Router};
