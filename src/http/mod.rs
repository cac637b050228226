//! HTTP request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum, request ID, timeout, body buffering)
//!     → dispatcher.rs (controller with the longest matching mount)
//!     → session.rs (method, mount, route lookup → 501 / 404)
//!         → input pipeline  (parse query, params, cookies, body; call handler)
//!         → output pipeline (default headers, format, encode)
//!     → exchange.rs (status, headers, bytes)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - The dispatch core is synchronous; the server runs it on the blocking pool
//! - Controllers, routers and pipelines are frozen before the server starts

pub mod controller;
pub mod dispatcher;
pub mod exchange;
pub mod handler;
pub mod parse;
pub mod request;
pub mod server;
pub mod session;
pub mod settings;

pub use controller::{Controller, ControllerBuilder, ControllerError};
pub use dispatcher::Dispatcher;
pub use exchange::{BufferedExchange, BufferedResponse, Exchange, TransportError};
pub use handler::{Fault, Handler, HandlerResult};
pub use parse::ParseError;
pub use request::{RequestId, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::HttpServer;
pub use session::{InputOutcome, Session, SessionError};
pub use settings::DispatchSettings;
