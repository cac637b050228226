//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with a single fallback handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Pick the dispatcher whose mount is the longest prefix of the path
//! - Buffer the body and run the dispatcher on the blocking pool
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::http::dispatcher::Dispatcher;
use crate::http::exchange::{BufferedExchange, BufferedResponse};
use crate::http::request::RequestIdLayer;
use crate::http::session::reason;
use crate::routing::{normalize_path, HttpMethod};

/// Application state injected into the handler.
#[derive(Clone)]
struct AppState {
    /// Deepest mount first.
    dispatchers: Arc<[Arc<Dispatcher>]>,
    max_body_bytes: usize,
}

impl AppState {
    fn select(&self, path: &str) -> Option<&Arc<Dispatcher>> {
        let path = normalize_path(path);
        self.dispatchers
            .iter()
            .find(|d| d.controller().strip_mount(&path).is_some())
    }
}

/// HTTP front end for a set of dispatchers.
pub struct HttpServer {
    router: Router,
    controllers: usize,
}

impl HttpServer {
    pub fn new(config: &ServerConfig, dispatchers: Vec<Dispatcher>) -> Self {
        let mut dispatchers: Vec<_> = dispatchers.into_iter().map(Arc::new).collect();
        dispatchers.sort_by_key(|d| std::cmp::Reverse(d.controller().depth()));

        for dispatcher in &dispatchers {
            let controller = dispatcher.controller();
            tracing::info!(
                controller = controller.name(),
                mount = controller.path(),
                routes = controller.router().len(),
                "Controller mounted"
            );
        }

        let controllers = dispatchers.len();
        let state = AppState {
            dispatchers: dispatchers.into(),
            max_body_bytes: config.listener.max_body_bytes,
        };

        Self {
            router: Self::build_router(config, state),
            controllers,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            controllers = self.controllers,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn dispatch_handler(State(state): State<AppState>, request: Request) -> Response {
    let path = request.uri().path().to_string();

    let Some(dispatcher) = state.select(&path).cloned() else {
        let status = if HttpMethod::from_name(request.method().as_str()).is_some() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::NOT_IMPLEMENTED
        };
        tracing::debug!(path = %path, status = %status, "No controller for path");
        return plain(status);
    };

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Request body rejected");
            return plain(StatusCode::PAYLOAD_TOO_LARGE);
        }
    };

    let target = parts.uri.path_and_query().map_or(path.as_str(), |pq| pq.as_str());
    let exchange = BufferedExchange::new(parts.method.as_str(), target)
        .with_headers(parts.headers)
        .with_body(body.to_vec());

    match tokio::task::spawn_blocking(move || dispatcher.dispatch(exchange)).await {
        Ok(exchange) => match exchange.into_response() {
            Some(response) => into_response(response),
            None => {
                tracing::error!(path = %path, "Dispatcher returned without a response");
                plain(StatusCode::INTERNAL_SERVER_ERROR)
            }
        },
        Err(e) => {
            tracing::error!(path = %path, error = %e, "Dispatch task failed");
            plain(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn into_response(buffered: BufferedResponse) -> Response {
    let mut response = Response::new(Body::from(buffered.body));
    *response.status_mut() = buffered.status;
    *response.headers_mut() = buffered.headers;
    response
}

fn plain(status: StatusCode) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=UTF-8"))],
        reason(status),
    )
        .into_response()
}
