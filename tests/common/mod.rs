//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context as _;
use axum::body::Body;
use axum::http::{Request, Response};
use dispatch_core::config::ServerConfig;
use dispatch_core::http::{Controller, HttpServer};
use dispatch_core::lifecycle::{prepare_dispatchers, Shutdown};
use dispatch_core::{HandlerResult, RequestContext, ResponseContext};
use tokio::net::TcpListener;
use tower::ServiceExt;

fn show_user(ctx: &mut RequestContext) -> HandlerResult {
    let id: i64 = ctx.path_param_as("id").context("missing id")?;
    Ok(ResponseContext::json(serde_json::json!({ "id": id })))
}

fn show_post(ctx: &mut RequestContext) -> HandlerResult {
    Ok(ResponseContext::json(serde_json::json!({
        "user": ctx.raw_param("id"),
        "post": ctx.raw_param("postId"),
    })))
}

fn broken(_: &mut RequestContext) -> HandlerResult {
    let port: u16 = "99999".parse().context("parsing upstream port")?;
    Ok(ResponseContext::ok(port.to_string()))
}

fn echo(ctx: &mut RequestContext) -> HandlerResult {
    Ok(ResponseContext::ok(ctx.body().cloned().unwrap_or_default()))
}

/// `users` at `/api` and `misc` at `/`.
pub fn demo_controllers() -> Vec<Controller> {
    vec![
        Controller::builder("users", "/api")
            .get("/users/{id:int}", show_user)
            .get("/users/{id}/posts/{postId}", show_post)
            .build()
            .unwrap(),
        Controller::builder("misc", "/")
            .get("/broken", broken)
            .post("/echo", echo)
            .build()
            .unwrap(),
    ]
}

pub fn server(config: &ServerConfig) -> HttpServer {
    let dispatchers = prepare_dispatchers(config, demo_controllers()).unwrap();
    HttpServer::new(config, dispatchers)
}

/// Send one request through the fully layered router.
pub async fn send(config: &ServerConfig, request: Request<Body>) -> Response<Body> {
    server(config).router().oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Run a server on an ephemeral port.
#[allow(dead_code)]
pub async fn spawn_server(config: ServerConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let server = server(&config);

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, shutdown)
}
