//! dispatch-server
//!
//! Runs the dispatch core behind Axum with a small demo controller set.
//!
//! ```text
//!     Client Request
//!     ─────────────▶ axum fallback ─▶ Dispatcher (longest mount)
//!                                        │
//!                                        ▼
//!                                     Session ─▶ Router ─▶ input pipeline ─▶ handler
//!                                        │
//!     Client Response                    ▼
//!     ◀───────────── Exchange ◀──── output pipeline
//! ```

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;

use dispatch_core::config::{load_config, ServerConfig};
use dispatch_core::http::{Controller, ControllerError, HttpServer};
use dispatch_core::lifecycle::{prepare_dispatchers, signals, Shutdown};
use dispatch_core::observability::{init_logging, metrics};
use dispatch_core::{Body, HandlerResult, RequestContext, ResponseContext};

#[derive(Debug, Parser)]
#[command(name = "dispatch-server", version, about = "HTTP request dispatch server")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Include fault detail in 500 responses.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path).with_context(|| format!("loading {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if cli.debug {
        config.dispatch.debug = true;
    }

    init_logging(&config.observability)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        debug = config.dispatch.debug,
        "dispatch-server starting"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .context("parsing observability.metrics_address")?;
        metrics::init_metrics(addr)?;
    }

    let dispatchers = prepare_dispatchers(&config, demo_controllers()?)?;
    let server = HttpServer::new(&config, dispatchers);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::shutdown_on_ctrl_c(&shutdown).await;
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn demo_controllers() -> Result<Vec<Controller>, ControllerError> {
    Ok(vec![users_controller()?, echo_controller()?])
}

type Users = Arc<Mutex<BTreeMap<i64, String>>>;

fn users_controller() -> Result<Controller, ControllerError> {
    let users: Users = Arc::new(Mutex::new(BTreeMap::from([
        (1, "ada".to_string()),
        (2, "grace".to_string()),
    ])));

    let list = Arc::clone(&users);
    let show = Arc::clone(&users);
    let create = users;

    Controller::builder("users", "/api")
        .get("/users", move |ctx: &mut RequestContext| -> HandlerResult {
            let limit = ctx
                .first_query_param("limit")
                .and_then(|v| v.parse().ok())
                .unwrap_or(usize::MAX);
            let users = lock(&list)?;
            let listed: Vec<_> = users
                .iter()
                .take(limit)
                .map(|(id, name)| serde_json::json!({ "id": id, "name": name }))
                .collect();
            Ok(ResponseContext::json(serde_json::Value::Array(listed)))
        })
        .get("/users/{id:int}", move |ctx: &mut RequestContext| -> HandlerResult {
            let id: i64 = ctx.path_param_as("id").context("missing id parameter")?;
            let users = lock(&show)?;
            Ok(match users.get(&id) {
                Some(name) => ResponseContext::json(serde_json::json!({ "id": id, "name": name })),
                None => ResponseContext::with_code(http::StatusCode::NOT_FOUND),
            })
        })
        .post("/users", move |ctx: &mut RequestContext| -> HandlerResult {
            let name = ctx
                .body()
                .and_then(Body::as_json)
                .and_then(|v| v.get("name"))
                .and_then(|v| v.as_str())
                .map(str::to_string);
            let Some(name) = name else {
                return Ok(ResponseContext::with_code(http::StatusCode::UNPROCESSABLE_ENTITY));
            };

            let mut users = lock(&create)?;
            let id = users.keys().next_back().copied().unwrap_or(0) + 1;
            users.insert(id, name.clone());
            Ok(ResponseContext::json(serde_json::json!({ "id": id, "name": name }))
                .with_status(http::StatusCode::CREATED))
        })
        .build()
}

fn echo_controller() -> Result<Controller, ControllerError> {
    Controller::builder("echo", "/")
        .get("/", |_: &mut RequestContext| -> HandlerResult {
            Ok(ResponseContext::ok(concat!("dispatch-server ", env!("CARGO_PKG_VERSION"))))
        })
        .post("/echo", |ctx: &mut RequestContext| -> HandlerResult {
            let body = ctx.body().cloned().unwrap_or_default();
            Ok(ResponseContext::ok(body))
        })
        .get("/cookies/{name}", |ctx: &mut RequestContext| -> HandlerResult {
            let name: String = ctx.path_param_as("name").context("missing name parameter")?;
            Ok(match ctx.cookie(&name) {
                Some(value) => ResponseContext::ok(value.to_string()),
                None => ResponseContext::with_code(http::StatusCode::NOT_FOUND),
            })
        })
        .build()
}

fn lock(users: &Users) -> anyhow::Result<std::sync::MutexGuard<'_, BTreeMap<i64, String>>> {
    users.lock().map_err(|_| anyhow::anyhow!("user store lock poisoned"))
}
