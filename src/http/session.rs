//! Per-request session.
//!
//! # Data Flow
//! ```text
//! Exchange (method token, path, query, headers, body)
//!     → handle_input
//!         → method token → HttpMethod      (unknown → 501, before lookup)
//!         → normalize, strip mount          (outside mount → 404)
//!         → Router::follow_route            (no match → 404)
//!         → RequestContext → input pipeline (rejection → its status)
//!     → handle_output
//!         → output pipeline                 (rejection → fault)
//!         → status, headers, bytes → Exchange
//!     → completed
//! ```
//!
//! # Design Decisions
//! - Exactly one response per session; a second write is an error, never
//!   silently dropped
//! - `reject_fault` is the only place fault detail can reach a client, and
//!   only when debug is enabled

use std::fmt::Write as _;

use http::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use uuid::Uuid;

use crate::context::{Body, RequestContext, ResponseContext};
use crate::http::controller::Controller;
use crate::http::exchange::{Exchange, TransportError};
use crate::http::handler::Fault;
use crate::http::parse::content_type_header;
use crate::http::request::X_REQUEST_ID;
use crate::http::settings::DispatchSettings;
use crate::pipeline::{Pipeline, Processed};
use crate::routing::{normalize_path, HttpMethod};

/// Session misuse and transport failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session already completed")]
    AlreadyCompleted,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result of [`Session::handle_input`].
#[derive(Debug)]
pub enum InputOutcome {
    /// The handler produced a response.
    Handled(ResponseContext),
    /// Processing stopped before or inside the input pipeline.
    Rejected {
        status: StatusCode,
        message: Option<String>,
    },
}

impl InputOutcome {
    fn status(status: StatusCode) -> Self {
        InputOutcome::Rejected { status, message: None }
    }
}

/// Canonical reason phrase for `status`.
pub fn reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown Status")
}

/// Drives one exchange through routing, the pipelines and the response.
pub struct Session<'a, E: Exchange> {
    exchange: E,
    controller: &'a Controller,
    settings: &'a DispatchSettings,
    request_id: Uuid,
    status: Option<StatusCode>,
    completed: bool,
}

impl<'a, E: Exchange> Session<'a, E> {
    /// Reuses a valid `x-request-id` from the request, otherwise makes one.
    pub fn new(exchange: E, controller: &'a Controller, settings: &'a DispatchSettings) -> Self {
        let request_id = exchange
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Self {
            exchange,
            controller,
            settings,
            request_id,
            status: None,
            completed: false,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn exchange(&self) -> &E {
        &self.exchange
    }

    /// Status of the response written, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "session",
            request_id = %self.request_id,
            method = %self.exchange.method(),
            path = %self.exchange.path(),
        )
    }

    /// Route the request and run the input pipeline.
    ///
    /// Faults from the pipeline are returned as `Err` for the caller to
    /// pass to [`reject_fault`](Self::reject_fault).
    pub fn handle_input(
        &mut self,
        pipeline: &Pipeline<RequestContext, ResponseContext>,
    ) -> Result<InputOutcome, Fault> {
        let Some(method) = HttpMethod::from_name(self.exchange.method()) else {
            tracing::debug!(method = self.exchange.method(), "Unknown method");
            return Ok(InputOutcome::status(StatusCode::NOT_IMPLEMENTED));
        };

        let requested = normalize_path(self.exchange.path());
        let Some(path) = self.controller.strip_mount(&requested).map(normalize_path) else {
            tracing::debug!(mount = self.controller.path(), "Path outside controller mount");
            return Ok(InputOutcome::status(StatusCode::NOT_FOUND));
        };

        let Some(matched) = self.controller.router().follow_route(method, &path) else {
            tracing::debug!(%method, path = %path, "No route matched");
            return Ok(InputOutcome::status(StatusCode::NOT_FOUND));
        };

        let ctx = RequestContext::builder(method, path, matched)
            .request_id(self.request_id)
            .headers(self.exchange.headers().clone())
            .query_string(self.exchange.query().map(str::to_string))
            .raw_body(self.exchange.take_body())
            .charset(self.settings.charset)
            .build();

        match pipeline.process(ctx)? {
            Processed::Completed(response) => Ok(InputOutcome::Handled(response)),
            Processed::Rejected(rejected) => {
                tracing::debug!(
                    action = %rejected.action,
                    index = rejected.index,
                    status = %rejected.rejection.status(),
                    "Input rejected"
                );
                Ok(InputOutcome::Rejected {
                    status: rejected.rejection.status(),
                    message: rejected.rejection.message().map(str::to_string),
                })
            }
        }
    }

    /// Run the output pipeline and write the response.
    pub fn handle_output(
        &mut self,
        pipeline: &Pipeline<ResponseContext, ResponseContext>,
        response: ResponseContext,
    ) -> Result<(), Fault> {
        let response = match pipeline.process(response)? {
            Processed::Completed(response) => response,
            Processed::Rejected(rejected) => {
                anyhow::bail!(
                    "output action {} rejected the response: {}",
                    rejected.action,
                    rejected.rejection
                );
            }
        };

        let (status, headers, body) = response.into_parts();
        let bytes = match body {
            Body::Empty => Vec::new(),
            Body::Bytes(bytes) => bytes,
            Body::Text(text) => self.settings.charset.encode(&text),
            Body::Json(_) => anyhow::bail!("response body is not writable after the output pipeline"),
        };

        self.write(status, headers, bytes)?;
        Ok(())
    }

    /// Write a minimal plain-text response.
    pub fn reject(&mut self, status: StatusCode, message: &str) -> Result<(), SessionError> {
        let charset = self.settings.charset;
        let body = charset.encode(message);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, content_type_header("text/plain", charset));
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));

        self.write(status, headers, body)
    }

    /// Answer with 500. Fault detail is included only in debug mode.
    pub fn reject_fault(&mut self, fault: &Fault) -> Result<(), SessionError> {
        tracing::error!(error = %fault, "Request failed");

        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let mut message = reason(status).to_string();
        if self.settings.debug {
            let _ = write!(message, "\n{fault}");
            for cause in fault.chain().skip(1) {
                let _ = write!(message, "\nCaused by: {cause}");
            }
        }
        self.reject(status, &message)
    }

    /// Mark the session finished and release the exchange.
    pub fn complete(&mut self) {
        self.completed = true;
        self.exchange.close();
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn into_exchange(self) -> E {
        self.exchange
    }

    fn write(&mut self, status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Result<(), SessionError> {
        if self.completed {
            return Err(SessionError::AlreadyCompleted);
        }
        self.exchange.send(status, headers, body)?;
        self.status = Some(status);
        self.complete();
        Ok(())
    }
}
