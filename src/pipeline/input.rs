//! Standard input-phase actions.
//!
//! # Data Flow
//! ```text
//! RequestContext (route resolved, raw parts attached)
//!     → ParseQuery       (never rejects)
//!     → ParsePathParams  (400 on a value that does not fit its kind)
//!     → ParseCookies     (malformed header → no cookies)
//!     → ParseBody        (400 on malformed JSON or undecodable text)
//!     → InvokeHandler    (RequestContext → ResponseContext)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use http::header::{CONTENT_TYPE, COOKIE};
use http::StatusCode;

use crate::context::{Body, Cookies, RequestContext, ResponseContext};
use crate::http::parse::{parse_content_type, parse_cookie_header, parse_query};
use crate::pipeline::action::{Action, ActionResult, Flow, Phase, Rejection};
use crate::pipeline::chain::{Pipeline, PipelineBuilder};
use crate::pipeline::PipelineError;

/// Decode the query string into `RequestContext::query`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseQuery;

impl Action<RequestContext, RequestContext> for ParseQuery {
    fn name(&self) -> &str {
        "parse-query"
    }

    fn phase(&self) -> Option<Phase> {
        Some(Phase::Input)
    }

    fn execute(&self, mut ctx: RequestContext) -> ActionResult<RequestContext, RequestContext> {
        if let Some(query) = ctx.query_string() {
            let query = parse_query(query);
            ctx.set_query(query);
        }
        Ok(Flow::Continue(ctx))
    }
}

/// Coerce raw path parameters to the kinds declared in the route template.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParsePathParams;

impl Action<RequestContext, RequestContext> for ParsePathParams {
    fn name(&self) -> &str {
        "parse-path-params"
    }

    fn phase(&self) -> Option<Phase> {
        Some(Phase::Input)
    }

    fn execute(&self, mut ctx: RequestContext) -> ActionResult<RequestContext, RequestContext> {
        let coerced: Result<HashMap<_, _>, String> = {
            let pattern = ctx.route().pattern();
            ctx.raw_params()
                .iter()
                .map(|(name, raw)| {
                    let kind = pattern.param_kind(name).unwrap_or_default();
                    kind.coerce(raw)
                        .map(|value| (name.clone(), value))
                        .map_err(|e| format!("path parameter \"{name}\": {e}"))
                })
                .collect()
        };

        match coerced {
            Ok(params) => {
                ctx.set_path_params(params);
                Ok(Flow::Continue(ctx))
            }
            Err(message) => Ok(Flow::Reject(ctx, Rejection::bad_request(message))),
        }
    }
}

/// Parse the `Cookie` header; a malformed header yields no cookies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseCookies;

impl Action<RequestContext, RequestContext> for ParseCookies {
    fn name(&self) -> &str {
        "parse-cookies"
    }

    fn phase(&self) -> Option<Phase> {
        Some(Phase::Input)
    }

    fn execute(&self, mut ctx: RequestContext) -> ActionResult<RequestContext, RequestContext> {
        let header = ctx
            .headers()
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join("; ");

        let cookies = if header.is_empty() {
            Cookies::new()
        } else {
            parse_cookie_header(&header).unwrap_or_else(|e| {
                tracing::debug!(request_id = %ctx.request_id(), error = %e, "Ignoring malformed cookies");
                Cookies::new()
            })
        };

        ctx.set_cookies(cookies);
        Ok(Flow::Continue(ctx))
    }
}

/// Turn the raw body into a [`Body`] according to `Content-Type`.
///
/// Leaves the body alone if an earlier action already set it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseBody;

impl Action<RequestContext, RequestContext> for ParseBody {
    fn name(&self) -> &str {
        "parse-body"
    }

    fn phase(&self) -> Option<Phase> {
        Some(Phase::Input)
    }

    fn execute(&self, mut ctx: RequestContext) -> ActionResult<RequestContext, RequestContext> {
        if ctx.body().is_some() {
            return Ok(Flow::Continue(ctx));
        }

        let raw = ctx.take_raw_body();
        if raw.is_empty() {
            ctx.set_body(Body::Empty)?;
            return Ok(Flow::Continue(ctx));
        }

        let content_type = ctx.header(CONTENT_TYPE.as_str()).and_then(|v| parse_content_type(v).ok());

        let body = match content_type {
            Some(ct) if ct.is_json() => match serde_json::from_slice(&raw) {
                Ok(value) => Body::Json(value),
                Err(e) => {
                    return Ok(Flow::Reject(ctx, Rejection::bad_request(format!("malformed JSON body: {e}"))));
                }
            },
            Some(ct) if ct.is_text() => {
                let charset = match ct.resolve_charset() {
                    Ok(declared) => declared.unwrap_or(ctx.charset()),
                    Err(e) => {
                        let rejection = Rejection::new(StatusCode::UNSUPPORTED_MEDIA_TYPE).with_message(e.to_string());
                        return Ok(Flow::Reject(ctx, rejection));
                    }
                };
                match charset.decode(&raw) {
                    Ok(text) => Body::Text(text),
                    Err(e) => return Ok(Flow::Reject(ctx, Rejection::bad_request(e.to_string()))),
                }
            }
            _ => Body::Bytes(raw),
        };

        ctx.set_body(body)?;
        Ok(Flow::Continue(ctx))
    }
}

/// Call the matched route's handler. Handler errors are faults.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvokeHandler;

impl Action<RequestContext, ResponseContext> for InvokeHandler {
    fn name(&self) -> &str {
        "invoke-handler"
    }

    fn phase(&self) -> Option<Phase> {
        Some(Phase::Input)
    }

    fn execute(&self, mut ctx: RequestContext) -> ActionResult<ResponseContext, RequestContext> {
        let handler = Arc::clone(ctx.route().handler());
        let response = handler.call(&mut ctx)?;
        Ok(Flow::Continue(response))
    }
}

/// The default input pipeline.
pub fn input_pipeline() -> Result<Pipeline<RequestContext, ResponseContext>, PipelineError> {
    PipelineBuilder::<RequestContext>::new(Phase::Input)
        .then(ParseQuery)
        .then(ParsePathParams)
        .then(ParseCookies)
        .then(ParseBody)
        .then(InvokeHandler)
        .build()
}
