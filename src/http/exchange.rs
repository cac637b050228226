//! Transport seam between a session and the wire.
//!
//! # Responsibilities
//! - Expose the raw request parts a session needs (method token, path,
//!   query string, headers, body bytes)
//! - Accept exactly one response (status, headers, body bytes)
//!
//! # Design Decisions
//! - Synchronous: sessions run on the blocking pool, so an exchange is a
//!   plain buffered value rather than a stream
//! - The method is an unparsed token so unknown methods reach the session
//!   and become 501 there

use http::{HeaderMap, StatusCode};

/// Transport-level failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("a response was already sent on this exchange")]
    AlreadySent,

    #[error("exchange is closed")]
    Closed,
}

/// One request/response pair on some transport.
pub trait Exchange: Send {
    /// Request method token exactly as received.
    fn method(&self) -> &str;

    /// Request path, without the query string.
    fn path(&self) -> &str;

    /// Raw query string, without the leading `?`.
    fn query(&self) -> Option<&str>;

    fn headers(&self) -> &HeaderMap;

    /// Take the request body. Later calls return an empty buffer.
    fn take_body(&mut self) -> Vec<u8>;

    /// Write the response.
    fn send(&mut self, status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Result<(), TransportError>;

    /// Release the exchange. Idempotent.
    fn close(&mut self);
}

/// A response captured by [`BufferedExchange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl BufferedResponse {
    /// The body as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// An in-memory exchange: the request is fully buffered and the response
/// is captured for the caller to forward.
#[derive(Debug, Default)]
pub struct BufferedExchange {
    method: String,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Vec<u8>,
    response: Option<BufferedResponse>,
    closed: bool,
}

impl BufferedExchange {
    /// `target` is a path with an optional `?query`.
    pub fn new(method: impl Into<String>, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (target, None),
        };
        Self {
            method: method.into(),
            path: path.to_string(),
            query,
            ..Self::default()
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn response(&self) -> Option<&BufferedResponse> {
        self.response.as_ref()
    }

    pub fn into_response(self) -> Option<BufferedResponse> {
        self.response
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Exchange for BufferedExchange {
    fn method(&self) -> &str {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn take_body(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.body)
    }

    fn send(&mut self, status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        if self.response.is_some() {
            return Err(TransportError::AlreadySent);
        }
        self.response = Some(BufferedResponse { status, headers, body });
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
