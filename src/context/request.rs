//! Per-request context.
//!
//! # Responsibilities
//! - Carry what routing resolved (method, normalized path, binding, raw params)
//! - Carry what the transport supplied (headers, query string, raw body)
//! - Hold values produced by input actions (query map, typed params,
//!   cookies, body)
//!
//! # Design Decisions
//! - Owned by one session; never shared, so no interior locking
//! - The parsed body can be set exactly once
//! - `extensions` is the free-form field bag for user actions

use std::cell::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

use http::{Extensions, HeaderMap};
use uuid::Uuid;

use crate::context::body::Body;
use crate::context::charset::Charset;
use crate::context::ContextError;
use crate::routing::{HttpMethod, ParamValue, PathParams, RouteBinding, RouteMatch};

/// Query parameters; a key may repeat, so every key maps to all its values.
pub type QueryParams = HashMap<String, Vec<String>>;

/// Cookies sent by the client, by name.
pub type Cookies = HashMap<String, String>;

/// Mutable state for one request.
#[derive(Debug)]
pub struct RequestContext {
    request_id: Uuid,
    method: HttpMethod,
    path: String,
    route: Arc<RouteBinding>,
    headers: HeaderMap,
    query_string: Option<String>,
    raw_body: Vec<u8>,
    charset: Charset,
    raw_params: PathParams,
    query: QueryParams,
    path_params: HashMap<String, ParamValue>,
    cookies: Cookies,
    body: OnceCell<Body>,
    extensions: Extensions,
}

impl RequestContext {
    /// Start building a context for a resolved route.
    pub fn builder(method: HttpMethod, path: impl Into<String>, matched: RouteMatch) -> RequestContextBuilder {
        RequestContextBuilder {
            context: RequestContext {
                request_id: Uuid::new_v4(),
                method,
                path: path.into(),
                route: matched.binding,
                headers: HeaderMap::new(),
                query_string: None,
                raw_body: Vec::new(),
                charset: Charset::default(),
                raw_params: matched.params,
                query: QueryParams::new(),
                path_params: HashMap::new(),
                cookies: Cookies::new(),
                body: OnceCell::new(),
                extensions: Extensions::new(),
            },
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Normalized path, relative to the controller mount.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn route(&self) -> &Arc<RouteBinding> {
        &self.route
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if present and visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Unparsed query string as received.
    pub fn query_string(&self) -> Option<&str> {
        self.query_string.as_deref()
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    pub fn query_param(&self, name: &str) -> Option<&[String]> {
        self.query.get(name).map(Vec::as_slice)
    }

    pub fn first_query_param(&self, name: &str) -> Option<&str> {
        self.query_param(name)?.first().map(String::as_str)
    }

    pub fn set_query(&mut self, query: QueryParams) {
        self.query = query;
    }

    /// Path parameters as extracted from the URL.
    pub fn raw_params(&self) -> &PathParams {
        &self.raw_params
    }

    pub fn raw_param(&self, name: &str) -> Option<&str> {
        self.raw_params.get(name).map(String::as_str)
    }

    /// Path parameters after coercion to their declared kinds.
    pub fn path_params(&self) -> &HashMap<String, ParamValue> {
        &self.path_params
    }

    pub fn path_param(&self, name: &str) -> Option<&ParamValue> {
        self.path_params.get(name)
    }

    /// A coerced path parameter converted to `T`; `None` when absent or of
    /// another kind.
    pub fn path_param_as<T>(&self, name: &str) -> Option<T>
    where
        T: for<'a> TryFrom<&'a ParamValue>,
    {
        self.path_param(name).and_then(|v| T::try_from(v).ok())
    }

    pub fn set_path_params(&mut self, params: HashMap<String, ParamValue>) {
        self.path_params = params;
    }

    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn set_cookies(&mut self, cookies: Cookies) {
        self.cookies = cookies;
    }

    /// Body bytes as received from the transport.
    pub fn raw_body(&self) -> &[u8] {
        &self.raw_body
    }

    /// Move the raw bytes out, leaving an empty buffer behind.
    pub fn take_raw_body(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.raw_body)
    }

    /// Parsed body, once an input action has set it.
    pub fn body(&self) -> Option<&Body> {
        self.body.get()
    }

    /// Set the parsed body. Fails if it was already set.
    pub fn set_body(&mut self, body: Body) -> Result<(), ContextError> {
        self.body.set(body).map_err(|_| ContextError::BodyAlreadySet)
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

/// Builder for [`RequestContext`].
#[derive(Debug)]
pub struct RequestContextBuilder {
    context: RequestContext,
}

impl RequestContextBuilder {
    pub fn request_id(mut self, id: Uuid) -> Self {
        self.context.request_id = id;
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.context.headers = headers;
        self
    }

    pub fn query_string(mut self, query: Option<String>) -> Self {
        self.context.query_string = query;
        self
    }

    pub fn raw_body(mut self, body: Vec<u8>) -> Self {
        self.context.raw_body = body;
        self
    }

    pub fn charset(mut self, charset: Charset) -> Self {
        self.context.charset = charset;
        self
    }

    pub fn build(self) -> RequestContext {
        self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ResponseContext;
    use crate::http::handler::Fault;
    use crate::routing::RoutePattern;

    fn noop(_: &mut RequestContext) -> Result<ResponseContext, Fault> {
        Ok(ResponseContext::default())
    }

    fn context() -> RequestContext {
        let binding = RouteBinding::new(RoutePattern::parse("/items/{id}").unwrap(), noop);
        let matched = RouteMatch {
            binding: Arc::new(binding),
            params: PathParams::from([("id".to_string(), "5".to_string())]),
        };
        RequestContext::builder(HttpMethod::Get, "/items/5", matched)
            .query_string(Some("a=1&a=2".into()))
            .build()
    }

    #[test]
    fn test_body_set_exactly_once() {
        let mut ctx = context();
        assert!(ctx.body().is_none());
        ctx.set_body(Body::Text("first".into())).unwrap();
        assert_eq!(ctx.set_body(Body::Empty), Err(ContextError::BodyAlreadySet));
        assert_eq!(ctx.body(), Some(&Body::Text("first".into())));
    }

    #[test]
    fn test_query_accessors() {
        let mut ctx = context();
        ctx.set_query(QueryParams::from([(
            "a".to_string(),
            vec!["1".to_string(), "2".to_string()],
        )]));
        assert_eq!(ctx.query_param("a").map(<[String]>::len), Some(2));
        assert_eq!(ctx.first_query_param("a"), Some("1"));
        assert_eq!(ctx.first_query_param("b"), None);
    }

    #[test]
    fn test_typed_path_param_access() {
        let mut ctx = context();
        assert_eq!(ctx.raw_param("id"), Some("5"));
        ctx.set_path_params(HashMap::from([("id".to_string(), ParamValue::Int(5))]));
        assert_eq!(ctx.path_param_as::<i64>("id"), Some(5));
        assert_eq!(ctx.path_param_as::<String>("id"), None);
    }

    #[test]
    fn test_extensions_field_bag() {
        let mut ctx = context();
        ctx.extensions_mut().insert(42u32);
        assert_eq!(ctx.extensions().get::<u32>(), Some(&42));
    }
}
