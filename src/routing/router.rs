//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Own one method router per HTTP method
//! - Register bindings at startup
//! - Look up the matching binding for (method, path)
//!
//! # Design Decisions
//! - Registration takes `&mut self`; once the router is shared through an
//!   `Arc` it is read-only, so live registration cannot happen
//! - O(1) method lookup via HashMap
//! - Explicit `None` on no match rather than a silent default

use std::collections::HashMap;
use std::sync::Arc;

use crate::routing::binding::{RouteBinding, RouteMatch};
use crate::routing::method::HttpMethod;
use crate::routing::method_router::MethodRouter;
use crate::routing::RouteError;

/// Aggregate router keyed by HTTP method.
#[derive(Debug, Default)]
pub struct Router {
    methods: HashMap<HttpMethod, MethodRouter>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `binding` under `method`.
    pub fn add_route(
        &mut self,
        method: HttpMethod,
        binding: RouteBinding,
    ) -> Result<Arc<RouteBinding>, RouteError> {
        let registered = self
            .methods
            .entry(method)
            .or_insert_with(|| MethodRouter::new(method))
            .register(binding)?;

        tracing::debug!(
            method = %method,
            pattern = %registered.pattern(),
            registrant = registered.registrant(),
            "Route registered"
        );
        Ok(registered)
    }

    /// Resolve `path` for `method`.
    pub fn follow_route(&self, method: HttpMethod, path: &str) -> Option<RouteMatch> {
        self.methods.get(&method)?.follow(path)
    }

    pub fn method_router(&self, method: HttpMethod) -> Option<&MethodRouter> {
        self.methods.get(&method)
    }

    /// Every registered (method, binding) pair, in method order.
    pub fn routes(&self) -> Vec<(HttpMethod, &Arc<RouteBinding>)> {
        let mut routes: Vec<_> = self
            .methods
            .iter()
            .flat_map(|(method, table)| table.bindings().map(move |b| (*method, b)))
            .collect();
        routes.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.pattern().to_string().cmp(&b.1.pattern().to_string()))
        });
        routes
    }

    /// Total number of bindings across all methods.
    pub fn len(&self) -> usize {
        self.methods.values().map(MethodRouter::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{RequestContext, ResponseContext};
    use crate::http::handler::Fault;
    use crate::routing::pattern::RoutePattern;

    fn noop(_: &mut RequestContext) -> Result<ResponseContext, Fault> {
        Ok(ResponseContext::default())
    }

    fn binding(template: &str) -> RouteBinding {
        RouteBinding::new(RoutePattern::parse(template).unwrap(), noop).registered_by("tests")
    }

    #[test]
    fn test_same_pattern_on_different_methods() {
        let mut router = Router::new();
        router.add_route(HttpMethod::Get, binding("/items/{id}")).unwrap();
        router.add_route(HttpMethod::Delete, binding("/items/{id}")).unwrap();

        assert_eq!(router.len(), 2);
        assert!(router.follow_route(HttpMethod::Get, "/items/1").is_some());
        assert!(router.follow_route(HttpMethod::Delete, "/items/1").is_some());
        assert!(router.follow_route(HttpMethod::Put, "/items/1").is_none());
    }

    #[test]
    fn test_duplicate_error_carries_context() {
        let mut router = Router::new();
        router.add_route(HttpMethod::Post, binding("/a/{x}")).unwrap();
        let err = router
            .add_route(HttpMethod::Post, binding("a/{y}/").registered_by("Other"))
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("POST"));
        assert!(message.contains("/a/{y}"));
        assert!(message.contains("Other"));
    }

    #[test]
    fn test_users_posts_extraction() {
        let mut router = Router::new();
        let registered = router
            .add_route(HttpMethod::Get, binding("/users/{id}/posts/{postId}"))
            .unwrap();

        let found = router
            .follow_route(HttpMethod::Get, "/users/42/posts/7")
            .unwrap();
        assert!(Arc::ptr_eq(&found.binding, &registered));
        assert_eq!(found.params.len(), 2);
        assert_eq!(found.params["id"], "42");
        assert_eq!(found.params["postId"], "7");

        assert!(router.follow_route(HttpMethod::Get, "/users/42").is_none());
    }

    #[test]
    fn test_normalized_paths_follow_alike() {
        let mut router = Router::new();
        router.add_route(HttpMethod::Get, binding("/a/{b}")).unwrap();

        let first = router.follow_route(HttpMethod::Get, "/a/b");
        assert!(first.is_some());
        for path in ["a/b/", "/a//b", "//a/b//"] {
            assert_eq!(router.follow_route(HttpMethod::Get, path), first);
        }
    }

    #[test]
    fn test_follow_is_idempotent() {
        let mut router = Router::new();
        router.add_route(HttpMethod::Get, binding("/x/{id}")).unwrap();
        router.add_route(HttpMethod::Get, binding("/x/latest")).unwrap();

        let first = router.follow_route(HttpMethod::Get, "/x/9");
        for _ in 0..10 {
            assert_eq!(router.follow_route(HttpMethod::Get, "/x/9"), first);
        }
    }

    #[test]
    fn test_routes_listing_is_sorted() {
        let mut router = Router::new();
        router.add_route(HttpMethod::Post, binding("/b")).unwrap();
        router.add_route(HttpMethod::Get, binding("/z")).unwrap();
        router.add_route(HttpMethod::Get, binding("/a")).unwrap();

        let listed: Vec<String> = router
            .routes()
            .into_iter()
            .map(|(m, b)| format!("{m} {}", b.pattern()))
            .collect();
        assert_eq!(listed, vec!["GET /a", "GET /z", "POST /b"]);
    }
}
