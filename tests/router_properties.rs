//! Property tests for path normalization and duplicate detection.

use std::sync::Arc;

use dispatch_core::routing::{normalize_path, RouteBinding, RoutePattern};
use dispatch_core::{HandlerResult, HttpMethod, RequestContext, ResponseContext, RouteError, Router};
use proptest::prelude::*;

fn ok(_: &mut RequestContext) -> HandlerResult {
    Ok(ResponseContext::default())
}

fn binding(template: &str) -> RouteBinding {
    RouteBinding::new(RoutePattern::parse(template).unwrap(), ok)
}

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}"
}

/// Join segments with random runs of slashes and an optional trailing slash.
fn sloppy_path() -> impl Strategy<Value = (Vec<String>, String)> {
    prop::collection::vec((segment(), 1usize..4), 0..6).prop_flat_map(|parts| {
        let segments: Vec<String> = parts.iter().map(|(s, _)| s.clone()).collect();
        let joined: String = parts
            .iter()
            .map(|(s, slashes)| format!("{}{s}", "/".repeat(*slashes)))
            .collect();
        any::<bool>().prop_map(move |trailing| {
            let path = if trailing { format!("{joined}/") } else { joined.clone() };
            (segments.clone(), path)
        })
    })
}

proptest! {
    #[test]
    fn normalization_is_idempotent((_, path) in sloppy_path()) {
        let once = normalize_path(&path);
        prop_assert_eq!(normalize_path(&once), once.clone());
        prop_assert!(once.starts_with('/'));
        prop_assert!(once == "/" || !once.ends_with('/'));
        prop_assert!(!once.contains("//"));
    }

    #[test]
    fn sloppy_and_clean_paths_follow_to_same_binding((segments, path) in sloppy_path()) {
        let clean = format!("/{}", segments.join("/"));
        let mut router = Router::new();
        let registered = router.add_route(HttpMethod::Get, binding(&clean)).unwrap();

        let a = router.follow_route(HttpMethod::Get, &path).unwrap();
        let b = router.follow_route(HttpMethod::Get, &clean).unwrap();
        prop_assert!(Arc::ptr_eq(&a.binding, &registered));
        prop_assert_eq!(a, b);
    }

    #[test]
    fn duplicates_ignore_parameter_names(
        literal in segment(),
        first in "[a-z]{1,6}",
        second in "[a-z]{1,6}",
    ) {
        let mut router = Router::new();
        router
            .add_route(HttpMethod::Post, binding(&format!("/{literal}/{{{first}}}")))
            .unwrap();

        let err = router
            .add_route(HttpMethod::Post, binding(&format!("/{literal}/{{{second}}}")))
            .unwrap_err();
        let RouteError::Duplicate { method, .. } = err;
        prop_assert_eq!(method, HttpMethod::Post);
        prop_assert_eq!(router.len(), 1);

        // Another method is a separate table.
        let put_path = format!("/{literal}/{{{second}}}");
        prop_assert!(router
            .add_route(HttpMethod::Put, binding(&put_path))
            .is_ok());
    }

    #[test]
    fn follow_route_is_idempotent(id in 0i64..1_000_000) {
        let mut router = Router::new();
        router.add_route(HttpMethod::Get, binding("/users/{id:int}")).unwrap();

        let path = format!("/users/{id}");
        let first = router.follow_route(HttpMethod::Get, &path).unwrap();
        let second = router.follow_route(HttpMethod::Get, &path).unwrap();
        prop_assert_eq!(&first.params["id"], &id.to_string());
        prop_assert_eq!(first, second);
    }
}
