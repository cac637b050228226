//! Per-method route table.
//!
//! # Responsibilities
//! - Reject structurally duplicate patterns before mutating state
//! - Match a path against patterns of the same segment count
//!
//! # Design Decisions
//! - Patterns are bucketed by segment count; other lengths are never scanned
//! - Each bucket is kept ordered by specificity (literal before parameter
//!   at the first differing segment), and the first match wins. `/users/me`
//!   therefore beats `/users/{id}` no matter which was registered first.
//! - Two patterns with the same literal/parameter arrangement but different
//!   literals can never match the same path, so their relative order is
//!   irrelevant
//! - Request segments are percent-decoded once after splitting, so `%2F`
//!   stays inside its segment; a segment that is not UTF-8 once decoded
//!   matches nothing
//! - O(patterns of that length × pattern length) per lookup; a segment trie
//!   would only pay off with thousands of routes

use std::collections::HashMap;
use std::sync::Arc;

use percent_encoding::percent_decode_str;

use crate::routing::binding::{RouteBinding, RouteMatch};
use crate::routing::method::HttpMethod;
use crate::routing::pattern::split_segments;
use crate::routing::RouteError;

/// Route table for a single HTTP method.
#[derive(Debug)]
pub struct MethodRouter {
    method: HttpMethod,
    by_length: HashMap<usize, Vec<Arc<RouteBinding>>>,
    count: usize,
}

impl MethodRouter {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            by_length: HashMap::new(),
            count: 0,
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Insert a binding, failing if an equal-shaped pattern already exists.
    pub fn register(&mut self, binding: RouteBinding) -> Result<Arc<RouteBinding>, RouteError> {
        let bucket = self.by_length.entry(binding.pattern().len()).or_default();

        if let Some(existing) = bucket.iter().find(|b| b.pattern() == binding.pattern()) {
            return Err(RouteError::Duplicate {
                method: self.method,
                pattern: binding.pattern().to_string(),
                registrant: binding.registrant().to_string(),
                existing: existing.pattern().to_string(),
                existing_registrant: existing.registrant().to_string(),
            });
        }

        let key = binding.pattern().specificity();
        let position = bucket.partition_point(|b| b.pattern().specificity() <= key);
        let binding = Arc::new(binding);
        bucket.insert(position, Arc::clone(&binding));
        self.count += 1;
        Ok(binding)
    }

    /// Find the binding for `path`. Returns `None` when nothing matches.
    pub fn follow(&self, path: &str) -> Option<RouteMatch> {
        let decoded = split_segments(path)
            .into_iter()
            .map(|s| percent_decode_str(s).decode_utf8().ok())
            .collect::<Option<Vec<_>>>()?;
        let segments: Vec<&str> = decoded.iter().map(|s| &**s).collect();
        self.by_length.get(&segments.len())?.iter().find_map(|binding| {
            binding.pattern().matches(&segments).map(|params| RouteMatch {
                binding: Arc::clone(binding),
                params,
            })
        })
    }

    /// All bindings, grouped by segment count.
    pub fn bindings(&self) -> impl Iterator<Item = &Arc<RouteBinding>> {
        self.by_length.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
