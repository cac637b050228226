//! Controllers: a named route table mounted under a path prefix.

use std::sync::Arc;

use crate::http::handler::Handler;
use crate::routing::{
    normalize_path, split_segments, HttpMethod, PatternError, RouteBinding, RouteError, RoutePattern,
    Router,
};

/// Controller construction errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error("controller {controller}: invalid route \"{template}\": {source}")]
    Pattern {
        controller: String,
        template: String,
        #[source]
        source: PatternError,
    },

    #[error(transparent)]
    Route(#[from] RouteError),
}

/// A frozen route table reachable under `path`.
#[derive(Debug)]
pub struct Controller {
    name: String,
    path: String,
    router: Router,
}

impl Controller {
    pub fn builder(name: impl Into<String>, mount: &str) -> ControllerBuilder {
        ControllerBuilder::new(name, mount)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized mount path, `/` for the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The remainder of `path` below the mount point, or `None` if `path`
    /// is outside it. Prefixes only count at segment boundaries, so a
    /// controller at `/api` owns `/api/x` but not `/apix`.
    pub fn strip_mount<'p>(&self, path: &'p str) -> Option<&'p str> {
        if self.path == "/" {
            return Some(path);
        }
        let rest = path.strip_prefix(self.path.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    /// Number of path segments in the mount point.
    pub fn depth(&self) -> usize {
        split_segments(&self.path).len()
    }
}

/// Collects routes, then freezes them into a [`Controller`].
///
/// The first error is kept and reported by [`build`](Self::build); later
/// registrations are skipped.
pub struct ControllerBuilder {
    name: String,
    path: String,
    router: Router,
    error: Option<ControllerError>,
}

impl ControllerBuilder {
    pub fn new(name: impl Into<String>, mount: &str) -> Self {
        Self {
            name: name.into(),
            path: normalize_path(mount),
            router: Router::new(),
            error: None,
        }
    }

    pub fn route(mut self, method: HttpMethod, template: &str, handler: impl Handler + 'static) -> Self {
        self.register(method, template, Arc::new(handler));
        self
    }

    pub fn get(self, template: &str, handler: impl Handler + 'static) -> Self {
        self.route(HttpMethod::Get, template, handler)
    }

    pub fn post(self, template: &str, handler: impl Handler + 'static) -> Self {
        self.route(HttpMethod::Post, template, handler)
    }

    pub fn put(self, template: &str, handler: impl Handler + 'static) -> Self {
        self.route(HttpMethod::Put, template, handler)
    }

    pub fn delete(self, template: &str, handler: impl Handler + 'static) -> Self {
        self.route(HttpMethod::Delete, template, handler)
    }

    pub fn patch(self, template: &str, handler: impl Handler + 'static) -> Self {
        self.route(HttpMethod::Patch, template, handler)
    }

    fn register(&mut self, method: HttpMethod, template: &str, handler: Arc<dyn Handler>) {
        if self.error.is_some() {
            return;
        }

        let pattern = match RoutePattern::parse(template) {
            Ok(pattern) => pattern,
            Err(source) => {
                self.error = Some(ControllerError::Pattern {
                    controller: self.name.clone(),
                    template: template.to_string(),
                    source,
                });
                return;
            }
        };

        let binding = RouteBinding::from_arc(pattern, handler).registered_by(self.name.clone());
        if let Err(e) = self.router.add_route(method, binding) {
            self.error = Some(e.into());
        }
    }

    pub fn build(self) -> Result<Controller, ControllerError> {
        if let Some(e) = self.error {
            return Err(e);
        }

        tracing::info!(
            controller = %self.name,
            mount = %self.path,
            routes = self.router.len(),
            "Controller built"
        );

        Ok(Controller {
            name: self.name,
            path: self.path,
            router: self.router,
        })
    }
}
