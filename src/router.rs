//! Route table with wildcard patterns and handler dispatch seams.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::HandlerError;
use crate::request::{Method, Request};
use crate::response::Response;

/// A route handler.
///
/// Implemented automatically for `Fn(&Request) -> Result<Response,
/// HandlerError>` closures, so hosts can register plain closures without a
/// named type.
pub trait Handler: Send + Sync {
    /// Produce a response for a matched request.
    ///
    /// # Errors
    ///
    /// A returned [`HandlerError`] propagates to the host unchanged; it is
    /// the only failure the engine does not convert into an error response.
    fn handle(&self, request: &Request) -> Result<Response, HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&Request) -> Result<Response, HandlerError> + Send + Sync,
{
    fn handle(&self, request: &Request) -> Result<Response, HandlerError> {
        self(request)
    }
}

/// Handlers the engine provides itself.
///
/// Markers rather than closures so the health handler can read engine
/// state without a self-referential `Arc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// The default 404 responder.
    NotFound,
    /// `{"status": ...}` health report.
    Health,
    /// Echoes the request back as plain text.
    Echo,
}

/// Either a built-in handler marker or a host-registered handler.
#[derive(Clone)]
pub enum HandlerRef {
    Builtin(Builtin),
    Custom(Arc<dyn Handler>),
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerRef::Builtin(builtin) => f.debug_tuple("Builtin").field(builtin).finish(),
            HandlerRef::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A registered route: method, wildcard pattern, handler.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    pub pattern: String,
    pub handler: HandlerRef,
}

/// Introspection view of a route, for `list_routes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub method: Method,
    pub pattern: String,
}

/// Match a concrete request path against a wildcard pattern.
///
/// `*` matches any run of characters (including `/` and an empty run);
/// consecutive stars collapse; a trailing star matches the remainder. A
/// star followed by a literal scans forward to the next occurrence of that
/// literal. Both path and pattern must be exhausted together for a match.
#[must_use]
pub fn path_matches_pattern(path: &str, pattern: &str) -> bool {
    let path = path.as_bytes();
    let pattern = pattern.as_bytes();
    let mut i = 0;
    let mut j = 0;

    while i < path.len() && j < pattern.len() {
        if pattern[j] == b'*' {
            while j < pattern.len() && pattern[j] == b'*' {
                j += 1;
            }
            if j == pattern.len() {
                return true;
            }
            while i < path.len() && path[i] != pattern[j] {
                i += 1;
            }
            if i == path.len() {
                return false;
            }
        } else if pattern[j] == path[i] {
            i += 1;
            j += 1;
        } else {
            return false;
        }
    }

    i == path.len() && j == pattern.len()
}

/// Ordered route table.
///
/// Lookup walks routes most-recently-registered first, so registering a
/// second route for the same method and pattern shadows the first rather
/// than replacing it; removing the newer one restores the older.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. Patterns are matched verbatim apart from `*`
    /// wildcards; no normalization is applied.
    pub fn add_route(&mut self, method: Method, pattern: impl Into<String>, handler: HandlerRef) {
        let pattern = pattern.into();
        debug!(method = %method, pattern = %pattern, "route registered");
        self.routes.push(Route {
            method,
            pattern,
            handler,
        });
    }

    /// Register a host handler for a route.
    pub fn add_handler<H>(&mut self, method: Method, pattern: impl Into<String>, handler: H)
    where
        H: Handler + 'static,
    {
        self.add_route(method, pattern, HandlerRef::Custom(Arc::new(handler)));
    }

    /// Find the route for a request, most recently registered first.
    #[must_use]
    pub fn find_route(&self, method: Method, path: &str) -> Option<&Route> {
        let found = self
            .routes
            .iter()
            .rev()
            .find(|route| route.method == method && path_matches_pattern(path, &route.pattern));
        match found {
            Some(route) => debug!(method = %method, path, pattern = %route.pattern, "route matched"),
            None => debug!(method = %method, path, "no route matched"),
        }
        found
    }

    /// Remove the most recently registered route with this exact method
    /// and pattern. Returns `true` if one was removed.
    pub fn remove_route(&mut self, method: Method, pattern: &str) -> bool {
        if let Some(idx) = self
            .routes
            .iter()
            .rposition(|route| route.method == method && route.pattern == pattern)
        {
            self.routes.remove(idx);
            true
        } else {
            false
        }
    }

    /// Snapshot of all routes in registration order.
    #[must_use]
    pub fn list_routes(&self) -> Vec<RouteInfo> {
        self.routes
            .iter()
            .map(|route| RouteInfo {
                method: route.method,
                pattern: route.pattern.clone(),
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
