//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. This is the router the
//! facades decorate; it knows nothing about spans or cache headers.

use std::collections::HashMap;
use std::sync::Arc;

use http::header::{ALLOW, HeaderValue};
use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;
use tracing::debug;

use crate::handler::{BoxedHandler, Handler};
use crate::request::{Params, Request};
use crate::response::Response;

/// The underlying application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Handlers registered with [`Router::on`] are not decorated; use
/// [`PublicRouter`](crate::PublicRouter) or [`AdminRouter`](crate::AdminRouter)
/// for that.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Endpoint>>,
}

/// A tree leaf: the handler plus the template it was registered under.
struct Endpoint {
    pattern: Arc<str>,
    handler: BoxedHandler,
}

/// A handler matched by [`Router::lookup`], with the parameters it captured.
pub struct Route {
    pattern: Arc<str>,
    handler: BoxedHandler,
    params: Params,
}

impl Route {
    pub fn params(&self) -> &Params { &self.params }

    /// The registered template, e.g. `/identities/{id}`.
    pub fn pattern(&self) -> &str { &self.pattern }

    /// Runs the matched handler with the captured parameters.
    pub async fn call(self, mut req: Request) -> Response {
        req.set_params(self.params);
        req.set_route(self.pattern);
        self.handler.call(req).await
    }
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax — `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use gatehouse::{Request, Response, Router};
    /// # use http::Method;
    /// # async fn version(_: Request) -> Response { Response::text("") }
    /// Router::new().on(Method::GET, "/version", version);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or conflicts with a registered route.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.insert(method, path, handler.into_boxed_handler())
    }

    pub(crate) fn insert(mut self, method: Method, path: &str, handler: BoxedHandler) -> Self {
        debug!(%method, path, "route registered");
        self.routes
            .entry(method)
            .or_default()
            .insert(path, Endpoint { pattern: Arc::from(path), handler })
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn lookup(&self, method: &Method, path: &str) -> Option<Route> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let endpoint = matched.value;
        Some(Route {
            pattern: Arc::clone(&endpoint.pattern),
            handler: Arc::clone(&endpoint.handler),
            params: matched.params.iter().collect(),
        })
    }

    /// Methods that have a route matching `path`, in a stable order.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = self
            .routes
            .iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(method, _)| method.clone())
            .collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    /// Routes one request and produces one response.
    ///
    /// Unknown paths get `404`; a path registered only under other methods
    /// gets `405` with an `Allow` header.
    pub async fn dispatch(&self, req: Request) -> Response {
        if let Some(route) = self.lookup(req.method(), req.path()) {
            return route.call(req).await;
        }

        let allowed = self.allowed_methods(req.path());
        if allowed.is_empty() {
            return Response::status(StatusCode::NOT_FOUND);
        }

        let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
        let mut res = Response::status(StatusCode::METHOD_NOT_ALLOWED);
        if let Ok(value) = HeaderValue::from_str(&allow) {
            res.headers_mut().insert(ALLOW, value);
        }
        res
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
