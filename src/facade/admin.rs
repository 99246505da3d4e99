use std::fmt::Display;

use http::Method;
use hyper::body::Body;
use hyper::service::Service;

use crate::handler::{BoxedHandler, Handle, Handler, ServiceRequest};
use crate::middleware::Decorators;
use crate::path;
use crate::router::{Route, Router};

/// Default path every admin route is registered under.
pub const ADMIN_PREFIX: &str = "/admin";

/// Decorating facade over a fresh [`Router`] that namespaces every path under
/// an admin prefix.
///
/// Callers write plain paths; the facade joins them under the prefix for
/// every registration method and for [`lookup`](AdminRouter::lookup), so an
/// admin route can never land at the top level.
///
/// ```rust,no_run
/// use gatehouse::{AdminRouter, Params, Request, Response};
/// use gatehouse::middleware::{Decorators, Tracer};
///
/// async fn list(_req: Request, _params: Params) -> Response {
///     Response::json("[]")
/// }
///
/// // Served at GET /admin/identities only.
/// let admin = AdminRouter::new(Decorators::new(Tracer::current()))
///     .get("/identities", list);
/// ```
pub struct AdminRouter {
    router: Router,
    decorators: Decorators,
    prefix: String,
}

impl AdminRouter {
    /// A facade using [`ADMIN_PREFIX`].
    pub fn new(decorators: Decorators) -> Self {
        Self::with_prefix(decorators, ADMIN_PREFIX)
    }

    pub fn with_prefix(decorators: Decorators, prefix: impl Into<String>) -> Self {
        Self { router: Router::new(), decorators, prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &str { &self.prefix }

    method_shortcuts! {
        get => GET,
        head => HEAD,
        post => POST,
        put => PUT,
        patch => PATCH,
        delete => DELETE,
    }

    /// Registers a router-native handler for any method.
    pub fn handle(self, method: Method, path: &str, handle: impl Handle) -> Self {
        let handler = self.decorators.handle(handle);
        self.register(method, path, handler)
    }

    /// Registers a handler function for any method.
    pub fn handler_func(self, method: Method, path: &str, handler: impl Handler) -> Self {
        let handler = self.decorators.handler_func(handler);
        self.register(method, path, handler)
    }

    /// Registers a handler object for any method.
    pub fn handler<S, B>(self, method: Method, path: &str, service: S) -> Self
    where
        S: Service<ServiceRequest, Response = http::Response<B>> + Send + Sync + 'static,
        S::Error: Display + Send + 'static,
        S::Future: Send + 'static,
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: Display,
    {
        let handler = self.decorators.handler(service);
        self.register(method, path, handler)
    }

    /// Looks up `path` under the admin prefix.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<Route> {
        self.router.lookup(method, &self.full_path(path))
    }

    /// The path a relative `path` is registered at.
    pub fn full_path(&self, path: &str) -> String {
        path::join(&self.prefix, path)
    }

    pub fn decorators(&self) -> &Decorators { &self.decorators }

    pub fn into_router(self) -> Router { self.router }

    fn register(mut self, method: Method, path: &str, handler: BoxedHandler) -> Self {
        let full = self.full_path(path);
        self.router = self.router.insert(method, &full, handler);
        self
    }
}

impl From<AdminRouter> for Router {
    fn from(facade: AdminRouter) -> Self {
        facade.into_router()
    }
}
