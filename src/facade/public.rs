use std::fmt::Display;

use http::Method;
use hyper::body::Body;
use hyper::service::Service;

use crate::handler::{BoxedHandler, Handle, Handler, ServiceRequest};
use crate::middleware::Decorators;
use crate::router::{Route, Router};

/// Decorating facade over a fresh [`Router`], paths unchanged.
///
/// ```rust,no_run
/// use gatehouse::{Params, PublicRouter, Request, Response};
/// use gatehouse::middleware::{Decorators, Tracer};
///
/// async fn whoami(_req: Request, _params: Params) -> Response {
///     Response::json(r#"{"id":"anonymous"}"#)
/// }
///
/// let public = PublicRouter::new(Decorators::new(Tracer::current()))
///     .get("/sessions/whoami", whoami);
/// ```
pub struct PublicRouter {
    router: Router,
    decorators: Decorators,
}

impl PublicRouter {
    pub fn new(decorators: Decorators) -> Self {
        Self { router: Router::new(), decorators }
    }

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

    pub fn lookup(&self, method: &Method, path: &str) -> Option<Route> {
        self.router.lookup(method, path)
    }

    pub fn decorators(&self) -> &Decorators { &self.decorators }

    pub fn into_router(self) -> Router { self.router }

    fn register(mut self, method: Method, path: &str, handler: BoxedHandler) -> Self {
        self.router = self.router.insert(method, path, handler);
        self
    }
}

impl From<PublicRouter> for Router {
    fn from(facade: PublicRouter) -> Self {
        facade.into_router()
    }
}
