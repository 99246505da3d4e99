//! Middleware layer.
//!
//! Two decorators wrap every handler registered through a facade:
//!
//! - [`no_cache`] — adds the [`NoCache`] header set to the response
//! - [`trace`] — opens a request span through the injected [`Tracer`]
//!
//! [`Decorators`] composes them in a fixed order, cache-control outermost:
//!
//! ```text
//! request → no_cache → trace (span opens) → handler → span closes → no_cache headers → response
//! ```

use std::fmt::Display;
use std::sync::Arc;

use hyper::body::Body;
use hyper::service::Service;

use crate::handler::{BoxedHandler, Handle, Handler, ServiceRequest};

pub mod no_cache;
pub mod trace;

pub use no_cache::NoCache;
pub use trace::{RequestAttributes, TRACING_COMPONENT, Tracer};

/// The decorator chain shared by every route of a facade.
#[derive(Clone, Debug, Default)]
pub struct Decorators {
    tracer: Tracer,
    no_cache: Arc<NoCache>,
}

impl Decorators {
    pub fn new(tracer: Tracer) -> Self {
        Self { tracer, no_cache: Arc::new(NoCache::default()) }
    }

    /// Replaces the default no-cache header set.
    pub fn with_no_cache(mut self, policy: NoCache) -> Self {
        self.no_cache = Arc::new(policy);
        self
    }

    pub fn tracer(&self) -> &Tracer { &self.tracer }
    pub fn no_cache(&self) -> &NoCache { &self.no_cache }

    pub(crate) fn handle(&self, handle: impl Handle) -> BoxedHandler {
        no_cache::no_cache(trace::handle(handle, &self.tracer), &self.no_cache)
    }

    pub(crate) fn handler_func(&self, handler: impl Handler) -> BoxedHandler {
        no_cache::no_cache(trace::handler_func(handler, &self.tracer), &self.no_cache)
    }

    pub(crate) fn handler<S, B>(&self, service: S) -> BoxedHandler
    where
        S: Service<ServiceRequest, Response = http::Response<B>> + Send + Sync + 'static,
        S::Error: Display + Send + 'static,
        S::Future: Send + 'static,
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: Display,
    {
        no_cache::no_cache(trace::handler(service, &self.tracer), &self.no_cache)
    }
}
