//! Response headers that forbid caching.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use http::StatusCode;
use http::header::{CACHE_CONTROL, EXPIRES, HeaderMap, HeaderName, HeaderValue, PRAGMA};
use tracing::error;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::response::Response;

/// The header set added to every decorated response.
///
/// The default covers HTTP/1.1 caches, HTTP/1.0 caches and proxies that only
/// honour `Expires`:
///
/// | Header | Value |
/// |---|---|
/// | `cache-control` | `private, no-cache, no-store, must-revalidate, max-age=0` |
/// | `pragma` | `no-cache` |
/// | `expires` | `0` |
///
/// A header the handler already set is left alone, so a route can still opt
/// into its own `cache-control`.
#[derive(Clone, Debug)]
pub struct NoCache {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl NoCache {
    /// A policy that adds nothing. Build on it with [`NoCache::header`].
    pub fn empty() -> Self {
        Self { headers: Vec::new() }
    }

    /// Adds `name: value`, replacing any earlier value for `name`.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.retain(|(n, _)| *n != name);
        self.headers.push((name, value));
        self
    }

    pub fn headers(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.headers.iter().map(|(n, v)| (n, v))
    }

    /// Inserts every policy header that `headers` does not carry yet.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.headers {
            headers.entry(name).or_insert_with(|| value.clone());
        }
    }
}

impl Default for NoCache {
    fn default() -> Self {
        Self::empty()
            .header(
                CACHE_CONTROL,
                HeaderValue::from_static("private, no-cache, no-store, must-revalidate, max-age=0"),
            )
            .header(PRAGMA, HeaderValue::from_static("no-cache"))
            .header(EXPIRES, HeaderValue::from_static("0"))
    }
}

/// Wraps `inner` so its responses carry the `policy` headers.
///
/// A panicking handler is answered with `500`, which gets the headers too.
pub(crate) fn no_cache(inner: BoxedHandler, policy: &Arc<NoCache>) -> BoxedHandler {
    Arc::new(NoCacheHandler { inner, policy: Arc::clone(policy) })
}

struct NoCacheHandler {
    inner: BoxedHandler,
    policy: Arc<NoCache>,
}

impl ErasedHandler for NoCacheHandler {
    fn call(&self, req: Request) -> BoxFuture {
        let policy = Arc::clone(&self.policy);
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let outcome = AssertUnwindSafe(async move { inner.call(req).await })
                .catch_unwind()
                .await;
            let mut res = outcome.unwrap_or_else(|panic| {
                error!("handler panicked: {}", panic_message(panic.as_ref()));
                Response::status(StatusCode::INTERNAL_SERVER_ERROR)
            });
            policy.apply(res.headers_mut());
            res
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string payload")
}
