//! Incoming HTTP request type and the per-request context.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::request::Parts;
use http::{Extensions, HeaderMap, Method, Uri, Version};
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use tracing::Span;

use crate::handler::ServiceRequest;

// ── Params ────────────────────────────────────────────────────────────────────

/// Path parameters captured by the router.
///
/// For a route `/identities/{id}` matched against `/identities/42`,
/// `params.get("id")` returns `Some("42")`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params(HashMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ── RequestContext ────────────────────────────────────────────────────────────

/// Values attached to a request while it travels through the decorators.
///
/// The tracing decorator stores the request span here; for router-native
/// handlers it also stores the matched parameters. Handler objects receiving
/// an `http::Request` find a clone of this struct in its extensions.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    span: Option<Span>,
    params: Option<Params>,
}

impl RequestContext {
    /// The span opened for this request, if it went through a tracing decorator.
    pub fn span(&self) -> Option<&Span> { self.span.as_ref() }

    /// Matched parameters, set for router-native handlers only.
    pub fn params(&self) -> Option<&Params> { self.params.as_ref() }

    pub(crate) fn set_span(&mut self, span: Span) {
        self.span = Some(span);
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.params = Some(params);
    }
}

// ── Request ───────────────────────────────────────────────────────────────────

/// An incoming HTTP request with its body fully buffered.
pub struct Request {
    head: Parts,
    body: Bytes,
    remote_addr: Option<SocketAddr>,
    params: Params,
    route: Option<Arc<str>>,
    context: RequestContext,
}

impl Request {
    pub(crate) fn from_parts(head: Parts, body: Bytes, remote_addr: Option<SocketAddr>) -> Self {
        let context = head.extensions.get::<RequestContext>().cloned().unwrap_or_default();
        Self { head, body, remote_addr, params: Params::new(), route: None, context }
    }

    /// Builds a request from an `http::Request` with any body, buffering it.
    ///
    /// Extensions written by [`Request::into_http`] (context, params, peer
    /// address) are restored.
    pub async fn from_http<B: Body>(req: http::Request<B>) -> Result<Self, B::Error> {
        let (head, body) = req.into_parts();
        let body = body.collect().await?.to_bytes();
        Ok(Self::from_http_parts(head, body))
    }

    fn from_http_parts(head: Parts, body: Bytes) -> Self {
        let remote_addr = head.extensions.get::<SocketAddr>().copied();
        let params = head.extensions.get::<Params>().cloned().unwrap_or_default();
        let mut req = Self::from_parts(head, body, remote_addr);
        req.params = params;
        req
    }

    /// Records the peer address of the connection the request arrived on.
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn method(&self) -> &Method { &self.head.method }
    pub fn uri(&self) -> &Uri { &self.head.uri }
    pub fn path(&self) -> &str { self.head.uri.path() }
    pub fn version(&self) -> Version { self.head.version }
    pub fn headers(&self) -> &HeaderMap { &self.head.headers }
    pub fn extensions(&self) -> &Extensions { &self.head.extensions }
    pub fn body(&self) -> &Bytes { &self.body }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }
    pub fn params(&self) -> &Params { &self.params }

    /// The route template that matched, such as `/identities/{id}`. `None`
    /// until the router has dispatched the request.
    pub fn route(&self) -> Option<&str> { self.route.as_deref() }
    pub fn context(&self) -> &RequestContext { &self.context }

    /// Header lookup. Names are case-insensitive; non-UTF-8 values are skipped.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/identities/{id}`, `req.param("id")` on `/identities/42`
    /// returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    pub(crate) fn set_route(&mut self, route: Arc<str>) {
        self.route = Some(route);
    }

    pub(crate) fn context_mut(&mut self) -> &mut RequestContext {
        &mut self.context
    }

    /// Converts back into an `http::Request`, carrying the [`RequestContext`]
    /// and [`Params`] in its extensions.
    pub fn into_http(self) -> ServiceRequest {
        let mut head = self.head;
        head.extensions.insert(self.context);
        head.extensions.insert(self.params);
        if let Some(addr) = self.remote_addr {
            head.extensions.insert(addr);
        }
        http::Request::from_parts(head, Full::new(self.body))
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (head, body) = req.into_parts();
        Self::from_http_parts(head, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> Request {
        http::Request::builder()
            .uri(uri)
            .header("X-Request-Id", "abc")
            .body(Bytes::from_static(b"hello"))
            .unwrap()
            .into()
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = request("/identities?page=2");
        assert_eq!(req.header("x-request-id"), Some("abc"));
        assert_eq!(req.path(), "/identities");
        assert_eq!(req.body().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn into_http_carries_context_and_params() {
        let mut req = request("/identities/7").with_remote_addr("192.0.2.1:4000".parse().unwrap());
        req.set_params([("id", "7")].into_iter().collect());
        req.context_mut().set_params([("id", "7")].into_iter().collect());

        let http_req = req.into_http();
        let ctx = http_req.extensions().get::<RequestContext>().unwrap();
        assert_eq!(ctx.params().and_then(|p| p.get("id")), Some("7"));

        let back = Request::from_http(http_req).await.unwrap();
        assert_eq!(back.param("id"), Some("7"));
        assert_eq!(back.context().params().map(Params::len), Some(1));
        assert_eq!(back.remote_addr().map(|a| a.port()), Some(4000));
        assert_eq!(back.body().as_ref(), b"hello");
        assert_eq!(back.route(), None);
    }
}
