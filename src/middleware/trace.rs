//! Per-request tracing spans.
//!
//! Every decorated handler runs inside a span opened through the injected
//! [`Tracer`]. The span is named after the request path (`otel.name`) and
//! carries the OpenTelemetry HTTP server attributes listed on
//! [`RequestAttributes`]. It closes when the handler future completes, panics,
//! or is dropped, so each request opens exactly one span and closes it once.
//!
//! ```rust,no_run
//! use gatehouse::middleware::Tracer;
//!
//! // Spans go to whatever subscriber is the default when this runs.
//! let tracer = Tracer::current();
//! ```

use std::fmt::Display;
use std::net::IpAddr;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::header::{AUTHORIZATION, CONTENT_LENGTH, HOST, USER_AGENT};
use http::uri::Authority;
use http::Version;
use hyper::body::Body;
use hyper::service::Service;
use tracing::instrument::{Instrument, WithSubscriber};
use tracing::{Dispatch, Span, dispatcher, info_span};

use crate::handler::{
    BoxFuture, BoxedHandler, ErasedHandler, Handle, Handler, ServiceRequest, boxed_service,
};
use crate::request::Request;

/// Target of every request span. Filter on it to route or silence them.
pub const TRACING_COMPONENT: &str = "gatehouse";

// ── Tracer ────────────────────────────────────────────────────────────────────

/// Handle to the subscriber request spans are reported to.
///
/// Built once at startup and handed to
/// [`Decorators`](crate::middleware::Decorators); spans never go through the
/// thread-local default at request time.
#[derive(Clone, Debug)]
pub struct Tracer {
    dispatch: Dispatch,
}

impl Tracer {
    pub fn new(dispatch: impl Into<Dispatch>) -> Self {
        Self { dispatch: dispatch.into() }
    }

    /// Captures the default subscriber in effect right now.
    pub fn current() -> Self {
        Self { dispatch: dispatcher::get_default(Dispatch::clone) }
    }

    /// A tracer whose spans are all disabled.
    pub fn disabled() -> Self {
        Self { dispatch: Dispatch::none() }
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Opens the span for `req`.
    ///
    /// The parent is the span already stored in the request's context; with
    /// none present the span is a root.
    pub fn start(&self, req: &Request) -> Span {
        let attrs = RequestAttributes::from_request(req);
        let parent = req.context().span().and_then(Span::id);

        dispatcher::with_default(&self.dispatch, || {
            info_span!(
                target: TRACING_COMPONENT,
                parent: parent,
                "http.request",
                otel.name = %req.path(),
                otel.kind = "server",
                net.transport = attrs.net_transport,
                net.peer.ip = attrs.net_peer_ip.as_deref(),
                net.peer.port = attrs.net_peer_port,
                net.host.name = attrs.net_host_name.as_deref(),
                net.host.ip = attrs.net_host_ip.as_deref(),
                net.host.port = attrs.net_host_port,
                enduser.id = attrs.enduser_id.as_deref(),
                http.method = attrs.http_method.as_str(),
                http.target = attrs.http_target.as_str(),
                http.scheme = attrs.http_scheme,
                http.host = attrs.http_host.as_deref(),
                http.flavor = attrs.http_flavor,
                http.user_agent = attrs.http_user_agent.as_deref(),
                http.request_content_length = attrs.http_request_content_length,
                http.route = attrs.http_route.as_deref(),
                http.client_ip = attrs.http_client_ip.as_deref()
            )
        })
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::current()
    }
}

// ── Attributes ────────────────────────────────────────────────────────────────

/// Request attributes recorded on every span, following the OpenTelemetry
/// HTTP semantic conventions (v1.7).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestAttributes {
    pub net_transport: &'static str,
    pub net_peer_ip: Option<String>,
    pub net_peer_port: Option<u16>,
    pub net_host_name: Option<String>,
    pub net_host_ip: Option<String>,
    pub net_host_port: Option<u16>,
    /// Basic-auth user name.
    pub enduser_id: Option<String>,
    pub http_method: String,
    pub http_target: String,
    pub http_scheme: &'static str,
    pub http_host: Option<String>,
    pub http_flavor: Option<&'static str>,
    pub http_user_agent: Option<String>,
    pub http_request_content_length: Option<u64>,
    /// Matched route template, not the concrete path.
    pub http_route: Option<String>,
    /// First hop of `X-Forwarded-For`.
    pub http_client_ip: Option<String>,
}

impl RequestAttributes {
    pub fn from_request(req: &Request) -> Self {
        let host = req
            .header(HOST.as_str())
            .map(str::to_owned)
            .or_else(|| req.uri().authority().map(|a| a.as_str().to_owned()));
        let (host_name, host_ip, host_port) = match host.as_deref().map(split_host) {
            Some((name, port)) if name.parse::<IpAddr>().is_ok() => (None, Some(name), port),
            Some((name, port)) => (Some(name), None, port),
            None => (None, None, None),
        };

        Self {
            net_transport: "ip_tcp",
            net_peer_ip: req.remote_addr().map(|a| a.ip().to_string()),
            net_peer_port: req.remote_addr().map(|a| a.port()),
            net_host_name: host_name,
            net_host_ip: host_ip,
            net_host_port: host_port,
            enduser_id: basic_auth_user(req),
            http_method: req.method().to_string(),
            http_target: req
                .uri()
                .path_and_query()
                .map_or_else(|| req.path().to_owned(), |pq| pq.as_str().to_owned()),
            http_scheme: if req.uri().scheme_str() == Some("https") { "https" } else { "http" },
            http_host: host,
            http_flavor: flavor(req.version()),
            http_user_agent: req.header(USER_AGENT.as_str()).map(str::to_owned),
            http_request_content_length: req
                .header(CONTENT_LENGTH.as_str())
                .and_then(|v| v.parse().ok())
                .filter(|len| *len > 0),
            http_route: req.route().map(str::to_owned),
            http_client_ip: req
                .header("x-forwarded-for")
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
                .map(str::to_owned),
        }
    }
}

fn split_host(host: &str) -> (String, Option<u16>) {
    match host.parse::<Authority>() {
        Ok(auth) => {
            let name = auth.host().trim_start_matches('[').trim_end_matches(']');
            (name.to_owned(), auth.port_u16())
        }
        Err(_) => (host.to_owned(), None),
    }
}

fn basic_auth_user(req: &Request) -> Option<String> {
    let (scheme, encoded) = req.header(AUTHORIZATION.as_str())?.split_at_checked(6)?;
    if !scheme.eq_ignore_ascii_case("basic ") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (user, _) = credentials.split_once(':')?;
    (!user.is_empty()).then(|| user.to_owned())
}

fn flavor(version: Version) -> Option<&'static str> {
    match version {
        Version::HTTP_10 => Some("1.0"),
        Version::HTTP_11 => Some("1.1"),
        Version::HTTP_2 => Some("2"),
        Version::HTTP_3 => Some("QUIC"),
        _ => None,
    }
}

// ── Decorators ────────────────────────────────────────────────────────────────

/// Wraps a router-native handler. The matched params are copied into the
/// request context next to the span.
pub(crate) fn handle(handle: impl Handle, tracer: &Tracer) -> BoxedHandler {
    traced(Handle::into_boxed_handler(handle), tracer, true)
}

/// Wraps a handler function.
pub(crate) fn handler_func(handler: impl Handler, tracer: &Tracer) -> BoxedHandler {
    traced(Handler::into_boxed_handler(handler), tracer, false)
}

/// Wraps a handler object. The object receives the decorated context through
/// the `http::Request` extensions.
pub(crate) fn handler<S, B>(service: S, tracer: &Tracer) -> BoxedHandler
where
    S: Service<ServiceRequest, Response = http::Response<B>> + Send + Sync + 'static,
    S::Error: Display + Send + 'static,
    S::Future: Send + 'static,
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Display,
{
    traced(boxed_service(service), tracer, false)
}

fn traced(inner: BoxedHandler, tracer: &Tracer, attach_params: bool) -> BoxedHandler {
    Arc::new(Traced { inner, tracer: tracer.clone(), attach_params })
}

struct Traced {
    inner: BoxedHandler,
    tracer: Tracer,
    attach_params: bool,
}

impl ErasedHandler for Traced {
    fn call(&self, mut req: Request) -> BoxFuture {
        let span = self.tracer.start(&req);

        req.context_mut().set_span(span.clone());
        if self.attach_params {
            let params = req.params().clone();
            req.context_mut().set_params(params);
        }

        let dispatch = self.tracer.dispatch().clone();
        let fut = dispatcher::with_default(&dispatch, || {
            let _entered = span.enter();
            self.inner.call(req)
        });
        Box::pin(fut.instrument(span).with_subscriber(dispatch))
    }
}
