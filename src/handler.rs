//! Handler calling conventions and type erasure.
//!
//! # Three ways to write a handler
//!
//! | Convention | Trait | Shape |
//! |---|---|---|
//! | router-native | [`Handle`] | `async fn(Request, Params) -> impl IntoResponse` |
//! | handler function | [`Handler`] | `async fn(Request) -> impl IntoResponse` |
//! | handler object | `hyper::service::Service` | `Service<ServiceRequest, Response = http::Response<B>>` |
//!
//! # How async handlers are stored
//!
//! The router holds handlers of *different* types in a single
//! `HashMap<Method, Tree>`, so every convention is erased to the same
//! trait object before insertion:
//!
//! ```text
//! async fn show(req: Request, params: Params) -> Response { … }
//!        ↓ facade.get("/identities/{id}", show)
//! show.into_boxed_handler()                        ← Handle blanket impl
//!        ↓
//! Arc::new(FnHandle(show))                         ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req)  at request time               ← one vtable dispatch
//! ```
//!
//! Decorators wrap a `BoxedHandler` in another `BoxedHandler`, so the
//! per-request cost is one virtual call per layer.

use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::service::Service;
use tracing::error;

use crate::request::{Params, Request};
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// Request type handed to handler objects.
///
/// The body is already buffered; `Full` makes it a real `Body`, so services
/// built with `hyper::service::service_fn` fit directly.
pub type ServiceRequest = http::Request<Full<Bytes>>;

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public handler traits' conversion methods.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A heap-allocated, type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public traits ─────────────────────────────────────────────────────────────

/// Router-native handler: receives the request and the matched path
/// parameters.
///
/// Satisfied automatically by any function with the signature:
///
/// ```text
/// async fn name(req: Request, params: Params) -> impl IntoResponse
/// ```
pub trait Handle: private::SealedHandle + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

/// Handler function: receives only the request. Path parameters are still
/// reachable through [`Request::param`].
///
/// Satisfied automatically by any function with the signature:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
pub trait Handler: private::SealedHandler + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

/// Both traits are sealed: only the blanket impls below satisfy them.
mod private {
    pub trait SealedHandle {}
    pub trait SealedHandler {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R> private::SealedHandle for F
where
    F: Fn(Request, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handle for F
where
    F: Fn(Request, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandle(self))
    }
}

impl<F, Fut, R> private::SealedHandler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrappers ─────────────────────────────────────────────────────────

struct FnHandle<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandle<F>
where
    F: Fn(Request, Params) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let params = req.params().clone();
        let fut = (self.0)(req, params);
        Box::pin(async move { fut.await.into_response() })
    }
}

struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// Adapts a hyper `Service` over [`ServiceRequest`].
///
/// The request is converted with [`Request::into_http`], so the decorated
/// [`RequestContext`](crate::RequestContext) is visible in its extensions.
/// Service errors and body errors become `500`.
struct ServiceHandler<S>(S);

impl<S, B> ErasedHandler for ServiceHandler<S>
where
    S: Service<ServiceRequest, Response = http::Response<B>>,
    S::Error: Display + Send + 'static,
    S::Future: Send + 'static,
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Display,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = self.0.call(req.into_http());
        Box::pin(async move {
            let res = match fut.await {
                Ok(res) => res,
                Err(e) => {
                    error!("handler service failed: {e}");
                    return Response::status(StatusCode::INTERNAL_SERVER_ERROR);
                }
            };
            let (head, body) = res.into_parts();
            match body.collect().await {
                Ok(collected) => {
                    http::Response::from_parts(head, collected.to_bytes()).into_response()
                }
                Err(e) => {
                    error!("handler service body failed: {e}");
                    Response::status(StatusCode::INTERNAL_SERVER_ERROR)
                }
            }
        })
    }
}

/// Erases a handler object.
pub(crate) fn boxed_service<S, B>(service: S) -> BoxedHandler
where
    S: Service<ServiceRequest, Response = http::Response<B>> + Send + Sync + 'static,
    S::Error: Display + Send + 'static,
    S::Future: Send + 'static,
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Display,
{
    Arc::new(ServiceHandler(service))
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use hyper::service::service_fn;

    use super::*;

    fn request(uri: &str) -> Request {
        http::Request::builder()
            .uri(uri)
            .body(Bytes::new())
            .unwrap()
            .into()
    }

    #[tokio::test]
    async fn handle_receives_router_params() {
        async fn show(_req: Request, params: Params) -> String {
            format!("id={}", params.get("id").unwrap_or("-"))
        }

        let mut req = request("/identities/9");
        req.set_params([("id", "9")].into_iter().collect());

        let res = show.into_boxed_handler().call(req).await;
        assert_eq!(res.body().as_ref(), b"id=9");
    }

    #[tokio::test]
    async fn service_body_is_buffered() {
        let svc = service_fn(|req: ServiceRequest| async move {
            let body = format!("path={}", req.uri().path());
            Ok::<_, Infallible>(http::Response::new(Full::new(Bytes::from(body))))
        });

        let res = boxed_service(svc).call(request("/x")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body().as_ref(), b"path=/x");
    }

    #[tokio::test]
    async fn service_reads_buffered_request_body() {
        let svc = service_fn(|req: ServiceRequest| async move {
            let body = req.into_body().collect().await?.to_bytes();
            Ok::<_, Infallible>(http::Response::new(Full::new(body)))
        });

        let req: Request = http::Request::builder()
            .method("POST")
            .uri("/echo")
            .body(Bytes::from_static(b"ping"))
            .unwrap()
            .into();

        let res = boxed_service(svc).call(req).await;
        assert_eq!(res.body().as_ref(), b"ping");
    }

    #[tokio::test]
    async fn service_error_becomes_500() {
        let svc = service_fn(|_req: ServiceRequest| async {
            Err::<http::Response<Full<Bytes>>, _>("backend down")
        });

        let res = boxed_service(svc).call(request("/x")).await;
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
