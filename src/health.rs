//! Built-in health-check handlers.
//!
//! | Probe | Suggested path | Question |
//! |---|---|---|
//! | **Alive** | `/health/alive` | Is the process alive? Failure → restart. |
//! | **Ready** | `/health/ready` | Can it serve traffic? Failure → pulled from the load balancer. |
//!
//! Register them on either facade (they are plain handler functions):
//!
//! ```rust,no_run
//! use gatehouse::{AdminRouter, health};
//! use gatehouse::middleware::Decorators;
//! use http::Method;
//!
//! let admin = AdminRouter::new(Decorators::default())
//!     .handler_func(Method::GET, "/health/alive", health::alive)
//!     .handler_func(Method::GET, "/health/ready", health::ready);
//! ```
//!
//! Replace `ready` with your own handler to gate on dependency health.

use crate::{Request, Response};

const OK: &str = r#"{"status":"ok"}"#;

/// Liveness probe. Always `200 OK` with `{"status":"ok"}`.
pub async fn alive(_req: Request) -> Response {
    Response::json(OK)
}

/// Readiness probe (default implementation). Always `200 OK` with
/// `{"status":"ok"}`.
pub async fn ready(_req: Request) -> Response {
    Response::json(OK)
}
