//! # gatehouse
//!
//! Public and admin router facades for hyper services.
//!
//! ## The contract
//!
//! Routing is [`matchit`]'s job. Exporting spans is whatever `tracing`
//! subscriber the process installs. Transport is hyper's. gatehouse only
//! decorates: every handler registered through a facade
//!
//! - answers with headers that forbid caching anywhere in the chain, and
//! - runs inside one `tracing` span per request, named after the path and
//!   carrying the OpenTelemetry HTTP server attributes.
//!
//! [`AdminRouter`] additionally joins every path under an admin prefix
//! (`/admin` by default), so admin routes can never be registered at the top
//! level by accident.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use gatehouse::middleware::{Decorators, Tracer};
//! use gatehouse::{AdminRouter, Params, PublicRouter, Request, Response, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let decorators = Decorators::new(Tracer::current());
//!
//!     let public = PublicRouter::new(decorators.clone())
//!         .get("/identities/{id}", get_identity);
//!     let admin = AdminRouter::new(decorators)
//!         .delete("/identities/{id}", delete_identity); // DELETE /admin/identities/{id}
//!
//!     let (public, admin) = tokio::join!(
//!         Server::bind("0.0.0.0:4433").serve(public),
//!         Server::bind("127.0.0.1:4434").serve(admin),
//!     );
//!     public.and(admin).unwrap();
//! }
//!
//! async fn get_identity(_req: Request, params: Params) -> Response {
//!     let id = params.get("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#))
//! }
//!
//! async fn delete_identity(_req: Request, _params: Params) -> http::StatusCode {
//!     http::StatusCode::NO_CONTENT
//! }
//! ```

mod error;
mod facade;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod health;
pub mod middleware;
pub mod path;

pub use error::Error;
pub use facade::{ADMIN_PREFIX, AdminRouter, PublicRouter};
pub use handler::{Handle, Handler, ServiceRequest};
pub use request::{Params, Request, RequestContext};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::{Route, Router};
pub use server::Server;
