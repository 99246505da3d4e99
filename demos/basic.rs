//! Public and admin APIs on two ports, with request spans and no-cache headers.
//!
//! Run with:
//!   cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:4433/identities/42
//!   curl -i http://localhost:4433/health/alive
//!   curl -i http://localhost:4434/admin/identities
//!   curl -i -X DELETE http://localhost:4434/admin/identities/42
//!   curl -i http://localhost:4434/identities        # 404: admin routes live under /admin

use gatehouse::middleware::{Decorators, Tracer};
use gatehouse::{AdminRouter, Params, PublicRouter, Request, Response, Server, health};
use http::{Method, StatusCode};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    // Request spans go to the subscriber installed above.
    let decorators = Decorators::new(Tracer::current());

    let public = PublicRouter::new(decorators.clone())
        .get("/identities/{id}", get_identity)
        .handler_func(Method::GET, "/health/alive", health::alive)
        .handler_func(Method::GET, "/health/ready", health::ready);

    let admin = AdminRouter::new(decorators)
        .get("/identities", list_identities)
        .delete("/identities/{id}", delete_identity)
        .handler_func(Method::GET, "/health/alive", health::alive)
        .handler_func(Method::GET, "/health/ready", health::ready);

    let (public, admin) = tokio::join!(
        Server::bind("0.0.0.0:4433").serve(public),
        Server::bind("127.0.0.1:4434").serve(admin),
    );
    public.and(admin).expect("server error");
}

// GET /identities/{id}
async fn get_identity(_req: Request, params: Params) -> Response {
    let id = params.get("id").unwrap_or("unknown");
    tracing::info!(id, "fetching identity");
    Response::json(format!(r#"{{"id":"{id}","state":"active"}}"#))
}

// GET /admin/identities
async fn list_identities(_req: Request, _params: Params) -> Response {
    Response::json(r#"[{"id":"42","state":"active"}]"#)
}

// DELETE /admin/identities/{id} → 204 No Content
async fn delete_identity(_req: Request, _params: Params) -> StatusCode {
    StatusCode::NO_CONTENT
}
