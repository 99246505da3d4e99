use std::time::Duration;

use gatehouse::middleware::{Decorators, Tracer};
use gatehouse::{PublicRouter, Request, Response, Server};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

async fn boom(_req: Request) -> Response {
    panic!("handler exploded")
}

async fn connect(addr: &str) -> TcpStream {
    for _ in 0..50 {
        if let Ok(stream) = TcpStream::connect(addr).await {
            return stream;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server never came up on {addr}");
}

async fn raw_get(addr: &str, path: &str) -> String {
    let mut stream = connect(addr).await;
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    raw.to_ascii_lowercase()
}

#[tokio::test]
async fn panicking_route_is_served_500_with_no_cache_headers() {
    const ADDR: &str = "127.0.0.1:47811";

    let public = PublicRouter::new(Decorators::new(Tracer::disabled()))
        .handler_func(http::Method::GET, "/boom", boom);
    let server = tokio::spawn(Server::bind(ADDR).serve(public));

    let raw = raw_get(ADDR, "/boom").await;
    server.abort();

    assert!(raw.starts_with("http/1.1 500"), "{raw}");
    assert!(raw.contains("cache-control: private, no-cache, no-store, must-revalidate, max-age=0"));
    assert!(raw.contains("pragma: no-cache"));
    assert!(raw.contains("expires: 0"));
}
