//! In-process endpoints for network tests.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;

/// Serves `app` on an ephemeral localhost port.
pub async fn spawn_http(app: Router) -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind http stub");
    listener.set_nonblocking(true).expect("nonblocking listener");
    let addr = listener.local_addr().expect("http stub addr");
    let server = axum::Server::from_tcp(listener)
        .expect("http stub server")
        .serve(app.into_make_service());
    tokio::spawn(server);
    addr
}

/// Accepts WebSocket connections and hands each to `handler`.
pub async fn spawn_ws<F, Fut>(handler: F) -> SocketAddr
where
    F: Fn(WebSocketStream<TcpStream>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind ws stub");
    let addr = listener.local_addr().expect("ws stub addr");
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            if let Ok(socket) = tokio_tungstenite::accept_async(stream).await {
                tokio::spawn(handler(socket));
            }
        }
    });
    addr
}

/// An address nothing is listening on.
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe port");
    listener.local_addr().expect("probe port addr")
}
