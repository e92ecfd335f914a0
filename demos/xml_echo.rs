//! Echoes parsed XML bodies back as JSON.
//!
//! ```sh
//! curl -H 'Content-Type: application/xml' -d '<list><item>a</item></list>' http://127.0.0.1:8080/
//! ```

use ftl_xml_body::{
    layers::{handle_error::HandleErrorLayer, limit_req_body::LimitReqBody},
    Error, HyperService, IntoResponse, Layer, Router, Xml, XmlBodyLayer,
};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto::Builder,
};
use serde_json::Value;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let mut router = Router::new();
    router.any("/", echo).unwrap();
    router.any("/{*path}", echo).unwrap();

    // bodies over 1MiB fail with 413 while the XML layer reads them
    let service = HyperService::new(
        (
            HandleErrorLayer::new(|e: Error| async move { e.into_response() }),
            LimitReqBody::new(1024 * 1024),
            XmlBodyLayer::new(),
        )
            .layer(router),
    );

    let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
    tracing::info!("Listening on {}", listener.local_addr().unwrap());

    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!("Failed to accept: {e}");
                continue;
            }
        };

        let service = service.clone();

        tokio::spawn(async move {
            if let Err(e) = Builder::new(TokioExecutor::new()).serve_connection(TokioIo::new(stream), service).await {
                tracing::error!("Connection from {addr} failed: {e}");
            }
        });
    }
}

async fn echo(Xml(value): Xml) -> Value {
    value
}
