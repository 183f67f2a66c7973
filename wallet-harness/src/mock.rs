//! Mock renditions of the wallet's auxiliary services.
//!
//! Each service is an [`axum::Router`] serving static or lightly templated
//! JSON, configured from an explicit config struct with env-var overrides.
//! Test scenarios poll these the way the production frontend polls the real
//! services; none of them implement any protocol logic beyond their
//! published discovery and request shapes.

use tokio::net::TcpListener;

pub mod issuer;
pub mod pdp;
pub mod verifier;

/// Serve a router until the task is dropped or the listener fails.
pub async fn serve(listener: TcpListener, router: axum::Router) -> std::io::Result<()> {
    axum::serve(listener, router).await
}

/// Bind a router on `127.0.0.1:port` (an ephemeral port when 0) and serve
/// it in a background task. Returns the bound port.
pub async fn spawn(port: u16, router: axum::Router) -> std::io::Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(async move {
        if let Err(err) = serve(listener, router).await {
            log::error!("mock service on port {port} stopped: {err}");
        }
    });
    Ok(port)
}
