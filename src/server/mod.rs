//! HTTP servers for the evaluator and the auditor.
//!
//! Both are axum routers over shared state; [`serve`] runs one until its
//! shutdown future resolves, letting in-flight requests drain.

pub mod auditor;
pub mod evaluator;

use std::future::Future;

use axum::Router;
use tokio::net::TcpListener;

use crate::error::{DissonanceError, Result};

pub use auditor::AuditReport;
pub use evaluator::{EvaluatorHealth, EvaluatorState};

/// Bind a TCP listener, mapping failures to a server error naming the address
pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| DissonanceError::Server(format!("Failed to bind {}: {}", addr, e)))
}

/// Serve `router` on `listener` until `shutdown` completes
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(addr = %addr, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| DissonanceError::Server(format!("Server on {} failed: {}", addr, e)))?;

    tracing::info!(addr = %addr, "Server drained");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[tokio::test]
    async fn test_bind_invalid_address() {
        let err = bind("not-an-address").await.unwrap_err();
        assert!(err.to_string().contains("not-an-address"));
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let listener = bind("127.0.0.1:0").await.unwrap();
        let router = Router::new().route("/health", get(|| async { "ok" }));
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let server = tokio::spawn(serve(listener, router, async {
            let _ = rx.await;
        }));
        tx.send(()).unwrap();
        assert!(server.await.unwrap().is_ok());
    }
}
