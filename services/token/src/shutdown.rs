//! Graceful shutdown.

use axum::Router;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Waits for SIGTERM or SIGINT.
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}

/// Serve `app` until `shutdown` resolves, then drain for at most `timeout`.
///
/// # Errors
///
/// Returns the server's I/O error if it stops on its own.
pub async fn serve_with_graceful_shutdown<S>(
    listener: TcpListener,
    app: Router,
    shutdown: S,
    timeout: Duration,
) -> std::io::Result<()>
where
    S: Future<Output = ()> + Send,
{
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = stop_rx.changed().await;
    });
    let mut handle = tokio::spawn(async move { server.await });

    tokio::select! {
        result = &mut handle => {
            return result.map_err(std::io::Error::other)?;
        }
        () = shutdown => {}
    }

    info!("Draining in-flight requests");
    let _ = stop_tx.send(true);

    match tokio::time::timeout(timeout, &mut handle).await {
        Ok(result) => {
            result.map_err(std::io::Error::other)??;
            info!("Shutdown complete");
        }
        Err(_) => {
            warn!("Shutdown timeout reached, aborting remaining requests");
            handle.abort();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let app = Router::new().route("/", get(|| async { "ok" }));

        let result = serve_with_graceful_shutdown(
            listener,
            app,
            async {},
            Duration::from_secs(1),
        )
        .await;

        assert!(result.is_ok());
    }
}
