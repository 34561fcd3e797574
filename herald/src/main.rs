use std::sync::Arc;

use herald_common::Signal;
use herald_dispatch::Dispatcher;
use herald_http::{ApiServer, HttpConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    herald_common::logging::init();

    let config = HttpConfig::from_env();
    let dispatcher = Arc::new(Dispatcher::new());

    let server = ApiServer::bind(&config, dispatcher).await?;
    tracing::info!(address = %server.local_addr()?, "herald listening");

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    tokio::spawn(async move {
        wait_for_termination().await;
        tracing::info!("shutdown requested");
        let _ = shutdown_tx.send(Signal::Shutdown);
    });

    server.serve(shutdown_rx).await?;
    Ok(())
}

/// Resolve on SIGINT or, on Unix, SIGTERM.
async fn wait_for_termination() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
